// Markdown Converter
// Serializes a StructuredDocument to Markdown text. Attributes without a
// Markdown equivalent (color, highlight, font size, underline) survive in
// a single inline styled wrapper per run, so the output still round-trips
// through the parser.

use super::markdown_parser::parse_markdown;
use super::structured_document::*;
use regex::Regex;
use std::sync::LazyLock;

/// Convert markdown text (including style wrappers) to a StructuredDocument
pub fn markdown_to_document(markdown: &str) -> StructuredDocument {
    parse_markdown(markdown)
}

/// Convert a StructuredDocument to markdown text
pub fn document_to_markdown(doc: &StructuredDocument) -> String {
    let mut output = String::new();

    for (i, block) in doc.blocks().iter().enumerate() {
        if i > 0 {
            output.push_str("\n\n");
        }

        match &block.kind {
            BlockKind::Paragraph => {
                output.push_str(&inline_content_to_markdown(&block.content));
            }
            BlockKind::Heading { level } => {
                output.push_str(&"#".repeat(*level as usize));
                output.push(' ');
                output.push_str(&inline_content_to_markdown(&block.content));
            }
            BlockKind::BlockQuote => {
                output.push_str("> ");
                output.push_str(&inline_content_to_markdown(&block.content));
            }
            BlockKind::ListItem { ordered, number } => {
                if *ordered {
                    output.push_str(&format!("{}. ", number.unwrap_or(1)));
                } else {
                    output.push_str("- ");
                }
                output.push_str(&inline_content_to_markdown(&block.content));
            }
            BlockKind::Rule => {
                output.push_str("---");
            }
        }
    }

    cleanup(&output)
}

/// Convert inline content to markdown
fn inline_content_to_markdown(content: &[Inline]) -> String {
    let mut output = String::new();

    for item in content {
        match item {
            Inline::Text(run) => output.push_str(&run_to_markdown(run)),
            Inline::Image(image) => output.push_str(&image_to_markdown(image)),
            Inline::Break => output.push_str("  \n"),
        }
    }

    output
}

fn run_to_markdown(run: &TextRun) -> String {
    if run.text.is_empty() {
        return String::new();
    }

    let style = &run.style;
    let mut result = run.text.clone();

    // Code overrides the other Markdown marks
    if style.code {
        result = format!("`{}`", result);
    } else {
        if style.strikethrough {
            result = format!("~~{}~~", result);
        }
        if style.bold && style.italic {
            result = format!("***{}***", result);
        } else if style.bold {
            result = format!("**{}**", result);
        } else if style.italic {
            result = format!("*{}*", result);
        }
    }

    // All attributes without Markdown syntax share one wrapper
    if let Some(declarations) = style_declarations(style) {
        result = format!("<span style=\"{}\">{}</span>", declarations, result);
    }

    if let Some(destination) = &style.link {
        result = format!("[{}]({})", result, destination);
    }

    result
}

/// The combined style declarations for attributes with no Markdown
/// equivalent, or None when the run needs no wrapper
fn style_declarations(style: &InlineStyle) -> Option<String> {
    if !style.needs_style_wrapper() {
        return None;
    }
    let mut declarations: Vec<String> = Vec::new();
    if let Some(color) = &style.color {
        declarations.push(format!("color: {}", color));
    }
    if let Some(highlight) = &style.highlight {
        declarations.push(format!("background-color: {}", highlight));
    }
    if let Some(px) = style.font_size {
        declarations.push(format!("font-size: {}px", px));
    }
    if style.underline {
        declarations.push("text-decoration: underline".to_string());
    }
    Some(declarations.join("; "))
}

fn image_to_markdown(image: &ImageRun) -> String {
    match (image.width, image.height) {
        // An explicit size has no Markdown form; fall back to an img tag
        (Some(w), Some(h)) => format!(
            "<img src=\"{}\" alt=\"{}\" width=\"{}\" height=\"{}\">",
            image.src, image.alt, w, h
        ),
        _ => format!("![{}]({})", image.alt, image.src),
    }
}

static EXTRA_BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").unwrap());
static EMPTY_WRAPPER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<span style="[^"]*">\s*</span>"#).unwrap());

/// Final cleanup: collapse runs of blank lines to a single one, strip
/// wrappers left empty, trim leading/trailing blank lines
fn cleanup(text: &str) -> String {
    let text = EMPTY_WRAPPER.replace_all(text, "");
    let text = EXTRA_BLANK_LINES.replace_all(&text, "\n\n");
    text.trim_matches('\n').trim_end().to_string()
}
