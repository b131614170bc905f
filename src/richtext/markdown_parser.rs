// Markdown Parser - converts pulldown-cmark events into the structured
// document model. Inline HTML is limited to the wrappers the serializer
// emits (<span style>, <u>, <img>); everything else passes through as
// plain text semantics.

use super::structured_document::*;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use regex::Regex;
use std::sync::LazyLock;

static STYLE_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"style="([^"]*)""#).unwrap());
static COLOR_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|;)\s*color:\s*([^;]+)").unwrap());
static BACKGROUND_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"background-color:\s*([^;]+)").unwrap());
static FONT_SIZE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"font-size:\s*(\d+)px").unwrap());
static UNDERLINE_DECL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"text-decoration:[^;]*underline").unwrap());
static SRC_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"src="([^"]*)""#).unwrap());
static ALT_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"alt="([^"]*)""#).unwrap());
static WIDTH_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"width="(\d+)""#).unwrap());
static HEIGHT_ATTR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r#"height="(\d+)""#).unwrap());

struct ListContext {
    ordered: bool,
    next_number: u64,
}

struct ImageCapture {
    src: String,
    alt: String,
}

struct ParserState {
    doc: StructuredDocument,
    content: Vec<Inline>,
    style_stack: Vec<InlineStyle>,
    quote_depth: usize,
    list_stack: Vec<ListContext>,
    image: Option<ImageCapture>,
    in_code_block: bool,
}

impl ParserState {
    fn new() -> Self {
        ParserState {
            doc: StructuredDocument::new(),
            content: Vec::new(),
            style_stack: vec![InlineStyle::plain()],
            quote_depth: 0,
            list_stack: Vec::new(),
            image: None,
            in_code_block: false,
        }
    }

    fn style(&self) -> InlineStyle {
        self.style_stack.last().cloned().unwrap_or_default()
    }

    fn push_style(&mut self, style: InlineStyle) {
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn push_text(&mut self, text: &str, style: InlineStyle) {
        self.content.push(Inline::Text(TextRun::new(text, style)));
    }

    fn flush_block(&mut self, kind: BlockKind) {
        let mut block = Block::new(0, kind);
        block.content = std::mem::take(&mut self.content);
        block.normalize_runs();
        self.doc.add_block(block);
    }

    /// Emit accumulated stray content before a structural boundary
    fn flush_pending_paragraph(&mut self) {
        if !self.content.is_empty() {
            self.flush_block(BlockKind::Paragraph);
        }
    }

    fn handle_html(&mut self, html: &str) {
        let html = html.trim();
        if html == "<u>" || html.starts_with("<u ") {
            let mut style = self.style();
            style.underline = true;
            self.push_style(style);
        } else if html == "</u>" {
            self.pop_style();
        } else if html.starts_with("<span") {
            let mut style = self.style();
            if let Some(caps) = STYLE_ATTR.captures(html) {
                let declarations = caps.get(1).map(|m| m.as_str()).unwrap_or("");
                if let Some(c) = COLOR_DECL.captures(declarations) {
                    style.color = Some(c[1].trim().to_string());
                }
                if let Some(c) = BACKGROUND_DECL.captures(declarations) {
                    style.highlight = Some(c[1].trim().to_string());
                }
                if let Some(c) = FONT_SIZE_DECL.captures(declarations) {
                    style.font_size = c[1].parse().ok();
                }
                if UNDERLINE_DECL.is_match(declarations) {
                    style.underline = true;
                }
            }
            self.push_style(style);
        } else if html.starts_with("</span") {
            self.pop_style();
        } else if html.starts_with("<img") {
            let src = SRC_ATTR
                .captures(html)
                .map(|c| c[1].to_string())
                .unwrap_or_default();
            let alt = ALT_ATTR
                .captures(html)
                .map(|c| c[1].to_string())
                .unwrap_or_default();
            let mut image = ImageRun::new(src, alt);
            image.width = WIDTH_ATTR.captures(html).and_then(|c| c[1].parse().ok());
            image.height = HEIGHT_ATTR.captures(html).and_then(|c| c[1].parse().ok());
            self.content.push(Inline::Image(image));
        }
    }
}

/// Parse markdown text into a structured document
pub fn parse_markdown(text: &str) -> StructuredDocument {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(text, options);

    let mut state = ParserState::new();

    for event in parser {
        match event {
            Event::Start(tag) => match tag {
                Tag::Emphasis => {
                    let mut style = state.style();
                    style.italic = true;
                    state.push_style(style);
                }
                Tag::Strong => {
                    let mut style = state.style();
                    style.bold = true;
                    state.push_style(style);
                }
                Tag::Strikethrough => {
                    let mut style = state.style();
                    style.strikethrough = true;
                    state.push_style(style);
                }
                Tag::Link { dest_url, .. } => {
                    let mut style = state.style();
                    style.link = Some(dest_url.to_string());
                    state.push_style(style);
                }
                Tag::Image { dest_url, .. } => {
                    state.image = Some(ImageCapture {
                        src: dest_url.to_string(),
                        alt: String::new(),
                    });
                }
                Tag::BlockQuote(_) => {
                    state.quote_depth += 1;
                }
                Tag::List(start_number) => {
                    state.list_stack.push(ListContext {
                        ordered: start_number.is_some(),
                        next_number: start_number.unwrap_or(1),
                    });
                }
                Tag::Item => {
                    // Items flush at End(Item); nothing pending may leak in
                    state.flush_pending_paragraph();
                }
                Tag::CodeBlock(_) => {
                    state.flush_pending_paragraph();
                    state.in_code_block = true;
                }
                Tag::Paragraph | Tag::Heading { .. } => {}
                _ => {}
            },

            Event::End(tag_end) => match tag_end {
                TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough | TagEnd::Link => {
                    state.pop_style();
                }
                TagEnd::Image => {
                    if let Some(capture) = state.image.take() {
                        state
                            .content
                            .push(Inline::Image(ImageRun::new(capture.src, capture.alt)));
                    }
                }
                TagEnd::Paragraph => {
                    // Paragraphs inside a list item stay in the item;
                    // a break keeps multi-paragraph items one block
                    if state.list_stack.is_empty() {
                        let kind = if state.quote_depth > 0 {
                            BlockKind::BlockQuote
                        } else {
                            BlockKind::Paragraph
                        };
                        state.flush_block(kind);
                    } else if !state.content.is_empty() {
                        state.content.push(Inline::Break);
                    }
                }
                TagEnd::Heading(level) => {
                    state.flush_block(BlockKind::Heading {
                        level: (level as u8).clamp(1, 3),
                    });
                }
                TagEnd::BlockQuote(_) => {
                    state.quote_depth = state.quote_depth.saturating_sub(1);
                }
                TagEnd::Item => {
                    let number = match state.list_stack.last_mut() {
                        Some(ctx) if ctx.ordered => {
                            let n = ctx.next_number;
                            ctx.next_number += 1;
                            Some(n)
                        }
                        _ => None,
                    };
                    let ordered = state
                        .list_stack
                        .last()
                        .map(|ctx| ctx.ordered)
                        .unwrap_or(false);
                    // Trailing break from a loose item's last paragraph
                    if matches!(state.content.last(), Some(Inline::Break)) {
                        state.content.pop();
                    }
                    state.flush_block(BlockKind::ListItem { ordered, number });
                }
                TagEnd::List(_) => {
                    state.list_stack.pop();
                }
                TagEnd::CodeBlock => {
                    state.in_code_block = false;
                    state.flush_block(BlockKind::Paragraph);
                }
                _ => {}
            },

            Event::Text(text) => {
                if let Some(capture) = &mut state.image {
                    capture.alt.push_str(&text);
                } else if state.in_code_block {
                    state.push_text(text.trim_end_matches('\n'), InlineStyle::code());
                } else {
                    let style = state.style();
                    state.push_text(&text, style);
                }
            }

            Event::Code(code) => {
                let mut style = state.style();
                style.code = true;
                state.push_text(&code, style);
            }

            Event::SoftBreak | Event::HardBreak => {
                state.content.push(Inline::Break);
            }

            Event::Rule => {
                state.flush_pending_paragraph();
                state.doc.add_block(Block::rule(0));
            }

            Event::Html(html) | Event::InlineHtml(html) => {
                state.handle_html(&html);
            }

            _ => {}
        }
    }

    state.flush_pending_paragraph();

    // A document always holds at least one (empty) paragraph
    if state.doc.is_empty() {
        state.doc.add_block(Block::paragraph(0));
    }

    state.doc
}
