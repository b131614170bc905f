// Shortcut Recognizer
// Matches markdown-like trigger sequences at the caret and converts them
// into structured formatting in place. Two independent pattern classes:
// block-level triggers (whole pre-caret line equals the trigger) and
// inline triggers (delimited span ending at the caret).

use super::structured_document::{Block, BlockKind, DocumentPosition, TextRun};
use super::structured_editor::StructuredEditor;
use super::typing_state::MarkSet;
use regex::Regex;
use std::sync::LazyLock;

/// The key that completed a trigger sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKey {
    Space,
    Enter,
}

/// Outcome of a block-level conversion
#[derive(Debug, Clone, PartialEq)]
pub enum BlockConversion {
    Kind(BlockKind),
    HorizontalRule,
}

/// Outcome of an inline conversion, for the typing-format tracker
#[derive(Debug, Clone, PartialEq)]
pub struct InlineConversion {
    /// Toggles the conversion consumed (to be forced off for the next
    /// typed character)
    pub consumed: MarkSet,
    /// Whether the conversion happened inside a heading block (headings
    /// keep their bold presentation)
    pub in_heading: bool,
}

/// Match the trailing pre-caret line against the fixed block trigger table
fn block_conversion_for(line: &str, key: BreakKey) -> Option<BlockConversion> {
    let conversion = match (line, key) {
        ("#", BreakKey::Space) => BlockConversion::Kind(BlockKind::Heading { level: 1 }),
        ("##", BreakKey::Space) => BlockConversion::Kind(BlockKind::Heading { level: 2 }),
        ("###", BreakKey::Space) => BlockConversion::Kind(BlockKind::Heading { level: 3 }),
        (">", BreakKey::Space) => BlockConversion::Kind(BlockKind::BlockQuote),
        ("-" | "*", BreakKey::Space) => BlockConversion::Kind(BlockKind::ListItem {
            ordered: false,
            number: None,
        }),
        ("1.", BreakKey::Space) => BlockConversion::Kind(BlockKind::ListItem {
            ordered: true,
            number: Some(1),
        }),
        ("---" | "***", BreakKey::Enter) => BlockConversion::HorizontalRule,
        _ => return None,
    };
    Some(conversion)
}

/// Try to convert the caret's line via the block trigger table.
///
/// On a match the trigger text is deleted, the line is isolated into its
/// own block, and the block kind changes; the triggering key must be
/// suppressed by the caller. Returns the applied conversion.
pub fn apply_block_shortcut(
    editor: &mut StructuredEditor,
    key: BreakKey,
) -> Option<BlockConversion> {
    if editor.has_selection() {
        return None;
    }

    let caret = editor.cursor();
    let blocks = editor.document().blocks();
    let block = blocks.get(caret.block_index)?;
    if !block.kind.allows_content() {
        return None;
    }

    let text = block.to_plain_text();
    let before_caret = &text[..caret.offset.min(text.len())];
    let line = before_caret
        .rsplit_once('\n')
        .map(|(_, tail)| tail)
        .unwrap_or(before_caret);

    let conversion = block_conversion_for(line, key)?;
    let line_start = caret.offset - line.len();

    // Consume the trigger text, then isolate the caret's line
    {
        let block = &mut editor.document_mut().blocks_mut()[caret.block_index];
        block.delete_text_range(line_start, caret.offset);
    }
    editor.set_cursor(DocumentPosition::new(caret.block_index, line_start));
    let line_index = editor.isolate_current_line().ok()?;

    match &conversion {
        BlockConversion::Kind(kind) => {
            let block = &mut editor.document_mut().blocks_mut()[line_index];
            block.kind = kind.clone();
            editor.set_cursor(DocumentPosition::new(line_index, 0));
        }
        BlockConversion::HorizontalRule => {
            // The rule takes the line's place; whatever trailed the caret
            // moves into a fresh paragraph below it
            let doc = editor.document_mut();
            doc.insert_block(line_index, Block::rule(0));
            doc.blocks_mut()[line_index + 1].kind = BlockKind::Paragraph;
            editor.set_cursor(DocumentPosition::new(line_index + 1, 0));
        }
    }

    tracing::trace!(?conversion, "block shortcut applied");
    Some(conversion)
}

struct InlinePattern {
    regex: &'static LazyLock<Regex>,
    apply: fn(&mut super::structured_document::InlineStyle),
    consumed: MarkSet,
}

static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<all>\*\*(?P<inner>[^*]+)\*\*)$").unwrap());
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|[^*])(?P<all>\*(?P<inner>[^*]+)\*)$").unwrap());
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<all>_(?P<inner>[^_]+)_)$").unwrap());
static STRIKE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<all>~~(?P<inner>[^~]+)~~)$").unwrap());
static STRIKE_FULLWIDTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<all>～～(?P<inner>[^～]+)～～)$").unwrap());
static CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<all>`(?P<inner>[^`]+)`)$").unwrap());
static UNDERLINE_PLUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<all>\+\+(?P<inner>[^+]+)\+\+)$").unwrap());
static UNDERLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?P<all><u>(?P<inner>[^<]+)</u>)$").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<all>\[(?P<inner>[^\[\]]+)\]\((?P<url>[^()\s]+)\))$").unwrap()
});

const BOLD_CONSUMED: MarkSet = MarkSet {
    bold: true,
    italic: false,
    underline: false,
    strikethrough: false,
};
const ITALIC_CONSUMED: MarkSet = MarkSet {
    bold: false,
    italic: true,
    underline: false,
    strikethrough: false,
};
const STRIKE_CONSUMED: MarkSet = MarkSet {
    bold: false,
    italic: false,
    underline: false,
    strikethrough: true,
};
const UNDERLINE_CONSUMED: MarkSet = MarkSet {
    bold: false,
    italic: false,
    underline: true,
    strikethrough: false,
};
const NONE_CONSUMED: MarkSet = MarkSet {
    bold: false,
    italic: false,
    underline: false,
    strikethrough: false,
};

/// Fixed priority order: bold before italic prevents `**x**` from being
/// read as two italics
fn inline_patterns() -> [InlinePattern; 8] {
    [
        InlinePattern {
            regex: &BOLD,
            apply: |s| s.bold = true,
            consumed: BOLD_CONSUMED,
        },
        InlinePattern {
            regex: &ITALIC_STAR,
            apply: |s| s.italic = true,
            consumed: ITALIC_CONSUMED,
        },
        InlinePattern {
            regex: &ITALIC_UNDERSCORE,
            apply: |s| s.italic = true,
            consumed: ITALIC_CONSUMED,
        },
        InlinePattern {
            regex: &STRIKE,
            apply: |s| s.strikethrough = true,
            consumed: STRIKE_CONSUMED,
        },
        InlinePattern {
            regex: &STRIKE_FULLWIDTH,
            apply: |s| s.strikethrough = true,
            consumed: STRIKE_CONSUMED,
        },
        InlinePattern {
            regex: &CODE,
            apply: |s| s.code = true,
            consumed: NONE_CONSUMED,
        },
        InlinePattern {
            regex: &UNDERLINE_PLUS,
            apply: |s| s.underline = true,
            consumed: UNDERLINE_CONSUMED,
        },
        InlinePattern {
            regex: &UNDERLINE_TAG,
            apply: |s| s.underline = true,
            consumed: UNDERLINE_CONSUMED,
        },
    ]
}

/// Try to convert a delimited span ending at the caret into a styled run.
///
/// On a match the span (including delimiters) is replaced by one styled
/// run plus a trailing plain space, with the caret placed after the space;
/// the triggering space keystroke must be suppressed by the caller.
pub fn apply_inline_shortcut(editor: &mut StructuredEditor) -> Option<InlineConversion> {
    if editor.has_selection() {
        return None;
    }

    let caret = editor.cursor();
    let (base_style, in_heading, text_before) = {
        let blocks = editor.document().blocks();
        let block = blocks.get(caret.block_index)?;
        let (idx, local) = block.text_run_at(caret.offset)?;
        let super::structured_document::Inline::Text(run) = &block.content[idx] else {
            return None;
        };
        (
            run.style.clone(),
            block.kind.is_heading(),
            run.text[..local].to_string(),
        )
    };

    // Link pattern takes its own path because of the second capture group
    if let Some(caps) = LINK.captures(&text_before) {
        let all = caps.name("all").unwrap();
        let label = caps.name("inner").unwrap().as_str().to_string();
        let url = caps.name("url").unwrap().as_str().to_string();
        replace_trigger_span(
            editor,
            caret.offset,
            all.as_str().len(),
            &label,
            {
                let mut style = base_style.clone();
                style.link = Some(url);
                style
            },
            base_style,
        );
        tracing::trace!("inline link shortcut applied");
        return Some(InlineConversion {
            consumed: NONE_CONSUMED,
            in_heading,
        });
    }

    for pattern in inline_patterns() {
        let Some(caps) = pattern.regex.captures(&text_before) else {
            continue;
        };
        let all = caps.name("all").unwrap();
        let inner = caps.name("inner").unwrap().as_str().to_string();

        let mut styled = base_style.clone();
        (pattern.apply)(&mut styled);

        replace_trigger_span(
            editor,
            caret.offset,
            all.as_str().len(),
            &inner,
            styled,
            base_style,
        );
        tracing::trace!("inline shortcut applied");
        return Some(InlineConversion {
            consumed: pattern.consumed,
            in_heading,
        });
    }

    None
}

/// Replace [caret - span_len, caret) with a styled run holding `inner`,
/// followed by one space in the base style; the caret lands after the
/// space, never on the boundary of the styled run.
fn replace_trigger_span(
    editor: &mut StructuredEditor,
    caret_offset: usize,
    span_len: usize,
    inner: &str,
    styled: super::structured_document::InlineStyle,
    base: super::structured_document::InlineStyle,
) {
    let block_index = editor.cursor().block_index;
    let start = caret_offset - span_len;

    let block = &mut editor.document_mut().blocks_mut()[block_index];
    block.delete_text_range(start, caret_offset);
    block.insert_run(start, TextRun::new(inner, styled));
    block.insert_run(start + inner.len(), TextRun::new(" ", base));

    editor.set_cursor(DocumentPosition::new(block_index, start + inner.len() + 1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::structured_document::{Inline, InlineStyle};

    fn editor_with(text: &str) -> StructuredEditor {
        let mut editor = StructuredEditor::new();
        editor.insert_text(text).unwrap();
        editor
    }

    #[test]
    fn test_heading_trigger_consumes_text() {
        let mut editor = editor_with("##");
        let conv = apply_block_shortcut(&mut editor, BreakKey::Space).unwrap();

        assert_eq!(conv, BlockConversion::Kind(BlockKind::Heading { level: 2 }));
        let block = &editor.document().blocks()[0];
        assert_eq!(block.kind, BlockKind::Heading { level: 2 });
        assert_eq!(block.to_plain_text(), "");
        assert_eq!(editor.cursor(), DocumentPosition::new(0, 0));
    }

    #[test]
    fn test_quote_and_list_triggers() {
        let mut editor = editor_with(">");
        apply_block_shortcut(&mut editor, BreakKey::Space).unwrap();
        assert_eq!(editor.document().blocks()[0].kind, BlockKind::BlockQuote);

        let mut editor = editor_with("1.");
        apply_block_shortcut(&mut editor, BreakKey::Space).unwrap();
        assert_eq!(
            editor.document().blocks()[0].kind,
            BlockKind::ListItem {
                ordered: true,
                number: Some(1),
            }
        );
    }

    #[test]
    fn test_non_trigger_line_does_not_match() {
        let mut editor = editor_with("#hello");
        assert!(apply_block_shortcut(&mut editor, BreakKey::Space).is_none());
        // Trigger must equal the whole pre-caret line, not a prefix
        let mut editor = editor_with("a -");
        assert!(apply_block_shortcut(&mut editor, BreakKey::Space).is_none());
    }

    #[test]
    fn test_rule_trigger_on_enter() {
        let mut editor = editor_with("---");
        let conv = apply_block_shortcut(&mut editor, BreakKey::Enter).unwrap();

        assert_eq!(conv, BlockConversion::HorizontalRule);
        assert_eq!(editor.document().block_count(), 2);
        assert_eq!(editor.document().blocks()[0].kind, BlockKind::Rule);
        assert_eq!(editor.document().blocks()[1].kind, BlockKind::Paragraph);
        assert_eq!(editor.cursor(), DocumentPosition::new(1, 0));
    }

    #[test]
    fn test_list_trigger_isolates_current_line() {
        let mut editor = StructuredEditor::new();
        editor.insert_text("earlier text").unwrap();
        editor.insert_break().unwrap();
        editor.insert_text("-").unwrap();

        let conv = apply_block_shortcut(&mut editor, BreakKey::Space).unwrap();
        assert_eq!(
            conv,
            BlockConversion::Kind(BlockKind::ListItem {
                ordered: false,
                number: None,
            })
        );

        assert_eq!(editor.document().block_count(), 2);
        assert_eq!(
            editor.document().blocks()[0].to_plain_text(),
            "earlier text"
        );
        assert_eq!(editor.document().blocks()[0].kind, BlockKind::Paragraph);
        assert!(editor.document().blocks()[1].kind.is_list_item());
        assert_eq!(editor.document().blocks()[1].to_plain_text(), "");
    }

    #[test]
    fn test_bold_conversion() {
        let mut editor = editor_with("see **bold**");
        let conv = apply_inline_shortcut(&mut editor).unwrap();

        assert!(conv.consumed.bold);
        let block = &editor.document().blocks()[0];
        assert_eq!(block.to_plain_text(), "see bold ");
        assert_eq!(block.content.len(), 3);
        match (&block.content[1], &block.content[2]) {
            (Inline::Text(b), Inline::Text(space)) => {
                assert_eq!(b.text, "bold");
                assert!(b.style.bold);
                assert_eq!(space.text, " ");
                assert!(!space.style.bold);
            }
            _ => panic!("expected bold run and trailing space"),
        }
        // Caret inside the trailing space, past the styled run
        assert_eq!(editor.cursor(), DocumentPosition::new(0, 9));
    }

    #[test]
    fn test_bold_wins_over_italic() {
        let mut editor = editor_with("**x**");
        apply_inline_shortcut(&mut editor).unwrap();
        let block = &editor.document().blocks()[0];
        match &block.content[0] {
            Inline::Text(run) => {
                assert_eq!(run.text, "x");
                assert!(run.style.bold);
                assert!(!run.style.italic);
            }
            _ => panic!("expected bold run"),
        }
    }

    #[test]
    fn test_empty_delimiters_do_not_match() {
        let mut editor = editor_with("**");
        assert!(apply_inline_shortcut(&mut editor).is_none());
        let mut editor = editor_with("~~~~");
        assert!(apply_inline_shortcut(&mut editor).is_none());
    }

    #[test]
    fn test_rightmost_occurrence_wins() {
        let mut editor = editor_with("*a* and *b*");
        apply_inline_shortcut(&mut editor).unwrap();
        let block = &editor.document().blocks()[0];
        // Only the trailing occurrence converts
        assert_eq!(block.to_plain_text(), "*a* and b ");
    }

    #[test]
    fn test_underscore_and_tilde_patterns() {
        let mut editor = editor_with("_it_");
        let conv = apply_inline_shortcut(&mut editor).unwrap();
        assert!(conv.consumed.italic);

        let mut editor = editor_with("～～gone～～");
        let conv = apply_inline_shortcut(&mut editor).unwrap();
        assert!(conv.consumed.strikethrough);
        match &editor.document().blocks()[0].content[0] {
            Inline::Text(run) => assert!(run.style.strikethrough),
            _ => panic!("expected strikethrough run"),
        }
    }

    #[test]
    fn test_underline_tag_pattern() {
        let mut editor = editor_with("<u>under</u>");
        let conv = apply_inline_shortcut(&mut editor).unwrap();
        assert!(conv.consumed.underline);
        assert_eq!(editor.document().blocks()[0].to_plain_text(), "under ");
    }

    #[test]
    fn test_inline_code_consumes_no_toggle() {
        let mut editor = editor_with("`code`");
        let conv = apply_inline_shortcut(&mut editor).unwrap();
        assert!(!conv.consumed.any());
        match &editor.document().blocks()[0].content[0] {
            Inline::Text(run) => assert!(run.style.code),
            _ => panic!("expected code run"),
        }
    }

    #[test]
    fn test_link_conversion() {
        let mut editor = editor_with("go [here](https://example.com)");
        let conv = apply_inline_shortcut(&mut editor).unwrap();
        assert!(!conv.consumed.any());

        let block = &editor.document().blocks()[0];
        assert_eq!(block.to_plain_text(), "go here ");
        match &block.content[1] {
            Inline::Text(run) => {
                assert_eq!(run.text, "here");
                assert_eq!(run.style.link.as_deref(), Some("https://example.com"));
            }
            _ => panic!("expected link run"),
        }
    }

    #[test]
    fn test_heading_reports_context() {
        let mut editor = StructuredEditor::new();
        editor.insert_text("x **b**").unwrap();
        editor
            .set_block_kind(BlockKind::Heading { level: 1 })
            .unwrap();
        let conv = apply_inline_shortcut(&mut editor).unwrap();
        assert!(conv.in_heading);
    }

    #[test]
    fn test_selection_blocks_all_shortcuts() {
        let mut editor = editor_with("**x**");
        editor.set_selection(DocumentPosition::new(0, 0), DocumentPosition::new(0, 2));
        assert!(apply_inline_shortcut(&mut editor).is_none());
        assert!(apply_block_shortcut(&mut editor, BreakKey::Space).is_none());
    }

    #[test]
    fn test_inline_style_builds_on_existing() {
        let mut editor = StructuredEditor::new();
        editor
            .insert_text_styled("ctx **b**", InlineStyle::italic())
            .unwrap();
        apply_inline_shortcut(&mut editor).unwrap();
        match &editor.document().blocks()[0].content[1] {
            Inline::Text(run) => {
                assert!(run.style.bold);
                assert!(run.style.italic);
            }
            _ => panic!("expected combined run"),
        }
    }
}
