// Link edit session
// An ephemeral (text, href) buffer bound to one link run; committed back
// to the run or discarded. UI-free equivalent of a link editor popover.

use super::image_editor::Rect;
use super::structured_document::Inline;
use super::structured_editor::{EditResult, StructuredEditor};

/// Editing state for a single link run
#[derive(Debug, Clone, PartialEq)]
pub struct LinkEditSession {
    block_index: usize,
    run_index: usize,
    /// Text as shown when the session opened; commit falls back to it
    /// when the edited text is emptied
    original_text: String,
    pub text: String,
    pub href: String,
}

impl LinkEditSession {
    /// Open a session for the link run at (block, run index). Returns None
    /// if nothing there is a link run.
    pub fn open(editor: &StructuredEditor, block_index: usize, run_index: usize) -> Option<Self> {
        let block = editor.document().blocks().get(block_index)?;
        match block.content.get(run_index)? {
            Inline::Text(run) if run.style.link.is_some() => Some(LinkEditSession {
                block_index,
                run_index,
                original_text: run.text.clone(),
                text: run.text.clone(),
                href: run.style.link.clone().unwrap_or_default(),
            }),
            _ => None,
        }
    }

    pub fn block_index(&self) -> usize {
        self.block_index
    }

    pub fn run_index(&self) -> usize {
        self.run_index
    }

    /// A session commits only with a non-empty target
    pub fn can_commit(&self) -> bool {
        !self.href.trim().is_empty()
    }

    /// Write both fields back to the run. An emptied text field keeps the
    /// link's original text.
    pub fn commit(&self, editor: &mut StructuredEditor) -> EditResult {
        let text = if self.text.trim().is_empty() {
            &self.original_text
        } else {
            &self.text
        };
        editor.edit_link_at(self.block_index, self.run_index, self.href.trim(), text)
    }

    /// Strip the link down to plain text, preserving its current text
    pub fn unlink(&self, editor: &mut StructuredEditor) -> EditResult {
        editor.remove_link_at(self.block_index, self.run_index)
    }
}

/// Place a popover of the given size near its anchor, clamped so it stays
/// inside the viewport. Preferred position is just below the anchor,
/// flipping above it when there is no room.
pub fn popover_position(anchor: Rect, size: (i32, i32), viewport: Rect) -> (i32, i32) {
    let (w, h) = size;
    let mut x = anchor.x;
    let mut y = anchor.y + anchor.h;

    if y + h > viewport.y + viewport.h {
        y = anchor.y - h;
    }

    x = x
        .min(viewport.x + viewport.w - w)
        .max(viewport.x);
    y = y
        .min(viewport.y + viewport.h - h)
        .max(viewport.y);

    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor_with_link() -> StructuredEditor {
        let mut editor = StructuredEditor::new();
        editor.insert_text("see ").unwrap();
        editor
            .insert_link_with_text("https://example.com", "example")
            .unwrap();
        editor
    }

    #[test]
    fn test_open_requires_link_run() {
        let editor = editor_with_link();
        assert!(LinkEditSession::open(&editor, 0, 0).is_none());
        let session = LinkEditSession::open(&editor, 0, 1).unwrap();
        assert_eq!(session.text, "example");
        assert_eq!(session.href, "https://example.com");
    }

    #[test]
    fn test_commit_writes_both_fields() {
        let mut editor = editor_with_link();
        let mut session = LinkEditSession::open(&editor, 0, 1).unwrap();
        session.text = "sample".into();
        session.href = "https://example.org".into();
        assert!(session.can_commit());
        session.commit(&mut editor).unwrap();

        match &editor.document().blocks()[0].content[1] {
            Inline::Text(run) => {
                assert_eq!(run.text, "sample");
                assert_eq!(run.style.link.as_deref(), Some("https://example.org"));
            }
            _ => panic!("expected link run"),
        }
    }

    #[test]
    fn test_empty_text_keeps_original() {
        let mut editor = editor_with_link();
        let mut session = LinkEditSession::open(&editor, 0, 1).unwrap();
        session.text = "  ".into();
        session.commit(&mut editor).unwrap();

        match &editor.document().blocks()[0].content[1] {
            Inline::Text(run) => assert_eq!(run.text, "example"),
            _ => panic!("expected link run"),
        }
    }

    #[test]
    fn test_empty_target_cannot_commit() {
        let editor = editor_with_link();
        let mut session = LinkEditSession::open(&editor, 0, 1).unwrap();
        session.href = " ".into();
        assert!(!session.can_commit());
    }

    #[test]
    fn test_unlink_preserves_text() {
        let mut editor = editor_with_link();
        let session = LinkEditSession::open(&editor, 0, 1).unwrap();
        session.unlink(&mut editor).unwrap();

        let block = &editor.document().blocks()[0];
        assert_eq!(block.content.len(), 1);
        assert_eq!(block.to_plain_text(), "see example");
    }

    #[test]
    fn test_popover_stays_in_viewport() {
        let viewport = Rect::new(0, 0, 800, 600);

        // Plenty of room below: opens under the anchor
        let (x, y) = popover_position(Rect::new(100, 100, 80, 20), (200, 120), viewport);
        assert_eq!((x, y), (100, 120));

        // Anchor near the bottom edge: flips above
        let (x, y) = popover_position(Rect::new(100, 560, 80, 20), (200, 120), viewport);
        assert_eq!((x, y), (100, 440));

        // Anchor near the right edge: clamped inside
        let (x, _) = popover_position(Rect::new(750, 100, 40, 20), (200, 120), viewport);
        assert_eq!(x, 600);
    }
}
