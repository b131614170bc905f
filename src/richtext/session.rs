// Editor session
// Wires the caret-relative recognizer, the typing-format tracker, the
// command executor and the auxiliary editors to raw host input events.
// One session per attached document; all ephemeral state lives here.

use super::image_editor::ImageEditor;
use super::link_editor::LinkEditSession;
use super::markdown_converter::document_to_markdown;
use super::shortcuts::{self, BreakKey};
use super::structured_document::{BlockKind, StructuredDocument};
use super::structured_editor::{EditResult, StructuredEditor};
use super::typing_state::TypingState;

/// A key delivered by the host input surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Backspace,
    Delete,
    Escape,
    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
}

/// A keydown event with its modifier state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyInput {
    pub key: Key,
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyInput {
    pub fn plain(key: Key) -> Self {
        KeyInput {
            key,
            shift: false,
            ctrl: false,
            alt: false,
        }
    }

    pub fn ch(c: char) -> Self {
        Self::plain(Key::Char(c))
    }

    pub fn ctrl(key: Key) -> Self {
        KeyInput {
            key,
            shift: false,
            ctrl: true,
            alt: false,
        }
    }

    pub fn shift(key: Key) -> Self {
        KeyInput {
            key,
            shift: true,
            ctrl: false,
            alt: false,
        }
    }
}

/// Whether the engine handled the event; `Consumed` means the host must
/// suppress its default action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Consumed,
    PassThrough,
}

/// The four inline toggles a user can apply from the executor surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineMark {
    Bold,
    Italic,
    Underline,
    Strikethrough,
}

/// One attached document plus every piece of ephemeral editing state
pub struct EditorSession {
    editor: StructuredEditor,
    typing: TypingState,
    images: ImageEditor,
    link_session: Option<LinkEditSession>,
    on_change: Option<Box<dyn FnMut(&str)>>,
}

impl EditorSession {
    pub fn new() -> Self {
        Self::with_document(StructuredDocument::new())
    }

    pub fn with_document(mut document: StructuredDocument) -> Self {
        document.materialize_first_block();
        EditorSession {
            editor: StructuredEditor::with_document(document),
            typing: TypingState::new(),
            images: ImageEditor::new(),
            link_session: None,
            on_change: None,
        }
    }

    pub fn editor(&self) -> &StructuredEditor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut StructuredEditor {
        &mut self.editor
    }

    pub fn typing_state(&self) -> &TypingState {
        &self.typing
    }

    pub fn images(&self) -> &ImageEditor {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageEditor {
        &mut self.images
    }

    /// Register the synchronous change hook; it receives the serialized
    /// document after every mutation
    pub fn set_on_change(&mut self, hook: Box<dyn FnMut(&str)>) {
        self.on_change = Some(hook);
    }

    /// The document's serialized form (the style-preserving Markdown
    /// dialect used for storage)
    pub fn serialize(&self) -> String {
        document_to_markdown(self.editor.document())
    }

    /// Atomically replace the tree and drop every piece of ephemeral state
    /// so nothing stale can reference nodes of the previous document
    pub fn attach_document(&mut self, mut document: StructuredDocument) {
        document.materialize_first_block();
        self.editor = StructuredEditor::with_document(document);
        self.typing = TypingState::new();
        self.images.clear();
        self.link_session = None;
        tracing::debug!("document attached, session state reset");
    }

    pub fn composition_start(&mut self) {
        self.typing.composition_start();
    }

    pub fn composition_end(&mut self) {
        self.typing.composition_end();
    }

    pub fn is_composing(&self) -> bool {
        self.typing.is_composing()
    }

    fn emit_change(&mut self) {
        self.images.refresh(&self.editor);
        if let Some(hook) = &mut self.on_change {
            let serialized = document_to_markdown(self.editor.document());
            hook(&serialized);
        }
    }

    /// Handle one keydown event. While a composition is in progress the
    /// tree and selection are never touched.
    pub fn handle_key(&mut self, input: &KeyInput) -> Disposition {
        if self.typing.is_composing() {
            return Disposition::PassThrough;
        }

        // A selected image captures dismissal and removal keys first
        if self.images.selection().is_some() {
            match input.key {
                Key::Escape => {
                    self.images.clear();
                    return Disposition::Consumed;
                }
                Key::Backspace | Key::Delete => {
                    self.images.delete_selected(&mut self.editor).ok();
                    self.emit_change();
                    return Disposition::Consumed;
                }
                _ => {}
            }
        }

        if input.ctrl {
            return self.handle_command_key(input);
        }

        match input.key {
            Key::Char(' ') => {
                if shortcuts::apply_block_shortcut(&mut self.editor, BreakKey::Space).is_some() {
                    // Block conversions drop any sticky typing format
                    self.typing.clear();
                    self.emit_change();
                    return Disposition::Consumed;
                }
                if let Some(conversion) = shortcuts::apply_inline_shortcut(&mut self.editor) {
                    let mut consumed = conversion.consumed;
                    if conversion.in_heading {
                        // Headings keep their bold presentation
                        consumed.bold = false;
                    }
                    self.typing.suppress(consumed);
                    self.emit_change();
                    return Disposition::Consumed;
                }
                self.insert_char(' ');
                Disposition::Consumed
            }
            Key::Char(c) => {
                self.insert_char(c);
                Disposition::Consumed
            }
            Key::Enter if input.shift => {
                self.editor.insert_break().ok();
                self.emit_change();
                Disposition::Consumed
            }
            Key::Enter => {
                if shortcuts::apply_block_shortcut(&mut self.editor, BreakKey::Enter).is_some() {
                    self.typing.clear();
                    self.emit_change();
                    return Disposition::Consumed;
                }
                self.editor.insert_newline().ok();
                // A paragraph break never carries formatting across
                self.typing.clear();
                self.emit_change();
                Disposition::Consumed
            }
            Key::Backspace => {
                self.editor.delete_backward().ok();
                self.emit_change();
                Disposition::Consumed
            }
            Key::Delete => {
                self.editor.delete_forward().ok();
                self.emit_change();
                Disposition::Consumed
            }
            Key::ArrowLeft => {
                if input.shift {
                    self.editor.move_cursor_left_extend();
                } else {
                    self.editor.move_cursor_left();
                }
                Disposition::Consumed
            }
            Key::ArrowRight => {
                if input.shift {
                    self.editor.move_cursor_right_extend();
                } else {
                    self.editor.move_cursor_right();
                }
                Disposition::Consumed
            }
            Key::ArrowUp => {
                self.editor.move_cursor_up();
                Disposition::Consumed
            }
            Key::ArrowDown => {
                self.editor.move_cursor_down();
                Disposition::Consumed
            }
            Key::Home => {
                self.editor.move_cursor_to_line_start();
                Disposition::Consumed
            }
            Key::End => {
                self.editor.move_cursor_to_line_end();
                Disposition::Consumed
            }
            Key::Escape => Disposition::PassThrough,
        }
    }

    fn handle_command_key(&mut self, input: &KeyInput) -> Disposition {
        match input.key {
            Key::Char('b') => {
                self.toggle_inline(InlineMark::Bold);
                Disposition::Consumed
            }
            Key::Char('i') => {
                self.toggle_inline(InlineMark::Italic);
                Disposition::Consumed
            }
            Key::Char('u') => {
                self.toggle_inline(InlineMark::Underline);
                Disposition::Consumed
            }
            _ => Disposition::PassThrough,
        }
    }

    fn insert_char(&mut self, c: char) {
        let inherited = self.editor.style_for_insertion();
        let style = self.typing.take_for_insertion(inherited);
        let mut buffer = [0u8; 4];
        self.editor
            .insert_text_styled(c.encode_utf8(&mut buffer), style)
            .ok();
        self.emit_change();
    }

    // Command executor surface (toolbar / menu entry points)

    /// Toggle an inline mark on the selection, or arm the typing-format
    /// state when the caret is collapsed
    pub fn toggle_inline(&mut self, mark: InlineMark) {
        if self.editor.has_selection() {
            let result = match mark {
                InlineMark::Bold => self.editor.toggle_bold(),
                InlineMark::Italic => self.editor.toggle_italic(),
                InlineMark::Underline => self.editor.toggle_underline(),
                InlineMark::Strikethrough => self.editor.toggle_strikethrough(),
            };
            result.ok();
            self.emit_change();
        } else {
            self.typing.arm(|marks| match mark {
                InlineMark::Bold => marks.bold = true,
                InlineMark::Italic => marks.italic = true,
                InlineMark::Underline => marks.underline = true,
                InlineMark::Strikethrough => marks.strikethrough = true,
            });
        }
    }

    /// Toggle inline code on the selection; a collapsed caret is a no-op
    pub fn insert_inline_code(&mut self) {
        if self.editor.has_selection() {
            self.editor.toggle_code().ok();
            self.emit_change();
        }
    }

    pub fn set_block_kind(&mut self, kind: BlockKind) -> EditResult {
        let result = self.editor.set_block_kind(kind);
        self.typing.clear();
        self.emit_change();
        result
    }

    pub fn toggle_list(&mut self, ordered: bool) -> EditResult {
        let result = self.editor.toggle_list(ordered);
        self.typing.clear();
        self.emit_change();
        result
    }

    /// Set or clear the text color on the selection. The selection
    /// collapses and the next typed character starts unstyled.
    pub fn set_text_color(&mut self, color: Option<&str>) -> EditResult {
        if !self.editor.has_selection() {
            return Ok(());
        }
        let result = self.editor.set_text_color(color);
        self.typing.request_reset();
        self.emit_change();
        result
    }

    /// Set or clear the highlight color on the selection, with the same
    /// collapse-and-reset behavior as text color
    pub fn set_highlight(&mut self, color: Option<&str>) -> EditResult {
        if !self.editor.has_selection() {
            return Ok(());
        }
        let result = self.editor.set_highlight(color);
        self.typing.request_reset();
        self.emit_change();
        result
    }

    pub fn set_font_size(&mut self, px: u8) -> EditResult {
        let result = self.editor.set_font_size(px);
        self.emit_change();
        result
    }

    pub fn grow_font_size(&mut self) -> EditResult {
        let result = self.editor.grow_font_size();
        self.emit_change();
        result
    }

    pub fn shrink_font_size(&mut self) -> EditResult {
        let result = self.editor.shrink_font_size();
        self.emit_change();
        result
    }

    pub fn insert_link(&mut self, url: &str) -> EditResult {
        let result = self.editor.insert_link(url);
        self.emit_change();
        result
    }

    pub fn insert_horizontal_rule(&mut self) -> EditResult {
        let result = self.editor.insert_horizontal_rule();
        self.typing.clear();
        self.emit_change();
        result
    }

    /// Clear all inline formatting on the selection and drop any pending
    /// sticky state
    pub fn clear_formatting(&mut self) -> EditResult {
        let result = self.editor.clear_formatting();
        self.typing.clear();
        self.emit_change();
        result
    }

    // Link edit session plumbing

    /// Open a link edit session for the run at (block, run index)
    pub fn open_link_editor(&mut self, block_index: usize, run_index: usize) -> bool {
        self.link_session = LinkEditSession::open(&self.editor, block_index, run_index);
        self.link_session.is_some()
    }

    pub fn link_session(&self) -> Option<&LinkEditSession> {
        self.link_session.as_ref()
    }

    pub fn link_session_mut(&mut self) -> Option<&mut LinkEditSession> {
        self.link_session.as_mut()
    }

    /// Commit the open link session back to its run
    pub fn commit_link_session(&mut self) -> EditResult {
        let Some(session) = self.link_session.take() else {
            return Ok(());
        };
        if !session.can_commit() {
            return Ok(());
        }
        let result = session.commit(&mut self.editor);
        self.emit_change();
        result
    }

    /// Strip the open session's link down to plain text
    pub fn unlink_session(&mut self) -> EditResult {
        let Some(session) = self.link_session.take() else {
            return Ok(());
        };
        let result = session.unlink(&mut self.editor);
        self.emit_change();
        result
    }

    pub fn discard_link_session(&mut self) {
        self.link_session = None;
    }

    /// Pointer-up after an image resize commits the final size once
    pub fn finish_image_resize(&mut self) {
        if self.images.is_resizing() {
            self.images.end_resize(&mut self.editor).ok();
            self.emit_change();
        }
    }
}

impl Default for EditorSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience: feed a string through the session as individual
/// keystrokes (tests and host glue)
pub fn type_text(session: &mut EditorSession, text: &str) {
    for c in text.chars() {
        if c == '\n' {
            session.handle_key(&KeyInput::plain(Key::Enter));
        } else {
            session.handle_key(&KeyInput::ch(c));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::richtext::structured_document::{DocumentPosition, Inline};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_typing_builds_paragraph() {
        let mut session = EditorSession::new();
        type_text(&mut session, "hello world");
        assert_eq!(session.editor().document().to_plain_text(), "hello world");
    }

    #[test]
    fn test_space_triggers_heading_conversion() {
        let mut session = EditorSession::new();
        type_text(&mut session, "##");
        let disposition = session.handle_key(&KeyInput::ch(' '));

        assert_eq!(disposition, Disposition::Consumed);
        let doc = session.editor().document();
        assert_eq!(doc.blocks()[0].kind, BlockKind::Heading { level: 2 });
        assert_eq!(doc.blocks()[0].to_plain_text(), "");
    }

    #[test]
    fn test_bold_conversion_does_not_stick() {
        let mut session = EditorSession::new();
        type_text(&mut session, "**bold**");
        session.handle_key(&KeyInput::ch(' '));
        type_text(&mut session, "x");

        let block = &session.editor().document().blocks()[0];
        assert_eq!(block.to_plain_text(), "bold x");
        match &block.content[1] {
            Inline::Text(run) => {
                assert!(!run.style.bold);
                assert_eq!(run.text, " x");
            }
            _ => panic!("expected plain tail"),
        }
    }

    #[test]
    fn test_armed_toggle_applies_to_next_char() {
        let mut session = EditorSession::new();
        type_text(&mut session, "a");
        session.toggle_inline(InlineMark::Bold);
        type_text(&mut session, "b");

        let block = &session.editor().document().blocks()[0];
        assert_eq!(block.content.len(), 2);
        match &block.content[1] {
            Inline::Text(run) => {
                assert_eq!(run.text, "b");
                assert!(run.style.bold);
            }
            _ => panic!("expected bold run"),
        }
    }

    #[test]
    fn test_enter_clears_sticky_state() {
        let mut session = EditorSession::new();
        session.toggle_inline(InlineMark::Bold);
        session.handle_key(&KeyInput::plain(Key::Enter));
        type_text(&mut session, "x");

        let block = &session.editor().document().blocks()[1];
        match &block.content[0] {
            Inline::Text(run) => assert!(!run.style.bold),
            _ => panic!("expected plain run"),
        }
    }

    #[test]
    fn test_composition_gates_everything() {
        let mut session = EditorSession::new();
        session.composition_start();
        assert_eq!(
            session.handle_key(&KeyInput::ch('x')),
            Disposition::PassThrough
        );
        assert_eq!(session.editor().document().to_plain_text(), "");

        session.composition_end();
        assert_eq!(session.handle_key(&KeyInput::ch('x')), Disposition::Consumed);
        assert_eq!(session.editor().document().to_plain_text(), "x");
    }

    #[test]
    fn test_change_hook_receives_serialized_state() {
        let seen: Rc<RefCell<Vec<String>>> = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();

        let mut session = EditorSession::new();
        session.set_on_change(Box::new(move |content| {
            sink.borrow_mut().push(content.to_string());
        }));

        type_text(&mut session, "hi");
        let log = seen.borrow();
        assert_eq!(log.len(), 2);
        assert_eq!(log.last().unwrap(), "hi");
    }

    #[test]
    fn test_attach_document_resets_ephemeral_state() {
        let mut session = EditorSession::new();
        type_text(&mut session, "old");
        session.toggle_inline(InlineMark::Bold);
        session
            .editor_mut()
            .set_selection(DocumentPosition::new(0, 0), DocumentPosition::new(0, 3));

        session.attach_document(StructuredDocument::with_paragraph("new"));

        assert_eq!(session.editor().document().to_plain_text(), "new");
        assert!(session.editor().selection().is_none());
        assert!(session.link_session().is_none());
        // The armed bold from the old document must not leak into this one
        type_text(&mut session, "!");
        match &session.editor().document().blocks()[0].content[0] {
            Inline::Text(run) => assert!(!run.style.bold),
            _ => panic!("expected plain run"),
        }
    }

    #[test]
    fn test_ctrl_b_arms_or_toggles() {
        let mut session = EditorSession::new();
        type_text(&mut session, "hello");
        session
            .editor_mut()
            .set_selection(DocumentPosition::new(0, 0), DocumentPosition::new(0, 5));
        session.handle_key(&KeyInput::ctrl(Key::Char('b')));

        match &session.editor().document().blocks()[0].content[0] {
            Inline::Text(run) => assert!(run.style.bold),
            _ => panic!("expected bold run"),
        }
    }

    #[test]
    fn test_color_command_resets_typing_format() {
        let mut session = EditorSession::new();
        type_text(&mut session, "hello");
        session
            .editor_mut()
            .set_selection(DocumentPosition::new(0, 0), DocumentPosition::new(0, 5));
        session.set_text_color(Some("#ef4444")).unwrap();

        assert!(session.editor().selection().is_none());
        type_text(&mut session, "x");

        let block = &session.editor().document().blocks()[0];
        match block.content.last().unwrap() {
            Inline::Text(run) => {
                assert_eq!(run.text, "x");
                assert!(run.style.color.is_none());
            }
            _ => panic!("expected uncolored run"),
        }
    }
}
