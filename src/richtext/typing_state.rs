// Typing-Format State Tracker
// Governs whether newly typed characters inherit active inline styles.
// One value per editor session; never global.

use super::structured_document::InlineStyle;

/// The four inline toggles that can be armed or suppressed for the next
/// typed character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MarkSet {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
}

impl MarkSet {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn any(&self) -> bool {
        self.bold || self.italic || self.underline || self.strikethrough
    }
}

/// Sticky typing-format state.
///
/// `armed` marks are applied to the next inserted character even though no
/// run at the caret carries them; `suppressed` marks are stripped from the
/// inherited style so text typed after a converted span does not continue
/// it. Both are consumed by the next insertion. `reset_pending` drops all
/// inherited decorations (color, highlight, size) once.
#[derive(Debug, Default)]
pub struct TypingState {
    armed: MarkSet,
    suppressed: MarkSet,
    reset_pending: bool,
    composing: bool,
}

impl TypingState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm a mark so the next typed character carries it (collapsed-caret
    /// toggle). Arming wins over a pending suppression of the same mark.
    pub fn arm(&mut self, set: impl FnOnce(&mut MarkSet)) {
        set(&mut self.armed);
    }

    pub fn armed(&self) -> MarkSet {
        self.armed
    }

    /// Force marks off for the next typed character (after an inline
    /// shortcut conversion)
    pub fn suppress(&mut self, marks: MarkSet) {
        self.suppressed.bold |= marks.bold;
        self.suppressed.italic |= marks.italic;
        self.suppressed.underline |= marks.underline;
        self.suppressed.strikethrough |= marks.strikethrough;
    }

    /// Request that the next typed character drops every inherited
    /// decoration (set after color/highlight commands collapse the
    /// selection)
    pub fn request_reset(&mut self) {
        self.reset_pending = true;
    }

    pub fn is_composing(&self) -> bool {
        self.composing
    }

    /// Entering composition: the tree and selection are off limits until
    /// the composition ends
    pub fn composition_start(&mut self) {
        self.composing = true;
    }

    /// Composition end unconditionally clears the sticky state so committed
    /// IME text is never judged against a stale flag
    pub fn composition_end(&mut self) {
        self.composing = false;
        self.clear();
    }

    /// Clear everything except the composition flag (paragraph break, block
    /// conversion, explicit reset commands)
    pub fn clear(&mut self) {
        self.armed = MarkSet::none();
        self.suppressed = MarkSet::none();
        self.reset_pending = false;
    }

    /// Consume the pending state, adjusting the style the next character
    /// would otherwise inherit. The flags are one-shot: after this call the
    /// state is clean.
    pub fn take_for_insertion(&mut self, inherited: InlineStyle) -> InlineStyle {
        let mut style = inherited;

        if self.reset_pending {
            let link = style.link.take();
            style = InlineStyle::plain();
            style.link = link;
        }

        if self.suppressed.bold {
            style.bold = false;
        }
        if self.suppressed.italic {
            style.italic = false;
        }
        if self.suppressed.underline {
            style.underline = false;
        }
        if self.suppressed.strikethrough {
            style.strikethrough = false;
        }

        if self.armed.bold {
            style.bold = true;
        }
        if self.armed.italic {
            style.italic = true;
        }
        if self.armed.underline {
            style.underline = true;
        }
        if self.armed.strikethrough {
            style.strikethrough = true;
        }

        self.clear();
        style
    }
}
