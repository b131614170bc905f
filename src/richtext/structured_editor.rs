// Structured Editor
// Provides editing operations on a StructuredDocument
// Completely independent of markdown syntax

use super::structured_document::*;
use unicode_segmentation::UnicodeSegmentation;

/// Default font size in pixels when no explicit size is set
pub const DEFAULT_FONT_SIZE: u8 = 16;
/// Font size step for grow/shrink commands
pub const FONT_SIZE_STEP: u8 = 4;
/// Inclusive font size bounds
pub const MIN_FONT_SIZE: u8 = 10;
pub const MAX_FONT_SIZE: u8 = 72;

/// Result of an editing operation
pub type EditResult = Result<(), EditError>;

/// Errors that can occur during editing
#[derive(Debug, Clone, PartialEq)]
pub enum EditError {
    InvalidPosition,
    InvalidBlockIndex,
    EmptyDocument,
}

/// The structured editor with cursor state
pub struct StructuredEditor {
    document: StructuredDocument,
    cursor: DocumentPosition,
    selection: Option<(DocumentPosition, DocumentPosition)>, // (start, end)
}

impl StructuredEditor {
    /// Create a new editor with an empty document
    pub fn new() -> Self {
        StructuredEditor {
            document: StructuredDocument::new(),
            cursor: DocumentPosition::start(),
            selection: None,
        }
    }

    /// Create an editor with an existing document
    pub fn with_document(document: StructuredDocument) -> Self {
        StructuredEditor {
            document,
            cursor: DocumentPosition::start(),
            selection: None,
        }
    }

    pub fn document(&self) -> &StructuredDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut StructuredDocument {
        &mut self.document
    }

    pub fn cursor(&self) -> DocumentPosition {
        self.cursor
    }

    /// Set cursor position (will be clamped to valid range)
    pub fn set_cursor(&mut self, pos: DocumentPosition) {
        self.cursor = self.document.clamp_position(pos);
        self.selection = None;
    }

    pub fn selection(&self) -> Option<(DocumentPosition, DocumentPosition)> {
        self.selection
    }

    pub fn has_selection(&self) -> bool {
        self.selection.is_some()
    }

    pub fn set_selection(&mut self, start: DocumentPosition, end: DocumentPosition) {
        let start = self.document.clamp_position(start);
        let end = self.document.clamp_position(end);
        self.selection = Some((start, end));
        self.cursor = end;
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Selection in document order, if any
    fn ordered_selection(&self) -> Option<(DocumentPosition, DocumentPosition)> {
        let (a, b) = self.selection?;
        if b.block_index < a.block_index || (b.block_index == a.block_index && b.offset < a.offset)
        {
            Some((b, a))
        } else {
            Some((a, b))
        }
    }

    /// Collapse the selection to its end, leaving the caret just after the
    /// formerly selected span
    pub fn collapse_selection_to_end(&mut self) {
        if let Some((_, end)) = self.ordered_selection() {
            self.cursor = end;
            self.selection = None;
        }
    }

    pub fn select_all(&mut self) {
        if self.document.block_count() == 0 {
            self.selection = None;
            return;
        }
        let start = DocumentPosition::new(0, 0);
        let last_idx = self.document.block_count() - 1;
        let end = DocumentPosition::new(last_idx, self.document.blocks()[last_idx].text_len());
        self.selection = Some((start, end));
        self.cursor = end;
    }

    /// Start or extend selection from current cursor position to a new position
    pub fn extend_selection_to(&mut self, end: DocumentPosition) {
        let end = self.document.clamp_position(end);
        if let Some((start, _)) = self.selection {
            self.selection = Some((start, end));
        } else {
            self.selection = Some((self.cursor, end));
        }
        self.cursor = end;
    }

    /// The inline style newly typed characters would inherit at the caret.
    /// Typing at the edge of a link run stays outside the link.
    pub fn style_for_insertion(&self) -> InlineStyle {
        let blocks = self.document.blocks();
        if self.cursor.block_index >= blocks.len() {
            return InlineStyle::plain();
        }
        let block = &blocks[self.cursor.block_index];
        let Some((idx, local)) = block.text_run_at(self.cursor.offset) else {
            return InlineStyle::plain();
        };
        let Some(Inline::Text(run)) = block.content.get(idx) else {
            return InlineStyle::plain();
        };
        let mut style = run.style.clone();
        if local == 0 || local == run.len() {
            style.link = None;
        }
        style
    }

    /// Insert text at the cursor, inheriting the style at the caret
    pub fn insert_text(&mut self, text: &str) -> EditResult {
        let style = self.style_for_insertion();
        self.insert_text_styled(text, style)
    }

    /// Insert text at the cursor with an explicit style
    pub fn insert_text_styled(&mut self, text: &str, style: InlineStyle) -> EditResult {
        self.document.materialize_first_block();

        if self.selection.is_some() {
            self.delete_selection()?;
        }

        let block_index = self.cursor.block_index;
        if block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }

        // A rule cannot host text; continue in a fresh paragraph below it
        if !self.document.blocks()[block_index].kind.allows_content() {
            self.document
                .insert_block(block_index + 1, Block::paragraph(0));
            self.cursor = DocumentPosition::new(block_index + 1, 0);
        }

        let pos = self.cursor;
        let block = &mut self.document.blocks_mut()[pos.block_index];
        block.insert_run(pos.offset, TextRun::new(text, style));

        self.cursor.offset = pos.offset + text.len();
        Ok(())
    }

    /// Insert an explicit line-break marker at the cursor
    pub fn insert_break(&mut self) -> EditResult {
        self.document.materialize_first_block();
        if self.selection.is_some() {
            self.delete_selection()?;
        }
        let pos = self.cursor;
        if pos.block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }
        let block = &mut self.document.blocks_mut()[pos.block_index];
        block.insert_inline(pos.offset, Inline::Break);
        self.cursor.offset = pos.offset + 1;
        Ok(())
    }

    /// Insert an image run at the cursor
    pub fn insert_image(&mut self, image: ImageRun) -> EditResult {
        self.document.materialize_first_block();
        if self.selection.is_some() {
            self.delete_selection()?;
        }
        let pos = self.cursor;
        if pos.block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }
        let block = &mut self.document.blocks_mut()[pos.block_index];
        block.insert_inline(pos.offset, Inline::Image(image));
        self.cursor.offset = pos.offset + 1;
        Ok(())
    }

    /// Insert a paragraph break at the cursor.
    ///
    /// Inside a list item this continues the list (or leaves it when the
    /// item is empty); everywhere else the new block is a plain paragraph
    /// no matter what the current block is.
    pub fn insert_newline(&mut self) -> EditResult {
        self.document.materialize_first_block();

        if self.selection.is_some() {
            self.delete_selection()?;
        }

        let block_index = self.cursor.block_index;
        if block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }

        let offset = self.cursor.offset;
        let (kind, is_empty) = {
            let block = &self.document.blocks()[block_index];
            (block.kind.clone(), block.is_empty())
        };

        if let BlockKind::ListItem { ordered, number } = &kind {
            // An empty item exits the list instead of continuing it
            if is_empty || offset == 0 {
                self.document.blocks_mut()[block_index].kind = BlockKind::Paragraph;
                self.cursor.offset = 0;
                return Ok(());
            }

            let right_content = self.document.blocks_mut()[block_index].split_content_at(offset);

            let new_number = if *ordered { number.map(|n| n + 1) } else { None };
            let mut new_item = Block::new(
                0,
                BlockKind::ListItem {
                    ordered: *ordered,
                    number: new_number,
                },
            );
            new_item.content = right_content;
            new_item.normalize_runs();

            self.document.insert_block(block_index + 1, new_item);
            self.cursor = DocumentPosition::new(block_index + 1, 0);
            return Ok(());
        }

        let right_content = self.document.blocks_mut()[block_index].split_content_at(offset);

        let mut new_para = Block::paragraph(0);
        new_para.content = right_content;
        new_para.normalize_runs();

        self.document.insert_block(block_index + 1, new_para);
        self.cursor = DocumentPosition::new(block_index + 1, 0);
        Ok(())
    }

    /// Split the current block at the caret, moving everything from the
    /// caret to block-end into a new block of the same kind. Returns the
    /// index of the new block.
    pub fn split_block_at_cursor(&mut self) -> Result<usize, EditError> {
        let block_index = self.cursor.block_index;
        if block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }
        let offset = self.cursor.offset;
        let kind = self.document.blocks()[block_index].kind.clone();
        let right = self.document.blocks_mut()[block_index].split_content_at(offset);
        let mut new_block = Block::new(0, kind);
        new_block.content = right;
        new_block.normalize_runs();
        self.document.insert_block(block_index + 1, new_block);
        Ok(block_index + 1)
    }

    /// Isolate the caret's line into its own block: content before the last
    /// explicit line break stays behind, the line itself (and everything
    /// after it) moves to a new block. Returns the index of the block now
    /// holding the line. When the line already starts the block, the block
    /// itself is the isolated line.
    pub fn isolate_current_line(&mut self) -> Result<usize, EditError> {
        let block_index = self.cursor.block_index;
        if block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }
        let line_start = self.document.blocks()[block_index].line_start_before(self.cursor.offset);
        if line_start == 0 {
            return Ok(block_index);
        }

        let caret_in_line = self.cursor.offset - line_start;
        let kind = self.document.blocks()[block_index].kind.clone();
        let right = {
            let block = &mut self.document.blocks_mut()[block_index];
            let right = block.split_content_at(line_start);
            // Drop the break marker that separated the lines
            if matches!(block.content.last(), Some(Inline::Break)) {
                block.content.pop();
            }
            right
        };

        let mut line_block = Block::new(0, kind);
        line_block.content = right;
        line_block.normalize_runs();
        self.document.insert_block(block_index + 1, line_block);
        self.cursor = DocumentPosition::new(block_index + 1, caret_in_line);
        Ok(block_index + 1)
    }

    /// Merge block `index + 1` into block `index`
    pub fn merge_block_with_next(&mut self, index: usize) -> EditResult {
        let Some(next) = self.document.remove_block(index + 1) else {
            return Err(EditError::InvalidBlockIndex);
        };
        let block = &mut self.document.blocks_mut()[index];
        block.content.extend(next.content);
        block.normalize_runs();
        Ok(())
    }

    /// Delete character before cursor (backspace)
    pub fn delete_backward(&mut self) -> EditResult {
        if self.document.is_empty() {
            return Err(EditError::EmptyDocument);
        }

        if self.selection.is_some() {
            return self.delete_selection();
        }

        let block_index = self.cursor.block_index;
        let offset = self.cursor.offset;

        if offset == 0 {
            if block_index == 0 {
                return Ok(()); // At start of document, nothing to delete
            }

            // A rule above is removed outright instead of merged into
            if self.document.blocks()[block_index - 1].kind == BlockKind::Rule {
                self.document.remove_block(block_index - 1);
                self.cursor.block_index = block_index - 1;
                return Ok(());
            }

            let prev_len = self.document.blocks()[block_index - 1].text_len();
            self.merge_block_with_next(block_index - 1)?;
            self.cursor = DocumentPosition::new(block_index - 1, prev_len);
            return Ok(());
        }

        // Delete one grapheme cluster backwards
        let prev_start = {
            let block = &self.document.blocks()[block_index];
            let text = block.to_plain_text();
            text[..offset]
                .grapheme_indices(true)
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0)
        };
        if prev_start < offset {
            let block = &mut self.document.blocks_mut()[block_index];
            block.delete_text_range(prev_start, offset);
            self.cursor.offset = prev_start;
        }
        Ok(())
    }

    /// Delete character at cursor (delete key)
    pub fn delete_forward(&mut self) -> EditResult {
        if self.document.is_empty() {
            return Err(EditError::EmptyDocument);
        }

        if self.selection.is_some() {
            return self.delete_selection();
        }

        let block_index = self.cursor.block_index;
        let offset = self.cursor.offset;
        let block_len = self.document.blocks()[block_index].text_len();

        if offset >= block_len {
            if block_index + 1 >= self.document.block_count() {
                return Ok(()); // At end of document, nothing to delete
            }
            if self.document.blocks()[block_index + 1].kind == BlockKind::Rule {
                self.document.remove_block(block_index + 1);
                return Ok(());
            }
            return self.merge_block_with_next(block_index);
        }

        let next_end = {
            let block = &self.document.blocks()[block_index];
            let text = block.to_plain_text();
            text[offset..]
                .grapheme_indices(true)
                .nth(1)
                .map(|(i, _)| offset + i)
                .unwrap_or(text.len())
        };
        if next_end > offset {
            let block = &mut self.document.blocks_mut()[block_index];
            block.delete_text_range(offset, next_end);
        }
        Ok(())
    }

    /// Delete the current selection
    pub fn delete_selection(&mut self) -> EditResult {
        let Some((start, end)) = self.ordered_selection() else {
            return Ok(());
        };
        self.document.delete_range(start, end);
        self.cursor = self.document.clamp_position(start);
        self.selection = None;
        Ok(())
    }

    // Cursor movement

    pub fn move_cursor_left(&mut self) {
        if self.cursor.offset > 0 {
            let text = self.document.blocks()[self.cursor.block_index].to_plain_text();
            self.cursor.offset = text[..self.cursor.offset]
                .grapheme_indices(true)
                .next_back()
                .map(|(i, _)| i)
                .unwrap_or(0);
        } else if self.cursor.block_index > 0 {
            self.cursor.block_index -= 1;
            self.cursor.offset = self.document.blocks()[self.cursor.block_index].text_len();
        }
        self.cursor = self.document.clamp_position(self.cursor);
        self.selection = None;
    }

    pub fn move_cursor_right(&mut self) {
        let blocks = self.document.blocks();
        if self.cursor.block_index >= blocks.len() {
            return;
        }
        let block_len = blocks[self.cursor.block_index].text_len();
        if self.cursor.offset < block_len {
            let text = blocks[self.cursor.block_index].to_plain_text();
            self.cursor.offset = text[self.cursor.offset..]
                .grapheme_indices(true)
                .nth(1)
                .map(|(i, _)| self.cursor.offset + i)
                .unwrap_or(block_len);
        } else if self.cursor.block_index < blocks.len() - 1 {
            self.cursor.block_index += 1;
            self.cursor.offset = 0;
        }
        self.cursor = self.document.clamp_position(self.cursor);
        self.selection = None;
    }

    pub fn move_cursor_up(&mut self) {
        if self.cursor.block_index > 0 {
            self.cursor.block_index -= 1;
            let len = self.document.blocks()[self.cursor.block_index].text_len();
            self.cursor.offset = self.cursor.offset.min(len);
        }
        self.selection = None;
    }

    pub fn move_cursor_down(&mut self) {
        let blocks = self.document.blocks();
        if self.cursor.block_index + 1 < blocks.len() {
            self.cursor.block_index += 1;
            let len = blocks[self.cursor.block_index].text_len();
            self.cursor.offset = self.cursor.offset.min(len);
        }
        self.selection = None;
    }

    pub fn move_cursor_to_line_start(&mut self) {
        self.cursor.offset = 0;
        self.selection = None;
    }

    pub fn move_cursor_to_line_end(&mut self) {
        let blocks = self.document.blocks();
        if self.cursor.block_index < blocks.len() {
            self.cursor.offset = blocks[self.cursor.block_index].text_len();
        }
        self.selection = None;
    }

    pub fn move_cursor_left_extend(&mut self) {
        let new_pos = if self.cursor.offset > 0 {
            DocumentPosition::new(self.cursor.block_index, self.cursor.offset - 1)
        } else if self.cursor.block_index > 0 {
            DocumentPosition::new(
                self.cursor.block_index - 1,
                self.document.blocks()[self.cursor.block_index - 1].text_len(),
            )
        } else {
            self.cursor
        };
        if new_pos != self.cursor {
            self.extend_selection_to(new_pos);
        }
    }

    pub fn move_cursor_right_extend(&mut self) {
        let blocks = self.document.blocks();
        if self.cursor.block_index >= blocks.len() {
            return;
        }
        let block_len = blocks[self.cursor.block_index].text_len();
        let new_pos = if self.cursor.offset < block_len {
            DocumentPosition::new(self.cursor.block_index, self.cursor.offset + 1)
        } else if self.cursor.block_index < blocks.len() - 1 {
            DocumentPosition::new(self.cursor.block_index + 1, 0)
        } else {
            self.cursor
        };
        if new_pos != self.cursor {
            self.extend_selection_to(new_pos);
        }
    }

    /// Extract plain text for the current selection
    pub fn selection_text(&self) -> String {
        let Some((start, end)) = self.ordered_selection() else {
            return String::new();
        };
        let blocks = self.document.blocks();
        if blocks.is_empty() {
            return String::new();
        }
        let mut result = String::new();
        for bi in start.block_index..=end.block_index.min(blocks.len() - 1) {
            let text = blocks[bi].to_plain_text();
            let from = if bi == start.block_index {
                start.offset.min(text.len())
            } else {
                0
            };
            let to = if bi == end.block_index {
                end.offset.min(text.len())
            } else {
                text.len()
            };
            if bi > start.block_index {
                result.push('\n');
            }
            if from < to {
                result.push_str(&text[from..to]);
            }
        }
        result
    }

    // Inline styling

    /// Split content into three parts: before selection, within selection,
    /// after selection
    fn split_content_for_style(
        content: &[Inline],
        start_offset: usize,
        end_offset: usize,
    ) -> (Vec<Inline>, Vec<Inline>, Vec<Inline>) {
        let mut before = Vec::new();
        let mut selected = Vec::new();
        let mut after = Vec::new();

        let mut pos = 0usize;
        for item in content {
            let item_len = item.text_len();
            let item_start = pos;
            let item_end = pos + item_len;
            pos = item_end;

            if item_end <= start_offset {
                before.push(item.clone());
            } else if item_start >= end_offset {
                after.push(item.clone());
            } else if item_start >= start_offset && item_end <= end_offset {
                selected.push(item.clone());
            } else {
                match item {
                    Inline::Text(run) => {
                        let sel_start = start_offset.saturating_sub(item_start);
                        let sel_end = end_offset.saturating_sub(item_start).min(item_len);
                        if sel_start > 0 {
                            before.push(Inline::Text(TextRun::new(
                                &run.text[..sel_start],
                                run.style.clone(),
                            )));
                        }
                        if sel_end > sel_start {
                            selected.push(Inline::Text(TextRun::new(
                                &run.text[sel_start..sel_end],
                                run.style.clone(),
                            )));
                        }
                        if sel_end < item_len {
                            after.push(Inline::Text(TextRun::new(
                                &run.text[sel_end..],
                                run.style.clone(),
                            )));
                        }
                    }
                    other => {
                        if item_start < start_offset {
                            before.push(other.clone());
                        } else {
                            selected.push(other.clone());
                        }
                    }
                }
            }
        }

        (before, selected, after)
    }

    /// Apply a style-mapping function to every text run in the selection.
    /// Blocks touched are re-normalized, so the run-merge invariant holds
    /// afterwards. No-op without a selection.
    pub fn apply_style_to_selection<F>(&mut self, mut apply: F) -> EditResult
    where
        F: FnMut(&mut InlineStyle),
    {
        let Some((start, end)) = self.ordered_selection() else {
            return Ok(());
        };
        let blocks_len = self.document.block_count();
        if start.block_index >= blocks_len || end.block_index >= blocks_len {
            return Err(EditError::InvalidBlockIndex);
        }

        for bi in start.block_index..=end.block_index {
            let (from, to) = {
                let block = &self.document.blocks()[bi];
                let len = block.text_len();
                let from = if bi == start.block_index { start.offset } else { 0 };
                let to = if bi == end.block_index { end.offset } else { len };
                (from, to)
            };

            let (before, selected, after) = {
                let block = &self.document.blocks()[bi];
                Self::split_content_for_style(&block.content, from, to)
            };
            let styled: Vec<Inline> = selected
                .into_iter()
                .map(|item| match item {
                    Inline::Text(mut run) => {
                        apply(&mut run.style);
                        Inline::Text(run)
                    }
                    other => other,
                })
                .collect();

            let block = &mut self.document.blocks_mut()[bi];
            block.content = before
                .into_iter()
                .chain(styled)
                .chain(after)
                .collect();
            block.normalize_runs();
        }

        Ok(())
    }

    /// True when every text run in the selection satisfies the predicate.
    /// An empty or missing selection yields false.
    pub fn selection_all<F>(&self, pred: F) -> bool
    where
        F: Fn(&InlineStyle) -> bool,
    {
        let Some((start, end)) = self.ordered_selection() else {
            return false;
        };
        let blocks = self.document.blocks();
        let mut seen_any = false;
        for bi in start.block_index..=end.block_index.min(blocks.len().saturating_sub(1)) {
            let block = &blocks[bi];
            let len = block.text_len();
            let from = if bi == start.block_index { start.offset } else { 0 };
            let to = if bi == end.block_index { end.offset } else { len };
            let (_, selected, _) = Self::split_content_for_style(&block.content, from, to);
            for item in selected {
                if let Inline::Text(run) = item {
                    seen_any = true;
                    if !pred(&run.style) {
                        return false;
                    }
                }
            }
        }
        seen_any
    }

    /// Toggle an inline mark on the selection: if the whole selection
    /// carries it already the mark comes off, otherwise it goes on.
    /// No-op on a collapsed selection (the caller arms the typing state
    /// instead).
    fn toggle_mark<G, S>(&mut self, get: G, set: S) -> EditResult
    where
        G: Fn(&InlineStyle) -> bool,
        S: Fn(&mut InlineStyle, bool),
    {
        if self.selection.is_none() {
            return Ok(());
        }
        let target = !self.selection_all(&get);
        self.apply_style_to_selection(|style| set(style, target))
    }

    pub fn toggle_bold(&mut self) -> EditResult {
        self.toggle_mark(|s| s.bold, |s, v| s.bold = v)
    }

    pub fn toggle_italic(&mut self) -> EditResult {
        self.toggle_mark(|s| s.italic, |s, v| s.italic = v)
    }

    pub fn toggle_underline(&mut self) -> EditResult {
        self.toggle_mark(|s| s.underline, |s, v| s.underline = v)
    }

    pub fn toggle_strikethrough(&mut self) -> EditResult {
        self.toggle_mark(|s| s.strikethrough, |s, v| s.strikethrough = v)
    }

    pub fn toggle_code(&mut self) -> EditResult {
        self.toggle_mark(|s| s.code, |s, v| s.code = v)
    }

    /// Set or clear the text color on the selection; collapses the
    /// selection afterwards. Silent no-op without a selection.
    pub fn set_text_color(&mut self, color: Option<&str>) -> EditResult {
        if self.selection.is_none() {
            return Ok(());
        }
        let color = color.map(str::to_string);
        self.apply_style_to_selection(|style| style.color = color.clone())?;
        self.collapse_selection_to_end();
        Ok(())
    }

    /// Set or clear the highlight color on the selection; collapses the
    /// selection afterwards. Silent no-op without a selection.
    pub fn set_highlight(&mut self, color: Option<&str>) -> EditResult {
        if self.selection.is_none() {
            return Ok(());
        }
        let color = color.map(str::to_string);
        self.apply_style_to_selection(|style| style.highlight = color.clone())?;
        self.collapse_selection_to_end();
        Ok(())
    }

    /// Set an explicit font size on the selection. Silent no-op without a
    /// selection.
    pub fn set_font_size(&mut self, px: u8) -> EditResult {
        if self.selection.is_none() {
            return Ok(());
        }
        let px = px.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.apply_style_to_selection(|style| style.font_size = Some(px))
    }

    /// The effective font size at a position: the explicit size of the run
    /// at the caret, else the nearest explicit size to its left within the
    /// block, else the default.
    pub fn effective_font_size(&self, pos: DocumentPosition) -> u8 {
        let blocks = self.document.blocks();
        if pos.block_index >= blocks.len() {
            return DEFAULT_FONT_SIZE;
        }
        let block = &blocks[pos.block_index];
        let (idx, _) = block.find_content_at_offset(pos.offset);
        for i in (0..=idx.min(block.content.len().saturating_sub(1))).rev() {
            if let Some(Inline::Text(run)) = block.content.get(i) {
                if let Some(px) = run.style.font_size {
                    return px;
                }
            }
        }
        DEFAULT_FONT_SIZE
    }

    pub fn grow_font_size(&mut self) -> EditResult {
        self.step_font_size(FONT_SIZE_STEP as i16)
    }

    pub fn shrink_font_size(&mut self) -> EditResult {
        self.step_font_size(-(FONT_SIZE_STEP as i16))
    }

    fn step_font_size(&mut self, delta: i16) -> EditResult {
        let Some((start, _)) = self.ordered_selection() else {
            return Ok(());
        };
        let base = self.effective_font_size(start) as i16;
        let next = (base + delta).clamp(MIN_FONT_SIZE as i16, MAX_FONT_SIZE as i16) as u8;
        self.set_font_size(next)
    }

    /// Clear all inline formatting on the selection, keeping link
    /// destinations intact (unlink is a separate operation)
    pub fn clear_formatting(&mut self) -> EditResult {
        self.apply_style_to_selection(|style| {
            let link = style.link.take();
            *style = InlineStyle::plain();
            style.link = link;
        })
    }

    // Block commands

    pub fn block_kind_at_cursor(&self) -> BlockKind {
        let blocks = self.document.blocks();
        if blocks.is_empty() || self.cursor.block_index >= blocks.len() {
            return BlockKind::Paragraph;
        }
        blocks[self.cursor.block_index].kind.clone()
    }

    /// Set the block kind for the current block (idempotent)
    pub fn set_block_kind(&mut self, kind: BlockKind) -> EditResult {
        let block_index = self.cursor.block_index;
        if block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }
        self.document.blocks_mut()[block_index].kind = kind;
        Ok(())
    }

    /// Toggle list membership of the current block
    pub fn toggle_list(&mut self, ordered: bool) -> EditResult {
        let block_index = self.cursor.block_index;
        if block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }
        let block = &mut self.document.blocks_mut()[block_index];
        block.kind = match &block.kind {
            BlockKind::ListItem { ordered: o, .. } if *o == ordered => BlockKind::Paragraph,
            _ => BlockKind::ListItem {
                ordered,
                number: if ordered { Some(1) } else { None },
            },
        };
        Ok(())
    }

    /// Insert a horizontal rule after the current block, followed by a
    /// fresh paragraph holding the caret
    pub fn insert_horizontal_rule(&mut self) -> EditResult {
        self.document.materialize_first_block();
        let block_index = self.cursor.block_index;
        if block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }
        self.document.insert_block(block_index + 1, Block::rule(0));
        self.document
            .insert_block(block_index + 2, Block::paragraph(0));
        self.cursor = DocumentPosition::new(block_index + 2, 0);
        self.selection = None;
        Ok(())
    }

    // Links

    /// Apply a link to the selection, or insert the URL as a new link run
    /// at the caret when nothing is selected
    pub fn insert_link(&mut self, url: &str) -> EditResult {
        if self.selection.is_some() {
            let url = url.to_string();
            self.apply_style_to_selection(|style| style.link = Some(url.clone()))?;
            self.collapse_selection_to_end();
            Ok(())
        } else {
            self.insert_text_styled(url, InlineStyle::link(url))
        }
    }

    /// Insert a link run with explicit text at the caret
    pub fn insert_link_with_text(&mut self, url: &str, text: &str) -> EditResult {
        self.insert_text_styled(text, InlineStyle::link(url))
    }

    /// Rewrite the text and destination of the link run at (block, run index)
    pub fn edit_link_at(
        &mut self,
        block_index: usize,
        run_index: usize,
        destination: &str,
        text: &str,
    ) -> EditResult {
        if block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }
        let block = &mut self.document.blocks_mut()[block_index];
        match block.content.get_mut(run_index) {
            Some(Inline::Text(run)) if run.style.link.is_some() => {
                run.text = text.to_string();
                run.style.link = Some(destination.to_string());
                block.normalize_runs();
                Ok(())
            }
            _ => Err(EditError::InvalidPosition),
        }
    }

    /// Strip the link run at (block, run index) down to plain text,
    /// preserving its current text
    pub fn remove_link_at(&mut self, block_index: usize, run_index: usize) -> EditResult {
        if block_index >= self.document.block_count() {
            return Err(EditError::InvalidBlockIndex);
        }
        let block = &mut self.document.blocks_mut()[block_index];
        match block.content.get_mut(run_index) {
            Some(Inline::Text(run)) if run.style.link.is_some() => {
                run.style.link = None;
                block.normalize_runs();
                Ok(())
            }
            _ => Err(EditError::InvalidPosition),
        }
    }
}

impl Default for StructuredEditor {
    fn default() -> Self {
        Self::new()
    }
}
