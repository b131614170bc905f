// Image selection and resize session
// Direct manipulation of a single image run: click to select, corner-drag
// to resize (aspect-locked), Escape/Delete to dismiss or remove.

use super::structured_document::{DocumentPosition, Inline};
use super::structured_editor::{EditResult, StructuredEditor};

/// Minimum size for either axis while resizing, in pixels
pub const MIN_IMAGE_SIZE: u32 = 50;

/// An on-screen rectangle, in host coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, w: i32, h: i32) -> Self {
        Rect { x, y, w, h }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }
}

/// The currently selected image run and its tracked overlay rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSelection {
    pub block_index: usize,
    pub inline_index: usize,
    pub rect: Rect,
}

/// Transient state for one pointer-down/move/up resize gesture
#[derive(Debug, Clone)]
struct DragState {
    start_x: i32,
    start_y: i32,
    start_w: u32,
    start_h: u32,
    aspect: f64,
}

/// Image manipulation session; at most one image is selected at a time
#[derive(Default)]
pub struct ImageEditor {
    selection: Option<ImageSelection>,
    drag: Option<DragState>,
}

impl ImageEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selection(&self) -> Option<&ImageSelection> {
        self.selection.as_ref()
    }

    pub fn is_resizing(&self) -> bool {
        self.drag.is_some()
    }

    /// Select the image run at the given tree position. Returns false if
    /// nothing there is an image.
    pub fn select(
        &mut self,
        editor: &StructuredEditor,
        block_index: usize,
        inline_index: usize,
    ) -> bool {
        let is_image = editor
            .document()
            .blocks()
            .get(block_index)
            .and_then(|b| b.content.get(inline_index))
            .is_some_and(|item| matches!(item, Inline::Image(_)));
        if is_image {
            self.selection = Some(ImageSelection {
                block_index,
                inline_index,
                rect: Rect::default(),
            });
        }
        is_image
    }

    /// Deselect (Escape or click elsewhere); an in-flight drag is discarded
    pub fn clear(&mut self) {
        self.selection = None;
        self.drag = None;
    }

    /// Track the image's on-screen rectangle (called on scroll/resize)
    pub fn set_overlay_rect(&mut self, rect: Rect) {
        if let Some(sel) = &mut self.selection {
            sel.rect = rect;
        }
    }

    /// Re-validate the selection against the tree. A detached (removed)
    /// image clears the selection instead of leaving a stale overlay.
    pub fn refresh(&mut self, editor: &StructuredEditor) {
        let Some(sel) = &self.selection else {
            return;
        };
        let still_image = editor
            .document()
            .blocks()
            .get(sel.block_index)
            .and_then(|b| b.content.get(sel.inline_index))
            .is_some_and(|item| matches!(item, Inline::Image(_)));
        if !still_image {
            self.clear();
        }
    }

    /// Begin a corner drag from the given pointer position. The start size
    /// and aspect ratio are captured once for the whole gesture.
    pub fn begin_resize(&mut self, editor: &StructuredEditor, x: i32, y: i32) -> bool {
        let Some(sel) = &self.selection else {
            return false;
        };
        let Some(Inline::Image(image)) = editor
            .document()
            .blocks()
            .get(sel.block_index)
            .and_then(|b| b.content.get(sel.inline_index))
        else {
            return false;
        };

        let start_w = image.width.unwrap_or(sel.rect.w.max(1) as u32);
        let start_h = image.height.unwrap_or(sel.rect.h.max(1) as u32);
        self.drag = Some(DragState {
            start_x: x,
            start_y: y,
            start_w,
            start_h,
            aspect: start_w.max(1) as f64 / start_h.max(1) as f64,
        });
        true
    }

    /// Update an in-flight drag. Width follows the pointer, height is
    /// derived from the captured aspect ratio, both floored at the minimum.
    /// Returns the preview size.
    pub fn update_resize(&mut self, x: i32, _y: i32) -> Option<(u32, u32)> {
        let drag = self.drag.as_ref()?;
        let delta = x - drag.start_x;
        let width = ((drag.start_w as i64 + delta as i64).max(MIN_IMAGE_SIZE as i64)) as u32;
        let height = ((width as f64 / drag.aspect).round() as u32).max(MIN_IMAGE_SIZE);

        if let Some(sel) = &mut self.selection {
            sel.rect.w = width as i32;
            sel.rect.h = height as i32;
        }
        Some((width, height))
    }

    /// Commit the final size to the image run, once, on pointer-up
    pub fn end_resize(&mut self, editor: &mut StructuredEditor) -> EditResult {
        if self.drag.take().is_none() {
            return Ok(());
        }
        let Some(sel) = &self.selection else {
            return Ok(());
        };
        let (width, height) = (sel.rect.w.max(1) as u32, sel.rect.h.max(1) as u32);
        if let Some(Inline::Image(image)) = editor
            .document_mut()
            .blocks_mut()
            .get_mut(sel.block_index)
            .and_then(|b| b.content.get_mut(sel.inline_index))
        {
            image.width = Some(width);
            image.height = Some(height);
        }
        Ok(())
    }

    /// Remove the selected image run and place the caret at the position
    /// it vacated (Delete/Backspace while selected)
    pub fn delete_selected(&mut self, editor: &mut StructuredEditor) -> EditResult {
        let Some(sel) = self.selection.take() else {
            return Ok(());
        };
        self.drag = None;

        let offset = {
            let Some(block) = editor.document().blocks().get(sel.block_index) else {
                return Ok(());
            };
            block.content[..sel.inline_index.min(block.content.len())]
                .iter()
                .map(|c| c.text_len())
                .sum::<usize>()
        };

        let block = &mut editor.document_mut().blocks_mut()[sel.block_index];
        if sel.inline_index < block.content.len() {
            block.content.remove(sel.inline_index);
            block.normalize_runs();
        }
        editor.set_cursor(DocumentPosition::new(sel.block_index, offset));
        Ok(())
    }
}
