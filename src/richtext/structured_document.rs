// Structured Document Model
// A document representation completely independent of markdown syntax
// Markdown is only used as a storage/serialization format

use std::cmp::min;
use std::fmt;

/// Unique identifier for document elements
pub type ElementId = usize;

/// Inline formatting attributes (semantic, not syntactic)
///
/// Two runs with equal attribute sets are indistinguishable, which is what
/// allows adjacent runs to be merged (see `Block::normalize_runs`).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub code: bool,
    /// Text color as a CSS hex string, e.g. "#ef4444"
    pub color: Option<String>,
    /// Background (highlight) color as a CSS hex string
    pub highlight: Option<String>,
    /// Explicit font size in pixels
    pub font_size: Option<u8>,
    /// Link destination; a run with a destination is a link run
    pub link: Option<String>,
}

impl InlineStyle {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn bold() -> Self {
        InlineStyle {
            bold: true,
            ..Default::default()
        }
    }

    pub fn italic() -> Self {
        InlineStyle {
            italic: true,
            ..Default::default()
        }
    }

    pub fn code() -> Self {
        InlineStyle {
            code: true,
            ..Default::default()
        }
    }

    pub fn link(destination: impl Into<String>) -> Self {
        InlineStyle {
            link: Some(destination.into()),
            ..Default::default()
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == Self::default()
    }

    /// True if any attribute has no Markdown inline syntax and therefore
    /// needs a styled wrapper tag when serializing.
    pub fn needs_style_wrapper(&self) -> bool {
        self.underline
            || self.color.is_some()
            || self.highlight.is_some()
            || self.font_size.is_some()
    }
}

/// A run of styled text (a contiguous piece of text with uniform styling)
#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub style: InlineStyle,
}

impl TextRun {
    pub fn new(text: impl Into<String>, style: InlineStyle) -> Self {
        TextRun {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, InlineStyle::plain())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Split this text run at the given byte offset
    /// Returns (left_run, right_run)
    pub fn split_at(&self, offset: usize) -> (TextRun, TextRun) {
        let (left, right) = self.text.split_at(offset);
        (
            TextRun::new(left, self.style.clone()),
            TextRun::new(right, self.style.clone()),
        )
    }
}

/// An inline image with an optional explicit size overriding the intrinsic one
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRun {
    pub src: String,
    pub alt: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl ImageRun {
    pub fn new(src: impl Into<String>, alt: impl Into<String>) -> Self {
        ImageRun {
            src: src.into(),
            alt: alt.into(),
            width: None,
            height: None,
        }
    }
}

/// Inline content (can appear within a block)
#[derive(Debug, Clone, PartialEq)]
pub enum Inline {
    Text(TextRun),
    Image(ImageRun),
    /// Explicit line-break marker inside a soft-wrapped block
    Break,
}

impl Inline {
    /// Get the plain text length of this inline content
    pub fn text_len(&self) -> usize {
        match self {
            Inline::Text(run) => run.len(),
            // Single placeholder character each
            Inline::Image(_) => 1,
            Inline::Break => 1,
        }
    }

    /// Flatten to plain text
    pub fn to_plain_text(&self) -> String {
        match self {
            Inline::Text(run) => run.text.clone(),
            Inline::Image(_) => " ".to_string(),
            Inline::Break => "\n".to_string(),
        }
    }
}

/// Block-level content types
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph,
    Heading {
        level: u8,
    }, // 1-3
    BlockQuote,
    ListItem {
        ordered: bool,
        number: Option<u64>,
    },
    /// Horizontal rule; carries no inline content
    Rule,
}

impl BlockKind {
    pub fn is_heading(&self) -> bool {
        matches!(self, BlockKind::Heading { .. })
    }

    pub fn is_list_item(&self) -> bool {
        matches!(self, BlockKind::ListItem { .. })
    }

    /// Rules hold no inline content
    pub fn allows_content(&self) -> bool {
        !matches!(self, BlockKind::Rule)
    }
}

/// A block of content
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: ElementId,
    pub kind: BlockKind,
    pub content: Vec<Inline>,
}

impl Block {
    pub fn new(id: ElementId, kind: BlockKind) -> Self {
        Block {
            id,
            kind,
            content: Vec::new(),
        }
    }

    pub fn paragraph(id: ElementId) -> Self {
        Self::new(id, BlockKind::Paragraph)
    }

    pub fn heading(id: ElementId, level: u8) -> Self {
        Self::new(
            id,
            BlockKind::Heading {
                level: level.clamp(1, 3),
            },
        )
    }

    pub fn rule(id: ElementId) -> Self {
        Self::new(id, BlockKind::Rule)
    }

    pub fn with_text(mut self, text: impl Into<String>, style: InlineStyle) -> Self {
        self.content.push(Inline::Text(TextRun::new(text, style)));
        self
    }

    pub fn with_plain_text(self, text: impl Into<String>) -> Self {
        self.with_text(text, InlineStyle::plain())
    }

    /// Get the total text length of this block
    pub fn text_len(&self) -> usize {
        self.content.iter().map(|c| c.text_len()).sum()
    }

    /// Get plain text content; line-break markers become '\n'
    pub fn to_plain_text(&self) -> String {
        self.content.iter().map(|c| c.to_plain_text()).collect()
    }

    /// Check if this block is empty (no content, or whitespace-only text).
    /// An empty block stands for a single placeholder line break.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
            || self.content.iter().all(|c| match c {
                Inline::Text(run) => run.text.trim().is_empty(),
                _ => false,
            })
    }

    /// Re-establish the run-merge invariant: no two adjacent text runs with
    /// an identical attribute set, no empty text runs. Every mutation ends
    /// with a call to this.
    pub fn normalize_runs(&mut self) {
        let mut normalized: Vec<Inline> = Vec::with_capacity(self.content.len());
        for item in self.content.drain(..) {
            match item {
                Inline::Text(run) if run.is_empty() => {}
                Inline::Text(run) => {
                    if let Some(Inline::Text(prev)) = normalized.last_mut() {
                        if prev.style == run.style {
                            prev.text.push_str(&run.text);
                            continue;
                        }
                    }
                    normalized.push(Inline::Text(run));
                }
                other => normalized.push(other),
            }
        }
        self.content = normalized;
    }

    /// Find the inline item containing the given flattened offset.
    /// Returns (item index, offset within item). A caret at the end of a
    /// run resolves to that run so backward deletion keeps working.
    pub fn find_content_at_offset(&self, offset: usize) -> (usize, usize) {
        let mut pos = 0usize;
        for (idx, item) in self.content.iter().enumerate() {
            let len = item.text_len();
            if pos + len >= offset {
                return (idx, offset - pos);
            }
            pos += len;
        }
        (self.content.len(), 0)
    }

    /// The text run the caret sits in, if any.
    /// Returns (item index, byte offset within the run's text).
    pub fn text_run_at(&self, offset: usize) -> Option<(usize, usize)> {
        let (idx, local) = self.find_content_at_offset(offset);
        match self.content.get(idx) {
            Some(Inline::Text(_)) => Some((idx, local)),
            _ => None,
        }
    }

    /// Delete text in [start..end) within this block's flattened content
    pub fn delete_text_range(&mut self, start: usize, end: usize) {
        let len = self.text_len();
        let start = min(start, len);
        let end = min(end, len);
        if start >= end {
            return;
        }

        let mut new_content: Vec<Inline> = Vec::new();
        let mut pos = 0usize;

        for item in self.content.drain(..) {
            let item_len = item.text_len();
            let item_start = pos;
            let item_end = pos + item_len;
            pos = item_end;

            if item_end <= start || item_start >= end {
                new_content.push(item);
                continue;
            }

            match item {
                Inline::Text(run) => {
                    let local_start = start.saturating_sub(item_start);
                    let local_end = min(item_len, end - item_start);
                    let mut text = run.text;
                    text.drain(local_start..local_end);
                    if !text.is_empty() {
                        new_content.push(Inline::Text(TextRun::new(text, run.style)));
                    }
                }
                // Single-character items overlapping the range are dropped
                Inline::Image(_) | Inline::Break => {}
            }
        }

        self.content = new_content;
        self.normalize_runs();
    }

    /// Split this block's content at a flattened text offset, returning the
    /// right part. The left part remains in self.
    pub fn split_content_at(&mut self, offset: usize) -> Vec<Inline> {
        let offset = min(offset, self.text_len());
        let mut left: Vec<Inline> = Vec::new();
        let mut right: Vec<Inline> = Vec::new();
        let mut pos = 0usize;

        for item in self.content.drain(..) {
            let len = item.text_len();
            if pos + len <= offset {
                pos += len;
                left.push(item);
                continue;
            }
            if pos >= offset {
                right.push(item);
                pos += len;
                continue;
            }
            // Offset falls inside this item; only text runs are splittable
            match item {
                Inline::Text(run) => {
                    let (l, r) = run.split_at(offset - pos);
                    if !l.is_empty() {
                        left.push(Inline::Text(l));
                    }
                    if !r.is_empty() {
                        right.push(Inline::Text(r));
                    }
                }
                other => right.push(other),
            }
            pos += len;
        }

        self.content = left;
        self.normalize_runs();
        right
    }

    /// Insert a styled run at a flattened text offset
    pub fn insert_run(&mut self, offset: usize, run: TextRun) {
        let right = self.split_content_at(offset);
        if !run.is_empty() {
            self.content.push(Inline::Text(run));
        }
        self.content.extend(right);
        self.normalize_runs();
    }

    /// Insert any inline item at a flattened text offset
    pub fn insert_inline(&mut self, offset: usize, inline: Inline) {
        let right = self.split_content_at(offset);
        self.content.push(inline);
        self.content.extend(right);
        self.normalize_runs();
    }

    /// Insert plain text at a flattened text offset
    pub fn insert_plain_text(&mut self, offset: usize, text: &str) {
        self.insert_run(offset, TextRun::plain(text));
    }

    /// Byte offset where the caret's line begins: right after the last
    /// explicit line-break marker before the caret, or 0.
    pub fn line_start_before(&self, caret: usize) -> usize {
        let mut pos = 0usize;
        let mut line_start = 0usize;
        for item in &self.content {
            let len = item.text_len();
            if pos >= caret {
                break;
            }
            if matches!(item, Inline::Break) && pos + len <= caret {
                line_start = pos + len;
            }
            pos += len;
        }
        line_start
    }
}

/// Position within a document
/// This represents a logical cursor position in the structured content
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentPosition {
    pub block_index: usize,
    pub offset: usize, // Byte offset within the block's flattened text
}

impl DocumentPosition {
    pub fn new(block_index: usize, offset: usize) -> Self {
        DocumentPosition {
            block_index,
            offset,
        }
    }

    pub fn start() -> Self {
        DocumentPosition::new(0, 0)
    }
}

/// The structured document
pub struct StructuredDocument {
    blocks: Vec<Block>,
    next_id: ElementId,
}

impl StructuredDocument {
    pub fn new() -> Self {
        StructuredDocument {
            blocks: Vec::new(),
            next_id: 1,
        }
    }

    /// Get a unique element ID
    pub(crate) fn next_id(&mut self) -> ElementId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn blocks_mut(&mut self) -> &mut Vec<Block> {
        &mut self.blocks
    }

    /// Add a block
    pub fn add_block(&mut self, mut block: Block) {
        if block.id == 0 {
            block.id = self.next_id();
        }
        self.blocks.push(block);
    }

    /// Insert a block at a specific position
    pub fn insert_block(&mut self, index: usize, mut block: Block) {
        if block.id == 0 {
            block.id = self.next_id();
        }
        self.blocks.insert(index, block);
    }

    /// Remove a block
    pub fn remove_block(&mut self, index: usize) -> Option<Block> {
        if index < self.blocks.len() {
            Some(self.blocks.remove(index))
        } else {
            None
        }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Validate and clamp a position to document bounds
    pub fn clamp_position(&self, pos: DocumentPosition) -> DocumentPosition {
        if self.blocks.is_empty() {
            return DocumentPosition::start();
        }

        let block_index = pos.block_index.min(self.blocks.len() - 1);
        let block = &self.blocks[block_index];
        let offset = pos.offset.min(block.text_len());

        DocumentPosition::new(block_index, offset)
    }

    /// Convert to plain text
    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| b.to_plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Create a document with one paragraph
    pub fn with_paragraph(text: impl Into<String>) -> Self {
        let mut doc = Self::new();
        let id = doc.next_id();
        let block = Block::paragraph(id).with_plain_text(text);
        doc.add_block(block);
        doc
    }

    /// A caret must always resolve to a concrete block: if the document is
    /// empty, materialize a paragraph to host it.
    pub fn materialize_first_block(&mut self) {
        if self.blocks.is_empty() {
            let id = self.next_id();
            self.blocks.push(Block::paragraph(id));
        }
    }

    /// Delete content in [start..end) across blocks.
    /// If the range spans multiple blocks, merges the tail of the end block
    /// into the start block and removes all fully-covered blocks in between.
    pub fn delete_range(&mut self, start: DocumentPosition, end: DocumentPosition) {
        if self.blocks.is_empty() {
            return;
        }
        let mut a = self.clamp_position(start);
        let mut b = self.clamp_position(end);
        if (b.block_index < a.block_index)
            || (b.block_index == a.block_index && b.offset < a.offset)
        {
            std::mem::swap(&mut a, &mut b);
        }

        if a.block_index == b.block_index {
            let block = &mut self.blocks[a.block_index];
            block.delete_text_range(a.offset, b.offset);
            return;
        }

        // Delete tail of start block
        {
            let block = &mut self.blocks[a.block_index];
            let len = block.text_len();
            block.delete_text_range(a.offset, len);
        }

        // Capture the kept tail of the end block
        let tail_content: Vec<Inline> = {
            let block = &mut self.blocks[b.block_index];
            block.split_content_at(b.offset)
        };

        // Remove all blocks after the start block up to and including the
        // (now headless) end block
        let remove_start = a.block_index + 1;
        let remove_count = b.block_index - a.block_index;
        for _ in 0..remove_count {
            if remove_start < self.blocks.len() {
                self.blocks.remove(remove_start);
            }
        }

        let start_block = &mut self.blocks[a.block_index];
        start_block.content.extend(tail_content);
        start_block.normalize_runs();
    }
}

impl Default for StructuredDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for StructuredDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "StructuredDocument ({} blocks):", self.blocks.len())?;
        for (i, block) in self.blocks.iter().enumerate() {
            write!(f, "  [{}] ", i)?;
            match &block.kind {
                BlockKind::Paragraph => write!(f, "Paragraph")?,
                BlockKind::Heading { level } => write!(f, "Heading(h{})", level)?,
                BlockKind::BlockQuote => write!(f, "BlockQuote")?,
                BlockKind::ListItem { ordered, number } => write!(
                    f,
                    "ListItem({}{})",
                    if *ordered { "ordered" } else { "unordered" },
                    if let Some(n) = number {
                        format!(", #{}", n)
                    } else {
                        String::new()
                    }
                )?,
                BlockKind::Rule => write!(f, "Rule")?,
            }
            writeln!(f, ": {:?}", block.to_plain_text())?;
        }
        Ok(())
    }
}
