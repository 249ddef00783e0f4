//! Editable source buffer with a caret/selection.
//!
//! Offsets are byte offsets into the text and are always kept on `char`
//! boundaries.

use std::ops::Range;

pub const INDENT: &str = "  ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBuffer {
    text: String,
    selection: Range<usize>,
}

impl SourceBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let end = text.len();
        Self {
            text,
            selection: end..end,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn selection(&self) -> Range<usize> {
        self.selection.clone()
    }

    /// Replaces the whole text and moves the caret to the end.
    pub fn replace(&mut self, text: impl Into<String>) {
        *self = Self::new(text);
    }

    pub fn select(&mut self, range: Range<usize>) {
        let start = self.floor_boundary(range.start);
        let end = self.floor_boundary(range.end.max(range.start));
        self.selection = start..end;
    }

    /// Tab key: inserts two spaces at the selection start and collapses the
    /// caret after them. Selected text is kept.
    pub fn insert_indent(&mut self) {
        let at = self.selection.start;
        self.text.insert_str(at, INDENT);
        let caret = at + INDENT.len();
        self.selection = caret..caret;
    }

    /// Replaces the selection with plain text and puts the caret after it.
    pub fn paste(&mut self, pasted: &str) {
        let Range { start, end } = self.selection.clone();
        self.text.replace_range(start..end, pasted);
        let caret = start + pasted.len();
        self.selection = caret..caret;
    }

    fn floor_boundary(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

impl Default for SourceBuffer {
    fn default() -> Self {
        Self::new(String::new())
    }
}
