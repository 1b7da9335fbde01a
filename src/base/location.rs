//! Source locations attached to components and diagnostics.

use std::cmp::Ordering;

use text_size::{TextRange, TextSize};

use super::position::{Position, Span};

/// An immutable source range carrying both line/column and byte offsets.
///
/// Ordering is by byte offsets first, then by line/column, so sorting a
/// file's locations yields textual order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct SourceLocation {
    pub start: Position,
    pub end: Position,
    pub range: TextRange,
}

impl SourceLocation {
    /// Build a location from raw front-end coordinates.
    ///
    /// Total: an end offset before the start offset collapses to an empty
    /// range at the start.
    pub fn new(
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
        start_offset: u32,
        end_offset: u32,
    ) -> Self {
        let start = TextSize::from(start_offset);
        let end = TextSize::from(end_offset.max(start_offset));
        Self {
            start: Position::new(start_line, start_column),
            end: Position::new(end_line, end_column),
            range: TextRange::new(start, end),
        }
    }

    pub fn span(&self) -> Span {
        Span::new(self.start, self.end)
    }

    pub fn start_offset(&self) -> u32 {
        self.range.start().into()
    }

    pub fn end_offset(&self) -> u32 {
        self.range.end().into()
    }

    /// Whether the line/column range of `other` lies within this location.
    pub fn encloses(&self, other: &SourceLocation) -> bool {
        self.span().encloses(&other.span())
    }
}

impl Ord for SourceLocation {
    fn cmp(&self, other: &Self) -> Ordering {
        self.range
            .start()
            .cmp(&other.range.start())
            .then_with(|| self.range.end().cmp(&other.range.end()))
            .then_with(|| self.start.cmp(&other.start))
            .then_with(|| self.end.cmp(&other.end))
    }
}

impl PartialOrd for SourceLocation {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
