//! Source spans.
//!
//! A [`Span`] is a half-open byte range `[start, end)` into the original
//! template source. Line and column numbers are derived on demand so that the
//! AST only ever stores offsets.

use std::fmt;
use std::ops::Range;

/// A byte range into the template source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Offset of the first byte.
    pub start: usize,
    /// Offset one past the last byte.
    pub end: usize,
}

impl Span {
    /// Creates a span from start and end offsets.
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Creates a span from a start offset and a length in bytes.
    pub const fn with_len(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    /// Length in bytes.
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// Returns `true` if the span covers no bytes.
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The smallest span covering both `self` and `other`.
    #[must_use]
    pub fn join(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Shifts the span right by `offset` bytes.
    #[must_use]
    pub const fn offset(self, offset: usize) -> Self {
        Self {
            start: self.start + offset,
            end: self.end + offset,
        }
    }

    /// Returns the text the span covers, or `None` if it is out of bounds or
    /// does not fall on character boundaries.
    pub fn slice(self, source: &str) -> Option<&str> {
        source.get(self.start..self.end)
    }

    /// Returns the 1-based `(line, column)` of the span's start.
    ///
    /// Columns count characters, not bytes, so multi-byte UTF-8 text before
    /// the span advances the column by one per character.
    ///
    /// # Examples
    ///
    /// ```
    /// use rusty_templates_core::span::Span;
    ///
    /// let source = "{% load a %}\n{{ é.b }}";
    /// assert_eq!(Span::new(16, 17).line_col(source), (2, 4));
    /// assert_eq!(Span::new(19, 20).line_col(source), (2, 6));
    /// ```
    pub fn line_col(self, source: &str) -> (usize, usize) {
        let end = self.start.min(source.len());
        let before = source.get(..end).unwrap_or(source);
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

impl From<Span> for Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

impl From<(usize, usize)> for Span {
    /// Converts a `(start, len)` pair.
    fn from((start, len): (usize, usize)) -> Self {
        Self::with_len(start, len)
    }
}
