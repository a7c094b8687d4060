use serde::Serialize;
use std::fmt;

/// A point in the source: 1-based line and character column, plus the byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
    pub offset: usize,
}

impl Position {
    pub fn new(line: u32, column: u32, offset: usize) -> Self {
        Self { line, column, offset }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Half-open byte range `[start, end)` of a token in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

impl Span {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    pub fn single(pos: Position) -> Self {
        Self { start: pos, end: pos }
    }

    /// Source text covered by this span. Returns an empty slice if the span does not
    /// fall on character boundaries of `source`.
    pub fn slice<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.start.offset..self.end.offset).unwrap_or("")
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start.line == self.end.line {
            write!(f, "{}:{}-{}", self.start.line, self.start.column, self.end.column)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_display() {
        let span1 = Span::new(Position::new(1, 5, 4), Position::new(1, 10, 9));
        assert_eq!(span1.to_string(), "1:5-10");

        let span2 = Span::new(Position::new(1, 5, 4), Position::new(3, 2, 20));
        assert_eq!(span2.to_string(), "1:5-3:2");
    }

    #[test]
    fn test_span_slice_handles_multibyte() {
        let text = "' héllo\nx";
        let span = Span::new(Position::new(1, 3, 2), Position::new(1, 8, 8));
        assert_eq!(span.slice(text), "héllo");
        let bad = Span::new(Position::new(1, 4, 4), Position::new(1, 5, 5));
        assert_eq!(bad.slice(text), "");
    }
}
