//! Text position type.
//!
//! Coordinates are **0-indexed**. Line 0 is the first line, column 0 is the
//! first character. Columns count decoded characters (Unicode scalar values),
//! matching what [`crate::coord::offset_to_line_col`] produces and what the
//! render-width computation consumes — they are *not* byte offsets.
//!
//! Display layers (status line, goto dialog) should convert to 1-indexed for
//! the user — that conversion never belongs here.

use std::fmt;

/// A position in a text buffer: (line, column), both 0-indexed.
///
/// `col` is the character offset from the start of the line. For the line
/// `"café\n"`, column 3 is `'é'` and column 4 is past the last visible
/// character (the cursor-after-last-char position).
///
/// # Ordering
///
/// Positions are ordered lexicographically: line first, then column. This
/// means `Position { line: 0, col: 5 }` < `Position { line: 1, col: 0 }`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub col: usize,
}

impl Position {
    /// The origin — line 0, column 0.
    pub const ZERO: Self = Self { line: 0, col: 0 };

    /// Create a new position.
    #[inline]
    #[must_use]
    pub const fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    /// True when both line and col are zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.line == 0 && self.col == 0
    }
}

// Natural ordering: line first, then column.
impl Ord for Position {
    #[inline]
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.line
            .cmp(&other.line)
            .then(self.col.cmp(&other.col))
    }
}

impl PartialOrd for Position {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pos({}:{})", self.line, self.col)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // 1-indexed for human display, matching the status line.
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_zero() {
        let p = Position::ZERO;
        assert_eq!(p.line, 0);
        assert_eq!(p.col, 0);
        assert!(p.is_zero());
    }

    #[test]
    fn position_new() {
        let p = Position::new(5, 10);
        assert_eq!(p.line, 5);
        assert_eq!(p.col, 10);
        assert!(!p.is_zero());
    }

    #[test]
    fn position_ordering_same_line() {
        assert!(Position::new(1, 3) < Position::new(1, 7));
    }

    #[test]
    fn position_ordering_different_lines() {
        // A high column on an earlier line still sorts first.
        assert!(Position::new(0, 100) < Position::new(1, 0));
    }

    #[test]
    fn position_ordering_equal() {
        let a = Position::new(3, 3);
        let b = Position::new(3, 3);
        assert_eq!(a, b);
        assert!(a <= b);
        assert!(a >= b);
    }

    #[test]
    fn position_debug_format() {
        assert_eq!(format!("{:?}", Position::new(2, 5)), "Pos(2:5)");
    }

    #[test]
    fn position_display_is_1_indexed() {
        assert_eq!(format!("{}", Position::new(0, 0)), "1:1");
        assert_eq!(format!("{}", Position::new(9, 14)), "10:15");
    }

    #[test]
    fn position_hash_consistency() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(Position::new(1, 2));
        set.insert(Position::new(1, 2)); // duplicate
        set.insert(Position::new(3, 4));
        assert_eq!(set.len(), 2);
    }
}
