//! Coordinate translation — logical offsets, (line, col) pairs, and UTF-8
//! boundaries.
//!
//! The gap buffer speaks logical byte offsets; cursors, selections, and the
//! renderer speak (line, column) pairs and character steps. This module is
//! the bridge: stateless functions over a [`GapBuffer`].
//!
//! Three position representations are in play:
//!
//! | Representation | Unit | Producer |
//! |----------------|------|----------|
//! | logical offset | bytes | the gap buffer |
//! | (line, col)    | lines + decoded chars | [`offset_to_line_col`] |
//! | display column | terminal cells | [`display_col`] |
//!
//! Columns here count **decoded characters**, not bytes — column 3 of
//! `"café"` is `'é'`, and the same column the render-width computation
//! starts from. Byte offsets produced by this module always sit on a UTF-8
//! code-point boundary; malformed input degrades to single-byte steps rather
//! than erroring, so cursor movement always makes progress.

use unicode_width::UnicodeWidthChar;

use crate::gap::GapBuffer;
use crate::position::Position;

// ---------------------------------------------------------------------------
// (line, col) ↔ offset
// ---------------------------------------------------------------------------

/// Resolve a (line, character-column) pair to a logical byte offset.
///
/// Walks the text until both targets hold simultaneously; a column past the
/// end of its line therefore runs on, and an unreachable pair resolves to
/// end-of-text. The column must be a character count previously produced by
/// [`offset_to_line_col`] (or the renderer's equivalent), never a byte index.
#[must_use]
pub fn line_col_to_offset(buf: &GapBuffer, line: usize, col: usize) -> usize {
    let text = buf.text();
    let mut cur_line = 0;
    let mut cur_col = 0;
    for (idx, ch) in text.char_indices() {
        if cur_line == line && cur_col == col {
            return idx;
        }
        if ch == '\n' {
            cur_line += 1;
            cur_col = 0;
        } else {
            cur_col += 1;
        }
    }
    text.len()
}

/// Resolve a logical byte offset (clamped) to a (line, character-column)
/// position.
#[must_use]
pub fn offset_to_line_col(buf: &GapBuffer, pos: usize) -> Position {
    let text = buf.text();
    let pos = pos.min(text.len());
    let mut line = 0;
    let mut col = 0;
    for (idx, ch) in text.char_indices() {
        if idx >= pos {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    Position::new(line, col)
}

// ---------------------------------------------------------------------------
// Code-point boundaries
// ---------------------------------------------------------------------------

/// True for a UTF-8 continuation byte (`0b10xx_xxxx`).
#[inline]
const fn is_continuation(byte: u8) -> bool {
    byte & 0xC0 == 0x80
}

/// The nearest code-point boundary strictly before `pos` (clamped), or 0.
///
/// Scans back at most 3 continuation bytes — the longest UTF-8 encoding is
/// 4 bytes. If the scan still sits on a continuation byte the sequence is
/// malformed and the step degrades to a single byte.
#[must_use]
pub fn prev_char_boundary(buf: &GapBuffer, pos: usize) -> usize {
    let pos = pos.min(buf.len());
    if pos == 0 {
        return 0;
    }
    let mut p = pos - 1;
    while p > 0 && pos - p < 4 && buf.byte_at(p).is_some_and(is_continuation) {
        p -= 1;
    }
    if buf.byte_at(p).is_some_and(is_continuation) {
        pos - 1
    } else {
        p
    }
}

/// The nearest code-point boundary strictly after `pos`, or `len()` when at
/// or past the end. Same malformed-input degradation as
/// [`prev_char_boundary`].
#[must_use]
pub fn next_char_boundary(buf: &GapBuffer, pos: usize) -> usize {
    let len = buf.len();
    if pos >= len {
        return len;
    }
    let mut p = pos + 1;
    while p < len && p - pos < 4 && buf.byte_at(p).is_some_and(is_continuation) {
        p += 1;
    }
    if p - pos == 4 && buf.byte_at(p).is_some_and(is_continuation) {
        pos + 1
    } else {
        p
    }
}

/// True when `pos` sits on a code-point boundary (or at end-of-text).
#[must_use]
pub fn is_char_boundary(buf: &GapBuffer, pos: usize) -> bool {
    buf.byte_at(pos).is_none_or(|b| !is_continuation(b))
}

// ---------------------------------------------------------------------------
// Word motions
// ---------------------------------------------------------------------------

/// True for the bytes that form a word: ASCII letters, digits, underscore.
/// Everything else — whitespace, punctuation, any non-ASCII byte — separates
/// words.
#[inline]
const fn is_word_byte(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

/// Ctrl+Left — the start of the word at or before `pos`.
///
/// Skips separators backward, then the word run, landing on the word's first
/// byte (or 0). The result is always a code-point boundary: word bytes are
/// ASCII and separator runs are never split.
#[must_use]
pub fn word_left(buf: &GapBuffer, pos: usize) -> usize {
    let mut p = pos.min(buf.len());
    while p > 0 && !buf.byte_at(p - 1).is_some_and(is_word_byte) {
        p -= 1;
    }
    while p > 0 && buf.byte_at(p - 1).is_some_and(is_word_byte) {
        p -= 1;
    }
    p
}

/// Ctrl+Right — the start of the next word after `pos`.
///
/// Skips the current word run forward, then separators, landing on the next
/// word's first byte (or end-of-text).
#[must_use]
pub fn word_right(buf: &GapBuffer, pos: usize) -> usize {
    let len = buf.len();
    let mut p = pos.min(len);
    while p < len && buf.byte_at(p).is_some_and(is_word_byte) {
        p += 1;
    }
    while p < len && !buf.byte_at(p).is_some_and(is_word_byte) {
        p += 1;
    }
    p
}

// ---------------------------------------------------------------------------
// Display columns
// ---------------------------------------------------------------------------

/// Convert a character column within `line` to a display column.
///
/// Walks the characters, expanding tabs to the next tab stop and counting
/// wide characters (CJK, emoji) as two cells. This is the width computation
/// the character columns of [`line_col_to_offset`] are aligned with. Stops
/// at `char_col` or when the line runs out.
#[must_use]
pub fn display_col(line: &str, char_col: usize, tab_width: u8) -> usize {
    let tab_w = usize::from(tab_width.max(1));
    let mut display = 0;
    for (i, ch) in line.chars().enumerate() {
        if i >= char_col {
            break;
        }
        match ch {
            '\n' | '\r' => break,
            '\t' => display = (display / tab_w + 1) * tab_w,
            _ => display += ch.width().unwrap_or(0),
        }
    }
    display
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
