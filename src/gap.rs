//! Gap buffer — the fundamental unit of text storage.
//!
//! A [`GapBuffer`] stores the document as one contiguous byte array with a
//! movable empty region (the *gap*) at the current edit point. Insertions
//! write into the gap and deletions widen it, so a run of edits at one spot
//! is O(1) amortized; relocating the edit point costs O(distance moved).
//!
//! ```text
//! storage: [--text before gap--][=====GAP=====][--text after gap--]
//!           ^                    ^             ^                    ^
//!           0                gap_start      gap_end            capacity
//! ```
//!
//! Alongside the bytes the buffer maintains `line_starts`, a sorted index of
//! the logical offset of every line's first byte. Line lookups are a binary
//! search over that index rather than a scan of the text.
//!
//! # Coordinate system
//!
//! All public positions are **logical byte offsets**: indices into the text
//! as if the gap did not exist, in `[0, len()]`. The physical location of the
//! gap never leaks through the API.
//!
//! # The two-step edit protocol
//!
//! Edits always happen at the gap. Callers position the gap with
//! [`move_gap`](GapBuffer::move_gap) and then call
//! [`insert`](GapBuffer::insert). This is deliberately explicit rather than
//! hidden behind a positioned insert: the gap tracking the cursor is the
//! performance contract that makes sequential typing cheap.

use std::fmt;

use tracing::debug;

/// Capacity of a fresh buffer, and the block size growth rounds up to.
pub const INITIAL_CAPACITY: usize = 256;

/// A gap buffer with a line-start index.
///
/// Out-of-range positions passed to any method are clamped to the valid
/// range, never rejected — callers (cursor math, selection drags) do not
/// need to pre-validate. See each method for its exact clamping.
pub struct GapBuffer {
    /// The backing array. `[0, gap_start)` and `[gap_end, capacity)` hold
    /// live text; `[gap_start, gap_end)` is the gap.
    storage: Vec<u8>,
    gap_start: usize,
    gap_end: usize,
    /// Logical offset of the first byte of each line, sorted ascending.
    /// Never empty; `line_starts[0] == 0` even for an empty buffer.
    line_starts: Vec<usize>,
}

impl GapBuffer {
    // -- Construction -------------------------------------------------------

    /// Create an empty buffer with [`INITIAL_CAPACITY`] bytes of gap.
    #[must_use]
    pub fn new() -> Self {
        Self {
            storage: vec![0; INITIAL_CAPACITY],
            gap_start: 0,
            gap_end: INITIAL_CAPACITY,
            line_starts: vec![0],
        }
    }

    /// Create a buffer holding `text`, gap at the end.
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        let mut buf = Self::new();
        buf.insert(text);
        buf
    }

    // -- Size ---------------------------------------------------------------

    /// Logical length in bytes (the gap does not count).
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len() - (self.gap_end - self.gap_start)
    }

    /// True when the buffer contains no text.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Physical capacity of the backing array.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Logical offset of the gap — the current edit point.
    #[inline]
    #[must_use]
    pub const fn gap_position(&self) -> usize {
        self.gap_start
    }

    // -- Mutation -----------------------------------------------------------

    /// Insert `text` at the current gap position.
    ///
    /// Grows the backing array first if the gap is too small. Splices a
    /// `line_starts` entry for every `\n` in `text` and shifts every entry
    /// past the insertion point right by `text.len()`. Empty input is a
    /// no-op.
    ///
    /// Callers wanting to insert at an arbitrary offset call
    /// [`move_gap`](Self::move_gap) first.
    pub fn insert(&mut self, text: &str) {
        let bytes = text.as_bytes();
        if bytes.is_empty() {
            return;
        }
        if self.gap_end - self.gap_start < bytes.len() {
            self.grow(bytes.len());
        }

        let at = self.gap_start;
        let idx = self.line_starts.partition_point(|&s| s <= at);
        for s in &mut self.line_starts[idx..] {
            *s += bytes.len();
        }
        let newline_entries = bytes
            .iter()
            .enumerate()
            .filter(|&(_, &b)| b == b'\n')
            .map(|(i, _)| at + i + 1);
        self.line_starts.splice(idx..idx, newline_entries);

        self.storage[self.gap_start..self.gap_start + bytes.len()].copy_from_slice(bytes);
        self.gap_start += bytes.len();
    }

    /// Remove `count` logical bytes starting at `start`.
    ///
    /// `start` and `count` are clamped to the text; a zero count or a start
    /// at or past the end is a no-op. Moves the gap to `start` and widens it
    /// over the deleted bytes.
    ///
    /// The line index is repaired: the entry of every deleted newline is
    /// dropped and every entry past the range shifts left by the deleted
    /// count, so `line_starts` stays exact across deletions.
    pub fn delete_range(&mut self, start: usize, count: usize) {
        let len = self.len();
        let start = start.min(len);
        if count == 0 || start >= len {
            return;
        }
        let count = count.min(len - start);

        self.move_gap(start);
        // With the gap at `start`, everything at logical offset >= start sits
        // contiguously after the gap, so the full count is always available.
        let removed = count.min(self.storage.len() - self.gap_end);
        self.gap_end += removed;

        // An entry e marks a newline at byte e - 1; that newline was deleted
        // iff e is in (start, start + removed].
        let first = self.line_starts.partition_point(|&s| s <= start);
        let last = self.line_starts.partition_point(|&s| s <= start + removed);
        self.line_starts.drain(first..last);
        for s in &mut self.line_starts[first..] {
            *s -= removed;
        }
    }

    /// Widen the gap backward by up to `n` bytes, deleting the bytes just
    /// before the edit point (backspace).
    ///
    /// Does **not** touch the line index: only use this when the deleted
    /// span is known to contain no newline — and note that any entry past
    /// the gap goes stale by `n` until [`rebuild_line_index`](Self::rebuild_line_index)
    /// runs. [`delete_range`](Self::delete_range) keeps the index exact.
    pub fn delete_left(&mut self, n: usize) {
        self.gap_start -= n.min(self.gap_start);
    }

    /// Widen the gap forward by up to `n` bytes, deleting the bytes just
    /// after the edit point (forward delete).
    ///
    /// Same line-index caveat as [`delete_left`](Self::delete_left).
    pub fn delete_right(&mut self, n: usize) {
        self.gap_end += n.min(self.storage.len() - self.gap_end);
    }

    /// Relocate the gap to logical offset `pos`, clamped to `[0, len()]`.
    ///
    /// Shifts the bytes between the old and new position across the gap.
    /// No-op (and therefore idempotent) when the gap is already there.
    pub fn move_gap(&mut self, pos: usize) {
        let pos = pos.min(self.len());
        match pos.cmp(&self.gap_start) {
            std::cmp::Ordering::Equal => {}
            std::cmp::Ordering::Less => {
                let count = self.gap_start - pos;
                self.storage
                    .copy_within(pos..self.gap_start, self.gap_end - count);
                self.gap_start = pos;
                self.gap_end -= count;
            }
            std::cmp::Ordering::Greater => {
                let count = pos - self.gap_start;
                self.storage
                    .copy_within(self.gap_end..self.gap_end + count, self.gap_start);
                self.gap_start += count;
                self.gap_end += count;
            }
        }
    }

    /// Recompute `line_starts` from the text. O(n); needed only after a
    /// sequence of [`delete_left`](Self::delete_left)/[`delete_right`](Self::delete_right)
    /// calls left the index stale.
    pub fn rebuild_line_index(&mut self) {
        self.line_starts.clear();
        self.line_starts.push(0);
        for (i, &b) in self.storage[..self.gap_start].iter().enumerate() {
            if b == b'\n' {
                self.line_starts.push(i + 1);
            }
        }
        let head = self.gap_start;
        for (i, &b) in self.storage[self.gap_end..].iter().enumerate() {
            if b == b'\n' {
                self.line_starts.push(head + i + 1);
            }
        }
    }

    /// Grow the backing array so the gap can absorb `needed` more bytes.
    ///
    /// New capacity is `capacity + needed` rounded up to the next
    /// [`INITIAL_CAPACITY`] multiple. The new array is fully built before it
    /// replaces the old one, so a failed allocation aborts the insert without
    /// leaving the buffer half-moved. Post-gap bytes keep their distance from
    /// the end; the buffer never shrinks.
    fn grow(&mut self, needed: usize) {
        let old_cap = self.storage.len();
        let new_cap = (old_cap + needed).div_ceil(INITIAL_CAPACITY) * INITIAL_CAPACITY;
        let tail = old_cap - self.gap_end;

        let mut new_storage = vec![0; new_cap];
        new_storage[..self.gap_start].copy_from_slice(&self.storage[..self.gap_start]);
        new_storage[new_cap - tail..].copy_from_slice(&self.storage[self.gap_end..]);

        self.gap_end = new_cap - tail;
        self.storage = new_storage;
        debug!(old_cap, new_cap, "gap buffer grew");
    }

    // -- Byte access --------------------------------------------------------

    /// The byte at logical offset `pos`, or `None` at or past the end.
    #[inline]
    #[must_use]
    pub fn byte_at(&self, pos: usize) -> Option<u8> {
        (pos < self.len()).then(|| self.storage[self.physical(pos)])
    }

    /// Map a logical offset to its index in the backing array.
    #[inline]
    fn physical(&self, pos: usize) -> usize {
        if pos < self.gap_start {
            pos
        } else {
            pos + (self.gap_end - self.gap_start)
        }
    }

    // -- Text access --------------------------------------------------------

    /// Materialize the full logical text. Allocates; prefer
    /// [`text_segment`](Self::text_segment) or [`line`](Self::line) when a
    /// sub-range suffices.
    #[must_use]
    pub fn text(&self) -> String {
        let mut bytes = Vec::with_capacity(self.len());
        bytes.extend_from_slice(&self.storage[..self.gap_start]);
        bytes.extend_from_slice(&self.storage[self.gap_end..]);
        into_string(bytes)
    }

    /// Materialize the logical range `[start, start + len)`, clamped to the
    /// text. Handles the range falling before, after, or across the gap.
    #[must_use]
    pub fn text_segment(&self, start: usize, len: usize) -> String {
        let total = self.len();
        let start = start.min(total);
        let end = start.saturating_add(len).min(total);

        let bytes = if end <= self.gap_start {
            self.storage[start..end].to_vec()
        } else if start >= self.gap_start {
            let shift = self.gap_end - self.gap_start;
            self.storage[start + shift..end + shift].to_vec()
        } else {
            let mut v = Vec::with_capacity(end - start);
            v.extend_from_slice(&self.storage[start..self.gap_start]);
            v.extend_from_slice(
                &self.storage[self.gap_end..self.gap_end + (end - self.gap_start)],
            );
            v
        };
        into_string(bytes)
    }

    /// The text of line `n`, without its trailing newline. `None` when
    /// `n >= line_count()`.
    #[must_use]
    pub fn line(&self, n: usize) -> Option<String> {
        let start = *self.line_starts.get(n)?;
        // The next line start sits one past this line's newline.
        let end = self
            .line_starts
            .get(n + 1)
            .map_or(self.len(), |&next| next - 1);
        Some(self.text_segment(start, end - start))
    }

    /// Number of lines. At least 1 — an empty buffer has one empty line.
    #[inline]
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Split the full text at `\n` into owned line strings. The final
    /// partial line is included only when non-empty, so a text ending in a
    /// newline yields no trailing empty entry.
    #[must_use]
    pub fn all_lines(&self) -> Vec<String> {
        let text = self.text();
        let mut lines: Vec<String> = text.split('\n').map(str::to_owned).collect();
        if lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }
        lines
    }

    /// The line containing logical offset `pos` (clamped): the greatest line
    /// whose start is `<= pos`. Binary search over the line index.
    #[must_use]
    pub fn line_of(&self, pos: usize) -> usize {
        let pos = pos.min(self.len());
        self.line_starts.partition_point(|&s| s <= pos) - 1
    }

    /// The logical offset of the first byte of line `n`, or `None` when
    /// `n >= line_count()`.
    #[inline]
    #[must_use]
    pub fn line_start(&self, n: usize) -> Option<usize> {
        self.line_starts.get(n).copied()
    }
}

impl Default for GapBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for GapBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GapBuffer")
            .field("len", &self.len())
            .field("capacity", &self.storage.len())
            .field("gap", &(self.gap_start..self.gap_end))
            .field("lines", &self.line_starts.len())
            .finish_non_exhaustive()
    }
}

/// Bytes → `String` without panicking: valid UTF-8 converts losslessly,
/// anything else (e.g. a deletion split a code point mid-sequence) degrades
/// to replacement characters.
fn into_string(bytes: Vec<u8>) -> String {
    String::from_utf8(bytes)
        .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
