//! Document sessions and tabs — the thin ownership layer over the storage.
//!
//! A [`Session`] binds one [`GapBuffer`] to everything that makes it a
//! document: a cursor, a scroll position, an optional selection, a modified
//! flag, and file identity. [`Tabs`] manages a row of documents, exactly one
//! of which is live in the session at a time.
//!
//! # Tab lifecycle
//!
//! ```text
//! Unopened ──create/open──▶ Open(clean) ◀──save── Open(modified)
//!                               │    └──edit──▶ Open(modified)
//!                               └──────close──────▶ Closed
//! ```
//!
//! Closing a modified tab does not block or persist — the core logs the
//! discard and the surrounding UI owns any "unsaved changes" prompt (it can
//! query [`Tabs::is_modified`] before calling [`Tabs::close`]).
//!
//! # Buffer ownership on tab switch
//!
//! Switching tabs *swaps* the gap buffer between the session and the parked
//! tab record (`std::mem::swap`) — never a copy, so switching away from a
//! large file costs nothing. The parked record for the active tab holds an
//! empty placeholder; at any instant exactly one slot owns the live buffer.
//! After a switch the gap is re-synchronized to the restored cursor via
//! [`GapBuffer::move_gap`].

use std::fmt;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::coord;
use crate::error::SessionError;
use crate::gap::GapBuffer;
use crate::position::Position;

/// Title used for tabs not yet backed by a file.
const UNTITLED: &str = "untitled";

// ---------------------------------------------------------------------------
// Line endings
// ---------------------------------------------------------------------------

/// Line ending style of a file. Detected on load by the first occurrence;
/// new buffers default to `Lf`. The buffer itself only indexes `\n` — CRLF
/// content still contains `\n`, so the line index is unaffected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineEnding {
    /// `\n` — Unix, macOS, Linux.
    Lf,
    /// `\r\n` — Windows, DOS.
    CrLf,
    /// `\r` — Classic Mac. Rare but we handle it.
    Cr,
}

impl LineEnding {
    /// The string representation of this line ending.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }

    /// Detect the dominant line ending by the first occurrence; `Lf` when
    /// the text has none.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        let bytes = text.as_bytes();
        for (i, &b) in bytes.iter().enumerate() {
            if b == b'\n' {
                if i > 0 && bytes[i - 1] == b'\r' {
                    return Self::CrLf;
                }
                return Self::Lf;
            }
            if b == b'\r' {
                if bytes.get(i + 1) == Some(&b'\n') {
                    return Self::CrLf;
                }
                return Self::Cr;
            }
        }
        Self::Lf
    }
}

impl fmt::Display for LineEnding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lf => f.write_str("LF"),
            Self::CrLf => f.write_str("CRLF"),
            Self::Cr => f.write_str("CR"),
        }
    }
}

/// Rewrite every line ending in `text` (`\n`, `\r`, `\r\n`) as `target`.
fn normalize_line_endings(text: &str, target: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\r' {
            result.push_str(target);
            // \r\n is one ending, not two.
            if chars.peek() == Some(&'\n') {
                chars.next();
            }
        } else if ch == '\n' {
            result.push_str(target);
        } else {
            result.push(ch);
        }
    }
    result
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// A single contiguous selection, stored as raw (possibly unordered) logical
/// offsets with an explicit active flag.
///
/// Emptiness is the flag, not `start == end` — a zero-width selection is a
/// legitimate transient state at the start of a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    active: bool,
    start: usize,
    end: usize,
}

impl Selection {
    /// No selection.
    pub const INACTIVE: Self = Self {
        active: false,
        start: 0,
        end: 0,
    };

    /// Start a selection anchored at `pos` (zero-width until extended).
    pub const fn begin(&mut self, pos: usize) {
        self.active = true;
        self.start = pos;
        self.end = pos;
    }

    /// Move the head of the selection; the anchor stays put.
    pub const fn extend(&mut self, pos: usize) {
        self.end = pos;
    }

    /// Drop the selection.
    pub const fn clear(&mut self) {
        self.active = false;
    }

    /// True while a selection (possibly zero-width) exists.
    #[inline]
    #[must_use]
    pub const fn is_active(self) -> bool {
        self.active
    }

    /// The normalized `(min, max)` span, or `None` when inactive. The stored
    /// endpoints keep drag order; this is the only way out, so callers never
    /// see an unordered pair.
    #[must_use]
    pub fn range(self) -> Option<(usize, usize)> {
        self.active
            .then(|| (self.start.min(self.end), self.start.max(self.end)))
    }
}

impl Default for Selection {
    fn default() -> Self {
        Self::INACTIVE
    }
}

// ---------------------------------------------------------------------------
// Snapshot sink
// ---------------------------------------------------------------------------

/// Receiver for full-text snapshots after each successful edit.
///
/// The language-server client synchronizes documents by full text; the core
/// hands it a string and holds no further contract — the sink must not call
/// back into the session.
pub trait SnapshotSink {
    /// Called with the complete buffer text after an edit.
    fn text_changed(&mut self, text: &str);
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One live document: a gap buffer plus cursor, scroll, selection, and file
/// identity.
///
/// All edits flow through the two-step protocol: the session moves the gap
/// to the cursor, then inserts or deletes there. Cursor positions are always
/// kept on UTF-8 code-point boundaries.
pub struct Session {
    buffer: GapBuffer,
    /// Cursor as a logical byte offset; the gap tracks it.
    cursor: usize,
    /// Cached (line, character-column) of the cursor.
    cursor_pos: Position,
    scroll_line: usize,
    scroll_col: usize,
    selection: Selection,
    modified: bool,
    path: Option<PathBuf>,
    title: String,
    line_ending: LineEnding,
    sink: Option<Box<dyn SnapshotSink>>,
}

impl Session {
    /// An empty, untitled, clean session.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: GapBuffer::new(),
            cursor: 0,
            cursor_pos: Position::ZERO,
            scroll_line: 0,
            scroll_col: 0,
            selection: Selection::INACTIVE,
            modified: false,
            path: None,
            title: UNTITLED.to_owned(),
            line_ending: LineEnding::Lf,
            sink: None,
        }
    }

    /// Put the session back to the empty untitled state, keeping any
    /// registered snapshot sink.
    fn reset(&mut self) {
        self.buffer = GapBuffer::new();
        self.cursor = 0;
        self.cursor_pos = Position::ZERO;
        self.scroll_line = 0;
        self.scroll_col = 0;
        self.selection = Selection::INACTIVE;
        self.modified = false;
        self.path = None;
        self.title = UNTITLED.to_owned();
        self.line_ending = LineEnding::Lf;
    }

    /// Install file contents as this session's document. Starts clean with
    /// the cursor at the top.
    fn load(&mut self, text: &str, path: &Path) {
        self.reset();
        self.line_ending = LineEnding::detect(text);
        self.buffer = GapBuffer::from_text(text);
        self.buffer.move_gap(0);
        self.path = Some(path.to_path_buf());
        self.title = path
            .file_name()
            .map_or_else(|| UNTITLED.to_owned(), |n| n.to_string_lossy().into_owned());
    }

    // -- Accessors ----------------------------------------------------------

    /// The underlying buffer, for read access (line text, lengths).
    #[inline]
    #[must_use]
    pub const fn buffer(&self) -> &GapBuffer {
        &self.buffer
    }

    /// Materialized full text.
    #[must_use]
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    /// Cursor as a logical byte offset.
    #[inline]
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Cached cursor (line, character-column).
    #[inline]
    #[must_use]
    pub const fn cursor_position(&self) -> Position {
        self.cursor_pos
    }

    /// Current scroll offsets (first visible line, first visible column).
    #[inline]
    #[must_use]
    pub const fn scroll(&self) -> (usize, usize) {
        (self.scroll_line, self.scroll_col)
    }

    /// Set the scroll offsets. Purely view state; no clamping against the
    /// buffer is done here.
    pub const fn set_scroll(&mut self, line: usize, col: usize) {
        self.scroll_line = line;
        self.scroll_col = col;
    }

    /// True since the last save (or load) saw an edit.
    #[inline]
    #[must_use]
    pub const fn is_modified(&self) -> bool {
        self.modified
    }

    /// Mark the session modified without an edit (e.g. an external tool
    /// rewrote state behind the buffer's back).
    pub const fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// The backing file path, if any.
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Tab title — the file name, or "untitled".
    #[inline]
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Detected (or default) line ending style, used on save.
    #[inline]
    #[must_use]
    pub const fn line_ending(&self) -> LineEnding {
        self.line_ending
    }

    /// Register the snapshot receiver notified after every edit.
    pub fn set_snapshot_sink(&mut self, sink: Box<dyn SnapshotSink>) {
        self.sink = Some(sink);
    }

    // -- Cursor & selection -------------------------------------------------

    /// Place the cursor at a logical offset.
    ///
    /// The offset is clamped to the text and snapped back to the nearest
    /// code-point boundary, then the gap follows it. An active selection's
    /// head is dragged along.
    pub fn set_cursor(&mut self, pos: usize) {
        let mut pos = pos.min(self.buffer.len());
        if !coord::is_char_boundary(&self.buffer, pos) {
            pos = coord::prev_char_boundary(&self.buffer, pos);
        }
        self.cursor = pos;
        self.buffer.move_gap(pos);
        self.cursor_pos = coord::offset_to_line_col(&self.buffer, pos);
        if self.selection.is_active() {
            self.selection.extend(pos);
        }
    }

    /// Move the cursor to a (line, character-column) position.
    pub fn set_cursor_line_col(&mut self, line: usize, col: usize) {
        let pos = coord::line_col_to_offset(&self.buffer, line, col);
        self.set_cursor(pos);
    }

    /// One character left.
    pub fn cursor_left(&mut self) {
        self.set_cursor(coord::prev_char_boundary(&self.buffer, self.cursor));
    }

    /// One character right.
    pub fn cursor_right(&mut self) {
        self.set_cursor(coord::next_char_boundary(&self.buffer, self.cursor));
    }

    /// One word left (Ctrl+Left).
    pub fn cursor_word_left(&mut self) {
        self.set_cursor(coord::word_left(&self.buffer, self.cursor));
    }

    /// One word right (Ctrl+Right).
    pub fn cursor_word_right(&mut self) {
        self.set_cursor(coord::word_right(&self.buffer, self.cursor));
    }

    /// Anchor a selection at the cursor. Subsequent cursor movement drags
    /// the selection head.
    pub const fn begin_selection(&mut self) {
        self.selection.begin(self.cursor);
    }

    /// Drop any selection.
    pub const fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// The selection state.
    #[inline]
    #[must_use]
    pub const fn selection(&self) -> Selection {
        self.selection
    }

    /// Normalized selection span, `None` when there is none.
    #[must_use]
    pub fn selection_range(&self) -> Option<(usize, usize)> {
        self.selection.range()
    }

    // -- Editing ------------------------------------------------------------

    /// Insert text at the cursor, replacing the selection if one is active.
    pub fn insert(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.delete_selection();
        self.buffer.move_gap(self.cursor);
        self.buffer.insert(text);
        self.cursor += text.len();
        self.after_edit();
    }

    /// Backspace: delete the selection, or the character before the cursor.
    pub fn backspace(&mut self) {
        if self.delete_selection() {
            return;
        }
        let prev = coord::prev_char_boundary(&self.buffer, self.cursor);
        if prev == self.cursor {
            return;
        }
        self.buffer.delete_range(prev, self.cursor - prev);
        self.cursor = prev;
        self.after_edit();
    }

    /// Forward delete: delete the selection, or the character after the
    /// cursor.
    pub fn delete_forward(&mut self) {
        if self.delete_selection() {
            return;
        }
        let next = coord::next_char_boundary(&self.buffer, self.cursor);
        if next == self.cursor {
            return;
        }
        self.buffer.delete_range(self.cursor, next - self.cursor);
        self.after_edit();
    }

    /// Delete the selected span, leaving the cursor at its start. Returns
    /// false when no selection was active or it was zero-width.
    pub fn delete_selection(&mut self) -> bool {
        let Some((start, end)) = self.selection.range() else {
            return false;
        };
        self.selection.clear();
        if start == end {
            return false;
        }
        self.buffer.delete_range(start, end - start);
        self.cursor = start.min(self.buffer.len());
        self.after_edit();
        true
    }

    /// Bookkeeping after every successful mutation: cursor cache, modified
    /// flag, snapshot notification.
    fn after_edit(&mut self) {
        self.buffer.move_gap(self.cursor);
        self.cursor_pos = coord::offset_to_line_col(&self.buffer, self.cursor);
        self.modified = true;
        if let Some(sink) = &mut self.sink {
            sink.text_changed(&self.buffer.text());
        }
    }

    // -- File I/O -----------------------------------------------------------

    /// Write the text to the session's path, converting line endings to the
    /// detected style. Clears the modified flag on success.
    ///
    /// # Errors
    ///
    /// [`SessionError::NoPath`] when the session has no path, or the
    /// underlying write error.
    pub fn save(&mut self) -> Result<(), SessionError> {
        let path = self.path.clone().ok_or(SessionError::NoPath)?;
        self.save_as(&path)
    }

    /// Write the text to `path`, adopting it as the session's path.
    ///
    /// # Errors
    ///
    /// Returns the underlying write error; the session state is unchanged on
    /// failure.
    pub fn save_as(&mut self, path: &Path) -> Result<(), SessionError> {
        let content = normalize_line_endings(&self.buffer.text(), self.line_ending.as_str());
        fs::write(path, content)?;
        self.path = Some(path.to_path_buf());
        self.title = path
            .file_name()
            .map_or_else(|| UNTITLED.to_owned(), |n| n.to_string_lossy().into_owned());
        self.modified = false;
        debug!(path = %path.display(), "saved");
        Ok(())
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("title", &self.title)
            .field("len", &self.buffer.len())
            .field("cursor", &self.cursor)
            .field("modified", &self.modified)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

/// A parked tab: the fields a [`Session`] needs restored, plus the buffer
/// itself when the tab is not active (the active tab's record holds an empty
/// placeholder instead).
struct Tab {
    buffer: GapBuffer,
    cursor: usize,
    scroll_line: usize,
    scroll_col: usize,
    selection: Selection,
    modified: bool,
    path: Option<PathBuf>,
    title: String,
    line_ending: LineEnding,
}

impl Tab {
    fn untitled() -> Self {
        Self {
            buffer: GapBuffer::new(),
            cursor: 0,
            scroll_line: 0,
            scroll_col: 0,
            selection: Selection::INACTIVE,
            modified: false,
            path: None,
            title: UNTITLED.to_owned(),
            line_ending: LineEnding::Lf,
        }
    }
}

/// The tab strip: parked tab records plus the one live [`Session`].
pub struct Tabs {
    tabs: Vec<Tab>,
    active: usize,
    session: Session,
}

impl Tabs {
    /// A strip with a single empty untitled tab.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tabs: vec![Tab::untitled()],
            active: 0,
            session: Session::new(),
        }
    }

    // -- Accessors ----------------------------------------------------------

    /// Number of open tabs.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    /// There is always at least one tab.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Index of the active tab.
    #[inline]
    #[must_use]
    pub const fn active_index(&self) -> usize {
        self.active
    }

    /// The live session (the active tab's document).
    #[inline]
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable access to the live session for editing.
    #[inline]
    pub const fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Title of tab `idx`, for the tab bar. `None` past the end.
    #[must_use]
    pub fn title(&self, idx: usize) -> Option<&str> {
        if idx == self.active {
            Some(self.session.title())
        } else {
            self.tabs.get(idx).map(|t| t.title.as_str())
        }
    }

    /// Modified flag of tab `idx` — what a close prompt checks. `None` past
    /// the end.
    #[must_use]
    pub fn is_modified(&self, idx: usize) -> Option<bool> {
        if idx == self.active {
            Some(self.session.is_modified())
        } else {
            self.tabs.get(idx).map(|t| t.modified)
        }
    }

    // -- Tab operations -----------------------------------------------------

    /// Open a new empty tab and make it active. Returns its index.
    pub fn create(&mut self) -> usize {
        self.park_active();
        self.tabs.push(Tab::untitled());
        let idx = self.tabs.len() - 1;
        self.restore(idx);
        debug!(tab = idx, "created tab");
        idx
    }

    /// Open `path` in a new active tab. Returns the tab index.
    ///
    /// # Errors
    ///
    /// The read error (including non-UTF-8 content); no tab is created on
    /// failure.
    pub fn open_from_path(&mut self, path: &Path) -> Result<usize, SessionError> {
        let text = fs::read_to_string(path)?;
        let idx = self.create();
        self.session.load(&text, path);
        debug!(tab = idx, path = %path.display(), "opened file");
        Ok(idx)
    }

    /// Make tab `idx` active, swapping its buffer into the session. No-op
    /// (returning false) when `idx` is the active tab or out of range.
    pub fn switch_to(&mut self, idx: usize) -> bool {
        if idx >= self.tabs.len() || idx == self.active {
            return false;
        }
        self.park_active();
        self.restore(idx);
        debug!(tab = idx, "switched tab");
        true
    }

    /// Close tab `idx`. Returns false when `idx` is out of range.
    ///
    /// Unsaved changes are discarded (and logged); the UI is expected to
    /// have prompted via [`is_modified`](Self::is_modified) first. Closing
    /// the last remaining tab leaves a fresh untitled tab, so the strip is
    /// never empty.
    pub fn close(&mut self, idx: usize) -> bool {
        if idx >= self.tabs.len() {
            return false;
        }
        if self.is_modified(idx) == Some(true) {
            warn!(tab = idx, "closing tab with unsaved changes");
        }

        if idx == self.active {
            // Drop the live buffer before pulling in a neighbor.
            self.session.reset();
            if self.tabs.len() == 1 {
                self.tabs[0] = Tab::untitled();
            } else {
                self.tabs.remove(idx);
                self.restore(idx.min(self.tabs.len() - 1));
            }
        } else {
            self.tabs.remove(idx);
            if idx < self.active {
                self.active -= 1;
            }
        }
        true
    }

    /// Save the active tab. See [`Session::save`].
    ///
    /// # Errors
    ///
    /// Propagates [`Session::save`] errors.
    pub fn save(&mut self) -> Result<(), SessionError> {
        self.session.save()
    }

    /// Mark the active tab modified.
    pub const fn mark_modified(&mut self) {
        self.session.mark_modified();
    }

    // -- Swap protocol ------------------------------------------------------

    /// Move the live buffer and session fields into the active tab's parked
    /// record, leaving the placeholder in the session.
    fn park_active(&mut self) {
        let tab = &mut self.tabs[self.active];
        mem::swap(&mut tab.buffer, &mut self.session.buffer);
        tab.cursor = self.session.cursor;
        tab.scroll_line = self.session.scroll_line;
        tab.scroll_col = self.session.scroll_col;
        tab.selection = self.session.selection;
        tab.modified = self.session.modified;
        tab.path = self.session.path.take();
        tab.title = mem::take(&mut self.session.title);
        tab.line_ending = self.session.line_ending;
    }

    /// Swap tab `idx`'s buffer into the session, restore its fields, and
    /// re-sync the gap to the restored cursor.
    fn restore(&mut self, idx: usize) {
        let tab = &mut self.tabs[idx];
        mem::swap(&mut tab.buffer, &mut self.session.buffer);
        self.session.cursor = tab.cursor;
        self.session.scroll_line = tab.scroll_line;
        self.session.scroll_col = tab.scroll_col;
        self.session.selection = tab.selection;
        self.session.modified = tab.modified;
        self.session.path = tab.path.take();
        self.session.title = mem::take(&mut tab.title);
        self.session.line_ending = tab.line_ending;
        self.active = idx;

        self.session.buffer.move_gap(self.session.cursor);
        self.session.cursor_pos =
            coord::offset_to_line_col(&self.session.buffer, self.session.cursor);
    }
}

impl Default for Tabs {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Tabs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tabs")
            .field("len", &self.tabs.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- LineEnding ---------------------------------------------------------

    #[test]
    fn line_ending_detect() {
        assert_eq!(LineEnding::detect("a\nb"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb"), LineEnding::CrLf);
        assert_eq!(LineEnding::detect("a\rb"), LineEnding::Cr);
        assert_eq!(LineEnding::detect("plain"), LineEnding::Lf);
        assert_eq!(LineEnding::detect(""), LineEnding::Lf);
    }

    #[test]
    fn line_ending_first_occurrence_wins() {
        assert_eq!(LineEnding::detect("a\nb\r\nc"), LineEnding::Lf);
        assert_eq!(LineEnding::detect("a\r\nb\nc"), LineEnding::CrLf);
    }

    #[test]
    fn line_ending_display() {
        assert_eq!(LineEnding::Lf.to_string(), "LF");
        assert_eq!(LineEnding::CrLf.to_string(), "CRLF");
        assert_eq!(LineEnding::Cr.to_string(), "CR");
    }

    #[test]
    fn normalize_mixed_endings() {
        assert_eq!(normalize_line_endings("a\r\nb\rc\n", "\n"), "a\nb\nc\n");
        assert_eq!(normalize_line_endings("a\nb\rc\r\n", "\r\n"), "a\r\nb\r\nc\r\n");
        assert_eq!(normalize_line_endings("café\n", "\r\n"), "café\r\n");
    }

    // -- Selection ----------------------------------------------------------

    #[test]
    fn selection_inactive_has_no_range() {
        let sel = Selection::INACTIVE;
        assert!(!sel.is_active());
        assert_eq!(sel.range(), None);
    }

    #[test]
    fn selection_range_is_normalized() {
        let mut sel = Selection::INACTIVE;
        sel.begin(8);
        sel.extend(3); // dragged backwards
        assert_eq!(sel.range(), Some((3, 8)));
    }

    #[test]
    fn selection_zero_width_is_still_active() {
        let mut sel = Selection::INACTIVE;
        sel.begin(5);
        assert!(sel.is_active());
        assert_eq!(sel.range(), Some((5, 5)));
        sel.clear();
        assert!(!sel.is_active());
    }

    // -- Session editing ----------------------------------------------------

    #[test]
    fn new_session_is_clean_and_untitled() {
        let s = Session::new();
        assert_eq!(s.text(), "");
        assert_eq!(s.title(), "untitled");
        assert!(!s.is_modified());
        assert!(s.path().is_none());
    }

    #[test]
    fn insert_at_cursor_advances_cursor() {
        let mut s = Session::new();
        s.insert("hello");
        assert_eq!(s.text(), "hello");
        assert_eq!(s.cursor(), 5);
        assert!(s.is_modified());
    }

    #[test]
    fn insert_mid_text() {
        let mut s = Session::new();
        s.insert("hllo");
        s.set_cursor(1);
        s.insert("e");
        assert_eq!(s.text(), "hello");
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn insert_empty_is_noop() {
        let mut s = Session::new();
        s.insert("");
        assert!(!s.is_modified());
    }

    #[test]
    fn cursor_cache_tracks_line_col() {
        let mut s = Session::new();
        s.insert("ab\ncd");
        assert_eq!(s.cursor_position(), Position::new(1, 2));
        s.set_cursor(3);
        assert_eq!(s.cursor_position(), Position::new(1, 0));
    }

    #[test]
    fn set_cursor_snaps_to_char_boundary() {
        let mut s = Session::new();
        s.insert("a你b");
        s.set_cursor(2); // inside 你
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn set_cursor_line_col_roundtrip() {
        let mut s = Session::new();
        s.insert("one\ntwo\nthree");
        s.set_cursor_line_col(2, 1);
        assert_eq!(s.cursor(), 9);
        assert_eq!(s.cursor_position(), Position::new(2, 1));
    }

    #[test]
    fn backspace_removes_char_before_cursor() {
        let mut s = Session::new();
        s.insert("abc");
        s.backspace();
        assert_eq!(s.text(), "ab");
        assert_eq!(s.cursor(), 2);
    }

    #[test]
    fn backspace_at_start_is_noop() {
        let mut s = Session::new();
        s.insert("abc");
        s.set_cursor(0);
        s.backspace();
        assert_eq!(s.text(), "abc");
    }

    #[test]
    fn backspace_removes_whole_multibyte_char() {
        let mut s = Session::new();
        s.insert("a🌍");
        s.backspace();
        assert_eq!(s.text(), "a");
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn backspace_across_newline_keeps_line_index() {
        let mut s = Session::new();
        s.insert("ab\ncd");
        s.set_cursor(3);
        s.backspace(); // deletes the newline
        assert_eq!(s.text(), "abcd");
        assert_eq!(s.buffer().line_count(), 1);
    }

    #[test]
    fn delete_forward_removes_char_at_cursor() {
        let mut s = Session::new();
        s.insert("abc");
        s.set_cursor(1);
        s.delete_forward();
        assert_eq!(s.text(), "ac");
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn delete_forward_at_end_is_noop() {
        let mut s = Session::new();
        s.insert("ab");
        s.delete_forward();
        assert_eq!(s.text(), "ab");
    }

    #[test]
    fn cursor_char_and_word_movement() {
        let mut s = Session::new();
        s.insert("foo bar");
        s.set_cursor(0);
        s.cursor_right();
        assert_eq!(s.cursor(), 1);
        s.cursor_word_right();
        assert_eq!(s.cursor(), 4);
        s.cursor_word_left();
        assert_eq!(s.cursor(), 0);
        s.cursor_left();
        assert_eq!(s.cursor(), 0);
    }

    // -- Selection through the session --------------------------------------

    #[test]
    fn drag_selection_and_delete() {
        let mut s = Session::new();
        s.insert("hello world");
        s.set_cursor(5);
        s.begin_selection();
        s.set_cursor(11); // drag right
        assert_eq!(s.selection_range(), Some((5, 11)));
        assert!(s.delete_selection());
        assert_eq!(s.text(), "hello");
        assert_eq!(s.cursor(), 5);
        assert_eq!(s.selection_range(), None);
    }

    #[test]
    fn backward_drag_normalizes() {
        let mut s = Session::new();
        s.insert("hello world");
        s.set_cursor(11);
        s.begin_selection();
        s.set_cursor(6); // drag left
        assert_eq!(s.selection_range(), Some((6, 11)));
    }

    #[test]
    fn insert_replaces_selection() {
        let mut s = Session::new();
        s.insert("hello world");
        s.set_cursor(6);
        s.begin_selection();
        s.set_cursor(11);
        s.insert("there");
        assert_eq!(s.text(), "hello there");
        assert_eq!(s.selection_range(), None);
    }

    #[test]
    fn backspace_deletes_selection_only() {
        let mut s = Session::new();
        s.insert("abcdef");
        s.set_cursor(1);
        s.begin_selection();
        s.set_cursor(4);
        s.backspace();
        assert_eq!(s.text(), "aef");
        assert_eq!(s.cursor(), 1);
    }

    #[test]
    fn zero_width_selection_does_not_swallow_backspace() {
        let mut s = Session::new();
        s.insert("ab");
        s.begin_selection(); // zero-width at 2
        s.backspace();
        assert_eq!(s.text(), "a");
    }

    // -- Snapshot sink ------------------------------------------------------

    struct RecordingSink(std::rc::Rc<std::cell::RefCell<Vec<String>>>);

    impl SnapshotSink for RecordingSink {
        fn text_changed(&mut self, text: &str) {
            self.0.borrow_mut().push(text.to_owned());
        }
    }

    #[test]
    fn sink_receives_snapshot_after_each_edit() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut s = Session::new();
        s.set_snapshot_sink(Box::new(RecordingSink(log.clone())));
        s.insert("ab");
        s.backspace();
        assert_eq!(*log.borrow(), vec!["ab".to_owned(), "a".to_owned()]);
    }

    #[test]
    fn sink_not_called_for_noop_edits() {
        let log = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let mut s = Session::new();
        s.set_snapshot_sink(Box::new(RecordingSink(log.clone())));
        s.insert("");
        s.backspace();
        assert!(log.borrow().is_empty());
    }

    // -- File I/O -----------------------------------------------------------

    #[test]
    fn save_without_path_errors() {
        let mut s = Session::new();
        s.insert("x");
        assert!(matches!(s.save(), Err(SessionError::NoPath)));
        assert!(s.is_modified());
    }

    #[test]
    fn save_as_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("note.txt");

        let mut s = Session::new();
        s.insert("hello\nworld\n");
        s.save_as(&path).unwrap();
        assert!(!s.is_modified());
        assert_eq!(s.title(), "note.txt");
        assert_eq!(s.path(), Some(path.as_path()));
        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\nworld\n");
    }

    #[test]
    fn save_preserves_crlf_style() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dos.txt");
        fs::write(&path, "one\r\ntwo\r\n").unwrap();

        let mut tabs = Tabs::new();
        tabs.open_from_path(&path).unwrap();
        assert_eq!(tabs.session().line_ending(), LineEnding::CrLf);

        tabs.session_mut().set_cursor(0);
        tabs.session_mut().insert("zero\n");
        tabs.save().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "zero\r\none\r\ntwo\r\n");
    }

    // -- Tabs ---------------------------------------------------------------

    #[test]
    fn new_strip_has_one_untitled_tab() {
        let tabs = Tabs::new();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs.active_index(), 0);
        assert_eq!(tabs.title(0), Some("untitled"));
        assert!(!tabs.is_empty());
    }

    #[test]
    fn create_opens_and_activates() {
        let mut tabs = Tabs::new();
        tabs.session_mut().insert("first");
        let idx = tabs.create();
        assert_eq!(idx, 1);
        assert_eq!(tabs.active_index(), 1);
        assert_eq!(tabs.session().text(), "");
        assert_eq!(tabs.len(), 2);
    }

    #[test]
    fn switch_restores_content_cursor_and_selection() {
        let mut tabs = Tabs::new();
        tabs.session_mut().insert("alpha beta");
        tabs.session_mut().set_cursor(3);
        tabs.session_mut().begin_selection();
        tabs.session_mut().set_cursor(7);
        tabs.session_mut().set_scroll(4, 2);
        tabs.create();
        tabs.session_mut().insert("second");

        assert!(tabs.switch_to(0));
        let s = tabs.session();
        assert_eq!(s.text(), "alpha beta");
        assert_eq!(s.cursor(), 7);
        assert_eq!(s.selection_range(), Some((3, 7)));
        assert_eq!(s.scroll(), (4, 2));
        assert_eq!(s.cursor_position(), Position::new(0, 7));
        // Gap re-synced to the cursor.
        assert_eq!(s.buffer().gap_position(), 7);
    }

    #[test]
    fn switch_to_self_or_out_of_range_is_noop() {
        let mut tabs = Tabs::new();
        assert!(!tabs.switch_to(0));
        assert!(!tabs.switch_to(9));
    }

    #[test]
    fn switch_preserves_modified_flags_per_tab() {
        let mut tabs = Tabs::new();
        tabs.session_mut().insert("dirty");
        tabs.create();
        assert!(!tabs.session().is_modified());
        assert_eq!(tabs.is_modified(0), Some(true));
        tabs.switch_to(0);
        assert!(tabs.session().is_modified());
        assert_eq!(tabs.is_modified(1), Some(false));
    }

    #[test]
    fn edits_after_switch_land_in_right_buffer() {
        let mut tabs = Tabs::new();
        tabs.session_mut().insert("one");
        tabs.create();
        tabs.session_mut().insert("two");
        tabs.switch_to(0);
        tabs.session_mut().insert("!");
        assert_eq!(tabs.session().text(), "one!");
        tabs.switch_to(1);
        assert_eq!(tabs.session().text(), "two");
    }

    #[test]
    fn close_parked_tab_adjusts_active_index() {
        let mut tabs = Tabs::new();
        tabs.session_mut().insert("a");
        tabs.create();
        tabs.session_mut().insert("b");
        assert_eq!(tabs.active_index(), 1);
        assert!(tabs.close(0));
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs.active_index(), 0);
        assert_eq!(tabs.session().text(), "b");
    }

    #[test]
    fn close_active_tab_activates_neighbor() {
        let mut tabs = Tabs::new();
        tabs.session_mut().insert("a");
        tabs.create();
        tabs.session_mut().insert("b");
        assert!(tabs.close(1));
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs.session().text(), "a");
    }

    #[test]
    fn close_last_tab_leaves_fresh_untitled() {
        let mut tabs = Tabs::new();
        tabs.session_mut().insert("scratch");
        assert!(tabs.close(0));
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs.session().text(), "");
        assert_eq!(tabs.title(0), Some("untitled"));
        assert!(!tabs.session().is_modified());
    }

    #[test]
    fn close_out_of_range_is_noop() {
        let mut tabs = Tabs::new();
        assert!(!tabs.close(5));
        assert_eq!(tabs.len(), 1);
    }

    #[test]
    fn open_from_path_loads_clean_tab() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.rs");
        fs::write(&path, "fn main() {}\n").unwrap();

        let mut tabs = Tabs::new();
        let idx = tabs.open_from_path(&path).unwrap();
        assert_eq!(tabs.active_index(), idx);
        assert_eq!(tabs.session().text(), "fn main() {}\n");
        assert_eq!(tabs.session().title(), "code.rs");
        assert!(!tabs.session().is_modified());
        assert_eq!(tabs.session().cursor(), 0);
    }

    #[test]
    fn open_missing_file_errors_without_new_tab() {
        let mut tabs = Tabs::new();
        let before = tabs.len();
        assert!(tabs.open_from_path(Path::new("/no/such/file")).is_err());
        assert_eq!(tabs.len(), before);
    }

    #[test]
    fn mark_modified_flows_through_strip() {
        let mut tabs = Tabs::new();
        tabs.mark_modified();
        assert_eq!(tabs.is_modified(0), Some(true));
    }
}
