//! # quill-core — text storage engine for the quill editor
//!
//! The mutable text store behind every open document, and nothing else: no
//! rendering, no widgets, no event loop. Three layers, leaf-first:
//!
//! - **[`gap`]** — `GapBuffer`, a byte array with a movable gap for O(1)
//!   amortized edits at the cursor, plus a sorted line-start index
//! - **[`coord`]** — translation between logical byte offsets, (line, col)
//!   pairs, UTF-8 code-point boundaries, and word boundaries
//! - **[`session`]** — `Session` and `Tabs`: cursor/scroll/selection state,
//!   file identity, and buffer ownership transfer on tab switch
//!
//! Everything is single-threaded and synchronous; every operation is a
//! bounded computation with no blocking call. Out-of-range positions are
//! clamped rather than rejected, so UI callers never pre-validate cursor
//! math. The only fallible surface is file I/O, reported through
//! [`SessionError`].

pub mod coord;
pub mod error;
pub mod gap;
pub mod position;
pub mod session;

pub use error::SessionError;
pub use gap::GapBuffer;
pub use position::Position;
pub use session::{LineEnding, Selection, Session, SnapshotSink, Tabs};
