//! Session error type.

use thiserror::Error;

/// Errors surfaced by file-backed session operations (open, save).
///
/// Buffer and coordinate operations never error — out-of-range input is
/// clamped. Only the I/O edge of the core reports failures, and it reports
/// them as values; nothing here retries.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Save was requested on a session that has no file path yet.
    #[error("buffer has no file path")]
    NoPath,

    /// The underlying read or write failed (including non-UTF-8 content on
    /// open, which `read_to_string` reports as `InvalidData`).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
