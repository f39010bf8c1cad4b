//! Error types for timbre-midi.

use thiserror::Error;

/// Result type alias for timbre-midi operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors produced while decoding MIDI byte streams.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The message contained no bytes.
    #[error("empty MIDI message")]
    Empty,

    /// The first byte was not a status byte.
    #[error("missing status byte, got 0x{0:02X}")]
    MissingStatus(u8),

    /// Fewer data bytes than the status requires.
    #[error("truncated MIDI message: status 0x{status:02X} needs {expected} bytes, got {actual}")]
    Truncated {
        status: u8,
        expected: usize,
        actual: usize,
    },
}
