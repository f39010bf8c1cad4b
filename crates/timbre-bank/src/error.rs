//! Error types for timbre-bank.

use thiserror::Error;

/// Result type alias for timbre-bank operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in timbre-bank.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A preset was requested from a stack with no banks.
    #[error("No sound banks loaded")]
    EmptyBankStack,

    /// The stack's banks contain no presets at all.
    #[error("Sound bank stack has no presets")]
    NoPresets,
}
