//! Error types for timbre-synth.

use thiserror::Error;

/// Error type for synthesizer operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Sound bank error: {0}")]
    Bank(#[from] timbre_bank::Error),

    #[error("MIDI error: {0}")]
    Midi(#[from] timbre_midi::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
