//! Centralized error type for the timbre umbrella crate.
//!
//! Wraps all subsystem errors so `?` propagates naturally across crate boundaries.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Synth: {0}")]
    Synth(#[from] timbre_synth::Error),

    #[error("Sound bank: {0}")]
    Bank(#[from] timbre_bank::Error),

    #[error("MIDI: {0}")]
    Midi(#[from] timbre_midi::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
