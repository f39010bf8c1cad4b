//! Sound bank data model for timbre.
//!
//! The in-memory SoundFont graph an external loader fills in, plus the pieces
//! that only walk it:
//!
//! - **[`Generator`]** / **[`Modulator`]** - SF2 parameter values and controller mappings
//! - **[`Preset`]** / **[`Instrument`]** / **[`Zone`]** / **[`Sample`]** - the bank graph
//! - **[`resolve`]** - zone resolution from (preset, key, velocity) to [`VoiceParameters`]
//! - **[`SoundBankStack`]** - prioritized banks with preset fallback
//!
//! No file format is parsed here.

pub mod bank;
pub mod error;
pub mod generator;
pub mod modulator;
pub mod patch;
pub mod preset;
pub mod resolver;
pub mod sample;
pub mod stack;
pub mod zone;

pub use bank::SoundBank;
pub use error::{Error, Result};
pub use generator::{merge_generators, Generator, GeneratorLimits, GeneratorType, GENERATOR_COUNT};
pub use modulator::{
    combine_modulators, default_modulators, general, merge_modulators, Modulator,
    ModulatorCurve, ModulatorSource, ModulatorTransform, RESONANCE_MODULATOR,
};
pub use patch::{is_xg_drum_bank, MidiPatch, MidiSystem};
pub use preset::{Instrument, Preset};
pub use resolver::{resolve, VoiceParameters};
pub use sample::{LoopMode, Sample};
pub use stack::SoundBankStack;
pub use zone::{InstrumentZone, KeyRange, PresetZone, Zone};
