//! Synthesis core for timbre.
//!
//! Plays MIDI through the in-memory sound bank graph of `timbre-bank`:
//!
//! - **[`Synthesizer`]** - channels, voice pool, scheduler and effect slots behind one MIDI surface
//! - **[`MidiChannel`]** - controller tables, RPN/NRPN, drum and tuning state
//! - **[`Voice`]** / **[`VoicePool`]** / **[`VoiceCache`]** - preallocated voices, stealing and template caching
//! - **[`EventScheduler`]** - timestamped events drained at quantum boundaries
//! - **[`BankStackHandle`]** - publish a replacement bank stack from another thread
//! - **[`SynthEvent`]** - notifications over a bounded channel
//! - **[`SynthesizerSnapshot`]** - save and restore channel and master state
//!
//! # Quick Start
//!
//! ```ignore
//! use timbre_synth::{SynthConfig, Synthesizer};
//!
//! let mut synth = Synthesizer::new(SynthConfig::default(), stack)?;
//! synth.process_message(&[0x90, 60, 100], 0, false, None);
//!
//! let mut left = vec![0.0; 512];
//! let mut right = vec![0.0; 512];
//! synth.render(&mut left, &mut right);
//! ```

pub mod bank_handle;
pub mod channel;
pub mod config;
pub mod dsp;
pub mod effects;
pub mod error;
pub mod events;
pub mod master;
pub mod modulation;
pub mod portamento;
pub mod scheduler;
pub mod snapshot;
pub mod synthesizer;
pub mod sysex;
pub mod tuning;
pub mod voice;

pub use error::{Error, Result};

pub use bank_handle::BankStackHandle;
pub use channel::{
    ChannelVibrato, CustomController, DrumKeyParameters, DrumParameter, MidiChannel,
    VELOCITY_OVERRIDE,
};
pub use config::SynthConfig;
pub use dsp::InterpolationType;
pub use effects::EffectProcessor;
pub use events::SynthEvent;
pub use master::{MasterParameter, MasterParameters};
pub use scheduler::EventScheduler;
pub use snapshot::{ChannelSnapshot, SynthesizerSnapshot};
pub use synthesizer::{MissingPresetCallback, Synthesizer, MAX_CHANNELS};
pub use tuning::KeyTuning;
pub use voice::{Voice, VoiceCache, VoicePool, VoiceState, VoiceTemplate};
