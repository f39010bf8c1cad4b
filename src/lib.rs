//! # Timbre - SoundFont MIDI Synthesizer
//!
//! Real-time sample-based synthesis driven by MIDI.
//!
//! ## Architecture
//!
//! Timbre is an umbrella crate that coordinates:
//! - **timbre-midi** - MIDI subsystem (wire decoding, typed events, timestamped input queue)
//! - **timbre-bank** - Sound bank graph (presets, instruments, zones, samples, bank stack, zone resolver)
//! - **timbre-synth** - Synthesis core (channels, voices, rendering pipeline, scheduler, SysEx)
//!
//! Sound banks are built in memory by an external loader; no file format is parsed here.
//!
//! ## Quick Start
//!
//! ```ignore
//! use timbre::prelude::*;
//!
//! let mut synth = SynthBuilder::new()
//!     .sample_rate(48000.0)
//!     .bank("gm", bank)
//!     .build()?;
//!
//! synth.note_on(0, 60, 100);
//!
//! let mut left = vec![0.0; 512];
//! let mut right = vec![0.0; 512];
//! synth.render(&mut left, &mut right);
//! ```

pub use timbre_bank as bank;
pub use timbre_midi as midi;
pub use timbre_synth as synth;

pub use timbre_bank::{
    GeneratorType, Instrument, InstrumentZone, LoopMode, MidiPatch, MidiSystem, Modulator,
    Preset, PresetZone, Sample, SoundBank, SoundBankStack,
};
pub use timbre_midi::{midi_input_channel, MidiEvent, MidiInputProducer, MidiMessage, TimedMessage};
pub use timbre_synth::{
    BankStackHandle, EffectProcessor, InterpolationType, KeyTuning, MasterParameter, SynthConfig,
    SynthEvent, Synthesizer, SynthesizerSnapshot,
};

mod builder;
pub mod error;

pub use builder::SynthBuilder;
pub use error::{Error, Result};

/// Convenience prelude for common imports
pub mod prelude {
    pub use crate::{Error, Result, SynthBuilder};

    pub use timbre_bank::{
        GeneratorType, Instrument, InstrumentZone, MidiPatch, MidiSystem, Preset, PresetZone,
        Sample, SoundBank, SoundBankStack,
    };
    pub use timbre_midi::{cc, midi_input_channel, MidiEvent, TimedMessage};
    pub use timbre_synth::{
        EffectProcessor, InterpolationType, MasterParameter, SynthConfig, SynthEvent, Synthesizer,
    };
}
