//! MIDI subsystem for timbre.
//!
//! - **[`MidiMessage`]** - zero-copy decoding of MIDI 1.0 byte streams
//! - **[`MidiEvent`]** - typed, timestamped channel voice events built on `midi-msg`
//! - **[`midi_input_channel`]** - lock-free timestamped queue from a producer thread to the render thread
//! - **[`cc`]** - controller number constants

pub mod cc;
pub mod error;
pub mod event;
pub mod message;
pub mod queue;

pub use error::{Error, Result};
pub use event::{MidiEvent, MidiEventBuilder};
pub use message::{status, MidiMessage};
pub use queue::{
    midi_input_channel, midi_input_channel_with_capacity, MidiInputConsumer, MidiInputProducer,
    TimedMessage,
};

/// Re-export midi-msg types used in the public API.
pub use midi_msg::{Channel, ChannelVoiceMsg, ControlChange};
