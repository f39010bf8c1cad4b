//! Decoding of raw MIDI 1.0 byte streams.
//!
//! Unlike [`MidiEvent`](crate::MidiEvent), which only models channel voice
//! messages, [`MidiMessage`] also covers System Exclusive and System Reset so the
//! synthesizer can dispatch every message it accepts from a single match.

use crate::error::{Error, Result};

/// Status byte constants (upper nibble for channel messages).
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_PRESSURE: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_PRESSURE: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;
    pub const SYSTEM_EXCLUSIVE: u8 = 0xF0;
    pub const END_OF_EXCLUSIVE: u8 = 0xF7;
    pub const SYSTEM_RESET: u8 = 0xFF;
}

/// A decoded MIDI message borrowing its SysEx payload from the input buffer.
///
/// `channel` is the raw status nibble (0-15); callers add their own channel offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MidiMessage<'a> {
    NoteOff { channel: u8, note: u8, velocity: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    PolyPressure { channel: u8, note: u8, pressure: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
    ProgramChange { channel: u8, program: u8 },
    ChannelPressure { channel: u8, pressure: u8 },
    /// 14-bit bend value, 8192 = center.
    PitchBend { channel: u8, value: u16 },
    /// SysEx body without the leading `F0` and trailing `F7`.
    SystemExclusive(&'a [u8]),
    SystemReset,
    /// A message the synthesizer ignores (clock, song position, ...).
    Other(u8),
}

impl<'a> MidiMessage<'a> {
    /// Decode a single complete message.
    pub fn parse(bytes: &'a [u8]) -> Result<Self> {
        let &status_byte = bytes.first().ok_or(Error::Empty)?;
        if status_byte < 0x80 {
            return Err(Error::MissingStatus(status_byte));
        }

        if status_byte >= 0xF0 {
            return Ok(match status_byte {
                status::SYSTEM_EXCLUSIVE => {
                    let body = &bytes[1..];
                    let body = match body.last() {
                        Some(&status::END_OF_EXCLUSIVE) => &body[..body.len() - 1],
                        _ => body,
                    };
                    MidiMessage::SystemExclusive(body)
                }
                status::SYSTEM_RESET => MidiMessage::SystemReset,
                other => MidiMessage::Other(other),
            });
        }

        let kind = status_byte & 0xF0;
        let channel = status_byte & 0x0F;
        let expected = Self::data_len(kind) + 1;
        if bytes.len() < expected {
            return Err(Error::Truncated {
                status: status_byte,
                expected,
                actual: bytes.len(),
            });
        }
        let d1 = bytes[1] & 0x7F;
        let d2 = bytes.get(2).map_or(0, |b| b & 0x7F);

        Ok(match kind {
            status::NOTE_OFF => MidiMessage::NoteOff {
                channel,
                note: d1,
                velocity: d2,
            },
            status::NOTE_ON => MidiMessage::NoteOn {
                channel,
                note: d1,
                velocity: d2,
            },
            status::POLY_PRESSURE => MidiMessage::PolyPressure {
                channel,
                note: d1,
                pressure: d2,
            },
            status::CONTROL_CHANGE => MidiMessage::ControlChange {
                channel,
                controller: d1,
                value: d2,
            },
            status::PROGRAM_CHANGE => MidiMessage::ProgramChange {
                channel,
                program: d1,
            },
            status::CHANNEL_PRESSURE => MidiMessage::ChannelPressure {
                channel,
                pressure: d1,
            },
            _ => MidiMessage::PitchBend {
                channel,
                value: (u16::from(d2) << 7) | u16::from(d1),
            },
        })
    }

    /// Number of data bytes following a channel status nibble.
    #[inline]
    fn data_len(kind: u8) -> usize {
        match kind {
            status::PROGRAM_CHANGE | status::CHANNEL_PRESSURE => 1,
            _ => 2,
        }
    }

    /// Status nibble channel, if this is a channel message.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            MidiMessage::NoteOff { channel, .. }
            | MidiMessage::NoteOn { channel, .. }
            | MidiMessage::PolyPressure { channel, .. }
            | MidiMessage::ControlChange { channel, .. }
            | MidiMessage::ProgramChange { channel, .. }
            | MidiMessage::ChannelPressure { channel, .. }
            | MidiMessage::PitchBend { channel, .. } => Some(channel),
            _ => None,
        }
    }
}
