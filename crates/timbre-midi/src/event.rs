//! Typed MIDI channel voice events with audio-time timestamps.

use midi_msg::{Channel, ChannelVoiceMsg, MidiMsg};

use crate::queue::TimedMessage;

/// Channel voice event scheduled at an absolute audio time in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MidiEvent {
    /// Audio time in seconds at which the event should take effect.
    pub time: f64,
    pub channel: Channel,
    pub msg: ChannelVoiceMsg,
}

impl MidiEvent {
    #[inline]
    pub fn new(time: f64, channel: Channel, msg: ChannelVoiceMsg) -> Self {
        Self { time, channel, msg }
    }

    #[inline]
    pub fn note_on_builder(note: u8, velocity: u8) -> MidiEventBuilder {
        MidiEventBuilder::new(ChannelVoiceMsg::NoteOn { note, velocity })
    }

    #[inline]
    pub fn note_off_builder(note: u8) -> MidiEventBuilder {
        MidiEventBuilder::new(ChannelVoiceMsg::NoteOff { note, velocity: 0 })
    }

    #[inline]
    pub fn cc_builder(control: u8, value: u8) -> MidiEventBuilder {
        MidiEventBuilder::new(ChannelVoiceMsg::ControlChange {
            control: midi_msg::ControlChange::CC { control, value },
        })
    }

    #[inline]
    pub fn bend_builder(bend: u16) -> MidiEventBuilder {
        MidiEventBuilder::new(ChannelVoiceMsg::PitchBend { bend })
    }

    #[inline]
    pub fn program_builder(program: u8) -> MidiEventBuilder {
        MidiEventBuilder::new(ChannelVoiceMsg::ProgramChange { program })
    }

    #[inline]
    pub fn note_on(time: f64, channel: u8, note: u8, velocity: u8) -> Self {
        Self::new(
            time,
            Channel::from_u8(channel),
            ChannelVoiceMsg::NoteOn { note, velocity },
        )
    }

    #[inline]
    pub fn note_off(time: f64, channel: u8, note: u8) -> Self {
        Self::new(
            time,
            Channel::from_u8(channel),
            ChannelVoiceMsg::NoteOff { note, velocity: 0 },
        )
    }

    #[inline]
    pub fn control_change(time: f64, channel: u8, cc: u8, value: u8) -> Self {
        Self::new(
            time,
            Channel::from_u8(channel),
            ChannelVoiceMsg::ControlChange {
                control: midi_msg::ControlChange::CC { control: cc, value },
            },
        )
    }

    #[inline]
    pub fn program_change(time: f64, channel: u8, program: u8) -> Self {
        Self::new(
            time,
            Channel::from_u8(channel),
            ChannelVoiceMsg::ProgramChange { program },
        )
    }

    #[inline]
    pub fn pitch_bend(time: f64, channel: u8, bend: u16) -> Self {
        Self::new(
            time,
            Channel::from_u8(channel),
            ChannelVoiceMsg::PitchBend { bend },
        )
    }

    #[inline]
    pub fn channel_num(&self) -> u8 {
        self.channel as u8
    }

    #[inline]
    pub fn is_note_on(&self) -> bool {
        matches!(self.msg, ChannelVoiceMsg::NoteOn { velocity, .. } if velocity > 0)
    }

    #[inline]
    pub fn is_note_off(&self) -> bool {
        matches!(
            self.msg,
            ChannelVoiceMsg::NoteOff { .. } | ChannelVoiceMsg::NoteOn { velocity: 0, .. }
        )
    }

    #[inline]
    pub fn note(&self) -> Option<u8> {
        match self.msg {
            ChannelVoiceMsg::NoteOn { note, .. }
            | ChannelVoiceMsg::NoteOff { note, .. }
            | ChannelVoiceMsg::PolyPressure { note, .. } => Some(note),
            _ => None,
        }
    }

    #[inline]
    pub fn to_midi_msg(&self) -> MidiMsg {
        MidiMsg::ChannelVoice {
            channel: self.channel,
            msg: self.msg,
        }
    }

    /// Encode as MIDI 1.0 bytes.
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_midi_msg().to_midi()
    }

    /// Wrap as a queue message for the synthesizer's input channel.
    pub fn to_timed(&self, channel_offset: usize) -> TimedMessage {
        TimedMessage::new(self.time, &self.to_bytes()).with_channel_offset(channel_offset)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MidiEventBuilder {
    time: f64,
    channel: u8,
    msg: ChannelVoiceMsg,
}

impl MidiEventBuilder {
    #[inline]
    fn new(msg: ChannelVoiceMsg) -> Self {
        Self {
            time: 0.0,
            channel: 0,
            msg,
        }
    }

    #[inline]
    pub fn channel(mut self, channel: u8) -> Self {
        self.channel = channel;
        self
    }

    #[inline]
    pub fn at(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    #[inline]
    pub fn build(self) -> MidiEvent {
        MidiEvent {
            time: self.time,
            channel: Channel::from_u8(self.channel),
            msg: self.msg,
        }
    }
}
