//! Per-key drum parameters (GS drum NRPNs and direct API).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrumKeyParameters {
    /// Pitch offset in cents.
    pub pitch: f64,
    /// Linear gain.
    pub gain: f64,
    /// Overrides the zone's exclusive class when non-zero.
    pub exclusive_class: u8,
    /// MIDI pan, 64 = use the zone's pan.
    pub pan: u8,
    pub reverb_gain: f64,
    pub chorus_gain: f64,
    pub rx_note_on: bool,
    pub rx_note_off: bool,
}

impl Default for DrumKeyParameters {
    fn default() -> Self {
        Self {
            pitch: 0.0,
            gain: 1.0,
            exclusive_class: 0,
            pan: 64,
            reverb_gain: 1.0,
            chorus_gain: 1.0,
            rx_note_on: true,
            rx_note_off: true,
        }
    }
}

impl DrumKeyParameters {
    /// Pan override in SF2 units, or `None` when centered (zone pan applies).
    pub fn pan_override(&self) -> Option<f64> {
        (self.pan != 64).then(|| (f64::from(self.pan) - 64.0) / 64.0 * 500.0)
    }
}

/// Selects one field of [`DrumKeyParameters`] for a setter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DrumParameter {
    Pitch(f64),
    Gain(f64),
    ExclusiveClass(u8),
    Pan(u8),
    ReverbGain(f64),
    ChorusGain(f64),
    ReceiveNoteOn(bool),
    ReceiveNoteOff(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrumParameters {
    keys: Vec<DrumKeyParameters>,
}

impl Default for DrumParameters {
    fn default() -> Self {
        Self {
            keys: vec![DrumKeyParameters::default(); 128],
        }
    }
}

impl DrumParameters {
    #[inline]
    pub fn key(&self, key: u8) -> &DrumKeyParameters {
        &self.keys[usize::from(key & 0x7F)]
    }

    pub fn set(&mut self, key: u8, parameter: DrumParameter) {
        let entry = &mut self.keys[usize::from(key & 0x7F)];
        match parameter {
            DrumParameter::Pitch(cents) => entry.pitch = cents,
            DrumParameter::Gain(gain) => entry.gain = gain.max(0.0),
            DrumParameter::ExclusiveClass(class) => entry.exclusive_class = class,
            DrumParameter::Pan(pan) => entry.pan = pan.min(127),
            DrumParameter::ReverbGain(gain) => entry.reverb_gain = gain.max(0.0),
            DrumParameter::ChorusGain(gain) => entry.chorus_gain = gain.max(0.0),
            DrumParameter::ReceiveNoteOn(rx) => entry.rx_note_on = rx,
            DrumParameter::ReceiveNoteOff(rx) => entry.rx_note_off = rx,
        }
    }

    pub fn keys(&self) -> &[DrumKeyParameters] {
        &self.keys
    }

    /// Replace all keys (snapshot restore); extra entries are ignored.
    pub fn load(&mut self, keys: &[DrumKeyParameters]) {
        for (slot, key) in self.keys.iter_mut().zip(keys) {
            *slot = *key;
        }
    }

    pub fn reset(&mut self) {
        self.keys.fill(DrumKeyParameters::default());
    }
}
