//! Engine-wide parameters.

use serde::{Deserialize, Serialize};
use timbre_bank::MidiSystem;

use crate::dsp::InterpolationType;

/// One runtime setting, applied with `Synthesizer::set_master_parameter`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum MasterParameter {
    /// Linear output gain.
    Gain(f64),
    /// -1 (left) to 1 (right).
    Pan(f64),
    /// Usable voices, at most the configured capacity.
    VoiceCap(usize),
    Interpolation(InterpolationType),
    MidiSystem(MidiSystem),
    /// Semitones added to every melodic note; the fractional part tunes in cents.
    Transposition(f64),
    /// Cents added to every voice.
    MasterTuning(f64),
    ReverbGain(f64),
    ChorusGain(f64),
    EffectsEnabled(bool),
    /// SysEx device id to answer to; `None` accepts every device.
    DeviceId(Option<u8>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MasterParameters {
    pub gain: f64,
    pub pan: f64,
    pub voice_cap: usize,
    pub interpolation: InterpolationType,
    pub midi_system: MidiSystem,
    pub transposition: f64,
    pub tuning: f64,
    pub reverb_gain: f64,
    pub chorus_gain: f64,
    pub effects_enabled: bool,
    pub device_id: Option<u8>,
}

impl MasterParameters {
    pub fn new(voice_cap: usize, effects_enabled: bool) -> Self {
        Self {
            gain: 1.0,
            pan: 0.0,
            voice_cap,
            interpolation: InterpolationType::default(),
            midi_system: MidiSystem::default(),
            transposition: 0.0,
            tuning: 0.0,
            reverb_gain: 1.0,
            chorus_gain: 1.0,
            effects_enabled,
            device_id: None,
        }
    }

    /// Store a parameter, clamping it to its valid range.
    pub fn apply(&mut self, parameter: MasterParameter) {
        match parameter {
            MasterParameter::Gain(gain) => self.gain = gain.max(0.0),
            MasterParameter::Pan(pan) => self.pan = pan.clamp(-1.0, 1.0),
            MasterParameter::VoiceCap(cap) => self.voice_cap = cap.max(1),
            MasterParameter::Interpolation(interpolation) => self.interpolation = interpolation,
            MasterParameter::MidiSystem(system) => self.midi_system = system,
            MasterParameter::Transposition(semitones) => self.transposition = semitones,
            MasterParameter::MasterTuning(cents) => self.tuning = cents,
            MasterParameter::ReverbGain(gain) => self.reverb_gain = gain.max(0.0),
            MasterParameter::ChorusGain(gain) => self.chorus_gain = gain.max(0.0),
            MasterParameter::EffectsEnabled(enabled) => self.effects_enabled = enabled,
            MasterParameter::DeviceId(id) => self.device_id = id,
        }
    }

    /// Every parameter as a list, for snapshots.
    pub fn to_parameters(&self) -> [MasterParameter; 11] {
        [
            MasterParameter::Gain(self.gain),
            MasterParameter::Pan(self.pan),
            MasterParameter::VoiceCap(self.voice_cap),
            MasterParameter::Interpolation(self.interpolation),
            MasterParameter::MidiSystem(self.midi_system),
            MasterParameter::Transposition(self.transposition),
            MasterParameter::MasterTuning(self.tuning),
            MasterParameter::ReverbGain(self.reverb_gain),
            MasterParameter::ChorusGain(self.chorus_gain),
            MasterParameter::EffectsEnabled(self.effects_enabled),
            MasterParameter::DeviceId(self.device_id),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_clamps() {
        let mut master = MasterParameters::new(64, true);
        master.apply(MasterParameter::Pan(3.0));
        master.apply(MasterParameter::Gain(-1.0));
        assert_eq!(master.pan, 1.0);
        assert_eq!(master.gain, 0.0);
    }

    #[test]
    fn test_parameters_round_trip() {
        let mut master = MasterParameters::new(64, true);
        master.apply(MasterParameter::MidiSystem(MidiSystem::Xg));
        master.apply(MasterParameter::MasterTuning(-12.0));
        let mut restored = MasterParameters::new(8, false);
        for parameter in master.to_parameters() {
            restored.apply(parameter);
        }
        assert_eq!(restored, master);
    }
}
