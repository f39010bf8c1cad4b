//! Save and restore of channel and master state.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelVibrato, CustomController, DrumKeyParameters};
use crate::master::MasterParameters;
use crate::synthesizer::Synthesizer;
use crate::tuning::KeyTuning;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    /// Raw controller table, CCs followed by the extended source slots.
    pub controllers: Vec<i16>,
    pub locked: Vec<bool>,
    /// Custom controllers in [`CustomController::ALL`] order.
    pub custom: Vec<f64>,
    pub drum_params: Vec<DrumKeyParameters>,
    pub octave_tuning: [i8; 12],
    pub vibrato: ChannelVibrato,
    pub program: u8,
    pub is_drum: bool,
    pub lock_preset: bool,
    pub muted: bool,
    pub velocity_override: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesizerSnapshot {
    pub master: MasterParameters,
    pub channels: Vec<ChannelSnapshot>,
    /// (program, key, tuning) for every tuned key.
    pub key_tunings: Vec<(u8, u8, KeyTuning)>,
}

impl Synthesizer {
    pub fn snapshot(&self) -> SynthesizerSnapshot {
        let channels = (0..self.channel_count())
            .filter_map(|index| self.channel(index))
            .map(|ch| ChannelSnapshot {
                controllers: ch.controllers.values().to_vec(),
                locked: ch.controllers.locked().to_vec(),
                custom: CustomController::ALL
                    .iter()
                    .map(|&controller| ch.custom.get(controller))
                    .collect(),
                drum_params: ch.drum_params.keys().to_vec(),
                octave_tuning: ch.octave_tuning,
                vibrato: ch.vibrato,
                program: ch.program,
                is_drum: ch.is_drum,
                lock_preset: ch.lock_preset,
                muted: ch.muted,
                velocity_override: ch.velocity_override,
            })
            .collect();
        SynthesizerSnapshot {
            master: self.master().clone(),
            channels,
            key_tunings: self.key_tunings().collect(),
        }
    }

    /// Restore a snapshot. Missing channels are created; the program and drum
    /// state go through the normal program change path so presets resolve
    /// against the current bank stack.
    pub fn apply_snapshot(&mut self, snapshot: &SynthesizerSnapshot) {
        for parameter in snapshot.master.to_parameters() {
            self.set_master_parameter(parameter);
        }

        for (index, saved) in snapshot.channels.iter().enumerate() {
            while self.channel_count() <= index {
                self.add_channel();
            }
            self.lock_preset(index, false);
            if let Some(ch) = self.channel_mut(index) {
                for (slot, &value) in saved.controllers.iter().enumerate() {
                    ch.controllers.set_raw(slot, value);
                }
                for (&controller, &value) in CustomController::ALL.iter().zip(&saved.custom) {
                    ch.custom.set(controller, value);
                }
                ch.drum_params.load(&saved.drum_params);
                ch.octave_tuning = saved.octave_tuning;
                ch.vibrato = saved.vibrato;
                ch.velocity_override = saved.velocity_override;
            }
            self.program_change(index, saved.program);
            self.set_drums(index, saved.is_drum);
            self.mute_channel(index, saved.muted);
            self.lock_preset(index, saved.lock_preset);
            for (slot, &locked) in saved.locked.iter().enumerate() {
                self.lock_controller(index, slot, locked);
            }
        }

        self.clear_key_tunings();
        for &(program, key, tuning) in &snapshot.key_tunings {
            self.set_key_tuning(program, key, Some(tuning));
        }
    }
}
