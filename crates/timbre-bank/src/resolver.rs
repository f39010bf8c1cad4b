//! Zone resolution: (preset, key, velocity) to voice parameters.
//!
//! Pure and deterministic. Output order is preset zone order, and within each
//! preset zone, instrument zone order; voice layering downstream relies on it.

use std::sync::Arc;

use crate::generator::{merge_generators, Generator};
use crate::modulator::{combine_modulators, merge_modulators, Modulator};
use crate::preset::Preset;
use crate::sample::Sample;

/// Everything needed to start one voice.
#[derive(Debug, Clone)]
pub struct VoiceParameters {
    /// Instrument zone generators with the instrument global zone merged in.
    pub instrument_generators: Vec<Generator>,
    /// Preset zone generators with the preset global zone merged in (additive).
    pub preset_generators: Vec<Generator>,
    /// Combined instrument, default and preset modulators.
    pub modulators: Vec<Modulator>,
    pub sample: Arc<Sample>,
}

impl PartialEq for VoiceParameters {
    fn eq(&self, other: &Self) -> bool {
        self.instrument_generators == other.instrument_generators
            && self.preset_generators == other.preset_generators
            && self.modulators == other.modulators
            && Arc::ptr_eq(&self.sample, &other.sample)
    }
}

/// Resolve the voices `preset` plays for `key` at `velocity`.
///
/// Zones out of range, zones without an instrument and instrument zones
/// without a sample contribute nothing; an empty result is a silent note.
pub fn resolve(preset: &Preset, key: u8, velocity: u8) -> Vec<VoiceParameters> {
    let preset_global = &preset.global_zone;
    let mut voices = Vec::new();

    for preset_zone in &preset.zones {
        if !preset_zone.matches(preset_global, key, velocity) {
            continue;
        }
        let Some(instrument) = &preset_zone.link else {
            continue;
        };

        let preset_generators =
            merge_generators(&preset_zone.generators, &preset_global.generators);
        let preset_modulators =
            merge_modulators(&preset_zone.modulators, &preset_global.modulators);

        let instrument_global = &instrument.global_zone;
        for instrument_zone in &instrument.zones {
            if !instrument_zone.matches(instrument_global, key, velocity) {
                continue;
            }
            let Some(sample) = &instrument_zone.link else {
                continue;
            };

            let instrument_generators =
                merge_generators(&instrument_zone.generators, &instrument_global.generators);
            let instrument_modulators = merge_modulators(
                &merge_modulators(&instrument_zone.modulators, &instrument_global.modulators),
                &preset.default_modulators,
            );

            voices.push(VoiceParameters {
                instrument_generators,
                preset_generators: preset_generators.clone(),
                modulators: combine_modulators(&instrument_modulators, &preset_modulators),
                sample: sample.clone(),
            });
        }
    }

    voices
}
