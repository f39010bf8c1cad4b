//! Voice templates: resolved zone parameters ready to start a voice.

use std::sync::Arc;

use timbre_bank::{
    GeneratorType, LoopMode, Modulator, Sample, VoiceParameters, GENERATOR_COUNT,
    RESONANCE_MODULATOR,
};

/// Address generators address 32768-frame blocks in their coarse variant.
const COARSE_OFFSET_FRAMES: i64 = 32768;

/// One layer of a note: base generator values, modulators and sample playback data.
#[derive(Debug, Clone)]
pub struct VoiceTemplate {
    /// Instrument values (or defaults) with preset offsets added, clamped to limits.
    pub generators: [i16; GENERATOR_COUNT],
    pub modulators: Vec<Modulator>,
    pub sample: Arc<Sample>,
    pub audio: Arc<[f32]>,
    pub root_key: u8,
    /// Key forced by the `keynum` generator.
    pub target_key: Option<u8>,
    /// Velocity forced by the `velocity` generator.
    pub velocity: Option<u8>,
    pub exclusive_class: u8,
    pub loop_mode: LoopMode,
    pub start: usize,
    pub end: usize,
    pub loop_start: usize,
    pub loop_end: usize,
    /// Sample frames per output frame at the root key.
    pub playback_rate: f64,
    /// Sample pitch correction in cents.
    pub pitch_correction: f64,
    /// Filter Q the resonance modulator adds at the controller's default value.
    pub resonance_offset: f64,
}

fn offset_address(base: usize, fine: i16, coarse: i16) -> i64 {
    base as i64 + i64::from(fine) + i64::from(coarse) * COARSE_OFFSET_FRAMES
}

impl VoiceTemplate {
    /// Build a template from resolved parameters.
    ///
    /// Returns `None` when the sample has no decoded audio.
    pub fn new(parameters: &VoiceParameters, output_sample_rate: f64) -> Option<Self> {
        let audio = parameters.sample.audio_data()?.clone();
        if audio.is_empty() {
            return None;
        }

        let mut generators = [0i16; GENERATOR_COUNT];
        for ty in GeneratorType::ALL {
            generators[ty.index()] = ty.default_value();
        }
        for generator in &parameters.instrument_generators {
            generators[generator.ty.index()] = generator.ty.clamp(i32::from(generator.value));
        }
        for generator in &parameters.preset_generators {
            if generator.ty.is_instrument_only() {
                continue;
            }
            let index = generator.ty.index();
            generators[index] = generator
                .ty
                .clamp(i32::from(generators[index]) + i32::from(generator.value));
        }
        let g = |ty: GeneratorType| generators[ty.index()];

        let sample = &parameters.sample;
        let length = audio.len() as i64;
        let start = offset_address(
            0,
            g(GeneratorType::StartAddrsOffset),
            g(GeneratorType::StartAddrsCoarseOffset),
        )
        .clamp(0, length - 1);
        let end = offset_address(
            audio.len(),
            g(GeneratorType::EndAddrOffset),
            g(GeneratorType::EndAddrsCoarseOffset),
        )
        .clamp(start + 1, length);
        let loop_start = offset_address(
            sample.loop_start,
            g(GeneratorType::StartloopAddrsOffset),
            g(GeneratorType::StartloopAddrsCoarseOffset),
        )
        .clamp(0, length);
        let loop_end = offset_address(
            sample.loop_end,
            g(GeneratorType::EndloopAddrsOffset),
            g(GeneratorType::EndloopAddrsCoarseOffset),
        )
        .clamp(loop_start, length);

        let root_key = match g(GeneratorType::OverridingRootKey) {
            key @ 0..=127 => key as u8,
            _ => sample.original_key,
        };
        let forced = |value: i16| u8::try_from(value).ok().filter(|v| *v <= 127);

        let resonance_offset = parameters
            .modulators
            .iter()
            .find(|m| m.is_identical(&RESONANCE_MODULATOR))
            .map_or(0.0, |m| (f64::from(m.amount) / 2.0).max(0.0));

        Some(Self {
            generators,
            modulators: parameters.modulators.clone(),
            sample: sample.clone(),
            audio,
            root_key,
            target_key: forced(g(GeneratorType::KeyNum)),
            velocity: forced(g(GeneratorType::Velocity)),
            exclusive_class: u8::try_from(g(GeneratorType::ExclusiveClass)).unwrap_or(0),
            loop_mode: LoopMode::from_generator(g(GeneratorType::SampleModes)),
            start: start as usize,
            end: end as usize,
            loop_start: loop_start as usize,
            loop_end: loop_end as usize,
            playback_rate: f64::from(sample.sample_rate) / output_sample_rate,
            pitch_correction: f64::from(sample.pitch_correction),
            resonance_offset,
        })
    }

    #[inline]
    pub fn generator(&self, ty: GeneratorType) -> i16 {
        self.generators[ty.index()]
    }
}
