//! In-memory sound banks for synthesizer tests.

#![allow(dead_code)]

use std::sync::Arc;

use timbre_bank::{
    GeneratorType, Instrument, InstrumentZone, MidiPatch, Preset, PresetZone, Sample, SoundBank,
    SoundBankStack,
};
use timbre_synth::{SynthConfig, Synthesizer};

pub const SAMPLE_RATE: u32 = 44100;

/// One second of a looping 440 Hz sine recorded at key 69.
pub fn sine_sample() -> Arc<Sample> {
    let audio = (0..SAMPLE_RATE as usize)
        .map(|i| (i as f32 * 440.0 * std::f32::consts::TAU / SAMPLE_RATE as f32).sin() * 0.5)
        .collect::<Vec<_>>();
    let len = audio.len();
    Arc::new(
        Sample::new("sine", SAMPLE_RATE, audio)
            .with_original_key(69)
            .with_loop(0, len),
    )
}

/// A looping instrument with the given extra generators on its only zone.
pub fn instrument(name: &str, generators: &[(GeneratorType, i16)]) -> Arc<Instrument> {
    let zone = generators.iter().fold(
        InstrumentZone::new(sine_sample()).with_generator(GeneratorType::SampleModes, 1),
        |zone, &(ty, value)| zone.with_generator(ty, value),
    );
    Arc::new(Instrument::new(name).with_zone(zone))
}

pub fn preset(name: &str, patch: MidiPatch, generators: &[(GeneratorType, i16)]) -> Preset {
    Preset::new(name, patch).with_zone(PresetZone::new(instrument(name, generators)))
}

/// Two-zone instrument: the global zone sets pan 0, keys 0-63 pan -50, keys 64-127 inherit.
pub fn split_pan_preset() -> Preset {
    let sample = sine_sample();
    let instrument = Instrument::new("split")
        .with_global_zone(
            InstrumentZone::global()
                .with_generator(GeneratorType::Pan, 0)
                .with_generator(GeneratorType::SampleModes, 1),
        )
        .with_zone(
            InstrumentZone::new(sample.clone())
                .with_key_range(0, 63)
                .with_generator(GeneratorType::Pan, -50),
        )
        .with_zone(InstrumentZone::new(sample).with_key_range(64, 127));
    Preset::new("Split", MidiPatch::new(0, 0, 0)).with_zone(PresetZone::new(Arc::new(instrument)))
}

/// A small GM-style bank: piano, strings and a drum kit.
pub fn gm_stack() -> SoundBankStack {
    SoundBankStack::new().with_bank(
        "gm",
        SoundBank::new("gm")
            .with_preset(preset("Piano", MidiPatch::new(0, 0, 0), &[]))
            .with_preset(preset("Strings", MidiPatch::new(0, 0, 48), &[]))
            .with_preset(preset("Standard", MidiPatch::drum(0), &[])),
    )
}

pub fn single_preset_stack(preset: Preset) -> SoundBankStack {
    SoundBankStack::new().with_bank("single", SoundBank::new("single").with_preset(preset))
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn synth_with(stack: SoundBankStack, voice_capacity: usize) -> Synthesizer {
    init_tracing();
    let config = SynthConfig {
        voice_capacity,
        ..SynthConfig::default()
    };
    Synthesizer::new(config, stack).expect("valid config")
}

pub fn synth() -> Synthesizer {
    synth_with(gm_stack(), 32)
}

pub fn render(synth: &mut Synthesizer, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    synth.render(&mut left, &mut right);
    (left, right)
}

pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}
