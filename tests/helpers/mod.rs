//! Test helpers and fixtures for timbre integration tests.
//!
//! Sound banks are built in memory from generated sine samples, so no
//! SoundFont file is needed.

#![allow(dead_code)]

pub mod tolerances;

use std::sync::Arc;
use timbre::prelude::*;

pub const TEST_SAMPLE_RATE: f64 = 48000.0;

/// Standard buffer size for deterministic testing
pub const TEST_BUFFER_SIZE: usize = 512;

/// One second of a looping sine at `frequency`, recorded at `key`.
pub fn sine_sample(frequency: f32, key: u8) -> Arc<Sample> {
    let rate = TEST_SAMPLE_RATE as u32;
    let audio: Vec<f32> = (0..rate as usize)
        .map(|i| (i as f32 * frequency * std::f32::consts::TAU / rate as f32).sin() * 0.5)
        .collect();
    let len = audio.len();
    Arc::new(
        Sample::new("sine", rate, audio)
            .with_original_key(key)
            .with_loop(0, len),
    )
}

pub fn looping_preset(name: &str, patch: MidiPatch) -> Preset {
    let zone = InstrumentZone::new(sine_sample(440.0, 69))
        .with_generator(GeneratorType::SampleModes, 1);
    let instrument = Arc::new(Instrument::new(name).with_zone(zone));
    Preset::new(name, patch).with_zone(PresetZone::new(instrument))
}

/// Piano at 0:0:0, organ at 0:0:16 and a standard drum kit.
pub fn gm_bank() -> SoundBank {
    SoundBank::new("gm")
        .with_preset(looping_preset("Piano", MidiPatch::new(0, 0, 0)))
        .with_preset(looping_preset("Organ", MidiPatch::new(0, 0, 16)))
        .with_preset(looping_preset("Standard", MidiPatch::drum(0)))
}

/// Route `tracing` output through the test harness. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

/// Build a synthesizer loaded with [`gm_bank`].
pub fn test_synth() -> Synthesizer {
    init_tracing();
    SynthBuilder::new()
        .sample_rate(TEST_SAMPLE_RATE)
        .bank("gm", gm_bank())
        .build()
        .expect("Failed to create test synthesizer")
}

pub fn render(synth: &mut Synthesizer, frames: usize) -> (Vec<f32>, Vec<f32>) {
    let mut left = vec![0.0; frames];
    let mut right = vec![0.0; frames];
    synth.render(&mut left, &mut right);
    (left, right)
}

/// Calculate RMS of a signal.
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum_sq: f32 = samples.iter().map(|s| s * s).sum();
    (sum_sq / samples.len() as f32).sqrt()
}

/// Calculate peak amplitude of a signal.
pub fn peak(samples: &[f32]) -> f32 {
    samples
        .iter()
        .map(|s| s.abs())
        .fold(0.0_f32, |a, b| a.max(b))
}

pub fn is_silent(samples: &[f32]) -> bool {
    peak(samples) < tolerances::SILENCE_THRESHOLD
}
