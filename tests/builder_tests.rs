//! SynthBuilder tests
//!
//! Run with:
//! ```bash
//! cargo test -p timbre --test builder_tests
//! ```

mod helpers;

use approx::assert_relative_eq;

use helpers::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use timbre::prelude::*;

#[test]
fn test_builder_defaults() {
    let synth = SynthBuilder::new().build().unwrap();
    assert_eq!(synth.config().sample_rate, 44100.0);
    assert_eq!(synth.channel_count(), 16);
    assert!(synth.bank_stack().is_empty());
}

#[test]
fn test_builder_applies_config() {
    let synth = SynthBuilder::new()
        .sample_rate(TEST_SAMPLE_RATE)
        .quantum_size(64)
        .voices(24)
        .channels(32)
        .initial_time(2.0)
        .effects(false)
        .build()
        .unwrap();
    let config = synth.config();
    assert_eq!(config.sample_rate, TEST_SAMPLE_RATE);
    assert_eq!(config.quantum_size, 64);
    assert_eq!(config.voice_capacity, 24);
    assert!(!config.enable_effects);
    assert_eq!(synth.channel_count(), 32);
    assert_eq!(synth.current_time(), 2.0);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let result = SynthBuilder::new().sample_rate(100.0).build();
    assert!(matches!(result, Err(Error::Synth(_))));

    let result = SynthBuilder::new().voices(0).build();
    assert!(result.is_err());
}

#[test]
fn test_builder_loads_banks() {
    let synth = test_synth();
    assert_eq!(synth.bank_stack().len(), 1);
    let preset = synth.channel(0).unwrap().preset().unwrap();
    assert_eq!(preset.name, "Piano");
    let drums = synth.channel(9).unwrap().preset().unwrap();
    assert_eq!(drums.name, "Standard");
}

#[test]
fn test_later_bank_takes_priority() {
    let overlay = SoundBank::new("overlay")
        .with_preset(looping_preset("Bright Piano", MidiPatch::new(0, 0, 0)));
    let synth = SynthBuilder::new()
        .bank("gm", gm_bank())
        .shared_bank("overlay", Arc::new(overlay), 0)
        .build()
        .unwrap();
    assert_eq!(synth.bank_stack().len(), 2);
    assert_eq!(synth.channel(0).unwrap().preset().unwrap().name, "Bright Piano");
    // Organ only exists in the lower bank.
    let mut synth = synth;
    synth.program_change(0, 16);
    assert_eq!(synth.channel(0).unwrap().preset().unwrap().name, "Organ");
}

#[test]
fn test_builder_midi_system_and_parameters() {
    let synth = SynthBuilder::new()
        .bank("gm", gm_bank())
        .midi_system(MidiSystem::Xg)
        .parameter(MasterParameter::Gain(0.5))
        .parameter(MasterParameter::VoiceCap(4))
        .build()
        .unwrap();
    assert_eq!(synth.master().midi_system, MidiSystem::Xg);
    assert_relative_eq!(synth.master().gain, 0.5);
    assert_eq!(synth.channel(0).unwrap().preset().unwrap().name, "Piano");
}

/// Adds nothing to the mix and counts how often it ran.
struct CountingProcessor {
    inputs: Vec<Vec<f32>>,
    calls: Arc<AtomicUsize>,
}

impl CountingProcessor {
    fn boxed(channels: usize, calls: &Arc<AtomicUsize>) -> Box<dyn EffectProcessor> {
        Box::new(Self {
            inputs: vec![Vec::new(); channels],
            calls: calls.clone(),
        })
    }
}

impl EffectProcessor for CountingProcessor {
    fn inputs_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.inputs
    }

    fn process(&mut self, _quantum: usize, _out_left: &mut [f32], _out_right: &mut [f32]) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn test_builder_installs_effects() {
    let reverb_calls = Arc::new(AtomicUsize::new(0));
    let chorus_calls = Arc::new(AtomicUsize::new(0));
    let mut synth = SynthBuilder::new()
        .sample_rate(TEST_SAMPLE_RATE)
        .bank("gm", gm_bank())
        .quantum_size(128)
        .reverb(CountingProcessor::boxed(1, &reverb_calls))
        .chorus(CountingProcessor::boxed(2, &chorus_calls))
        .build()
        .unwrap();
    synth.note_on(0, 69, 100);
    let (left, right) = render(&mut synth, TEST_BUFFER_SIZE);
    assert!(rms(&left) > tolerances::AUDIBLE_THRESHOLD);
    assert!(rms(&right) > tolerances::AUDIBLE_THRESHOLD);
    assert_eq!(reverb_calls.load(Ordering::Relaxed), 4);
    assert_eq!(chorus_calls.load(Ordering::Relaxed), 4);
}
