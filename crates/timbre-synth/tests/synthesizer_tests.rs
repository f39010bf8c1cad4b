//! Synthesizer behavior driven through the MIDI surface.

mod fixtures;

use std::sync::Arc;

use fixtures::*;
use timbre_bank::{
    GeneratorType, Instrument, InstrumentZone, MidiPatch, MidiSystem, Preset, PresetZone, Sample,
    SoundBankStack,
};
use timbre_midi::{cc, midi_input_channel, TimedMessage};
use timbre_synth::{EffectProcessor, InterpolationType, MasterParameter, SynthEvent};

fn note_on(synth: &mut timbre_synth::Synthesizer, channel: u8, note: u8, velocity: u8) {
    synth.process_message(&[0x90 | channel, note, velocity], 0, false, None);
}

fn note_off(synth: &mut timbre_synth::Synthesizer, channel: u8, note: u8) {
    synth.process_message(&[0x80 | channel, note, 0], 0, false, None);
}

fn control(synth: &mut timbre_synth::Synthesizer, channel: u8, controller: u8, value: u8) {
    synth.process_message(&[0xB0 | channel, controller, value], 0, false, None);
}

fn active_notes(synth: &timbre_synth::Synthesizer) -> Vec<u8> {
    synth
        .voices()
        .iter()
        .filter(|voice| voice.is_active())
        .map(|voice| voice.note)
        .collect()
}

#[test]
fn test_note_on_executes_synchronously() {
    let mut synth = synth();
    note_on(&mut synth, 0, 60, 100);
    assert_eq!(synth.active_voice_count(), 1);

    let (left, right) = render(&mut synth, 1024);
    assert!(rms(&left) > 0.01);
    assert!(rms(&right) > 0.01);
}

#[test]
fn test_zero_velocity_is_note_off() {
    let mut synth = synth();
    note_on(&mut synth, 0, 60, 0);
    assert_eq!(synth.active_voice_count(), 0);

    note_on(&mut synth, 0, 60, 100);
    note_on(&mut synth, 0, 60, 0);
    let voice = synth.voices().iter().find(|v| v.is_active()).unwrap();
    assert!(voice.release_time.is_some());
    assert_eq!(synth.active_voice_count(), 1);
}

#[test]
fn test_scheduled_events_run_in_time_order() {
    let mut synth = synth();
    let events = synth.events();
    for (time, note) in [(0.005, 65), (0.001, 61), (0.003, 63)] {
        synth.process_message(&[0x90, note, 100], 0, false, Some(time));
    }
    assert_eq!(synth.active_voice_count(), 0);
    assert_eq!(synth.pending_events(), 3);

    render(&mut synth, 1024);
    let order: Vec<u8> = events
        .try_iter()
        .filter_map(|event| match event {
            SynthEvent::NoteOn { note, .. } => Some(note),
            _ => None,
        })
        .collect();
    assert_eq!(order, vec![61, 63, 65]);
    assert_eq!(synth.pending_events(), 0);
}

#[test]
fn test_past_time_executes_immediately() {
    let mut synth = synth();
    render(&mut synth, 512);
    synth.process_message(&[0x90, 60, 100], 0, false, Some(0.0));
    assert_eq!(synth.active_voice_count(), 1);
}

#[test]
fn test_input_queue_is_drained_each_quantum() {
    let mut synth = synth();
    let (mut producer, consumer) = midi_input_channel();
    synth.connect_input(consumer);

    assert!(producer.send(TimedMessage::new(0.004, &[0x90, 62, 100])));
    assert!(producer.send(TimedMessage::new(0.0, &[0x90, 60, 100])));
    render(&mut synth, 128);
    assert_eq!(active_notes(&synth), vec![60]);

    render(&mut synth, 256);
    let mut notes = active_notes(&synth);
    notes.sort_unstable();
    assert_eq!(notes, vec![60, 62]);
}

#[test]
fn test_lowest_priority_voice_is_stolen() {
    let mut synth = synth_with(gm_stack(), 4);
    for (note, velocity) in [(60, 100), (61, 20), (62, 100), (63, 100)] {
        note_on(&mut synth, 0, note, velocity);
    }
    assert_eq!(synth.active_voice_count(), 4);

    note_on(&mut synth, 0, 64, 100);
    let mut notes = active_notes(&synth);
    notes.sort_unstable();
    assert_eq!(notes, vec![60, 62, 63, 64]);
}

#[test]
fn test_gm_program_falls_back_to_only_preset() {
    let only = fixtures::preset("Only", MidiPatch::new(0, 0, 0), &[]);
    let mut synth = synth_with(single_preset_stack(only), 8);
    synth.set_master_parameter(MasterParameter::MidiSystem(MidiSystem::Gm));

    synth.process_message(&[0xC0, 0], 0, false, None);
    assert_eq!(synth.channel(0).unwrap().preset().unwrap().name, "Only");
    synth.process_message(&[0xC0, 57], 0, false, None);
    assert_eq!(synth.channel(0).unwrap().preset().unwrap().name, "Only");
}

#[test]
fn test_bank_select_and_program_change() {
    let mut synth = synth();
    let events = synth.events();
    control(&mut synth, 0, cc::BANK_SELECT, 0);
    synth.process_message(&[0xC0, 48], 0, false, None);
    assert_eq!(synth.channel(0).unwrap().preset().unwrap().name, "Strings");
    assert!(events.try_iter().any(|event| matches!(
        event,
        SynthEvent::ProgramChange { channel: 0, program: 48, preset_name: Some(ref name), .. } if name == "Strings"
    )));

    // Channel 10 starts as drums.
    assert_eq!(synth.channel(9).unwrap().preset().unwrap().name, "Standard");
}

#[test]
fn test_locked_preset_ignores_program_change() {
    let mut synth = synth();
    synth.lock_preset(0, true);
    synth.program_change(0, 48);
    assert_eq!(synth.channel(0).unwrap().preset().unwrap().name, "Piano");
}

#[test]
fn test_split_zone_pan_reaches_voice() {
    let mut synth = synth_with(single_preset_stack(split_pan_preset()), 8);
    note_on(&mut synth, 0, 60, 100);
    let voice = synth.voices().iter().find(|v| v.is_active()).unwrap();
    assert_eq!(voice.template().unwrap().generator(GeneratorType::Pan), -50);
    assert_eq!(voice.modulated(GeneratorType::Pan), -50);

    note_on(&mut synth, 0, 70, 100);
    let high = synth
        .voices()
        .iter()
        .find(|v| v.is_active() && v.note == 70)
        .unwrap();
    assert_eq!(high.modulated(GeneratorType::Pan), 0);
}

#[test]
fn test_cache_returns_same_templates_until_bank_changes() {
    let mut synth = synth();
    let piano = synth.channel(0).unwrap().preset().unwrap();
    let patch = MidiPatch::new(0, 0, 0);

    let first = synth.voices_for_preset(&piano, patch, 60, 100);
    let second = synth.voices_for_preset(&piano, patch, 60, 100);
    assert_eq!(first.len(), 1);
    assert!(Arc::ptr_eq(&first, &second));

    let other = synth.voices_for_preset(&piano, patch, 61, 100);
    assert!(!Arc::ptr_eq(&first, &other));

    synth.set_bank_stack(gm_stack());
    let after = synth.voices_for_preset(&piano, patch, 60, 100);
    assert!(!Arc::ptr_eq(&first, &after));
}

#[test]
fn test_published_stack_is_picked_up_before_next_note() {
    let mut synth = synth();
    let events = synth.events();
    let handle = synth.bank_handle();
    let replacement = fixtures::preset("Replacement", MidiPatch::new(0, 0, 0), &[]);
    let generation = handle.publish(single_preset_stack(replacement));

    note_on(&mut synth, 0, 60, 100);
    assert_eq!(
        synth.channel(0).unwrap().preset().unwrap().name,
        "Replacement"
    );
    assert!(events
        .try_iter()
        .any(|event| event == SynthEvent::BankStackChanged { generation }));
}

#[test]
fn test_missing_preset_callback() {
    let mut synth = synth_with(SoundBankStack::new(), 8);
    let events = synth.events();
    assert!(synth.channel(0).unwrap().preset().is_none());

    // No callback: silent, not an error.
    note_on(&mut synth, 0, 60, 100);
    assert_eq!(synth.active_voice_count(), 0);

    let fallback = Arc::new(fixtures::preset("Fallback", MidiPatch::new(0, 0, 0), &[]));
    let supplied = fallback.clone();
    synth.set_missing_preset_callback(move |_, _| Some(supplied.clone()));
    synth.program_change(0, 5);
    assert_eq!(synth.channel(0).unwrap().preset().unwrap().name, "Fallback");
    assert!(events.try_iter().any(|event| matches!(
        event,
        SynthEvent::MissingPreset { channel: 0, patch } if patch.program == 5
    )));

    note_on(&mut synth, 0, 60, 100);
    assert_eq!(synth.active_voice_count(), 1);
    drop(fallback);
}

#[test]
fn test_sustain_pedal_holds_until_released() {
    let mut synth = synth();
    control(&mut synth, 0, cc::SUSTAIN_PEDAL, 127);
    note_on(&mut synth, 0, 60, 100);
    note_off(&mut synth, 0, 60);
    let voice = synth.voices().iter().find(|v| v.is_active()).unwrap();
    assert!(voice.release_time.is_none());

    control(&mut synth, 0, cc::SUSTAIN_PEDAL, 0);
    let voice = synth.voices().iter().find(|v| v.is_active()).unwrap();
    assert!(voice.release_time.is_some());
}

#[test]
fn test_exclusive_class_cuts_previous_voice() {
    let kit = fixtures::preset(
        "Hats",
        MidiPatch::drum(0),
        &[(GeneratorType::ExclusiveClass, 1)],
    );
    let mut synth = synth_with(single_preset_stack(kit), 8);
    note_on(&mut synth, 9, 42, 100);
    note_on(&mut synth, 9, 46, 100);

    let closed = synth
        .voices()
        .iter()
        .find(|v| v.is_active() && v.note == 42)
        .unwrap();
    assert!(closed.release_time.is_some());
    let open = synth
        .voices()
        .iter()
        .find(|v| v.is_active() && v.note == 46)
        .unwrap();
    assert!(open.release_time.is_none());
}

#[test]
fn test_reset_all_controllers_is_idempotent() {
    let mut synth = synth();
    control(&mut synth, 0, cc::MAIN_VOLUME, 20);
    control(&mut synth, 0, cc::PAN, 0);
    synth.process_message(&[0xE0, 0, 0], 0, false, None);
    synth.program_change(0, 48);
    synth.lock_controller(1, usize::from(cc::MAIN_VOLUME), true);

    synth.reset_all_controllers();
    let once = synth.snapshot();
    synth.reset_all_controllers();
    assert_eq!(synth.snapshot(), once);
    assert_eq!(synth.channel(0).unwrap().controllers.cc(cc::PAN), 64);
    assert_eq!(synth.channel(0).unwrap().program, 0);
}

#[test]
fn test_rpn_pitch_bend_range() {
    let mut synth = synth();
    control(&mut synth, 0, cc::RPN_MSB, 0);
    control(&mut synth, 0, cc::RPN_LSB, 0);
    control(&mut synth, 0, cc::DATA_ENTRY_MSB, 12);
    control(&mut synth, 0, cc::DATA_ENTRY_LSB, 50);
    let range = synth
        .channel(0)
        .unwrap()
        .controllers
        .source(timbre_bank::general::PITCH_WHEEL_RANGE);
    assert_eq!(range, (12 << 7) + 64);
}

#[test]
fn test_sf2_nrpn_sets_generator_offset() {
    let mut synth = synth();
    control(&mut synth, 0, cc::NRPN_MSB, 120);
    control(&mut synth, 0, cc::NRPN_LSB, GeneratorType::Pan as u8);
    control(&mut synth, 0, cc::DATA_ENTRY_MSB, 64);
    control(&mut synth, 0, cc::DATA_ENTRY_LSB, 10);

    let channel = synth.channel(0).unwrap();
    assert!(channel.generator_offsets_enabled);
    assert_eq!(channel.generator_offsets[GeneratorType::Pan.index()], 10);

    note_on(&mut synth, 0, 60, 100);
    let voice = synth.voices().iter().find(|v| v.is_active()).unwrap();
    assert_eq!(voice.modulated(GeneratorType::Pan), 10);
}

#[test]
fn test_extreme_sf2_nrpn_is_clamped_and_renders() {
    let mut synth = synth();
    control(&mut synth, 0, cc::NRPN_MSB, 120);
    control(&mut synth, 0, cc::NRPN_LSB, GeneratorType::CoarseTune as u8);
    control(&mut synth, 0, cc::DATA_ENTRY_MSB, 127);
    control(&mut synth, 0, cc::DATA_ENTRY_LSB, 127);
    assert_eq!(
        synth.channel(0).unwrap().generator_offsets[GeneratorType::CoarseTune.index()],
        8191
    );

    note_on(&mut synth, 0, 60, 100);
    let voice = synth.voices().iter().find(|v| v.is_active()).unwrap();
    assert_eq!(voice.modulated(GeneratorType::CoarseTune), 120);

    let (left, right) = render(&mut synth, 1024);
    assert!(left.iter().chain(&right).all(|s| s.is_finite()));
    assert_eq!(synth.active_voice_count(), 1);
}

#[test]
fn test_one_frame_tail_loop_with_hermite() {
    let audio: Vec<f32> = (0..64).map(|i| (i as f32 / 64.0) - 0.5).collect();
    let sample = Arc::new(
        Sample::new("tail", SAMPLE_RATE, audio)
            .with_original_key(60)
            .with_loop(63, 64),
    );
    let instrument = Instrument::new("tail")
        .with_zone(InstrumentZone::new(sample).with_generator(GeneratorType::SampleModes, 1));
    let preset = Preset::new("Tail", MidiPatch::new(0, 0, 0))
        .with_zone(PresetZone::new(Arc::new(instrument)));
    let mut synth = synth_with(single_preset_stack(preset), 8);
    synth.set_master_parameter(MasterParameter::Interpolation(InterpolationType::Hermite));

    note_on(&mut synth, 0, 72, 100);
    let (left, _) = render(&mut synth, 512);
    assert!(left.iter().all(|s| s.is_finite()));
    assert_eq!(synth.active_voice_count(), 1);
}

#[test]
fn test_pseudo_controller_needs_force() {
    let mut synth = synth();
    synth.controller_change(0, timbre_synth::VELOCITY_OVERRIDE, 40, false);
    assert_eq!(synth.channel(0).unwrap().velocity_override, 0);
    synth.controller_change(0, timbre_synth::VELOCITY_OVERRIDE, 40, true);
    note_on(&mut synth, 0, 60, 127);
    let voice = synth.voices().iter().find(|v| v.is_active()).unwrap();
    assert_eq!(voice.velocity, 40);
}

#[test]
fn test_locked_controller_ignores_changes() {
    let mut synth = synth();
    synth.lock_controller(0, usize::from(cc::MAIN_VOLUME), true);
    control(&mut synth, 0, cc::MAIN_VOLUME, 5);
    assert_eq!(synth.channel(0).unwrap().controllers.cc(cc::MAIN_VOLUME), 100);
    synth.controller_change(0, cc::MAIN_VOLUME, 5, true);
    assert_eq!(synth.channel(0).unwrap().controllers.cc(cc::MAIN_VOLUME), 100);

    synth.lock_controller(0, usize::from(cc::MAIN_VOLUME), false);
    control(&mut synth, 0, cc::MAIN_VOLUME, 5);
    assert_eq!(synth.channel(0).unwrap().controllers.cc(cc::MAIN_VOLUME), 5);
}

#[test]
fn test_all_sound_off_and_system_reset() {
    let mut synth = synth();
    note_on(&mut synth, 0, 60, 100);
    note_on(&mut synth, 1, 62, 100);
    control(&mut synth, 0, cc::ALL_SOUND_OFF, 0);
    assert_eq!(active_notes(&synth), vec![62]);

    synth.process_message(&[0xFF], 0, false, None);
    assert_eq!(synth.active_voice_count(), 0);
}

#[test]
fn test_channel_offset_creates_channels() {
    let mut synth = synth();
    let events = synth.events();
    synth.process_message(&[0x91, 60, 100], 16, false, None);
    assert_eq!(synth.channel_count(), 18);
    assert!(events
        .try_iter()
        .any(|event| event == SynthEvent::NewChannel { channel: 17 }));
    let voice = synth.voices().iter().find(|v| v.is_active()).unwrap();
    assert_eq!(voice.channel, 17);
}

#[test]
fn test_implausible_channel_offset_is_dropped() {
    let mut synth = synth();
    synth.process_message(&[0x90, 60, 100], 1_000_000, false, None);
    synth.process_message(&[0x90, 60, 100], usize::MAX, false, None);
    assert_eq!(synth.channel_count(), 16);
    assert_eq!(synth.active_voice_count(), 0);

    let last_port = timbre_synth::MAX_CHANNELS - 16;
    synth.process_message(&[0x9F, 60, 100], last_port, false, None);
    assert_eq!(synth.channel_count(), timbre_synth::MAX_CHANNELS);
    assert_eq!(synth.active_voice_count(), 1);
}

#[test]
fn test_malformed_message_is_dropped() {
    let mut synth = synth();
    synth.process_message(&[0x90, 60], 0, false, None);
    synth.process_message(&[], 0, false, None);
    synth.process_message(&[0x3C, 0x40], 0, false, None);
    assert_eq!(synth.active_voice_count(), 0);
}

#[test]
fn test_muted_channel_is_silent() {
    let mut synth = synth();
    synth.mute_channel(0, true);
    note_on(&mut synth, 0, 60, 100);
    let (left, _) = render(&mut synth, 512);
    assert_eq!(rms(&left), 0.0);
}

/// Copies its input to both outputs and counts calls.
struct Tap {
    inputs: Vec<Vec<f32>>,
    calls: Arc<std::sync::atomic::AtomicUsize>,
}

impl EffectProcessor for Tap {
    fn inputs_mut(&mut self) -> &mut [Vec<f32>] {
        &mut self.inputs
    }

    fn process(&mut self, quantum: usize, out_left: &mut [f32], out_right: &mut [f32]) {
        self.calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        for i in 0..quantum {
            out_left[i] += self.inputs[0][i];
            out_right[i] += self.inputs[0][i];
        }
    }
}

#[test]
fn test_reverb_send_reaches_processor() {
    let wet = fixtures::preset(
        "Wet",
        MidiPatch::new(0, 0, 0),
        &[(GeneratorType::ReverbEffectsSend, 1000)],
    );
    let mut synth = synth_with(single_preset_stack(wet), 8);
    let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
    synth.set_reverb_processor(Box::new(Tap {
        inputs: vec![Vec::new()],
        calls: calls.clone(),
    }));

    note_on(&mut synth, 0, 60, 100);
    let (with_effects, _) = render(&mut synth, 256);
    assert_eq!(calls.load(std::sync::atomic::Ordering::Relaxed), 2);

    synth.set_master_parameter(MasterParameter::EffectsEnabled(false));
    let (dry, _) = render(&mut synth, 256);
    assert_eq!(calls.load(std::sync::atomic::Ordering::Relaxed), 2);
    assert!(rms(&with_effects) > rms(&dry));
}

#[test]
fn test_unresolvable_stack_constructs() {
    let synth = synth_with(SoundBankStack::new(), 8);
    assert_eq!(synth.channel_count(), 16);
    let _: Option<Arc<Preset>> = synth.channel(0).unwrap().preset();
}
