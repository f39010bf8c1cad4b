//! The synthesizer core.
//!
//! Binds channels, the voice pool and cache, the event scheduler and the effect
//! processors together, and owns master parameters and audio time.
//!
//! All methods run on the render thread. Other threads talk to it through the
//! MIDI input queue ([`Synthesizer::connect_input`]), the bank stack handle
//! ([`Synthesizer::bank_handle`]) and the notification channel
//! ([`Synthesizer::events`]).

mod controller;
mod note;
mod program;
mod render;

use std::sync::Arc;

use crossbeam_channel::Receiver;
use timbre_bank::{MidiPatch, MidiSystem, Preset, SoundBankStack};
use timbre_midi::{MidiInputConsumer, MidiMessage, TimedMessage};
use tracing::{debug, info, warn};

use crate::bank_handle::BankStackHandle;
use crate::channel::{CustomController, DrumParameter, MidiChannel};
use crate::config::SynthConfig;
use crate::dsp::PanTable;
use crate::effects::{EffectProcessor, EffectSlot};
use crate::events::{EventSender, SynthEvent};
use crate::master::{MasterParameter, MasterParameters};
use crate::scheduler::EventScheduler;
use crate::tuning::{KeyTuning, TuningTables};
use crate::voice::{Voice, VoiceCache, VoicePool};
use crate::Result;

/// Upper bound on channels created from incoming messages (16 ports of 16).
pub const MAX_CHANNELS: usize = 256;

/// Called when the bank stack cannot supply any preset for a patch.
pub type MissingPresetCallback =
    Box<dyn FnMut(MidiPatch, MidiSystem) -> Option<Arc<Preset>> + Send>;

/// Effect send buses, sized to the quantum.
struct SendBuffers {
    reverb: Vec<f32>,
    chorus_left: Vec<f32>,
    chorus_right: Vec<f32>,
}

impl SendBuffers {
    fn new(quantum_size: usize) -> Self {
        Self {
            reverb: vec![0.0; quantum_size],
            chorus_left: vec![0.0; quantum_size],
            chorus_right: vec![0.0; quantum_size],
        }
    }

    fn clear(&mut self) {
        self.reverb.fill(0.0);
        self.chorus_left.fill(0.0);
        self.chorus_right.fill(0.0);
    }
}

/// SoundFont MIDI synthesizer.
pub struct Synthesizer {
    config: SynthConfig,
    master: MasterParameters,
    channels: Vec<MidiChannel>,
    voices: VoicePool,
    cache: VoiceCache,
    bank: BankStackHandle,
    stack: Arc<SoundBankStack>,
    bank_generation: u64,
    scheduler: EventScheduler<TimedMessage>,
    input: Option<MidiInputConsumer>,
    tuning: TuningTables,
    pan_table: PanTable,
    reverb: Option<EffectSlot>,
    chorus: Option<EffectSlot>,
    sends: SendBuffers,
    events: EventSender,
    missing_preset: Option<MissingPresetCallback>,
    current_time: f64,
}

impl Synthesizer {
    /// Create a synthesizer playing from `stack`.
    ///
    /// An empty stack is accepted (banks may be published later through the
    /// handle); channels stay silent until a preset resolves.
    pub fn new(config: SynthConfig, stack: SoundBankStack) -> Result<Self> {
        config.validate()?;
        if stack.is_empty() {
            warn!("Synthesizer created with an empty sound bank stack");
        }

        let bank = BankStackHandle::new(stack);
        let mut synth = Self {
            master: MasterParameters::new(config.voice_capacity, config.enable_effects),
            channels: (0..config.channel_count).map(MidiChannel::new).collect(),
            voices: VoicePool::new(config.voice_capacity, config.sample_rate, config.quantum_size),
            cache: VoiceCache::new(),
            stack: bank.load(),
            bank_generation: bank.generation(),
            bank,
            scheduler: EventScheduler::with_capacity(config.event_capacity),
            input: None,
            tuning: TuningTables::default(),
            pan_table: PanTable::new(),
            reverb: None,
            chorus: None,
            sends: SendBuffers::new(config.quantum_size),
            events: EventSender::new(config.event_capacity),
            missing_preset: None,
            current_time: config.initial_time,
            config,
        };
        for channel in 0..synth.channels.len() {
            synth.resolve_channel_preset(channel);
        }
        info!(
            "Synthesizer ready: {} Hz, {} voices, {} channels",
            synth.config.sample_rate,
            synth.config.voice_capacity,
            synth.channels.len()
        );
        Ok(synth)
    }

    #[inline]
    pub fn config(&self) -> &SynthConfig {
        &self.config
    }

    #[inline]
    pub fn master(&self) -> &MasterParameters {
        &self.master
    }

    /// Audio time in seconds at the start of the next quantum.
    #[inline]
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    #[inline]
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn channel(&self, channel: usize) -> Option<&MidiChannel> {
        self.channels.get(channel)
    }

    /// The voice pool's slots, including idle ones.
    #[inline]
    pub fn voices(&self) -> &[Voice] {
        self.voices.voices()
    }

    pub fn active_voice_count(&self) -> usize {
        self.voices.active_count()
    }

    /// Pending scheduled messages.
    pub fn pending_events(&self) -> usize {
        self.scheduler.len()
    }

    /// Receiver for notifications. Receivers share one queue.
    pub fn events(&self) -> Receiver<SynthEvent> {
        self.events.subscribe()
    }

    /// Handle another thread can use to publish a new bank stack.
    pub fn bank_handle(&self) -> BankStackHandle {
        self.bank.clone()
    }

    /// The bank stack notes currently resolve against.
    pub fn bank_stack(&self) -> &Arc<SoundBankStack> {
        &self.stack
    }

    /// Replace the bank stack now. The voice cache is cleared before any
    /// further note resolves and every channel picks its preset again.
    pub fn set_bank_stack(&mut self, stack: SoundBankStack) {
        self.bank.publish(stack);
        self.sync_bank_stack();
    }

    /// Pick up a stack published through the handle.
    fn sync_bank_stack(&mut self) {
        let generation = self.bank.generation();
        if generation == self.bank_generation {
            return;
        }
        self.stack = self.bank.load();
        self.bank_generation = generation;
        self.cache.clear();
        info!(
            "Sound bank stack replaced (generation {}, {} banks), voice cache cleared",
            generation,
            self.stack.len()
        );
        for channel in 0..self.channels.len() {
            let keep = self.channels[channel].lock_preset && self.channels[channel].preset().is_some();
            if !keep {
                self.resolve_channel_preset(channel);
            }
        }
        self.events.send(SynthEvent::BankStackChanged { generation });
    }

    pub fn set_missing_preset_callback<F>(&mut self, callback: F)
    where
        F: FnMut(MidiPatch, MidiSystem) -> Option<Arc<Preset>> + Send + 'static,
    {
        self.missing_preset = Some(Box::new(callback));
    }

    /// Install the reverb processor (mono input).
    pub fn set_reverb_processor(&mut self, processor: Box<dyn EffectProcessor>) {
        self.reverb = Some(EffectSlot::new(processor));
    }

    /// Install the chorus processor (stereo input).
    pub fn set_chorus_processor(&mut self, processor: Box<dyn EffectProcessor>) {
        self.chorus = Some(EffectSlot::new(processor));
    }

    /// Feed messages from another thread; drained at the start of each quantum.
    pub fn connect_input(&mut self, input: MidiInputConsumer) {
        self.input = Some(input);
    }

    /// Accept one raw MIDI message.
    ///
    /// The channel is the status nibble plus `channel_offset`; missing channels
    /// are created up to [`MAX_CHANNELS`]. Messages with a larger offset are
    /// dropped. `force` bypasses controller locks and allows
    /// pseudo-controllers. A `time` in the future schedules the message;
    /// otherwise it runs before this call returns.
    pub fn process_message(
        &mut self,
        bytes: &[u8],
        channel_offset: usize,
        force: bool,
        time: Option<f64>,
    ) {
        match time {
            Some(time) if time > self.current_time => {
                let mut message = TimedMessage::new(time, bytes).with_channel_offset(channel_offset);
                if force {
                    message = message.forced();
                }
                self.scheduler.schedule(time, message);
            }
            _ => self.execute(bytes, channel_offset, force),
        }
    }

    /// Route a queued message: future ones are scheduled, due ones run now.
    fn process_timed(&mut self, message: TimedMessage) {
        if message.time > self.current_time {
            self.scheduler.schedule(message.time, message);
        } else {
            self.execute(message.bytes(), message.channel_offset, message.force);
        }
    }

    fn execute(&mut self, bytes: &[u8], channel_offset: usize, force: bool) {
        if channel_offset > MAX_CHANNELS - 16 {
            warn!(
                "Dropping MIDI message with channel offset {} (limit {})",
                channel_offset,
                MAX_CHANNELS - 16
            );
            return;
        }
        let message = match MidiMessage::parse(bytes) {
            Ok(message) => message,
            Err(err) => {
                warn!("Dropping malformed MIDI message: {}", err);
                return;
            }
        };

        if let Some(nibble) = message.channel() {
            self.ensure_channel(usize::from(nibble) + channel_offset);
        }
        let channel = |nibble: u8| usize::from(nibble) + channel_offset;

        match message {
            MidiMessage::NoteOn {
                channel: c,
                note,
                velocity,
            } => self.note_on(channel(c), note, velocity),
            MidiMessage::NoteOff { channel: c, note, .. } => self.note_off(channel(c), note),
            MidiMessage::PolyPressure {
                channel: c,
                note,
                pressure,
            } => self.poly_pressure(channel(c), note, pressure),
            MidiMessage::ControlChange {
                channel: c,
                controller,
                value,
            } => self.controller_change(channel(c), controller, value, force),
            MidiMessage::ProgramChange { channel: c, program } => {
                self.program_change(channel(c), program)
            }
            MidiMessage::ChannelPressure { channel: c, pressure } => {
                self.channel_pressure(channel(c), pressure)
            }
            MidiMessage::PitchBend { channel: c, value } => self.pitch_wheel(channel(c), value),
            MidiMessage::SystemExclusive(data) => self.system_exclusive(data, channel_offset),
            MidiMessage::SystemReset => self.system_reset(),
            MidiMessage::Other(status) => debug!("Ignoring MIDI status {:#04x}", status),
        }
    }

    fn ensure_channel(&mut self, channel: usize) {
        while self.channels.len() <= channel {
            self.add_channel();
        }
    }

    /// Append a channel and return its index.
    pub fn add_channel(&mut self) -> usize {
        let index = self.channels.len();
        self.channels.push(MidiChannel::new(index));
        self.resolve_channel_preset(index);
        debug!("Added MIDI channel {}", index);
        self.events.send(SynthEvent::NewChannel { channel: index });
        index
    }

    pub fn mute_channel(&mut self, channel: usize, muted: bool) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.muted = muted;
            self.events.send(SynthEvent::MuteChannel { channel, muted });
        }
    }

    /// Keep the current preset through program changes and resets.
    pub fn lock_preset(&mut self, channel: usize, locked: bool) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.lock_preset = locked;
        }
    }

    /// Lock or unlock a controller table slot (CC number or extended index).
    pub fn lock_controller(&mut self, channel: usize, index: usize, locked: bool) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.controllers.set_locked(index, locked);
        }
    }

    pub fn set_custom_controller(&mut self, channel: usize, controller: CustomController, value: f64) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.custom.set(controller, value);
        }
    }

    pub fn set_drum_parameter(&mut self, channel: usize, key: u8, parameter: DrumParameter) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.drum_params.set(key, parameter);
            self.events.send(SynthEvent::DrumParameterChange {
                channel,
                key,
                parameter,
            });
        }
    }

    /// Per pitch class tuning in cents (-64..=63) for one channel.
    pub fn set_octave_tuning(&mut self, channel: usize, cents: [i8; 12]) {
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.octave_tuning = cents.map(|c| c.clamp(-64, 63));
        }
    }

    /// Set or clear the MTS tuning of one key of a program.
    pub fn set_key_tuning(&mut self, program: u8, key: u8, tuning: Option<KeyTuning>) {
        self.tuning.set(program, key, tuning);
    }

    pub fn key_tuning(&self, program: u8, key: u8) -> Option<KeyTuning> {
        self.tuning.get(program, key)
    }

    /// Every tuned key as (program, key, tuning).
    pub fn key_tunings(&self) -> impl Iterator<Item = (u8, u8, KeyTuning)> + '_ {
        self.tuning.entries()
    }

    pub fn clear_key_tunings(&mut self) {
        self.tuning.clear();
    }

    #[inline]
    pub(crate) fn channel_mut(&mut self, channel: usize) -> Option<&mut MidiChannel> {
        self.channels.get_mut(channel)
    }

    pub fn set_master_parameter(&mut self, parameter: MasterParameter) {
        let previous_system = self.master.midi_system;
        self.master.apply(parameter);
        match parameter {
            MasterParameter::VoiceCap(cap) => self.voices.set_cap(cap),
            MasterParameter::MidiSystem(system) if system != previous_system => {
                info!("MIDI system set to {:?}", system);
            }
            _ => {}
        }
    }

    /// Stop every channel. `force` cuts voices instantly instead of releasing them.
    pub fn stop_all_channels(&mut self, force: bool) {
        for channel in 0..self.channels.len() {
            self.stop_channel(channel, force);
        }
        self.events.send(SynthEvent::StopAll { force });
    }

    /// Full reset of every channel's controllers, programs and drum state.
    /// Locked controllers and locked presets are kept.
    pub fn reset_all_controllers(&mut self) {
        for channel in 0..self.channels.len() {
            let ch = &mut self.channels[channel];
            ch.reset();
            if !ch.lock_preset {
                ch.program = 0;
                self.resolve_channel_preset(channel);
            }
            self.events.send(SynthEvent::ControllersReset { channel });
        }
    }

    /// MIDI System Reset (0xFF).
    pub fn system_reset(&mut self) {
        self.stop_all_channels(true);
        self.master.midi_system = MidiSystem::default();
        self.reset_all_controllers();
    }
}
