//! Sounding voices.
//!
//! Voices are preallocated once by the [`VoicePool`] and reused. A voice moves
//! Idle → Active → Releasing → Finished, and the pool returns finished voices to
//! Idle after each quantum.

pub mod cache;
pub mod pool;
pub mod render;
pub mod template;

use std::sync::Arc;

use timbre_bank::{GeneratorType, LoopMode, GENERATOR_COUNT};

use crate::dsp::units::SILENCE_CB;
use crate::dsp::{LowpassFilter, ModulationEnvelope, VolumeEnvelope, WavetableOscillator};
use crate::portamento::Glide;

pub use cache::{cache_key, VoiceCache};
pub use pool::{StolenVoice, VoicePool};
pub use render::{RenderContext, VoiceOutput};
pub use template::VoiceTemplate;

/// Release time (timecents) used to silence a voice quickly without a click.
pub const KILL_RELEASE_TIMECENTS: f64 = -6950.0;

/// Shortest time a note sounds before a note-off releases it.
pub const MIN_NOTE_LENGTH: f64 = 0.03;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceState {
    #[default]
    Idle,
    Active,
    Releasing,
    Finished,
}

/// Per-note values decided at note-on.
#[derive(Debug, Clone)]
pub struct VoiceStart {
    pub templates: Arc<[VoiceTemplate]>,
    pub template_index: usize,
    pub channel: usize,
    /// Note as received, used to match note-offs.
    pub note: u8,
    /// Key after shift and tuning remap, used for pitch.
    pub key: u8,
    pub velocity: u8,
    pub time: f64,
    /// Extra cents from MTS tuning and master transposition.
    pub tuning_cents: f64,
    pub glide: Option<Glide>,
    pub gain: f64,
    pub pan_override: Option<f64>,
    pub reverb_gain: f64,
    pub chorus_gain: f64,
    pub exclusive_class: u8,
}

#[derive(Debug, Clone)]
pub struct Voice {
    state: VoiceState,
    /// Distinguishes reuses of the same slot.
    pub serial: u64,
    pub channel: usize,
    pub note: u8,
    pub key: u8,
    pub velocity: u8,
    pub pressure: u8,
    pub start_time: f64,
    /// Scheduled release, applied by the renderer once the time is reached.
    pub release_time: Option<f64>,
    release_timecents_override: Option<f64>,
    pub exclusive_class: u8,
    pub priority: f64,
    templates: Option<Arc<[VoiceTemplate]>>,
    template_index: usize,
    pub(crate) generators: [i16; GENERATOR_COUNT],
    pub(crate) modulated: [i16; GENERATOR_COUNT],
    pub(crate) oscillator: WavetableOscillator,
    pub(crate) volume_envelope: VolumeEnvelope,
    pub(crate) modulation_envelope: ModulationEnvelope,
    pub(crate) filter: LowpassFilter,
    pub(crate) loop_mode: LoopMode,
    pub(crate) tuning_cents: f64,
    pub(crate) glide: Option<Glide>,
    /// Rounded pitch and its playback ratio, recomputed when the cents change.
    pub(crate) cached_cents: i32,
    pub(crate) cached_ratio: f64,
    pub(crate) gain: f64,
    pub(crate) pan_override: Option<f64>,
    pub(crate) reverb_gain: f64,
    pub(crate) chorus_gain: f64,
    pub(crate) buffer: Vec<f32>,
}

impl Voice {
    pub fn new(sample_rate: f64, quantum_size: usize) -> Self {
        Self {
            state: VoiceState::Idle,
            serial: 0,
            channel: 0,
            note: 0,
            key: 0,
            velocity: 0,
            pressure: 0,
            start_time: 0.0,
            release_time: None,
            release_timecents_override: None,
            exclusive_class: 0,
            priority: 0.0,
            templates: None,
            template_index: 0,
            generators: [0; GENERATOR_COUNT],
            modulated: [0; GENERATOR_COUNT],
            oscillator: WavetableOscillator::default(),
            volume_envelope: VolumeEnvelope::new(sample_rate),
            modulation_envelope: ModulationEnvelope::default(),
            filter: LowpassFilter::new(sample_rate),
            loop_mode: LoopMode::NoLoop,
            tuning_cents: 0.0,
            glide: None,
            cached_cents: 0,
            cached_ratio: 1.0,
            gain: 1.0,
            pan_override: None,
            reverb_gain: 1.0,
            chorus_gain: 1.0,
            buffer: vec![0.0; quantum_size],
        }
    }

    #[inline]
    pub fn state(&self) -> VoiceState {
        self.state
    }

    /// Sounding (active or releasing).
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, VoiceState::Active | VoiceState::Releasing)
    }

    #[inline]
    pub fn is_releasing(&self) -> bool {
        self.state == VoiceState::Releasing
    }

    /// Still holding, with no release scheduled.
    #[inline]
    pub fn is_held(&self) -> bool {
        self.state == VoiceState::Active && self.release_time.is_none()
    }

    pub fn template(&self) -> Option<&VoiceTemplate> {
        self.templates.as_ref()?.get(self.template_index)
    }

    /// Current modulated value of a generator.
    #[inline]
    pub fn modulated(&self, ty: GeneratorType) -> i16 {
        self.modulated[ty.index()]
    }

    /// Begin playing. The caller computes the initial modulated table with
    /// `update_modulated` before the envelopes are started by [`Voice::trigger`].
    pub fn start(&mut self, start: VoiceStart, serial: u64) {
        let Some(template) = start.templates.get(start.template_index) else {
            return;
        };
        self.generators = template.generators;
        self.modulated = template.generators;
        self.oscillator = WavetableOscillator::new(
            template.start,
            template.end,
            template.loop_start,
            template.loop_end,
            matches!(
                template.loop_mode,
                LoopMode::Loop | LoopMode::LoopUntilRelease
            ),
        );
        self.loop_mode = template.loop_mode;

        self.state = VoiceState::Active;
        self.serial = serial;
        self.channel = start.channel;
        self.note = start.note;
        self.key = start.key;
        self.velocity = start.velocity;
        self.pressure = 0;
        self.start_time = start.time;
        self.release_time = None;
        self.release_timecents_override = None;
        self.exclusive_class = start.exclusive_class;
        self.tuning_cents = start.tuning_cents;
        self.glide = start.glide;
        self.cached_cents = 0;
        self.cached_ratio = 1.0;
        self.gain = start.gain;
        self.pan_override = start.pan_override;
        self.reverb_gain = start.reverb_gain;
        self.chorus_gain = start.chorus_gain;
        self.filter.reset();
        self.templates = Some(start.templates);
        self.template_index = start.template_index;
    }

    /// Start the envelopes from the current modulated table.
    pub fn trigger(&mut self) {
        let key = self
            .template()
            .and_then(|t| t.target_key)
            .unwrap_or(self.key);
        self.volume_envelope.start(&self.modulated, key);
        self.modulation_envelope
            .start(&self.modulated, key, self.start_time);
    }

    /// Schedule a release at `time`, no earlier than the minimum note length.
    pub fn release(&mut self, time: f64) {
        if self.is_active() && self.release_time.is_none() {
            self.release_time = Some(time.max(self.start_time + MIN_NOTE_LENGTH));
        }
    }

    /// Release now with a near-instant envelope tail.
    pub fn kill(&mut self, time: f64) {
        if !self.is_active() {
            return;
        }
        self.release_timecents_override = Some(KILL_RELEASE_TIMECENTS);
        self.release_time = Some(time);
        if self.state == VoiceState::Releasing {
            self.volume_envelope.force_release(KILL_RELEASE_TIMECENTS);
        }
    }

    /// Enter the release stage of the envelopes.
    pub(crate) fn begin_release(&mut self, time: f64) {
        if self.state != VoiceState::Active {
            return;
        }
        self.state = VoiceState::Releasing;
        let volume_release = self
            .release_timecents_override
            .unwrap_or_else(|| f64::from(self.modulated(GeneratorType::ReleaseVolEnv)));
        let modulation_release = self
            .release_timecents_override
            .unwrap_or_else(|| f64::from(self.modulated(GeneratorType::ReleaseModEnv)));
        self.volume_envelope.release(volume_release);
        self.modulation_envelope.release(time, modulation_release);
        if self.loop_mode == LoopMode::LoopUntilRelease {
            self.oscillator.looping = false;
        }
    }

    pub(crate) fn finish(&mut self) {
        if self.is_active() {
            self.state = VoiceState::Finished;
        }
    }

    /// Instant silence: back to Idle without a tail.
    pub fn force_stop(&mut self) {
        self.state = VoiceState::Idle;
        self.release_time = None;
        self.templates = None;
    }

    /// Return a finished voice to the pool.
    pub(crate) fn recycle(&mut self) -> bool {
        if self.state == VoiceState::Finished {
            self.force_stop();
            return true;
        }
        false
    }

    /// Stealing score; higher survives longer.
    ///
    /// The release penalty is applied twice.
    pub fn compute_priority(&self, is_drum_channel: bool) -> f64 {
        let mut priority = 0.0;
        if is_drum_channel {
            priority += 5.0;
        }
        if self.is_releasing() {
            priority -= 5.0;
        }
        priority += f64::from(self.velocity) / 25.0;
        priority -= f64::from(self.volume_envelope.stage() as u8);
        if self.is_releasing() {
            priority -= 5.0;
        }
        let attenuation = self.volume_envelope.attenuation_cb().min(SILENCE_CB);
        priority -= attenuation / 200.0;
        priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timbre_bank::{default_modulators, Generator, Sample, VoiceParameters};

    pub(crate) fn templates(count: usize) -> Arc<[VoiceTemplate]> {
        let parameters = VoiceParameters {
            instrument_generators: vec![Generator::new(GeneratorType::ReleaseVolEnv, 0)],
            preset_generators: Vec::new(),
            modulators: default_modulators(),
            sample: Arc::new(Sample::new("s", 44100, vec![0.25; 4096])),
        };
        let template = VoiceTemplate::new(&parameters, 44100.0).unwrap();
        vec![template; count].into()
    }

    pub(crate) fn start(channel: usize, note: u8, velocity: u8, time: f64) -> VoiceStart {
        VoiceStart {
            templates: templates(1),
            template_index: 0,
            channel,
            note,
            key: note,
            velocity,
            time,
            tuning_cents: 0.0,
            glide: None,
            gain: 1.0,
            pan_override: None,
            reverb_gain: 1.0,
            chorus_gain: 1.0,
            exclusive_class: 0,
        }
    }

    #[test]
    fn test_lifecycle() {
        let mut voice = Voice::new(44100.0, 128);
        assert_eq!(voice.state(), VoiceState::Idle);
        voice.start(start(0, 60, 100, 0.0), 1);
        voice.trigger();
        assert_eq!(voice.state(), VoiceState::Active);
        assert!(voice.is_held());

        voice.release(0.0);
        assert_eq!(voice.release_time, Some(MIN_NOTE_LENGTH));
        voice.begin_release(MIN_NOTE_LENGTH);
        assert_eq!(voice.state(), VoiceState::Releasing);

        voice.finish();
        assert_eq!(voice.state(), VoiceState::Finished);
        assert!(voice.recycle());
        assert_eq!(voice.state(), VoiceState::Idle);
    }

    #[test]
    fn test_release_penalty_applies_twice() {
        let mut voice = Voice::new(44100.0, 128);
        voice.start(start(0, 60, 100, 0.0), 1);
        voice.trigger();
        let held = voice.compute_priority(false);
        voice.begin_release(0.0);
        let releasing = voice.compute_priority(false);
        // -10 for release, and the stage ordinal moves from Delay (0) to Release (5).
        assert!((held - releasing - 15.0).abs() < 1e-9);
        assert!((voice.compute_priority(true) - releasing - 5.0).abs() < 1e-9);
    }
}
