//! SF2 volume envelope (DAHDSR) in centibels.
//!
//! Runs per sample. Attack is linear in amplitude; decay and release are linear
//! in centibels, which is exponential in amplitude. The voice's attenuation
//! (initial attenuation plus LFO excursion) changes once per quantum and is
//! smoothed per sample to avoid zipper noise.

use timbre_bank::{GeneratorType, GENERATOR_COUNT};

use super::units::{centibels_to_gain, gain_to_centibels, timecents_to_seconds, SILENCE_CB};

/// Smoothing coefficient at 44.1 kHz; scaled for other rates.
const ATTENUATION_SMOOTHING: f64 = 0.001;

/// Envelope segment. The ordinal feeds voice priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum EnvelopeStage {
    #[default]
    Delay = 0,
    Attack = 1,
    Hold = 2,
    Decay = 3,
    Sustain = 4,
    Release = 5,
}

#[derive(Debug, Clone)]
pub struct VolumeEnvelope {
    sample_rate: f64,
    smoothing: f64,
    stage: EnvelopeStage,
    /// Samples since the note started.
    position: usize,
    delay_end: usize,
    attack_end: usize,
    hold_end: usize,
    /// Samples a full 96 dB decay would take.
    decay_full: f64,
    sustain_cb: f64,
    /// Samples a full 96 dB release takes.
    release_full: f64,
    release_start: usize,
    release_start_cb: f64,
    /// Envelope attenuation, 0 = full level.
    envelope_cb: f64,
    /// Smoothed voice attenuation.
    attenuation_cb: f64,
    attenuation_primed: bool,
    finished: bool,
}

/// Timecents scaled by key: `(60 - key) * key_scale` is added.
#[inline]
fn key_scaled(timecents: i16, key_scale: i16, key: u8) -> f64 {
    f64::from(timecents) + (60.0 - f64::from(key)) * f64::from(key_scale)
}

impl VolumeEnvelope {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            smoothing: ATTENUATION_SMOOTHING * 44100.0 / sample_rate,
            stage: EnvelopeStage::Delay,
            position: 0,
            delay_end: 0,
            attack_end: 0,
            hold_end: 0,
            decay_full: 0.0,
            sustain_cb: 0.0,
            release_full: 0.0,
            release_start: 0,
            release_start_cb: 0.0,
            envelope_cb: SILENCE_CB,
            attenuation_cb: 0.0,
            attenuation_primed: false,
            finished: false,
        }
    }

    /// Reset for a new note using the voice's modulated generators.
    pub fn start(&mut self, generators: &[i16; GENERATOR_COUNT], key: u8) {
        let seconds_to_samples = |tc: f64| (timecents_to_seconds(tc) * self.sample_rate) as usize;
        let g = |ty: GeneratorType| generators[ty.index()];

        let delay = seconds_to_samples(f64::from(g(GeneratorType::DelayVolEnv)));
        let attack = seconds_to_samples(f64::from(g(GeneratorType::AttackVolEnv)));
        let hold = seconds_to_samples(key_scaled(
            g(GeneratorType::HoldVolEnv),
            g(GeneratorType::KeyNumToVolEnvHold),
            key,
        ));
        let decay = timecents_to_seconds(key_scaled(
            g(GeneratorType::DecayVolEnv),
            g(GeneratorType::KeyNumToVolEnvDecay),
            key,
        )) * self.sample_rate;

        self.stage = EnvelopeStage::Delay;
        self.position = 0;
        self.delay_end = delay;
        self.attack_end = delay + attack;
        self.hold_end = delay + attack + hold;
        self.decay_full = decay;
        self.sustain_cb = f64::from(g(GeneratorType::SustainVolEnv)).clamp(0.0, 1440.0);
        self.release_full = 0.0;
        self.release_start = 0;
        self.release_start_cb = 0.0;
        self.envelope_cb = SILENCE_CB;
        self.attenuation_primed = false;
        self.finished = false;
    }

    /// Enter the release segment from wherever the envelope currently is.
    pub fn release(&mut self, release_timecents: f64) {
        if self.stage == EnvelopeStage::Release {
            return;
        }
        self.force_release(release_timecents);
    }

    /// Restart the release from the current level, even when already releasing.
    pub fn force_release(&mut self, release_timecents: f64) {
        self.release_start_cb = if self.stage == EnvelopeStage::Delay {
            SILENCE_CB
        } else {
            self.envelope_cb
        };
        self.release_full = timecents_to_seconds(release_timecents) * self.sample_rate;
        self.release_start = self.position;
        self.stage = EnvelopeStage::Release;
    }

    #[inline]
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Total current attenuation in centibels (envelope plus voice attenuation).
    #[inline]
    pub fn attenuation_cb(&self) -> f64 {
        self.envelope_cb + self.attenuation_cb
    }

    /// Envelope attenuation at the current position, advancing the stage.
    fn next_envelope_cb(&mut self) -> f64 {
        let pos = self.position;
        loop {
            match self.stage {
                EnvelopeStage::Delay => {
                    if pos < self.delay_end {
                        return SILENCE_CB;
                    }
                    self.stage = EnvelopeStage::Attack;
                }
                EnvelopeStage::Attack => {
                    if pos < self.attack_end {
                        let span = (self.attack_end - self.delay_end) as f64;
                        let amplitude = (pos - self.delay_end) as f64 / span;
                        return gain_to_centibels(amplitude);
                    }
                    self.stage = EnvelopeStage::Hold;
                }
                EnvelopeStage::Hold => {
                    if pos < self.hold_end {
                        return 0.0;
                    }
                    self.stage = EnvelopeStage::Decay;
                }
                EnvelopeStage::Decay => {
                    let elapsed = (pos - self.hold_end) as f64;
                    let cb = if self.decay_full > 0.0 {
                        SILENCE_CB * elapsed / self.decay_full
                    } else {
                        f64::INFINITY
                    };
                    if cb < self.sustain_cb {
                        return cb;
                    }
                    self.stage = EnvelopeStage::Sustain;
                }
                EnvelopeStage::Sustain => {
                    if self.sustain_cb >= SILENCE_CB {
                        self.finished = true;
                    }
                    return self.sustain_cb;
                }
                EnvelopeStage::Release => {
                    let elapsed = (pos - self.release_start) as f64;
                    let cb = if self.release_full > 0.0 {
                        self.release_start_cb + SILENCE_CB * elapsed / self.release_full
                    } else {
                        SILENCE_CB
                    };
                    if cb >= SILENCE_CB {
                        self.finished = true;
                        return SILENCE_CB;
                    }
                    return cb;
                }
            }
        }
    }

    /// Apply the envelope to `buffer` in place.
    ///
    /// `target_attenuation_cb` is the voice attenuation for this quantum.
    /// Returns true once the envelope has decayed to silence; the rest of
    /// the buffer is zeroed.
    pub fn apply(&mut self, buffer: &mut [f32], target_attenuation_cb: f64) -> bool {
        if !self.attenuation_primed {
            self.attenuation_cb = target_attenuation_cb;
            self.attenuation_primed = true;
        }

        for (i, sample) in buffer.iter_mut().enumerate() {
            self.attenuation_cb += (target_attenuation_cb - self.attenuation_cb) * self.smoothing;
            self.envelope_cb = self.next_envelope_cb();
            self.position += 1;

            if self.finished {
                *sample = 0.0;
                for rest in &mut buffer[i + 1..] {
                    *rest = 0.0;
                }
                return true;
            }

            let gain = if self.stage == EnvelopeStage::Delay {
                0.0
            } else {
                centibels_to_gain(self.envelope_cb + self.attenuation_cb)
            };
            *sample *= gain as f32;
        }
        false
    }

    /// Advance without producing audio (for voices that are not yet audible).
    pub fn skip(&mut self, samples: usize) -> bool {
        for _ in 0..samples {
            self.envelope_cb = self.next_envelope_cb();
            self.position += 1;
            if self.finished {
                return true;
            }
        }
        false
    }
}
