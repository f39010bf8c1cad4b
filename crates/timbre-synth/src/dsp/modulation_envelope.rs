//! SF2 modulation envelope, evaluated once per quantum.
//!
//! Output runs 0..1 and drives the pitch and filter depth generators.

use timbre_bank::{GeneratorType, GENERATOR_COUNT};

use super::units::timecents_to_seconds;

#[derive(Debug, Clone, Default)]
pub struct ModulationEnvelope {
    start_time: f64,
    delay_end: f64,
    attack_end: f64,
    hold_end: f64,
    /// Seconds a full 1.0 to 0.0 decay would take.
    decay_full: f64,
    sustain_level: f64,
    release_start: Option<f64>,
    release_level: f64,
    /// Seconds a full 1.0 to 0.0 release takes.
    release_full: f64,
    value: f64,
}

impl ModulationEnvelope {
    pub fn start(&mut self, generators: &[i16; GENERATOR_COUNT], key: u8, time: f64) {
        let g = |ty: GeneratorType| f64::from(generators[ty.index()]);
        let key_offset = 60.0 - f64::from(key);

        let delay = timecents_to_seconds(g(GeneratorType::DelayModEnv));
        let attack = timecents_to_seconds(g(GeneratorType::AttackModEnv));
        let hold = timecents_to_seconds(
            g(GeneratorType::HoldModEnv) + key_offset * g(GeneratorType::KeyNumToModEnvHold),
        );
        let decay = timecents_to_seconds(
            g(GeneratorType::DecayModEnv) + key_offset * g(GeneratorType::KeyNumToModEnvDecay),
        );

        self.start_time = time;
        self.delay_end = time + delay;
        self.attack_end = self.delay_end + attack;
        self.hold_end = self.attack_end + hold;
        self.decay_full = decay;
        self.sustain_level = 1.0 - (g(GeneratorType::SustainModEnv) / 1000.0).clamp(0.0, 1.0);
        self.release_start = None;
        self.release_level = 0.0;
        self.release_full = 0.0;
        self.value = 0.0;
    }

    /// Begin the release segment at `time`.
    pub fn release(&mut self, time: f64, release_timecents: f64) {
        if self.release_start.is_some() {
            return;
        }
        self.release_level = self.held_value(time);
        self.release_full = timecents_to_seconds(release_timecents);
        self.release_start = Some(time);
    }

    /// Value ignoring any release.
    fn held_value(&self, time: f64) -> f64 {
        if time < self.delay_end {
            0.0
        } else if time < self.attack_end {
            (time - self.delay_end) / (self.attack_end - self.delay_end)
        } else if time < self.hold_end {
            1.0
        } else if self.decay_full <= 0.0 {
            self.sustain_level
        } else {
            (1.0 - (time - self.hold_end) / self.decay_full).max(self.sustain_level)
        }
    }

    /// Evaluate at `time`.
    pub fn process(&mut self, time: f64) -> f64 {
        self.value = match self.release_start {
            None => self.held_value(time),
            Some(start) => {
                if self.release_full <= 0.0 {
                    0.0
                } else {
                    (self.release_level - (time - start) / self.release_full).max(0.0)
                }
            }
        };
        self.value
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.value
    }
}
