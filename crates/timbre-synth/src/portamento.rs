//! CC 5/65/84 portamento glide.
//!
//! A glide starts at the CC 84 key (or the previous note) and reaches the played
//! key linearly. Duration scales with the interval.

/// Seconds per octave of glide at portamento time `cc5`.
#[inline]
pub fn time_per_octave(cc5: u8) -> f64 {
    0.002 * (f64::from(cc5) / 11.0).exp2()
}

/// Seconds a glide of `semitones` takes at portamento time `cc5`.
pub fn glide_duration(cc5: u8, semitones: f64) -> f64 {
    time_per_octave(cc5) * semitones.abs() / 12.0
}

/// Active glide of one voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glide {
    /// Starting key.
    pub from: f64,
    pub start_time: f64,
    pub duration: f64,
}

impl Glide {
    pub fn new(from: u8, to: u8, cc5: u8, start_time: f64) -> Option<Self> {
        if from == to {
            return None;
        }
        let duration = glide_duration(cc5, f64::from(from) - f64::from(to));
        (duration > 0.0).then_some(Self {
            from: f64::from(from),
            start_time,
            duration,
        })
    }

    /// Pitch offset in cents relative to `target` at `time`.
    pub fn cents(&self, target: u8, time: f64) -> f64 {
        let progress = ((time - self.start_time) / self.duration).clamp(0.0, 1.0);
        (self.from - f64::from(target)) * 100.0 * (1.0 - progress)
    }

    #[inline]
    pub fn is_done(&self, time: f64) -> bool {
        time >= self.start_time + self.duration
    }
}
