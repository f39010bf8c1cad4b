//! Resonant low-pass biquad (RBJ cookbook) with cutoff smoothing.

use std::f64::consts::{FRAC_1_SQRT_2, PI};

use super::units::absolute_cents_to_hz;

/// Cutoff (absolute cents) at or above which an unresonant filter is bypassed.
pub const BYPASS_CUTOFF_CENTS: f64 = 13500.0;

/// Fraction of the distance to the target cutoff covered per quantum.
pub const CUTOFF_SMOOTHING: f64 = 0.1;

#[derive(Debug, Clone)]
pub struct LowpassFilter {
    sample_rate: f64,
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
    cutoff_cents: f64,
    computed_cutoff: f64,
    computed_q: f64,
    initialized: bool,
}

impl LowpassFilter {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
            cutoff_cents: BYPASS_CUTOFF_CENTS,
            computed_cutoff: f64::NAN,
            computed_q: f64::NAN,
            initialized: false,
        }
    }

    /// Clear history for a new note.
    pub fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
        self.y1 = 0.0;
        self.y2 = 0.0;
        self.computed_cutoff = f64::NAN;
        self.computed_q = f64::NAN;
        self.initialized = false;
    }

    /// Current (smoothed) cutoff in absolute cents.
    #[inline]
    pub fn cutoff_cents(&self) -> f64 {
        self.cutoff_cents
    }

    fn update_coefficients(&mut self, q_cb: f64) {
        let nyquist_guard = self.sample_rate * 0.45;
        let frequency = absolute_cents_to_hz(self.cutoff_cents).min(nyquist_guard);
        // SF2 Q is the resonance peak height in centibels over a Butterworth response.
        let resonance = 10f64.powf(q_cb.max(0.0) / 200.0);
        let q = FRAC_1_SQRT_2 * resonance;
        let w0 = 2.0 * PI * frequency / self.sample_rate;
        let (sin, cos) = w0.sin_cos();
        let alpha = sin / (2.0 * q);
        // Keep the passband level roughly constant as resonance rises.
        let gain = 1.0 / resonance.sqrt();

        let a0 = 1.0 + alpha;
        self.b0 = (1.0 - cos) / 2.0 * gain / a0;
        self.b1 = (1.0 - cos) * gain / a0;
        self.b2 = self.b0;
        self.a1 = -2.0 * cos / a0;
        self.a2 = (1.0 - alpha) / a0;
        self.computed_cutoff = self.cutoff_cents;
        self.computed_q = q_cb;
    }

    /// Filter `buffer` in place toward `target_cents` with resonance `q_cb`.
    pub fn apply(&mut self, buffer: &mut [f32], target_cents: f64, q_cb: f64, smoothing: f64) {
        if self.initialized {
            self.cutoff_cents += (target_cents - self.cutoff_cents) * smoothing;
        } else {
            self.cutoff_cents = target_cents;
            self.initialized = true;
        }

        if self.cutoff_cents >= BYPASS_CUTOFF_CENTS && q_cb <= 0.0 {
            return;
        }

        if (self.cutoff_cents - self.computed_cutoff).abs() > 1.0 || q_cb != self.computed_q {
            self.update_coefficients(q_cb);
        }

        for sample in buffer.iter_mut() {
            let x0 = f64::from(*sample);
            let y0 = self.b0 * x0 + self.b1 * self.x1 + self.b2 * self.x2
                - self.a1 * self.y1
                - self.a2 * self.y2;
            self.x2 = self.x1;
            self.x1 = x0;
            self.y2 = self.y1;
            self.y1 = y0;
            *sample = y0 as f32;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f64, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f64 / 44100.0).sin() as f32)
            .collect()
    }

    fn peak(buffer: &[f32]) -> f32 {
        buffer.iter().fold(0.0f32, |m, s| m.max(s.abs()))
    }

    #[test]
    fn test_bypass_at_max_cutoff() {
        let mut filter = LowpassFilter::new(44100.0);
        let mut buffer = sine(10000.0, 256);
        let original = buffer.clone();
        filter.apply(&mut buffer, 13500.0, 0.0, CUTOFF_SMOOTHING);
        assert_eq!(buffer, original);
    }

    #[test]
    fn test_attenuates_above_cutoff() {
        let mut filter = LowpassFilter::new(44100.0);
        // About 260 Hz.
        let mut buffer = sine(8000.0, 4096);
        filter.apply(&mut buffer, 6000.0, 0.0, CUTOFF_SMOOTHING);
        assert!(peak(&buffer[2048..]) < 0.01);
    }

    #[test]
    fn test_passes_below_cutoff() {
        let mut filter = LowpassFilter::new(44100.0);
        let mut buffer = sine(100.0, 4096);
        filter.apply(&mut buffer, 12000.0, 0.0, CUTOFF_SMOOTHING);
        assert!(peak(&buffer[2048..]) > 0.6);
    }
}
