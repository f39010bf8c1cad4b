//! Wavetable playback over sample data.

use serde::{Deserialize, Serialize};

/// Sample interpolation quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterpolationType {
    Nearest,
    #[default]
    Linear,
    /// 4-point, 3rd-order Hermite.
    Hermite,
}

/// Read cursor and loop region for one voice.
#[derive(Debug, Clone, Default)]
pub struct WavetableOscillator {
    /// Fractional read position in sample frames.
    pub cursor: f64,
    /// Exclusive playback end.
    pub end: usize,
    pub loop_start: usize,
    pub loop_end: usize,
    pub looping: bool,
}

#[inline]
fn hermite(y0: f32, y1: f32, y2: f32, y3: f32, t: f32) -> f32 {
    let c0 = y1;
    let c1 = 0.5 * (y2 - y0);
    let c2 = y0 - 2.5 * y1 + 2.0 * y2 - 0.5 * y3;
    let c3 = 0.5 * (y3 - y0) + 1.5 * (y1 - y2);
    ((c3 * t + c2) * t + c1) * t + c0
}

impl WavetableOscillator {
    pub fn new(start: usize, end: usize, loop_start: usize, loop_end: usize, looping: bool) -> Self {
        Self {
            cursor: start as f64,
            end,
            loop_start,
            loop_end,
            looping: looping && loop_end > loop_start,
        }
    }

    /// Fill `out` reading `data` at `step` frames per output sample.
    ///
    /// Returns true when a non-looping read window passes the end of the data;
    /// the remainder of `out` is zeroed.
    pub fn render(
        &mut self,
        data: &[f32],
        step: f64,
        out: &mut [f32],
        interpolation: InterpolationType,
    ) -> bool {
        let end = self.end.min(data.len());
        if self.looping && self.loop_end <= end {
            self.render_looping(data, step, out, interpolation);
            return false;
        }

        for (i, sample) in out.iter_mut().enumerate() {
            let past_end = self.cursor.is_nan() || self.cursor >= end as f64;
            let index = self.cursor as usize;
            let frac = (self.cursor - index as f64) as f32;
            let window_end = match interpolation {
                InterpolationType::Nearest => index,
                _ => index + 1,
            };
            if past_end || window_end >= end {
                for rest in &mut out[i..] {
                    *rest = 0.0;
                }
                return true;
            }

            *sample = match interpolation {
                InterpolationType::Nearest => data[index],
                InterpolationType::Linear => data[index] + (data[index + 1] - data[index]) * frac,
                InterpolationType::Hermite => {
                    let y0 = data[index.saturating_sub(1)];
                    let y3 = data[(index + 2).min(end - 1)];
                    hermite(y0, data[index], data[index + 1], y3, frac)
                }
            };
            self.cursor += step;
        }
        false
    }

    fn render_looping(
        &mut self,
        data: &[f32],
        step: f64,
        out: &mut [f32],
        interpolation: InterpolationType,
    ) {
        let loop_start = self.loop_start;
        let loop_end = self.loop_end;
        let length = loop_end - loop_start;
        let wrap = |i: usize| {
            if i >= loop_end {
                loop_start + (i - loop_start) % length
            } else {
                i
            }
        };

        for sample in out.iter_mut() {
            if self.cursor >= loop_end as f64 {
                let start = loop_start as f64;
                self.cursor = start + (self.cursor - start) % length as f64;
                if self.cursor.is_nan() || self.cursor >= loop_end as f64 {
                    self.cursor = start;
                }
            }
            let index = self.cursor as usize;
            let frac = (self.cursor - index as f64) as f32;

            *sample = match interpolation {
                InterpolationType::Nearest => data[index],
                InterpolationType::Linear => {
                    let next = data[wrap(index + 1)];
                    data[index] + (next - data[index]) * frac
                }
                InterpolationType::Hermite => {
                    let y0 = if index == loop_start && self.cursor > loop_start as f64 {
                        data[loop_end - 1]
                    } else {
                        data[index.saturating_sub(1)]
                    };
                    hermite(
                        y0,
                        data[index],
                        data[wrap(index + 1)],
                        data[wrap(index + 2)],
                        frac,
                    )
                }
            };
            self.cursor += step;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn ramp(len: usize) -> Vec<f32> {
        (0..len).map(|i| i as f32).collect()
    }

    #[test]
    fn test_linear_interpolates() {
        let data = ramp(8);
        let mut osc = WavetableOscillator::new(0, 8, 0, 0, false);
        let mut out = [0.0f32; 4];
        assert!(!osc.render(&data, 0.5, &mut out, InterpolationType::Linear));
        assert_eq!(out, [0.0, 0.5, 1.0, 1.5]);
    }

    #[test]
    fn test_nearest_truncates() {
        let data = ramp(8);
        let mut osc = WavetableOscillator::new(0, 8, 0, 0, false);
        let mut out = [0.0f32; 3];
        osc.render(&data, 0.75, &mut out, InterpolationType::Nearest);
        assert_eq!(out, [0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_hermite_is_exact_on_a_line() {
        let data = ramp(16);
        let mut osc = WavetableOscillator::new(2, 16, 0, 0, false);
        let mut out = [0.0f32; 4];
        osc.render(&data, 0.25, &mut out, InterpolationType::Hermite);
        for (i, s) in out.iter().enumerate() {
            assert_abs_diff_eq!(*s, 2.0 + i as f32 * 0.25, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_non_looping_finishes_at_end() {
        let data = ramp(4);
        let mut osc = WavetableOscillator::new(0, 4, 0, 0, false);
        let mut out = [9.0f32; 8];
        assert!(osc.render(&data, 1.0, &mut out, InterpolationType::Linear));
        // Window [index, index + 1] is valid for indices 0..=2.
        assert_eq!(out, [0.0, 1.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_loop_wraps_large_steps() {
        let data = ramp(10);
        let mut osc = WavetableOscillator::new(0, 10, 4, 8, true);
        let mut out = [0.0f32; 4];
        // Step larger than the loop length wraps several times per sample.
        osc.render(&data, 9.0, &mut out, InterpolationType::Nearest);
        for s in &out[1..] {
            assert!((4.0..8.0).contains(s), "{s} outside loop");
        }
        assert!(osc.cursor < 8.0 + 9.0);
    }

    #[test]
    fn test_loop_wraps_huge_steps() {
        let data = ramp(10);
        let mut osc = WavetableOscillator::new(0, 10, 4, 8, true);
        let mut out = [0.0f32; 16];
        osc.render(&data, 1.0e9 + 0.5, &mut out, InterpolationType::Linear);
        for s in &out[1..] {
            assert!((4.0..8.0).contains(s), "{s} outside loop");
        }
        assert!(osc.cursor < 8.0 + 1.0e9 + 0.5);
    }

    #[test]
    fn test_hermite_one_frame_loop_at_tail() {
        let data = ramp(8);
        let mut osc = WavetableOscillator::new(0, 8, 7, 8, true);
        let mut out = [0.0f32; 16];
        osc.render(&data, 1.0, &mut out, InterpolationType::Hermite);
        for s in &out[8..] {
            assert_abs_diff_eq!(*s, 7.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_non_looping_huge_step_finishes() {
        let data = ramp(8);
        let mut osc = WavetableOscillator::new(0, 8, 0, 0, false);
        let mut out = [9.0f32; 4];
        assert!(osc.render(&data, 1.0e30, &mut out, InterpolationType::Hermite));
        assert_eq!(out, [0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_loop_disabled_when_empty() {
        let osc = WavetableOscillator::new(0, 10, 5, 5, true);
        assert!(!osc.looping);
    }
}
