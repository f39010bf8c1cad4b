//! Equal-power pan law.

/// Table steps across the full left-right range.
const PAN_RESOLUTION: usize = 1000;

/// Precomputed cosine/sine pan gains.
#[derive(Debug, Clone)]
pub struct PanTable {
    left: Vec<f32>,
    right: Vec<f32>,
}

impl PanTable {
    pub fn new() -> Self {
        let angle = |i: usize| i as f64 / PAN_RESOLUTION as f64 * std::f64::consts::FRAC_PI_2;
        Self {
            left: (0..=PAN_RESOLUTION).map(|i| angle(i).cos() as f32).collect(),
            right: (0..=PAN_RESOLUTION).map(|i| angle(i).sin() as f32).collect(),
        }
    }

    /// Gains for a pan in SF2 units (-500 = hard left, 500 = hard right).
    #[inline]
    pub fn gains(&self, pan: f64) -> (f32, f32) {
        let index = (pan.clamp(-500.0, 500.0) + 500.0).round() as usize;
        (self.left[index], self.right[index])
    }
}

impl Default for PanTable {
    fn default() -> Self {
        Self::new()
    }
}
