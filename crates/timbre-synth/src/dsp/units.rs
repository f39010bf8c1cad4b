//! SoundFont unit conversions.

/// Attenuation (centibels) at which a voice is inaudible.
pub const SILENCE_CB: f64 = 960.0;

/// Timecents at or below this value mean "instant".
const INSTANT_TIMECENTS: f64 = -32767.0;

/// Timecents to seconds: `2^(tc/1200)`.
#[inline]
pub fn timecents_to_seconds(timecents: f64) -> f64 {
    if timecents <= INSTANT_TIMECENTS {
        return 0.0;
    }
    (timecents / 1200.0).exp2()
}

/// Absolute cents to Hz, relative to 8.176 Hz (MIDI key 0).
#[inline]
pub fn absolute_cents_to_hz(cents: f64) -> f64 {
    8.176 * (cents / 1200.0).exp2()
}

/// Attenuation in centibels to linear gain.
#[inline]
pub fn centibels_to_gain(centibels: f64) -> f64 {
    10f64.powf(-centibels / 200.0)
}

/// Linear gain to attenuation in centibels, saturating at silence.
#[inline]
pub fn gain_to_centibels(gain: f64) -> f64 {
    if gain <= 0.0 {
        return SILENCE_CB;
    }
    (-200.0 * gain.log10()).clamp(0.0, SILENCE_CB)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_timecents() {
        assert_relative_eq!(timecents_to_seconds(0.0), 1.0);
        assert_relative_eq!(timecents_to_seconds(1200.0), 2.0);
        assert_relative_eq!(timecents_to_seconds(-12000.0), 2f64.powi(-10));
        assert_eq!(timecents_to_seconds(-32768.0), 0.0);
    }

    #[test]
    fn test_absolute_cents() {
        assert_relative_eq!(absolute_cents_to_hz(6900.0), 440.0, epsilon = 0.05);
    }

    #[test]
    fn test_centibels() {
        assert_relative_eq!(centibels_to_gain(0.0), 1.0);
        assert_relative_eq!(centibels_to_gain(200.0), 0.1);
        assert_relative_eq!(gain_to_centibels(0.1), 200.0, epsilon = 1e-9);
        assert_eq!(gain_to_centibels(0.0), SILENCE_CB);
    }
}
