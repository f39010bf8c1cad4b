//! Tolerance constants for audio testing.

/// Floating point rounding errors (silence, exact gain).
pub const FLOAT_EPSILON: f32 = 1e-6;

/// Values below this are considered silent (~-80dB).
pub const SILENCE_THRESHOLD: f32 = 0.0001;

/// Level a sounding note must clearly exceed.
pub const AUDIBLE_THRESHOLD: f32 = 0.001;
