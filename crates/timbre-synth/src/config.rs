//! Synthesizer configuration.

use crate::{Error, Result};

/// Construction-time settings. Runtime parameters go through
/// [`MasterParameter`](crate::MasterParameter).
#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub sample_rate: f64,
    /// Frames rendered per quantum.
    pub quantum_size: usize,
    /// Preallocated voices.
    pub voice_capacity: usize,
    /// Audio time of the first rendered frame, in seconds.
    pub initial_time: f64,
    /// MIDI channels created at startup.
    pub channel_count: usize,
    /// Capacity of the notification channel.
    pub event_capacity: usize,
    pub enable_effects: bool,
}

impl Default for SynthConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            quantum_size: 128,
            voice_capacity: 350,
            initial_time: 0.0,
            channel_count: 16,
            event_capacity: 1024,
            enable_effects: true,
        }
    }
}

impl SynthConfig {
    pub fn validate(&self) -> Result<()> {
        if !(8000.0..=384000.0).contains(&self.sample_rate) {
            return Err(Error::InvalidConfig(format!(
                "sample_rate {} out of range (8000-384000 Hz)",
                self.sample_rate
            )));
        }
        if !(1..=4096).contains(&self.quantum_size) {
            return Err(Error::InvalidConfig(format!(
                "quantum_size {} out of range (1-4096 frames)",
                self.quantum_size
            )));
        }
        if self.voice_capacity == 0 {
            return Err(Error::InvalidConfig("voice_capacity must be at least 1".into()));
        }
        if self.channel_count == 0 {
            return Err(Error::InvalidConfig("channel_count must be at least 1".into()));
        }
        if !self.initial_time.is_finite() || self.initial_time < 0.0 {
            return Err(Error::InvalidConfig(format!(
                "initial_time {} must be finite and non-negative",
                self.initial_time
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SynthConfig::default();
        assert_eq!(config.sample_rate, 44100.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let bad = [
            SynthConfig {
                sample_rate: 1000.0,
                ..Default::default()
            },
            SynthConfig {
                quantum_size: 0,
                ..Default::default()
            },
            SynthConfig {
                voice_capacity: 0,
                ..Default::default()
            },
            SynthConfig {
                initial_time: f64::NAN,
                ..Default::default()
            },
            SynthConfig {
                initial_time: -1.0,
                ..Default::default()
            },
        ];
        for config in bad {
            assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
        }
    }
}
