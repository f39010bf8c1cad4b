//! A loaded sound bank.

use std::sync::Arc;

use crate::modulator::{default_modulators, Modulator};
use crate::preset::Preset;

/// Presets of one sound bank plus the bank's default modulators.
#[derive(Debug, Clone)]
pub struct SoundBank {
    pub name: String,
    presets: Vec<Arc<Preset>>,
    default_modulators: Arc<[Modulator]>,
}

impl SoundBank {
    /// A bank using the standard default modulators.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_default_modulators(name, default_modulators())
    }

    /// A bank with custom default modulators (for example from a DMOD chunk).
    pub fn with_default_modulators(name: impl Into<String>, modulators: Vec<Modulator>) -> Self {
        Self {
            name: name.into(),
            presets: Vec::new(),
            default_modulators: Arc::from(modulators),
        }
    }

    /// Add a preset, binding it to this bank's default modulators.
    pub fn add_preset(&mut self, mut preset: Preset) -> Arc<Preset> {
        preset.default_modulators = self.default_modulators.clone();
        let preset = Arc::new(preset);
        self.presets.push(preset.clone());
        preset
    }

    pub fn with_preset(mut self, preset: Preset) -> Self {
        self.add_preset(preset);
        self
    }

    pub fn presets(&self) -> &[Arc<Preset>] {
        &self.presets
    }

    pub fn default_modulators(&self) -> &[Modulator] {
        &self.default_modulators
    }
}
