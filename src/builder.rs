//! Builder for configuring and constructing a [`Synthesizer`].

use std::sync::Arc;

use timbre_bank::{MidiSystem, SoundBank, SoundBankStack};
use timbre_synth::{EffectProcessor, MasterParameter, SynthConfig, Synthesizer};
use tracing::debug;

use crate::Result;

/// Banks added later take priority over earlier ones.
///
/// # Example
///
/// ```ignore
/// use timbre::prelude::*;
///
/// let synth = SynthBuilder::new()
///     .sample_rate(48000.0)
///     .voices(128)
///     .bank("gm", gm_bank)
///     .midi_system(MidiSystem::Gm)
///     .build()?;
/// ```
pub struct SynthBuilder {
    config: SynthConfig,
    stack: SoundBankStack,
    parameters: Vec<MasterParameter>,
    reverb: Option<Box<dyn EffectProcessor>>,
    chorus: Option<Box<dyn EffectProcessor>>,
}

impl Default for SynthBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SynthBuilder {
    pub fn new() -> Self {
        Self {
            config: SynthConfig::default(),
            stack: SoundBankStack::new(),
            parameters: Vec::new(),
            reverb: None,
            chorus: None,
        }
    }

    /// Default: 44100
    pub fn sample_rate(mut self, sample_rate: f64) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    /// Default: 128
    pub fn quantum_size(mut self, frames: usize) -> Self {
        self.config.quantum_size = frames;
        self
    }

    /// Default: 350
    pub fn voices(mut self, capacity: usize) -> Self {
        self.config.voice_capacity = capacity;
        self
    }

    /// Default: 16
    pub fn channels(mut self, count: usize) -> Self {
        self.config.channel_count = count;
        self
    }

    pub fn initial_time(mut self, seconds: f64) -> Self {
        self.config.initial_time = seconds;
        self
    }

    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    pub fn effects(mut self, enabled: bool) -> Self {
        self.config.enable_effects = enabled;
        self
    }

    pub fn bank(self, id: impl Into<String>, bank: SoundBank) -> Self {
        self.shared_bank(id, Arc::new(bank), 0)
    }

    /// Add a bank shared with other synthesizers, shifting its melodic banks by `bank_offset`.
    pub fn shared_bank(mut self, id: impl Into<String>, bank: Arc<SoundBank>, bank_offset: u8) -> Self {
        self.stack.add_bank(id, bank, bank_offset);
        self
    }

    pub fn stack(mut self, stack: SoundBankStack) -> Self {
        self.stack = stack;
        self
    }

    pub fn midi_system(self, system: MidiSystem) -> Self {
        self.parameter(MasterParameter::MidiSystem(system))
    }

    /// Apply a master parameter after construction.
    pub fn parameter(mut self, parameter: MasterParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn reverb(mut self, processor: Box<dyn EffectProcessor>) -> Self {
        self.reverb = Some(processor);
        self
    }

    pub fn chorus(mut self, processor: Box<dyn EffectProcessor>) -> Self {
        self.chorus = Some(processor);
        self
    }

    pub fn build(self) -> Result<Synthesizer> {
        let mut synth = Synthesizer::new(self.config, self.stack)?;
        for parameter in self.parameters {
            synth.set_master_parameter(parameter);
        }
        if let Some(reverb) = self.reverb {
            synth.set_reverb_processor(reverb);
        }
        if let Some(chorus) = self.chorus {
            synth.set_chorus_processor(chorus);
        }
        if synth.master().midi_system != MidiSystem::default() {
            // Bank select interpretation changed: pick presets again.
            synth.reset_all_controllers();
        }
        debug!(
            "Built synthesizer with {} sound banks",
            synth.bank_stack().len()
        );
        Ok(synth)
    }
}
