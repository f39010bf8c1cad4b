//! Presets and instruments.

use std::sync::Arc;

use crate::modulator::{default_modulators, Modulator};
use crate::patch::MidiPatch;
use crate::resolver::{resolve, VoiceParameters};
use crate::zone::{InstrumentZone, PresetZone};

/// An ordered list of sample zones plus a global zone.
#[derive(Debug, Clone, Default)]
pub struct Instrument {
    pub name: String,
    pub global_zone: InstrumentZone,
    pub zones: Vec<InstrumentZone>,
}

impl Instrument {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_global_zone(mut self, zone: InstrumentZone) -> Self {
        self.global_zone = zone;
        self
    }

    pub fn with_zone(mut self, zone: InstrumentZone) -> Self {
        self.zones.push(zone);
        self
    }
}

/// A playable program: instrument zones addressed by a MIDI patch.
#[derive(Debug, Clone)]
pub struct Preset {
    pub name: String,
    pub patch: MidiPatch,
    pub global_zone: PresetZone,
    pub zones: Vec<PresetZone>,
    /// The owning bank's default modulators, set when the preset is added to a bank.
    pub(crate) default_modulators: Arc<[Modulator]>,
}

impl Preset {
    pub fn new(name: impl Into<String>, patch: MidiPatch) -> Self {
        Self {
            name: name.into(),
            patch,
            global_zone: PresetZone::global(),
            zones: Vec::new(),
            default_modulators: Arc::from(default_modulators()),
        }
    }

    pub fn with_global_zone(mut self, zone: PresetZone) -> Self {
        self.global_zone = zone;
        self
    }

    pub fn with_zone(mut self, zone: PresetZone) -> Self {
        self.zones.push(zone);
        self
    }

    pub fn default_modulators(&self) -> &[Modulator] {
        &self.default_modulators
    }

    /// Resolve the voices this preset plays for a key and velocity.
    pub fn voice_parameters(&self, key: u8, velocity: u8) -> Vec<VoiceParameters> {
        resolve(self, key, velocity)
    }

    #[inline]
    pub fn is_drum(&self) -> bool {
        self.patch.is_gm_gs_drum
    }
}
