//! Key/velocity gated zones.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::generator::{Generator, GeneratorType};
use crate::modulator::Modulator;
use crate::preset::Instrument;
use crate::sample::Sample;

/// Inclusive MIDI value range used for key and velocity guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyRange {
    pub min: u8,
    pub max: u8,
}

impl KeyRange {
    pub const FULL: KeyRange = KeyRange { min: 0, max: 127 };

    /// Build a range; reversed bounds are swapped.
    pub const fn new(min: u8, max: u8) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    #[inline]
    pub fn contains(&self, value: u8) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

/// Generators and modulators guarded by optional key and velocity ranges.
///
/// `link` is the referenced instrument (preset zones) or sample (instrument
/// zones). A zone without a link used as a global zone supplies inherited
/// defaults to its siblings.
#[derive(Debug, Clone)]
pub struct Zone<L> {
    pub key_range: Option<KeyRange>,
    pub velocity_range: Option<KeyRange>,
    pub generators: Vec<Generator>,
    pub modulators: Vec<Modulator>,
    pub link: Option<L>,
}

/// Zone of an instrument, linking a sample.
pub type InstrumentZone = Zone<Arc<Sample>>;

/// Zone of a preset, linking an instrument.
pub type PresetZone = Zone<Arc<Instrument>>;

impl<L> Default for Zone<L> {
    fn default() -> Self {
        Self {
            key_range: None,
            velocity_range: None,
            generators: Vec::new(),
            modulators: Vec::new(),
            link: None,
        }
    }
}

impl<L> Zone<L> {
    /// A zone without a link, for use as a global zone.
    pub fn global() -> Self {
        Self::default()
    }

    pub fn new(link: L) -> Self {
        Self {
            link: Some(link),
            ..Self::default()
        }
    }

    pub fn with_key_range(mut self, min: u8, max: u8) -> Self {
        self.key_range = Some(KeyRange::new(min, max));
        self
    }

    pub fn with_velocity_range(mut self, min: u8, max: u8) -> Self {
        self.velocity_range = Some(KeyRange::new(min, max));
        self
    }

    /// Set a generator, replacing an earlier value of the same type.
    pub fn with_generator(mut self, ty: GeneratorType, value: i16) -> Self {
        match self.generators.iter_mut().find(|g| g.ty == ty) {
            Some(existing) => existing.value = value,
            None => self.generators.push(Generator::new(ty, value)),
        }
        self
    }

    pub fn with_modulator(mut self, modulator: Modulator) -> Self {
        self.modulators.push(modulator);
        self
    }

    pub fn generator(&self, ty: GeneratorType) -> Option<i16> {
        self.generators.iter().find(|g| g.ty == ty).map(|g| g.value)
    }

    /// True if `key` and `velocity` fall within this zone's ranges, falling back
    /// to the global zone's ranges where this zone omits one.
    pub fn matches(&self, global: &Zone<L>, key: u8, velocity: u8) -> bool {
        let key_range = self
            .key_range
            .or(global.key_range)
            .unwrap_or(KeyRange::FULL);
        let velocity_range = self
            .velocity_range
            .or(global.velocity_range)
            .unwrap_or(KeyRange::FULL);
        key_range.contains(key) && velocity_range.contains(velocity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_range_contains() {
        let range = KeyRange::new(64, 0);
        assert_eq!(range, KeyRange::new(0, 64));
        assert!(range.contains(0));
        assert!(range.contains(64));
        assert!(!range.contains(65));
    }

    #[test]
    fn test_zone_falls_back_to_global_range() {
        let global: Zone<()> = Zone::global().with_key_range(0, 63);
        let zone: Zone<()> = Zone::new(()).with_velocity_range(10, 20);
        assert!(zone.matches(&global, 60, 15));
        assert!(!zone.matches(&global, 70, 15));
        assert!(!zone.matches(&global, 60, 30));

        let own = Zone::new(()).with_key_range(64, 127);
        assert!(own.matches(&global, 70, 100));
    }

    #[test]
    fn test_with_generator_replaces() {
        let zone: Zone<()> = Zone::global()
            .with_generator(GeneratorType::Pan, 10)
            .with_generator(GeneratorType::Pan, -10);
        assert_eq!(zone.generators.len(), 1);
        assert_eq!(zone.generator(GeneratorType::Pan), Some(-10));
    }
}
