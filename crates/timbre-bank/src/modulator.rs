//! SoundFont 2 modulators.
//!
//! A modulator maps one (optionally scaled by a second) controller source to an
//! additive offset on a destination generator. Sources are stored decoded; the
//! 16-bit SF2 layout is available through [`ModulatorSource::from_bits`] /
//! [`ModulatorSource::to_bits`] for loaders.

use serde::{Deserialize, Serialize};

use crate::generator::GeneratorType;

/// Non-CC modulator source indices (SF2 "general controller palette").
pub mod general {
    pub const NO_CONTROLLER: u8 = 0;
    pub const NOTE_ON_VELOCITY: u8 = 2;
    pub const NOTE_ON_KEY_NUM: u8 = 3;
    pub const POLY_PRESSURE: u8 = 10;
    pub const CHANNEL_PRESSURE: u8 = 13;
    pub const PITCH_WHEEL: u8 = 14;
    pub const PITCH_WHEEL_RANGE: u8 = 16;
    pub const LINK: u8 = 127;
}

/// Shape applied to the normalized source value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModulatorCurve {
    #[default]
    Linear = 0,
    Concave = 1,
    Convex = 2,
    Switch = 3,
}

impl ModulatorCurve {
    fn from_bits(bits: u16) -> Self {
        match bits & 0x3F {
            1 => ModulatorCurve::Concave,
            2 => ModulatorCurve::Convex,
            3 => ModulatorCurve::Switch,
            _ => ModulatorCurve::Linear,
        }
    }
}

/// Output transform applied after scaling by the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModulatorTransform {
    #[default]
    Linear = 0,
    Absolute = 2,
}

/// One modulator source: a controller index plus its mapping flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ModulatorSource {
    /// CC number when `is_cc`, otherwise a [`general`] index.
    pub index: u8,
    pub is_cc: bool,
    /// Value runs max to min.
    pub negative: bool,
    /// Value maps to -1..1 instead of 0..1.
    pub bipolar: bool,
    pub curve: ModulatorCurve,
}

impl ModulatorSource {
    /// The "no controller" source, which always evaluates to 1.
    pub const NONE: ModulatorSource = ModulatorSource {
        index: general::NO_CONTROLLER,
        is_cc: false,
        negative: false,
        bipolar: false,
        curve: ModulatorCurve::Linear,
    };

    #[inline]
    pub const fn cc(index: u8) -> Self {
        Self {
            index,
            is_cc: true,
            negative: false,
            bipolar: false,
            curve: ModulatorCurve::Linear,
        }
    }

    #[inline]
    pub const fn general(index: u8) -> Self {
        Self {
            index,
            is_cc: false,
            negative: false,
            bipolar: false,
            curve: ModulatorCurve::Linear,
        }
    }

    #[inline]
    pub const fn negative(mut self) -> Self {
        self.negative = true;
        self
    }

    #[inline]
    pub const fn bipolar(mut self) -> Self {
        self.bipolar = true;
        self
    }

    #[inline]
    pub const fn curve(mut self, curve: ModulatorCurve) -> Self {
        self.curve = curve;
        self
    }

    /// True for the "no controller" source.
    #[inline]
    pub fn is_none(&self) -> bool {
        !self.is_cc && self.index == general::NO_CONTROLLER
    }

    /// Decode the SF2 `SFModulator` bit layout.
    pub fn from_bits(bits: u16) -> Self {
        Self {
            index: (bits & 0x7F) as u8,
            is_cc: bits & 0x80 != 0,
            negative: bits & 0x100 != 0,
            bipolar: bits & 0x200 != 0,
            curve: ModulatorCurve::from_bits(bits >> 10),
        }
    }

    pub fn to_bits(self) -> u16 {
        u16::from(self.index)
            | (u16::from(self.is_cc) << 7)
            | (u16::from(self.negative) << 8)
            | (u16::from(self.bipolar) << 9)
            | ((self.curve as u16) << 10)
    }
}

/// A controller-to-generator mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Modulator {
    pub source: ModulatorSource,
    pub secondary: ModulatorSource,
    pub destination: GeneratorType,
    pub amount: i16,
    pub transform: ModulatorTransform,
}

impl Modulator {
    pub const fn new(
        source: ModulatorSource,
        secondary: ModulatorSource,
        destination: GeneratorType,
        amount: i16,
    ) -> Self {
        Self {
            source,
            secondary,
            destination,
            amount,
            transform: ModulatorTransform::Linear,
        }
    }

    pub const fn with_transform(mut self, transform: ModulatorTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Same sources, destination and transform; the amount is not compared.
    #[inline]
    pub fn is_identical(&self, other: &Modulator) -> bool {
        self.source == other.source
            && self.secondary == other.secondary
            && self.destination == other.destination
            && self.transform == other.transform
    }

    /// A new modulator identical to `self` with both amounts added.
    #[inline]
    pub fn summed(&self, other: &Modulator) -> Modulator {
        Modulator {
            amount: self.amount.saturating_add(other.amount),
            ..*self
        }
    }
}

/// Add-if-absent merge under the identical relation. Local modulators win.
pub fn merge_modulators(local: &[Modulator], global: &[Modulator]) -> Vec<Modulator> {
    let mut merged = Vec::with_capacity(local.len() + global.len());
    merged.extend_from_slice(local);
    for modulator in global {
        if !local.iter().any(|m| m.is_identical(modulator)) {
            merged.push(*modulator);
        }
    }
    merged
}

/// Combine instrument and preset level modulators into the voice's final list.
///
/// Preset modulators identical to an instrument modulator add their amount to a
/// new copy of it; the rest are appended in order.
pub fn combine_modulators(instrument: &[Modulator], preset: &[Modulator]) -> Vec<Modulator> {
    let mut combined = instrument.to_vec();
    for modulator in preset {
        match combined.iter().position(|m| m.is_identical(modulator)) {
            Some(i) => combined[i] = combined[i].summed(modulator),
            None => combined.push(*modulator),
        }
    }
    combined
}

/// CC 71 to filter Q. Unipolar, so at the controller default (64) it contributes
/// half its amount; the renderer subtracts that as a fixed offset.
pub const RESONANCE_MODULATOR: Modulator = Modulator::new(
    ModulatorSource::cc(71),
    ModulatorSource::NONE,
    GeneratorType::InitialFilterQ,
    250,
);

/// The SF2 default modulators plus the common sound-controller extensions.
pub fn default_modulators() -> Vec<Modulator> {
    use general::*;
    use GeneratorType as G;
    use ModulatorCurve::*;

    let velocity = ModulatorSource::general(NOTE_ON_VELOCITY);
    vec![
        // Velocity to attenuation
        Modulator::new(
            velocity.negative().curve(Concave),
            ModulatorSource::NONE,
            G::InitialAttenuation,
            960,
        ),
        // Velocity to filter cutoff
        Modulator::new(
            velocity.negative(),
            ModulatorSource::NONE,
            G::InitialFilterFc,
            -2400,
        ),
        Modulator::new(
            ModulatorSource::general(CHANNEL_PRESSURE),
            ModulatorSource::NONE,
            G::VibLfoToPitch,
            50,
        ),
        Modulator::new(
            ModulatorSource::cc(1),
            ModulatorSource::NONE,
            G::VibLfoToPitch,
            50,
        ),
        // Main volume and expression
        Modulator::new(
            ModulatorSource::cc(7).negative().curve(Concave),
            ModulatorSource::NONE,
            G::InitialAttenuation,
            960,
        ),
        Modulator::new(
            ModulatorSource::cc(11).negative().curve(Concave),
            ModulatorSource::NONE,
            G::InitialAttenuation,
            960,
        ),
        Modulator::new(
            ModulatorSource::cc(10).bipolar(),
            ModulatorSource::NONE,
            G::Pan,
            500,
        ),
        Modulator::new(
            ModulatorSource::cc(91),
            ModulatorSource::NONE,
            G::ReverbEffectsSend,
            200,
        ),
        Modulator::new(
            ModulatorSource::cc(93),
            ModulatorSource::NONE,
            G::ChorusEffectsSend,
            200,
        ),
        // Pitch wheel scaled by the pitch wheel range
        Modulator::new(
            ModulatorSource::general(PITCH_WHEEL).bipolar(),
            ModulatorSource::general(PITCH_WHEEL_RANGE),
            G::FineTune,
            12800,
        ),
        // Sound controllers: resonance, release, attack, brightness
        RESONANCE_MODULATOR,
        Modulator::new(
            ModulatorSource::cc(72).bipolar(),
            ModulatorSource::NONE,
            G::ReleaseVolEnv,
            1200,
        ),
        Modulator::new(
            ModulatorSource::cc(73).bipolar(),
            ModulatorSource::NONE,
            G::AttackVolEnv,
            1200,
        ),
        Modulator::new(
            ModulatorSource::cc(74).bipolar(),
            ModulatorSource::NONE,
            G::InitialFilterFc,
            6000,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cc_to_pan(amount: i16) -> Modulator {
        Modulator::new(
            ModulatorSource::cc(10).bipolar(),
            ModulatorSource::NONE,
            GeneratorType::Pan,
            amount,
        )
    }

    #[test]
    fn test_source_bits_layout() {
        let source = ModulatorSource::from_bits(0x0502);
        assert_eq!(source.index, 2);
        assert!(!source.is_cc);
        assert!(source.negative);
        assert!(!source.bipolar);
        assert_eq!(source.curve, ModulatorCurve::Concave);
        assert_eq!(source.to_bits(), 0x0502);

        let cc = ModulatorSource::cc(10).bipolar();
        assert_eq!(cc.to_bits(), 0x028A);
    }

    #[test]
    fn test_identical_ignores_amount() {
        assert!(cc_to_pan(100).is_identical(&cc_to_pan(-300)));
        let absolute = cc_to_pan(100).with_transform(ModulatorTransform::Absolute);
        assert!(!cc_to_pan(100).is_identical(&absolute));
    }

    #[test]
    fn test_combine_sums_identical_amounts() {
        let instrument = [cc_to_pan(100)];
        let preset = [cc_to_pan(250)];
        let combined = combine_modulators(&instrument, &preset);
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0].amount, 350);
        // Inputs are untouched.
        assert_eq!(instrument[0].amount, 100);
        assert_eq!(preset[0].amount, 250);
    }

    #[test]
    fn test_combine_appends_distinct() {
        let reverb = Modulator::new(
            ModulatorSource::cc(91),
            ModulatorSource::NONE,
            GeneratorType::ReverbEffectsSend,
            100,
        );
        let combined = combine_modulators(&[cc_to_pan(10)], &[reverb]);
        assert_eq!(combined, vec![cc_to_pan(10), reverb]);
    }

    #[test]
    fn test_merge_keeps_local_amount() {
        let merged = merge_modulators(&[cc_to_pan(1)], &[cc_to_pan(2)]);
        assert_eq!(merged, vec![cc_to_pan(1)]);
    }

    #[test]
    fn test_default_modulators_are_distinct() {
        let defaults = default_modulators();
        for (i, a) in defaults.iter().enumerate() {
            for b in &defaults[i + 1..] {
                assert!(!a.is_identical(b), "{a:?} duplicates {b:?}");
            }
        }
    }
}
