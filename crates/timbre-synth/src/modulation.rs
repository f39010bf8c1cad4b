//! SF2 modulator evaluation.
//!
//! Once per quantum every voice recomputes its modulated generator table from its
//! base generators plus the sum of all modulator contributions. Sources are read
//! from the channel's controller table as 14-bit values normalized by 16384.

use timbre_bank::{
    general, GeneratorType, Modulator, ModulatorCurve, ModulatorSource, ModulatorTransform,
    GENERATOR_COUNT,
};
use timbre_midi::cc;

use crate::channel::ControllerTable;

/// Inputs a modulator source can read.
#[derive(Debug, Clone, Copy)]
pub struct ModulationContext<'a> {
    pub controllers: &'a ControllerTable,
    pub velocity: u8,
    pub key: u8,
    pub poly_pressure: u8,
    /// Scale applied to modulation wheel sources (RPN 0/5).
    pub modulation_multiplier: f64,
}

#[inline]
fn concave(x: f64) -> f64 {
    if x <= 0.0 {
        0.0
    } else if x >= 1.0 {
        1.0
    } else {
        (-(40.0 / 96.0) * (1.0 - x).log10()).clamp(0.0, 1.0)
    }
}

#[inline]
fn convex(x: f64) -> f64 {
    1.0 - concave(1.0 - x)
}

#[inline]
fn shape(curve: ModulatorCurve, x: f64) -> f64 {
    match curve {
        ModulatorCurve::Linear => x,
        ModulatorCurve::Concave => concave(x),
        ModulatorCurve::Convex => convex(x),
        ModulatorCurve::Switch => {
            if x >= 0.5 {
                1.0
            } else {
                0.0
            }
        }
    }
}

/// Map a normalized 0..1 input through the source's direction, polarity and curve.
pub fn transform_source(source: ModulatorSource, normalized: f64) -> f64 {
    let x = if source.negative {
        1.0 - normalized
    } else {
        normalized
    };
    if source.bipolar {
        let v = 2.0 * x - 1.0;
        if source.curve == ModulatorCurve::Switch {
            return if x >= 0.5 { 1.0 } else { -1.0 };
        }
        v.signum() * shape(source.curve, v.abs())
    } else {
        shape(source.curve, x)
    }
}

/// Raw 14-bit value of a source.
fn raw_source(source: ModulatorSource, ctx: &ModulationContext<'_>) -> f64 {
    if source.is_cc {
        return f64::from(ctx.controllers.get(usize::from(source.index)));
    }
    let seven_bit = |value: u8| f64::from(u16::from(value) << 7);
    match source.index {
        general::NOTE_ON_VELOCITY => seven_bit(ctx.velocity),
        general::NOTE_ON_KEY_NUM => seven_bit(ctx.key),
        general::POLY_PRESSURE => seven_bit(ctx.poly_pressure),
        index => f64::from(ctx.controllers.source(index)),
    }
}

/// Value of one source. An absent source reads as 1.
pub fn source_value(source: ModulatorSource, ctx: &ModulationContext<'_>) -> f64 {
    if source.is_none() {
        return 1.0;
    }
    transform_source(source, raw_source(source, ctx) / 16384.0)
}

/// Contribution of one modulator to its destination.
pub fn modulator_value(modulator: &Modulator, ctx: &ModulationContext<'_>) -> f64 {
    let mut primary = source_value(modulator.source, ctx);
    if modulator.source.is_cc && modulator.source.index == cc::MODULATION_WHEEL {
        primary *= ctx.modulation_multiplier;
    }
    let value = primary * source_value(modulator.secondary, ctx) * f64::from(modulator.amount);
    match modulator.transform {
        ModulatorTransform::Linear => value,
        ModulatorTransform::Absolute => value.abs(),
    }
}

/// Compute `out = base + offsets + sum(modulators)`, clamped to each
/// generator's limits.
///
/// Initial attenuation keeps only its lower bound: the renderer treats values
/// past the silence threshold as silent.
pub fn compute_modulated(
    base: &[i16; GENERATOR_COUNT],
    modulators: &[Modulator],
    ctx: &ModulationContext<'_>,
    offsets: Option<&[i16; GENERATOR_COUNT]>,
    out: &mut [i16; GENERATOR_COUNT],
) {
    let mut sums = [0f64; GENERATOR_COUNT];
    for (i, sum) in sums.iter_mut().enumerate() {
        *sum = f64::from(base[i]) + offsets.map_or(0.0, |o| f64::from(o[i]));
    }
    for modulator in modulators {
        sums[modulator.destination.index()] += modulator_value(modulator, ctx);
    }
    for ((slot, sum), ty) in out.iter_mut().zip(sums).zip(GeneratorType::ALL) {
        *slot = clamp_modulated(ty, sum);
    }
}

fn clamp_modulated(ty: GeneratorType, value: f64) -> i16 {
    let value = value.round().clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32;
    match ty {
        GeneratorType::InitialAttenuation => value.clamp(0, i32::from(i16::MAX)) as i16,
        _ => ty.clamp(value),
    }
}
