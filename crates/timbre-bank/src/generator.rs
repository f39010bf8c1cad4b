//! SoundFont 2 generators.
//!
//! A generator is a typed synthesis parameter with a signed 16-bit value. The
//! numbering follows the SF2.04 generator enumeration so that values read by an
//! external loader can be stored without translation.

use serde::{Deserialize, Serialize};

/// Number of generator slots (SF2 ids 0..=60).
pub const GENERATOR_COUNT: usize = 61;

/// SF2 generator identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum GeneratorType {
    StartAddrsOffset = 0,
    EndAddrOffset = 1,
    StartloopAddrsOffset = 2,
    EndloopAddrsOffset = 3,
    StartAddrsCoarseOffset = 4,
    ModLfoToPitch = 5,
    VibLfoToPitch = 6,
    ModEnvToPitch = 7,
    InitialFilterFc = 8,
    InitialFilterQ = 9,
    ModLfoToFilterFc = 10,
    ModEnvToFilterFc = 11,
    EndAddrsCoarseOffset = 12,
    ModLfoToVolume = 13,
    Unused1 = 14,
    ChorusEffectsSend = 15,
    ReverbEffectsSend = 16,
    Pan = 17,
    Unused2 = 18,
    Unused3 = 19,
    Unused4 = 20,
    DelayModLfo = 21,
    FreqModLfo = 22,
    DelayVibLfo = 23,
    FreqVibLfo = 24,
    DelayModEnv = 25,
    AttackModEnv = 26,
    HoldModEnv = 27,
    DecayModEnv = 28,
    SustainModEnv = 29,
    ReleaseModEnv = 30,
    KeyNumToModEnvHold = 31,
    KeyNumToModEnvDecay = 32,
    DelayVolEnv = 33,
    AttackVolEnv = 34,
    HoldVolEnv = 35,
    DecayVolEnv = 36,
    SustainVolEnv = 37,
    ReleaseVolEnv = 38,
    KeyNumToVolEnvHold = 39,
    KeyNumToVolEnvDecay = 40,
    Instrument = 41,
    Reserved1 = 42,
    KeyRange = 43,
    VelRange = 44,
    StartloopAddrsCoarseOffset = 45,
    KeyNum = 46,
    Velocity = 47,
    InitialAttenuation = 48,
    Reserved2 = 49,
    EndloopAddrsCoarseOffset = 50,
    CoarseTune = 51,
    FineTune = 52,
    SampleId = 53,
    SampleModes = 54,
    Reserved3 = 55,
    ScaleTuning = 56,
    ExclusiveClass = 57,
    OverridingRootKey = 58,
    Unused5 = 59,
    EndOper = 60,
}

/// Valid range and default of a generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorLimits {
    pub min: i32,
    pub max: i32,
    pub default: i16,
}

const fn lim(min: i32, max: i32, default: i16) -> GeneratorLimits {
    GeneratorLimits { min, max, default }
}

const NONE: GeneratorLimits = lim(0, 0, 0);
const TIME: GeneratorLimits = lim(-12000, 5000, -12000);
const ENV_TIME: GeneratorLimits = lim(-12000, 8000, -12000);
const DEPTH: GeneratorLimits = lim(-12000, 12000, 0);
const KEY_SCALE: GeneratorLimits = lim(-1200, 1200, 0);
const ADDRESS: GeneratorLimits = lim(-32768, 32768, 0);

/// Indexed by generator id.
const LIMITS: [GeneratorLimits; GENERATOR_COUNT] = [
    lim(0, 32768, 0), // startAddrsOffset
    lim(-32768, 0, 0), // endAddrOffset
    ADDRESS, // startloopAddrsOffset
    ADDRESS, // endloopAddrsOffset
    lim(0, 32768, 0), // startAddrsCoarseOffset
    DEPTH, // modLfoToPitch
    DEPTH, // vibLfoToPitch
    DEPTH, // modEnvToPitch
    lim(1500, 13500, 13500), // initialFilterFc
    lim(0, 960, 0), // initialFilterQ
    DEPTH, // modLfoToFilterFc
    DEPTH, // modEnvToFilterFc
    lim(-32768, 0, 0), // endAddrsCoarseOffset
    lim(-960, 960, 0), // modLfoToVolume
    NONE, // unused1
    lim(0, 1000, 0), // chorusEffectsSend
    lim(0, 1000, 0), // reverbEffectsSend
    lim(-500, 500, 0), // pan
    NONE, // unused2
    NONE, // unused3
    NONE, // unused4
    TIME, // delayModLFO
    lim(-16000, 4500, 0), // freqModLFO
    TIME, // delayVibLFO
    lim(-16000, 4500, 0), // freqVibLFO
    TIME, // delayModEnv
    ENV_TIME, // attackModEnv
    TIME, // holdModEnv
    ENV_TIME, // decayModEnv
    lim(0, 1000, 0), // sustainModEnv
    ENV_TIME, // releaseModEnv
    KEY_SCALE, // keyNumToModEnvHold
    KEY_SCALE, // keyNumToModEnvDecay
    TIME, // delayVolEnv
    ENV_TIME, // attackVolEnv
    TIME, // holdVolEnv
    ENV_TIME, // decayVolEnv
    lim(0, 1440, 0), // sustainVolEnv
    ENV_TIME, // releaseVolEnv
    KEY_SCALE, // keyNumToVolEnvHold
    KEY_SCALE, // keyNumToVolEnvDecay
    NONE, // instrument
    NONE, // reserved1
    NONE, // keyRange
    NONE, // velRange
    ADDRESS, // startloopAddrsCoarseOffset
    lim(-1, 127, -1), // keyNum
    lim(-1, 127, -1), // velocity
    lim(0, 1440, 0), // initialAttenuation
    NONE, // reserved2
    ADDRESS, // endloopAddrsCoarseOffset
    lim(-120, 120, 0), // coarseTune
    lim(-12700, 12700, 0), // fineTune
    NONE, // sampleID
    lim(0, 3, 0), // sampleModes
    NONE, // reserved3
    lim(0, 1200, 100), // scaleTuning
    lim(0, 127, 0), // exclusiveClass
    lim(-1, 127, -1), // overridingRootKey
    NONE, // unused5
    NONE, // endOper
];

impl GeneratorType {
    /// Every generator in id order.
    pub const ALL: [GeneratorType; GENERATOR_COUNT] = {
        use GeneratorType::*;
        [
            StartAddrsOffset,
            EndAddrOffset,
            StartloopAddrsOffset,
            EndloopAddrsOffset,
            StartAddrsCoarseOffset,
            ModLfoToPitch,
            VibLfoToPitch,
            ModEnvToPitch,
            InitialFilterFc,
            InitialFilterQ,
            ModLfoToFilterFc,
            ModEnvToFilterFc,
            EndAddrsCoarseOffset,
            ModLfoToVolume,
            Unused1,
            ChorusEffectsSend,
            ReverbEffectsSend,
            Pan,
            Unused2,
            Unused3,
            Unused4,
            DelayModLfo,
            FreqModLfo,
            DelayVibLfo,
            FreqVibLfo,
            DelayModEnv,
            AttackModEnv,
            HoldModEnv,
            DecayModEnv,
            SustainModEnv,
            ReleaseModEnv,
            KeyNumToModEnvHold,
            KeyNumToModEnvDecay,
            DelayVolEnv,
            AttackVolEnv,
            HoldVolEnv,
            DecayVolEnv,
            SustainVolEnv,
            ReleaseVolEnv,
            KeyNumToVolEnvHold,
            KeyNumToVolEnvDecay,
            Instrument,
            Reserved1,
            KeyRange,
            VelRange,
            StartloopAddrsCoarseOffset,
            KeyNum,
            Velocity,
            InitialAttenuation,
            Reserved2,
            EndloopAddrsCoarseOffset,
            CoarseTune,
            FineTune,
            SampleId,
            SampleModes,
            Reserved3,
            ScaleTuning,
            ExclusiveClass,
            OverridingRootKey,
            Unused5,
            EndOper,
        ]
    };

    #[inline]
    pub fn from_id(id: u16) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub fn limits(self) -> GeneratorLimits {
        LIMITS[self.index()]
    }

    #[inline]
    pub fn default_value(self) -> i16 {
        self.limits().default
    }

    /// Clamp a value into this generator's valid range.
    ///
    /// Generators without a range (structural or unused ids) pass through.
    #[inline]
    pub fn clamp(self, value: i32) -> i16 {
        let limits = self.limits();
        if limits.min == 0 && limits.max == 0 {
            return value.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        }
        value
            .clamp(limits.min, limits.max)
            .clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16
    }

    /// Sample address and key/velocity overrides are instrument-level only.
    pub fn is_instrument_only(self) -> bool {
        use GeneratorType::*;
        matches!(
            self,
            StartAddrsOffset
                | EndAddrOffset
                | StartloopAddrsOffset
                | EndloopAddrsOffset
                | StartAddrsCoarseOffset
                | EndAddrsCoarseOffset
                | StartloopAddrsCoarseOffset
                | EndloopAddrsCoarseOffset
                | KeyNum
                | Velocity
                | SampleModes
                | ExclusiveClass
                | OverridingRootKey
        )
    }
}

/// A generator value as stored in a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Generator {
    pub ty: GeneratorType,
    pub value: i16,
}

impl Generator {
    #[inline]
    pub const fn new(ty: GeneratorType, value: i16) -> Self {
        Self { ty, value }
    }
}

/// Merge `global` into `local`: every global generator whose type the local list
/// lacks is appended. Local values are never overwritten.
pub fn merge_generators(local: &[Generator], global: &[Generator]) -> Vec<Generator> {
    let mut merged = Vec::with_capacity(local.len() + global.len());
    merged.extend_from_slice(local);
    for generator in global {
        if !local.iter().any(|g| g.ty == generator.ty) {
            merged.push(*generator);
        }
    }
    merged
}
