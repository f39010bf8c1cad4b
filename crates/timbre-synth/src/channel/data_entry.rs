//! RPN/NRPN addressing.
//!
//! CC 101/100 select a registered parameter, CC 99/98 a non-registered one.
//! Data Entry (CC 6/38) then writes to whichever kind was addressed last; the
//! selected numbers themselves stay in the controller table.

use timbre_midi::cc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataEntryState {
    #[default]
    Idle,
    RpnCoarse,
    RpnFine,
    NrpnCoarse,
    NrpnFine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    Registered,
    NonRegistered,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataEntry {
    state: DataEntryState,
    kind: Option<ParameterKind>,
}

impl DataEntry {
    #[inline]
    pub fn state(&self) -> DataEntryState {
        self.state
    }

    /// Track a parameter number controller (CC 98-101).
    pub fn select(&mut self, controller: u8) {
        let (state, kind) = match controller {
            cc::RPN_MSB => (DataEntryState::RpnCoarse, ParameterKind::Registered),
            cc::RPN_LSB => (DataEntryState::RpnFine, ParameterKind::Registered),
            cc::NRPN_MSB => (DataEntryState::NrpnCoarse, ParameterKind::NonRegistered),
            cc::NRPN_LSB => (DataEntryState::NrpnFine, ParameterKind::NonRegistered),
            _ => return,
        };
        self.state = state;
        self.kind = Some(kind);
    }

    /// Data Entry arrived: addressing is complete.
    pub fn on_data_entry(&mut self) -> Option<ParameterKind> {
        self.state = DataEntryState::Idle;
        self.kind
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Registered parameters (RPN MSB, LSB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisteredParameter {
    PitchBendRange,
    FineTuning,
    CoarseTuning,
    ModulationDepth,
    /// 127/127 deselects.
    Null,
    Unknown(u8, u8),
}

impl RegisteredParameter {
    pub fn from_numbers(msb: u8, lsb: u8) -> Self {
        match (msb, lsb) {
            (0, 0) => RegisteredParameter::PitchBendRange,
            (0, 1) => RegisteredParameter::FineTuning,
            (0, 2) => RegisteredParameter::CoarseTuning,
            (0, 5) => RegisteredParameter::ModulationDepth,
            (127, 127) => RegisteredParameter::Null,
            (msb, lsb) => RegisteredParameter::Unknown(msb, lsb),
        }
    }
}

/// GS part parameters live under NRPN MSB 1.
const GS_PART_MSB: u8 = 1;
/// SF2 generator NRPNs live under NRPN MSB 120.
pub const SF2_NRPN_MSB: u8 = 120;

/// Non-registered parameters (NRPN MSB, LSB).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NonRegisteredParameter {
    VibratoRate,
    VibratoDepth,
    VibratoDelay,
    FilterCutoff,
    FilterResonance,
    AttackTime,
    DecayTime,
    ReleaseTime,
    DrumPitch(u8),
    DrumLevel(u8),
    DrumPan(u8),
    DrumReverb(u8),
    DrumChorus(u8),
    /// Generator number within the current SF2 NRPN page.
    Sf2Generator(u8),
    /// LSB 100-102 advance the SF2 generator page by 100, 1000 or 10000.
    Sf2Page(u16),
    Unknown(u8, u8),
}

impl NonRegisteredParameter {
    pub fn from_numbers(msb: u8, lsb: u8) -> Self {
        use NonRegisteredParameter::*;
        match (msb, lsb) {
            (GS_PART_MSB, 0x08) => VibratoRate,
            (GS_PART_MSB, 0x09) => VibratoDepth,
            (GS_PART_MSB, 0x0A) => VibratoDelay,
            (GS_PART_MSB, 0x20) => FilterCutoff,
            (GS_PART_MSB, 0x21) => FilterResonance,
            (GS_PART_MSB, 0x63) => AttackTime,
            (GS_PART_MSB, 0x64) => DecayTime,
            (GS_PART_MSB, 0x66) => ReleaseTime,
            (0x18, key) => DrumPitch(key),
            (0x1A, key) => DrumLevel(key),
            (0x1C, key) => DrumPan(key),
            (0x1D, key) => DrumReverb(key),
            (0x1E, key) => DrumChorus(key),
            (SF2_NRPN_MSB, 100) => Sf2Page(100),
            (SF2_NRPN_MSB, 101) => Sf2Page(1000),
            (SF2_NRPN_MSB, 102) => Sf2Page(10000),
            (SF2_NRPN_MSB, lsb) if lsb < 100 => Sf2Generator(lsb),
            (msb, lsb) => Unknown(msb, lsb),
        }
    }
}
