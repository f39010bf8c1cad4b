//! Per-channel controller table.
//!
//! Slots 0..128 hold MIDI CCs; the SF2 non-CC modulator sources (pitch wheel,
//! channel pressure, ...) live after them at [`NON_CC_INDEX_OFFSET`] so a modulator
//! source maps to a table slot with one addition. Every value is stored as a
//! 14-bit number: 7-bit CCs are shifted left by 7, and an LSB companion only
//! replaces the low 7 bits.

use timbre_bank::general;
use timbre_midi::cc;

/// Start of the non-CC source slots (the extended index space).
pub const NON_CC_INDEX_OFFSET: usize = 128;

/// Total slots: 128 CCs plus 128 source indices.
pub const CONTROLLER_TABLE_SIZE: usize = NON_CC_INDEX_OFFSET + 128;

/// Raw value marking CC 84 as unset, so portamento has no start key.
pub const PORTAMENTO_CONTROL_UNSET: i16 = 1;

/// Table slot of a non-CC modulator source.
#[inline]
pub const fn source_index(source: u8) -> usize {
    NON_CC_INDEX_OFFSET + source as usize
}

const fn default_values() -> [i16; CONTROLLER_TABLE_SIZE] {
    let mut values = [0i16; CONTROLLER_TABLE_SIZE];
    values[cc::MAIN_VOLUME as usize] = 100 << 7;
    values[cc::BALANCE as usize] = 64 << 7;
    values[cc::PAN as usize] = 64 << 7;
    values[cc::EXPRESSION as usize] = 127 << 7;
    values[cc::RPN_MSB as usize] = 127 << 7;
    values[cc::RPN_LSB as usize] = 127 << 7;
    values[cc::NRPN_MSB as usize] = 127 << 7;
    values[cc::NRPN_LSB as usize] = 127 << 7;
    values[cc::PORTAMENTO_CONTROL as usize] = PORTAMENTO_CONTROL_UNSET;

    let mut sound_controller = cc::FILTER_RESONANCE;
    while sound_controller <= cc::SOUND_CONTROLLER_10 {
        values[sound_controller as usize] = 64 << 7;
        sound_controller += 1;
    }

    values[source_index(general::PITCH_WHEEL)] = 8192;
    values[source_index(general::PITCH_WHEEL_RANGE)] = 2 << 7;
    values
}

/// Power-on value of every slot.
pub const DEFAULT_CONTROLLER_VALUES: [i16; CONTROLLER_TABLE_SIZE] = default_values();

/// Controllers RP-015 "Reset All Controllers" (CC 121) restores.
const RP15_RESET: [u8; 12] = [
    cc::MODULATION_WHEEL,
    cc::EXPRESSION,
    cc::SUSTAIN_PEDAL,
    cc::PORTAMENTO_ON_OFF,
    cc::SOSTENUTO_PEDAL,
    cc::SOFT_PEDAL,
    cc::LEGATO_FOOTSWITCH,
    cc::HOLD_2_PEDAL,
    cc::NRPN_LSB,
    cc::NRPN_MSB,
    cc::RPN_LSB,
    cc::RPN_MSB,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerTable {
    values: [i16; CONTROLLER_TABLE_SIZE],
    locked: [bool; CONTROLLER_TABLE_SIZE],
}

impl Default for ControllerTable {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerTable {
    pub fn new() -> Self {
        Self {
            values: DEFAULT_CONTROLLER_VALUES,
            locked: [false; CONTROLLER_TABLE_SIZE],
        }
    }

    /// Raw 14-bit value of any slot.
    #[inline]
    pub fn get(&self, index: usize) -> i16 {
        self.values.get(index).copied().unwrap_or(0)
    }

    /// 7-bit value of a CC.
    #[inline]
    pub fn cc(&self, controller: u8) -> u8 {
        (self.get(usize::from(controller)) >> 7) as u8
    }

    /// 14-bit value of a non-CC modulator source.
    #[inline]
    pub fn source(&self, source: u8) -> i16 {
        self.get(source_index(source))
    }

    /// Store a 7-bit CC value.
    #[inline]
    pub fn set_cc(&mut self, controller: u8, value: u8) {
        if let Some(slot) = self.values.get_mut(usize::from(controller)) {
            *slot = i16::from(value & 0x7F) << 7;
        }
    }

    /// Replace only the low 7 bits of a 14-bit controller.
    #[inline]
    pub fn set_lsb(&mut self, controller: u8, lsb: u8) {
        if let Some(slot) = self.values.get_mut(usize::from(controller)) {
            *slot = (*slot & 0x3F80) | i16::from(lsb & 0x7F);
        }
    }

    #[inline]
    pub fn set_source(&mut self, source: u8, value: i16) {
        if let Some(slot) = self.values.get_mut(source_index(source)) {
            *slot = value.clamp(0, 16383);
        }
    }

    /// Write a raw slot value (snapshot restore).
    #[inline]
    pub fn set_raw(&mut self, index: usize, value: i16) {
        if let Some(slot) = self.values.get_mut(index) {
            *slot = value;
        }
    }

    #[inline]
    pub fn is_locked(&self, index: usize) -> bool {
        self.locked.get(index).copied().unwrap_or(false)
    }

    pub fn set_locked(&mut self, index: usize, locked: bool) {
        if let Some(slot) = self.locked.get_mut(index) {
            *slot = locked;
        }
    }

    /// Restore power-on values, skipping locked slots.
    pub fn reset(&mut self) {
        for (index, value) in self.values.iter_mut().enumerate() {
            if !self.locked[index] {
                *value = DEFAULT_CONTROLLER_VALUES[index];
            }
        }
    }

    /// The RP-015 subset used by CC 121.
    pub fn reset_rp15(&mut self) {
        for controller in RP15_RESET {
            let index = usize::from(controller);
            if !self.locked[index] {
                self.values[index] = DEFAULT_CONTROLLER_VALUES[index];
            }
        }
        for source in [general::PITCH_WHEEL, general::CHANNEL_PRESSURE] {
            let index = source_index(source);
            if !self.locked[index] {
                self.values[index] = DEFAULT_CONTROLLER_VALUES[index];
            }
        }
    }

    pub fn values(&self) -> &[i16] {
        &self.values
    }

    pub fn locked(&self) -> &[bool] {
        &self.locked
    }
}
