//! MIDI patch addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies a desired preset: bank select MSB/LSB, program, and the GM/GS drum flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MidiPatch {
    pub program: u8,
    pub bank_msb: u8,
    pub bank_lsb: u8,
    /// Drum kit in the GM/GS sense (SF2 bank 128).
    pub is_gm_gs_drum: bool,
}

impl MidiPatch {
    pub const fn new(bank_msb: u8, bank_lsb: u8, program: u8) -> Self {
        Self {
            program,
            bank_msb,
            bank_lsb,
            is_gm_gs_drum: false,
        }
    }

    pub const fn drum(program: u8) -> Self {
        Self {
            program,
            bank_msb: 0,
            bank_lsb: 0,
            is_gm_gs_drum: true,
        }
    }
}

impl fmt::Display for MidiPatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_gm_gs_drum {
            write!(f, "DRUMS:{}", self.program)
        } else {
            write!(f, "{}:{}:{}", self.bank_msb, self.bank_lsb, self.program)
        }
    }
}

/// Active MIDI system, which decides how bank select is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MidiSystem {
    Gm,
    Gm2,
    #[default]
    Gs,
    Xg,
}

/// XG bank MSBs that select drum kits.
#[inline]
pub fn is_xg_drum_bank(bank_msb: u8) -> bool {
    matches!(bank_msb, 120 | 126 | 127)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(MidiPatch::new(8, 1, 25).to_string(), "8:1:25");
        assert_eq!(MidiPatch::drum(16).to_string(), "DRUMS:16");
    }

    #[test]
    fn test_xg_drum_banks() {
        assert!(is_xg_drum_bank(127));
        assert!(is_xg_drum_bank(126));
        assert!(!is_xg_drum_bank(0));
    }
}
