//! Bank select interpretation per MIDI system.

use timbre_bank::{is_xg_drum_bank, MidiSystem};

/// How a bank select changes the channel's drum status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumChange {
    Unchanged,
    On,
    Off,
}

/// Effective bank for preset lookup plus the drum status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankSelection {
    pub bank_msb: u8,
    pub bank_lsb: u8,
    pub drums: DrumChange,
}

/// GM2 bank MSBs for rhythm and melodic sets.
const GM2_RHYTHM_BANK: u8 = 120;
const GM2_MELODIC_BANK: u8 = 121;

/// Interpret the stored bank select MSB/LSB under `system`.
///
/// GM ignores bank select. GS uses the MSB only. XG selects drum kits with MSB
/// 120/126/127 and uses the LSB as the variation. GM2 selects rhythm with MSB 120
/// and melodic sets with MSB 121, the LSB being the variation.
pub fn interpret_bank_select(system: MidiSystem, msb: u8, lsb: u8) -> BankSelection {
    match system {
        MidiSystem::Gm => BankSelection {
            bank_msb: 0,
            bank_lsb: 0,
            drums: DrumChange::Unchanged,
        },
        MidiSystem::Gs => BankSelection {
            bank_msb: msb,
            bank_lsb: 0,
            drums: DrumChange::Unchanged,
        },
        MidiSystem::Xg => {
            if is_xg_drum_bank(msb) {
                BankSelection {
                    bank_msb: msb,
                    bank_lsb: 0,
                    drums: DrumChange::On,
                }
            } else {
                BankSelection {
                    bank_msb: msb,
                    bank_lsb: lsb,
                    drums: DrumChange::Off,
                }
            }
        }
        MidiSystem::Gm2 => match msb {
            GM2_RHYTHM_BANK => BankSelection {
                bank_msb: 0,
                bank_lsb: lsb,
                drums: DrumChange::On,
            },
            GM2_MELODIC_BANK => BankSelection {
                bank_msb: 0,
                bank_lsb: lsb,
                drums: DrumChange::Off,
            },
            _ => BankSelection {
                bank_msb: msb,
                bank_lsb: lsb,
                drums: DrumChange::Unchanged,
            },
        },
    }
}
