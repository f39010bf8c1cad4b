//! MIDI Tuning Standard key tables.
//!
//! One optional table of 128 keys per program. A tuned key plays the zones of
//! `midi_note` shifted by `cents`.

use serde::{Deserialize, Serialize};

/// Retuning of one key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyTuning {
    /// Key whose zones are played.
    pub midi_note: u8,
    /// Offset in cents added on top of `midi_note`.
    pub cents: f64,
}

impl KeyTuning {
    /// Decode the MTS three-byte frequency format (semitone, 14-bit fraction).
    ///
    /// Returns `None` for the 7F 7F 7F "no change" marker.
    pub fn from_mts_bytes(semitone: u8, msb: u8, lsb: u8) -> Option<Self> {
        if semitone == 0x7F && msb == 0x7F && lsb == 0x7F {
            return None;
        }
        let fraction = (u16::from(msb & 0x7F) << 7) | u16::from(lsb & 0x7F);
        Some(Self {
            midi_note: semitone & 0x7F,
            cents: f64::from(fraction) / 16384.0 * 100.0,
        })
    }
}

type KeyTable = [Option<KeyTuning>; 128];

/// Tables for all 128 programs, allocated on first use.
#[derive(Debug, Clone)]
pub struct TuningTables {
    programs: Vec<Option<Box<KeyTable>>>,
}

impl Default for TuningTables {
    fn default() -> Self {
        Self {
            programs: vec![None; 128],
        }
    }
}

impl TuningTables {
    pub fn get(&self, program: u8, key: u8) -> Option<KeyTuning> {
        self.programs
            .get(usize::from(program))?
            .as_ref()?
            .get(usize::from(key))
            .copied()
            .flatten()
    }

    pub fn set(&mut self, program: u8, key: u8, tuning: Option<KeyTuning>) {
        let Some(slot) = self.programs.get_mut(usize::from(program)) else {
            return;
        };
        let table = slot.get_or_insert_with(|| Box::new([None; 128]));
        if let Some(entry) = table.get_mut(usize::from(key)) {
            *entry = tuning;
        }
    }

    /// Every tuned key as (program, key, tuning).
    pub fn entries(&self) -> impl Iterator<Item = (u8, u8, KeyTuning)> + '_ {
        self.programs
            .iter()
            .enumerate()
            .filter_map(|(program, table)| table.as_ref().map(|t| (program as u8, t)))
            .flat_map(|(program, table)| {
                table
                    .iter()
                    .enumerate()
                    .filter_map(move |(key, tuning)| tuning.map(|t| (program, key as u8, t)))
            })
    }

    pub fn clear(&mut self) {
        self.programs.fill(None);
    }
}
