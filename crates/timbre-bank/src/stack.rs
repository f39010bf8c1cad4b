//! Ordered stack of sound banks with preset fallback.

use std::sync::Arc;

use tracing::debug;

use crate::bank::SoundBank;
use crate::error::{Error, Result};
use crate::patch::{is_xg_drum_bank, MidiPatch, MidiSystem};
use crate::preset::Preset;

#[derive(Debug, Clone)]
struct BankEntry {
    id: String,
    bank: Arc<SoundBank>,
    /// Added to every melodic preset's bank MSB.
    bank_offset: u8,
}

impl BankEntry {
    fn effective_msb(&self, preset: &Preset) -> u8 {
        if preset.is_drum() {
            preset.patch.bank_msb
        } else {
            preset.patch.bank_msb.saturating_add(self.bank_offset)
        }
    }
}

/// Sound banks searched in priority order. The most recently added bank wins.
#[derive(Debug, Clone, Default)]
pub struct SoundBankStack {
    entries: Vec<BankEntry>,
}

impl SoundBankStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a bank on top of the stack, replacing any bank with the same id.
    pub fn add_bank(&mut self, id: impl Into<String>, bank: Arc<SoundBank>, bank_offset: u8) {
        let id = id.into();
        self.entries.retain(|entry| entry.id != id);
        debug!("Adding sound bank '{}' ({} presets)", id, bank.presets().len());
        self.entries.insert(
            0,
            BankEntry {
                id,
                bank,
                bank_offset,
            },
        );
    }

    pub fn with_bank(mut self, id: impl Into<String>, bank: SoundBank) -> Self {
        self.add_bank(id, Arc::new(bank), 0);
        self
    }

    /// Remove a bank by id. Returns false if no such bank is loaded.
    pub fn remove_bank(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.id != id);
        self.entries.len() != before
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Bank ids in priority order.
    pub fn bank_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.id.as_str())
    }

    /// Every preset in priority order.
    pub fn presets(&self) -> impl Iterator<Item = &Arc<Preset>> {
        self.entries.iter().flat_map(|entry| entry.bank.presets())
    }

    /// Find the best preset for `patch`.
    ///
    /// Fallback order: exact bank/program/drum match, then for drums a drum
    /// preset with the same program and then any drum preset, then a melodic
    /// preset with the same program in any bank, then the first preset.
    pub fn get_preset(&self, patch: MidiPatch, system: MidiSystem) -> Result<Arc<Preset>> {
        if self.entries.is_empty() {
            return Err(Error::EmptyBankStack);
        }

        let is_drum =
            patch.is_gm_gs_drum || (system == MidiSystem::Xg && is_xg_drum_bank(patch.bank_msb));
        let (bank_msb, bank_lsb) = match system {
            MidiSystem::Gm => (0, 0),
            _ => (patch.bank_msb, patch.bank_lsb),
        };

        let exact = self.find(|entry, preset| {
            preset.patch.program == patch.program
                && preset.is_drum() == is_drum
                && (is_drum
                    || (entry.effective_msb(preset) == bank_msb
                        && preset.patch.bank_lsb == bank_lsb))
        });
        if let Some(preset) = exact {
            return Ok(preset);
        }

        if is_drum {
            let drum = self
                .find(|_, preset| preset.is_drum() && preset.patch.program == patch.program)
                .or_else(|| self.find(|_, preset| preset.is_drum()));
            if let Some(preset) = drum {
                debug!("No exact drum kit for {}, using '{}'", patch, preset.name);
                return Ok(preset);
            }
        }

        if let Some(preset) =
            self.find(|_, preset| !preset.is_drum() && preset.patch.program == patch.program)
        {
            debug!("No preset for {}, using '{}'", patch, preset.name);
            return Ok(preset);
        }

        let first = self.presets().next().cloned().ok_or(Error::NoPresets)?;
        debug!("No preset for {}, falling back to '{}'", patch, first.name);
        Ok(first)
    }

    fn find<F>(&self, predicate: F) -> Option<Arc<Preset>>
    where
        F: Fn(&BankEntry, &Preset) -> bool,
    {
        self.entries.iter().find_map(|entry| {
            entry
                .bank
                .presets()
                .iter()
                .find(|preset| predicate(entry, &***preset))
                .cloned()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank(name: &str, presets: &[(&str, MidiPatch)]) -> SoundBank {
        presets
            .iter()
            .fold(SoundBank::new(name), |bank, (preset, patch)| {
                bank.with_preset(Preset::new(*preset, *patch))
            })
    }

    fn stack() -> SoundBankStack {
        SoundBankStack::new().with_bank(
            "gm",
            bank(
                "gm",
                &[
                    ("Piano", MidiPatch::new(0, 0, 0)),
                    ("Strings", MidiPatch::new(0, 0, 48)),
                    ("Bright Strings", MidiPatch::new(8, 0, 48)),
                    ("Standard", MidiPatch::drum(0)),
                    ("Room", MidiPatch::drum(8)),
                ],
            ),
        )
    }

    #[test]
    fn test_empty_stack_is_error() {
        let err = SoundBankStack::new()
            .get_preset(MidiPatch::default(), MidiSystem::Gs)
            .unwrap_err();
        assert_eq!(err, Error::EmptyBankStack);
    }

    #[test]
    fn test_exact_match() {
        let preset = stack()
            .get_preset(MidiPatch::new(8, 0, 48), MidiSystem::Gs)
            .unwrap();
        assert_eq!(preset.name, "Bright Strings");
    }

    #[test]
    fn test_gm_ignores_bank() {
        let preset = stack()
            .get_preset(MidiPatch::new(8, 0, 48), MidiSystem::Gm)
            .unwrap();
        assert_eq!(preset.name, "Strings");
    }

    #[test]
    fn test_drum_fallbacks() {
        let stack = stack();
        let room = stack.get_preset(MidiPatch::drum(8), MidiSystem::Gs).unwrap();
        assert_eq!(room.name, "Room");
        let any = stack.get_preset(MidiPatch::drum(40), MidiSystem::Gs).unwrap();
        assert_eq!(any.name, "Standard");
    }

    #[test]
    fn test_xg_drum_bank_selects_drums() {
        let preset = stack()
            .get_preset(MidiPatch::new(127, 0, 8), MidiSystem::Xg)
            .unwrap();
        assert_eq!(preset.name, "Room");
    }

    #[test]
    fn test_program_only_then_first() {
        let stack = stack();
        let strings = stack
            .get_preset(MidiPatch::new(3, 3, 48), MidiSystem::Gs)
            .unwrap();
        assert_eq!(strings.name, "Strings");
        let first = stack
            .get_preset(MidiPatch::new(0, 0, 100), MidiSystem::Gs)
            .unwrap();
        assert_eq!(first.name, "Piano");
    }

    #[test]
    fn test_newer_bank_takes_priority_and_offset_applies() {
        let mut stack = stack();
        stack.add_bank(
            "overlay",
            Arc::new(bank("overlay", &[("Overlay Piano", MidiPatch::new(0, 0, 0))])),
            1,
        );
        let shifted = stack
            .get_preset(MidiPatch::new(1, 0, 0), MidiSystem::Gs)
            .unwrap();
        assert_eq!(shifted.name, "Overlay Piano");
        let base = stack
            .get_preset(MidiPatch::new(0, 0, 0), MidiSystem::Gs)
            .unwrap();
        assert_eq!(base.name, "Piano");

        assert_eq!(stack.bank_ids().collect::<Vec<_>>(), vec!["overlay", "gm"]);
        assert!(stack.remove_bank("overlay"));
        assert!(!stack.remove_bank("overlay"));
    }
}
