//! Voice template cache keyed by patch, note and velocity.

use std::sync::Arc;

use hashbrown::HashMap;
use timbre_bank::{MidiPatch, Preset};

use super::VoiceTemplate;

/// Bank MSB slot reserved for drum kits.
const DRUM_BANK_SLOT: u64 = 128;

/// Mixed-radix key over (bank MSB, bank LSB, program, note, velocity).
///
/// Drum patches fold into bank MSB slot 128 with LSB 0, so the MSB digit has 129
/// values and the encoding stays injective.
pub fn cache_key(patch: MidiPatch, note: u8, velocity: u8) -> u64 {
    let (msb, lsb) = if patch.is_gm_gs_drum {
        (DRUM_BANK_SLOT, 0)
    } else {
        (u64::from(patch.bank_msb), u64::from(patch.bank_lsb))
    };
    msb + lsb * 129
        + u64::from(patch.program) * 16_512
        + u64::from(note) * 2_113_536
        + u64::from(velocity) * 270_532_608
}

#[derive(Debug, Clone)]
struct CacheEntry {
    /// Preset the templates were built from; a different preset under the same
    /// key (locked or callback-supplied presets) rebuilds the entry.
    preset: Arc<Preset>,
    templates: Arc<[VoiceTemplate]>,
}

#[derive(Debug, Clone, Default)]
pub struct VoiceCache {
    entries: HashMap<u64, CacheEntry>,
}

impl VoiceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached templates for `key`, building them with `build` on a miss.
    pub fn get_or_build<F>(&mut self, key: u64, preset: &Arc<Preset>, build: F) -> Arc<[VoiceTemplate]>
    where
        F: FnOnce() -> Vec<VoiceTemplate>,
    {
        if let Some(entry) = self.entries.get(&key) {
            if Arc::ptr_eq(&entry.preset, preset) {
                return entry.templates.clone();
            }
        }
        let templates: Arc<[VoiceTemplate]> = build().into();
        self.entries.insert(
            key,
            CacheEntry {
                preset: preset.clone(),
                templates: templates.clone(),
            },
        );
        templates
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_key_is_injective_over_fields() {
        let base = cache_key(MidiPatch::new(0, 0, 0), 60, 100);
        assert_ne!(base, cache_key(MidiPatch::new(1, 0, 0), 60, 100));
        assert_ne!(base, cache_key(MidiPatch::new(0, 1, 0), 60, 100));
        assert_ne!(base, cache_key(MidiPatch::new(0, 0, 1), 60, 100));
        assert_ne!(base, cache_key(MidiPatch::new(0, 0, 0), 61, 100));
        assert_ne!(base, cache_key(MidiPatch::new(0, 0, 0), 60, 101));
        assert_ne!(
            cache_key(MidiPatch::drum(0), 60, 100),
            cache_key(MidiPatch::new(127, 127, 0), 60, 100)
        );
        assert_eq!(cache_key(MidiPatch::drum(0), 60, 100), 128 + 60 * 2_113_536 + 100 * 270_532_608);
    }

    #[test]
    fn test_hit_returns_same_list() {
        let preset = Arc::new(Preset::new("p", MidiPatch::default()));
        let mut cache = VoiceCache::new();
        let builds = Cell::new(0);
        let build = || {
            builds.set(builds.get() + 1);
            Vec::new()
        };
        let first = cache.get_or_build(1, &preset, build);
        let second = cache.get_or_build(1, &preset, build);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(builds.get(), 1);

        cache.clear();
        let third = cache.get_or_build(1, &preset, build);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(builds.get(), 2);
    }

    #[test]
    fn test_other_preset_rebuilds() {
        let a = Arc::new(Preset::new("a", MidiPatch::default()));
        let b = Arc::new(Preset::new("b", MidiPatch::default()));
        let mut cache = VoiceCache::new();
        let first = cache.get_or_build(1, &a, Vec::new);
        let second = cache.get_or_build(1, &b, Vec::new);
        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }
}
