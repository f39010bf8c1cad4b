//! Per-channel MIDI state.
//!
//! A channel is a bundle of independent sub-states: the controller table, the
//! custom controller table, drum and tuning tables, the RPN/NRPN addressing state,
//! the hold-pedal list and a weak reference to the current preset. The synthesizer
//! drives the transitions; this module only owns the data and the pure helpers.

pub mod bank_select;
pub mod controllers;
pub mod custom;
pub mod data_entry;
pub mod drum;

use std::sync::{Arc, Weak};

use serde::{Deserialize, Serialize};
use timbre_bank::{MidiPatch, MidiSystem, Preset, GENERATOR_COUNT};
use timbre_midi::cc;

pub use bank_select::{interpret_bank_select, BankSelection, DrumChange};
pub use controllers::{
    source_index, ControllerTable, CONTROLLER_TABLE_SIZE, NON_CC_INDEX_OFFSET,
    PORTAMENTO_CONTROL_UNSET,
};
pub use custom::{CustomController, CustomControllers};
pub use data_entry::{
    DataEntry, DataEntryState, NonRegisteredParameter, ParameterKind, RegisteredParameter,
    SF2_NRPN_MSB,
};
pub use drum::{DrumKeyParameters, DrumParameter, DrumParameters};

/// GS-style channel vibrato, layered on top of the SF2 vibrato LFO.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ChannelVibrato {
    /// Seconds before the vibrato starts.
    pub delay: f64,
    /// Depth in cents.
    pub depth: f64,
    /// Rate in Hz.
    pub rate: f64,
}

impl ChannelVibrato {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.depth > 0.0 && self.rate > 0.0
    }
}

/// Pseudo-controller number that sets a fixed note-on velocity (force only).
pub const VELOCITY_OVERRIDE: u8 = 128;

/// Channels whose number is 9 modulo 16 start as drum channels.
#[inline]
pub fn is_default_drum_channel(number: usize) -> bool {
    number % 16 == 9
}

#[derive(Debug, Clone)]
pub struct MidiChannel {
    pub number: usize,
    pub controllers: ControllerTable,
    pub custom: CustomControllers,
    pub drum_params: DrumParameters,
    /// Per pitch class offset in cents (-64..=63).
    pub octave_tuning: [i8; 12],
    pub vibrato: ChannelVibrato,
    preset: Option<Weak<Preset>>,
    /// Keeps a preset supplied by the missing-preset callback alive; presets
    /// from the bank stack are only held weakly.
    fallback_preset: Option<Arc<Preset>>,
    /// Program as last requested by MIDI; the bank lives in CC 0/32.
    pub program: u8,
    pub is_drum: bool,
    pub lock_preset: bool,
    pub muted: bool,
    pub data_entry: DataEntry,
    /// Voices held by the hold pedal: (pool index, voice serial).
    pub sustained: Vec<(usize, u64)>,
    /// SF2 NRPN generator offsets added to every new and sounding voice.
    pub generator_offsets: [i16; GENERATOR_COUNT],
    pub generator_offsets_enabled: bool,
    /// Current SF2 NRPN generator page (100/1000/10000 steps).
    pub sf2_nrpn_page: u16,
    /// Fixed note-on velocity, 0 = use the incoming velocity.
    pub velocity_override: u8,
}

impl MidiChannel {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            controllers: ControllerTable::new(),
            custom: CustomControllers::default(),
            drum_params: DrumParameters::default(),
            octave_tuning: [0; 12],
            vibrato: ChannelVibrato::default(),
            preset: None,
            fallback_preset: None,
            program: 0,
            is_drum: is_default_drum_channel(number),
            lock_preset: false,
            muted: false,
            data_entry: DataEntry::default(),
            sustained: Vec::new(),
            generator_offsets: [0; GENERATOR_COUNT],
            generator_offsets_enabled: false,
            sf2_nrpn_page: 0,
            velocity_override: 0,
        }
    }

    /// Current preset, if it is still alive in the bank graph.
    #[inline]
    pub fn preset(&self) -> Option<Arc<Preset>> {
        self.preset.as_ref().and_then(Weak::upgrade)
    }

    pub fn set_preset(&mut self, preset: Option<&Arc<Preset>>) {
        self.preset = preset.map(Arc::downgrade);
        self.fallback_preset = None;
    }

    /// Use a preset that does not belong to the bank stack.
    pub fn set_fallback_preset(&mut self, preset: Arc<Preset>) {
        self.preset = Some(Arc::downgrade(&preset));
        self.fallback_preset = Some(preset);
    }

    /// Bank selection under `system`, from the stored bank select controllers.
    pub fn bank_selection(&self, system: MidiSystem) -> BankSelection {
        interpret_bank_select(
            system,
            self.controllers.cc(cc::BANK_SELECT),
            self.controllers.cc(cc::BANK_SELECT_LSB),
        )
    }

    /// The patch a program change on this channel asks the bank stack for.
    pub fn requested_patch(&self, system: MidiSystem) -> MidiPatch {
        let selection = self.bank_selection(system);
        MidiPatch {
            program: self.program,
            bank_msb: selection.bank_msb,
            bank_lsb: selection.bank_lsb,
            is_gm_gs_drum: self.is_drum,
        }
    }

    #[inline]
    pub fn sustain_pedal_down(&self) -> bool {
        self.controllers.cc(cc::SUSTAIN_PEDAL) >= 64
    }

    /// Semitones of key shift applied before zone lookup.
    #[inline]
    pub fn key_shift(&self) -> i32 {
        self.custom.get(CustomController::ChannelKeyShift).round() as i32
    }

    /// Octave tuning offset in cents for `key`.
    #[inline]
    pub fn octave_tuning_cents(&self, key: u8) -> f64 {
        f64::from(self.octave_tuning[usize::from(key % 12)])
    }

    /// Restore the power-on state, keeping locks, the preset and the channel number.
    pub fn reset(&mut self) {
        self.controllers.reset();
        self.custom.reset();
        self.drum_params.reset();
        self.octave_tuning = [0; 12];
        self.vibrato = ChannelVibrato::default();
        self.data_entry.reset();
        self.sustained.clear();
        self.generator_offsets = [0; GENERATOR_COUNT];
        self.generator_offsets_enabled = false;
        self.sf2_nrpn_page = 0;
        self.velocity_override = 0;
        self.is_drum = is_default_drum_channel(self.number);
    }
}
