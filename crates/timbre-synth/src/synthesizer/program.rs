//! Program changes and preset resolution.

use tracing::{debug, info, warn};

use super::Synthesizer;
use crate::channel::DrumChange;
use crate::events::SynthEvent;

impl Synthesizer {
    /// Select a program using the channel's bank select controllers.
    ///
    /// Does nothing on a channel with a locked preset.
    pub fn program_change(&mut self, channel: usize, program: u8) {
        self.sync_bank_stack();
        let system = self.master.midi_system;
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        if ch.lock_preset {
            debug!("Channel {} preset is locked, ignoring program {}", channel, program);
            return;
        }
        ch.program = program & 0x7F;

        let selection = ch.bank_selection(system);
        let drums = match selection.drums {
            DrumChange::On => Some(true),
            DrumChange::Off => Some(false),
            DrumChange::Unchanged => None,
        };
        if let Some(is_drum) = drums {
            if ch.is_drum != is_drum {
                ch.is_drum = is_drum;
                self.events.send(SynthEvent::DrumChange { channel, is_drum });
            }
        }

        self.resolve_channel_preset(channel);

        let ch = &self.channels[channel];
        let preset = ch.preset();
        if let Some(preset) = &preset {
            info!(
                "Channel {} program change {} -> '{}'",
                channel,
                ch.requested_patch(system),
                preset.name
            );
        }
        self.events.send(SynthEvent::ProgramChange {
            channel,
            program: ch.program,
            bank_msb: selection.bank_msb,
            bank_lsb: selection.bank_lsb,
            is_drum: ch.is_drum,
            preset_name: preset.map(|preset| preset.name.clone()),
        });
    }

    /// Switch a channel between drums and melodic, then pick its preset again.
    pub fn set_drums(&mut self, channel: usize, is_drum: bool) {
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        if ch.is_drum == is_drum {
            return;
        }
        ch.is_drum = is_drum;
        if !ch.lock_preset {
            self.resolve_channel_preset(channel);
        }
        self.events.send(SynthEvent::DrumChange { channel, is_drum });
    }

    /// Look up the channel's requested patch in the bank stack.
    ///
    /// When the stack has nothing at all, the missing-preset callback may
    /// supply one; otherwise the channel stays silent.
    pub(super) fn resolve_channel_preset(&mut self, channel: usize) {
        let system = self.master.midi_system;
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        let patch = ch.requested_patch(system);
        match self.stack.get_preset(patch, system) {
            Ok(preset) => ch.set_preset(Some(&preset)),
            Err(err) => {
                warn!("No preset for {} on channel {}: {}", patch, channel, err);
                self.events.send(SynthEvent::MissingPreset { channel, patch });
                let fallback = self
                    .missing_preset
                    .as_mut()
                    .and_then(|callback| callback(patch, system));
                match fallback {
                    Some(preset) => ch.set_fallback_preset(preset),
                    None => ch.set_preset(None),
                }
            }
        }
    }
}
