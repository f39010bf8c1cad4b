//! Control change, RPN/NRPN data entry and channel mode messages.

use timbre_bank::{general, GENERATOR_COUNT};
use timbre_midi::cc;
use tracing::{debug, warn};

use super::Synthesizer;
use crate::channel::{
    CustomController, DrumParameter, NonRegisteredParameter, ParameterKind, RegisteredParameter,
    SF2_NRPN_MSB, VELOCITY_OVERRIDE,
};
use crate::events::SynthEvent;

/// Default modulation wheel depth in cents; RPN 0/5 scales relative to it.
const DEFAULT_MODULATION_DEPTH_CENTS: f64 = 50.0;

impl Synthesizer {
    /// Apply a control change.
    ///
    /// Controllers above 127 are channel configuration and need `force`.
    /// Locked controllers ignore every change, forced or not.
    pub fn controller_change(&mut self, channel: usize, controller: u8, value: u8, force: bool) {
        let value = value & 0x7F;
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };

        if controller > 127 {
            if !force {
                debug!("Ignoring pseudo-controller {} without force", controller);
                return;
            }
            match controller {
                VELOCITY_OVERRIDE => ch.velocity_override = value,
                other => debug!("Unknown pseudo-controller {}", other),
            }
            return;
        }
        if ch.controllers.is_locked(usize::from(controller)) {
            return;
        }

        match controller {
            cc::BANK_SELECT | cc::BANK_SELECT_LSB => ch.controllers.set_cc(controller, value),
            cc::DATA_ENTRY_MSB => {
                ch.controllers.set_cc(controller, value);
                self.data_entry_coarse(channel, value);
            }
            cc::DATA_ENTRY_LSB => {
                ch.controllers.set_lsb(cc::DATA_ENTRY_MSB, value);
                self.data_entry_fine(channel, value);
            }
            c if (cc::LSB_OFFSET + 1..cc::LSB_OFFSET * 2).contains(&c) => {
                ch.controllers.set_lsb(c - cc::LSB_OFFSET, value);
            }
            cc::NRPN_MSB => {
                ch.controllers.set_cc(controller, value);
                ch.data_entry.select(controller);
                ch.sf2_nrpn_page = 0;
            }
            cc::NRPN_LSB => {
                ch.controllers.set_cc(controller, value);
                ch.data_entry.select(controller);
                if ch.controllers.cc(cc::NRPN_MSB) == SF2_NRPN_MSB {
                    if let NonRegisteredParameter::Sf2Page(step) =
                        NonRegisteredParameter::from_numbers(SF2_NRPN_MSB, value)
                    {
                        ch.sf2_nrpn_page = ch.sf2_nrpn_page.saturating_add(step);
                    }
                }
            }
            cc::RPN_MSB | cc::RPN_LSB => {
                ch.controllers.set_cc(controller, value);
                ch.data_entry.select(controller);
            }
            cc::SUSTAIN_PEDAL => {
                ch.controllers.set_cc(controller, value);
                if value < 64 {
                    self.release_sustained(channel);
                }
            }
            cc::ALL_SOUND_OFF => self.stop_channel(channel, true),
            cc::RESET_ALL_CONTROLLERS => self.reset_controllers_rp15(channel),
            cc::LOCAL_CONTROL | cc::DATA_INCREMENT | cc::DATA_DECREMENT => {
                debug!("Ignoring controller {} on channel {}", controller, channel);
            }
            c if cc::is_channel_mode(c) => self.stop_channel(channel, false),
            _ => ch.controllers.set_cc(controller, value),
        }

        self.events.send(SynthEvent::ControllerChange {
            channel,
            controller,
            value,
        });
    }

    /// Data Entry MSB (CC 6).
    fn data_entry_coarse(&mut self, channel: usize, value: u8) {
        let ch = &mut self.channels[channel];
        match ch.data_entry.on_data_entry() {
            None => debug!("Data entry on channel {} with no parameter selected", channel),
            Some(ParameterKind::Registered) => {
                let parameter = RegisteredParameter::from_numbers(
                    ch.controllers.cc(cc::RPN_MSB),
                    ch.controllers.cc(cc::RPN_LSB),
                );
                match parameter {
                    RegisteredParameter::PitchBendRange => {
                        ch.controllers
                            .set_source(general::PITCH_WHEEL_RANGE, i16::from(value) << 7);
                    }
                    RegisteredParameter::FineTuning => {
                        let cents = fine_tuning_cents(ch.controllers.get(usize::from(cc::DATA_ENTRY_MSB)));
                        ch.custom.set(CustomController::ChannelTuning, cents);
                    }
                    RegisteredParameter::CoarseTuning => {
                        ch.custom.set(
                            CustomController::ChannelTuningSemitones,
                            f64::from(value) - 64.0,
                        );
                    }
                    RegisteredParameter::ModulationDepth => {
                        ch.custom.set(
                            CustomController::ModulationMultiplier,
                            f64::from(value) * 100.0 / DEFAULT_MODULATION_DEPTH_CENTS,
                        );
                    }
                    RegisteredParameter::Null => {}
                    RegisteredParameter::Unknown(msb, lsb) => {
                        warn!("Unrecognized RPN {}/{} on channel {}", msb, lsb, channel);
                    }
                }
            }
            Some(ParameterKind::NonRegistered) => {
                let parameter = NonRegisteredParameter::from_numbers(
                    ch.controllers.cc(cc::NRPN_MSB),
                    ch.controllers.cc(cc::NRPN_LSB),
                );
                self.apply_nrpn(channel, parameter, value);
            }
        }
    }

    fn apply_nrpn(&mut self, channel: usize, parameter: NonRegisteredParameter, value: u8) {
        use NonRegisteredParameter::*;

        let sound_controller = match parameter {
            FilterCutoff => Some(cc::BRIGHTNESS),
            FilterResonance => Some(cc::FILTER_RESONANCE),
            AttackTime => Some(cc::ATTACK_TIME),
            DecayTime => Some(cc::DECAY_TIME),
            ReleaseTime => Some(cc::RELEASE_TIME),
            _ => None,
        };
        if let Some(controller) = sound_controller {
            self.controller_change(channel, controller, value, false);
            return;
        }

        let v = f64::from(value);
        match parameter {
            VibratoRate | VibratoDepth | VibratoDelay if value == 64 => {}
            VibratoRate => self.channels[channel].vibrato.rate = v / 64.0 * 8.0,
            VibratoDepth => self.channels[channel].vibrato.depth = v / 2.0,
            VibratoDelay => self.channels[channel].vibrato.delay = v / 64.0 / 3.0,
            DrumPitch(key) => {
                self.set_drum_parameter(channel, key, DrumParameter::Pitch((v - 64.0) * 100.0));
            }
            DrumLevel(key) => self.set_drum_parameter(channel, key, DrumParameter::Gain(v / 120.0)),
            DrumPan(key) => self.set_drum_parameter(channel, key, DrumParameter::Pan(value)),
            DrumReverb(key) => {
                self.set_drum_parameter(channel, key, DrumParameter::ReverbGain(v / 127.0));
            }
            DrumChorus(key) => {
                self.set_drum_parameter(channel, key, DrumParameter::ChorusGain(v / 127.0));
            }
            Sf2Generator(lsb) => self.apply_sf2_nrpn(channel, lsb),
            Sf2Page(_) => {}
            Unknown(msb, lsb) => {
                warn!("Unrecognized NRPN {}/{} on channel {}", msb, lsb, channel);
            }
            FilterCutoff | FilterResonance | AttackTime | DecayTime | ReleaseTime => {}
        }
    }

    /// Write the data entry value as a signed offset (8192 = 0) to the
    /// generator at the current page plus `lsb`.
    fn apply_sf2_nrpn(&mut self, channel: usize, lsb: u8) {
        let ch = &mut self.channels[channel];
        let index = usize::from(ch.sf2_nrpn_page) + usize::from(lsb);
        if index >= GENERATOR_COUNT {
            warn!("SF2 NRPN for unknown generator {} on channel {}", index, channel);
            return;
        }
        let data = ch.controllers.get(usize::from(cc::DATA_ENTRY_MSB));
        ch.generator_offsets[index] = data - 8192;
        ch.generator_offsets_enabled = true;
    }

    /// Data Entry LSB (CC 38).
    fn data_entry_fine(&mut self, channel: usize, value: u8) {
        let ch = &mut self.channels[channel];
        match ch.data_entry.on_data_entry() {
            None => {}
            Some(ParameterKind::Registered) => {
                let msb = ch.controllers.cc(cc::DATA_ENTRY_MSB);
                match RegisteredParameter::from_numbers(
                    ch.controllers.cc(cc::RPN_MSB),
                    ch.controllers.cc(cc::RPN_LSB),
                ) {
                    RegisteredParameter::PitchBendRange => {
                        // LSB is cents, stored in 1/128 semitone steps.
                        let cents = (f64::from(value.min(99)) / 100.0 * 128.0).round() as i16;
                        ch.controllers.set_source(
                            general::PITCH_WHEEL_RANGE,
                            (i16::from(msb) << 7) + cents,
                        );
                    }
                    RegisteredParameter::FineTuning => {
                        let cents = fine_tuning_cents(ch.controllers.get(usize::from(cc::DATA_ENTRY_MSB)));
                        ch.custom.set(CustomController::ChannelTuning, cents);
                    }
                    RegisteredParameter::ModulationDepth => {
                        let cents = f64::from(msb) * 100.0 + f64::from(value);
                        ch.custom.set(
                            CustomController::ModulationMultiplier,
                            cents / DEFAULT_MODULATION_DEPTH_CENTS,
                        );
                    }
                    _ => {}
                }
            }
            Some(ParameterKind::NonRegistered) => {
                if let NonRegisteredParameter::Sf2Generator(lsb) = NonRegisteredParameter::from_numbers(
                    ch.controllers.cc(cc::NRPN_MSB),
                    ch.controllers.cc(cc::NRPN_LSB),
                ) {
                    self.apply_sf2_nrpn(channel, lsb);
                }
            }
        }
    }

    /// Release every voice the hold pedal kept alive on `channel`.
    fn release_sustained(&mut self, channel: usize) {
        let time = self.current_time;
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        for (index, serial) in ch.sustained.drain(..) {
            if let Some(voice) = self.voices.get_mut(index) {
                if voice.serial == serial && voice.channel == channel {
                    voice.release(time);
                }
            }
        }
    }

    /// CC 121: reset the RP-015 controller subset.
    pub fn reset_controllers_rp15(&mut self, channel: usize) {
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        ch.controllers.reset_rp15();
        ch.data_entry.reset();
        ch.sf2_nrpn_page = 0;
        self.release_sustained(channel);
    }

    /// Stop every voice on `channel`: released normally, or cut when `force` is set.
    pub fn stop_channel(&mut self, channel: usize, force: bool) {
        let time = self.current_time;
        for voice in self.voices.voices_mut() {
            if !voice.is_active() || voice.channel != channel {
                continue;
            }
            if force {
                voice.force_stop();
            } else {
                voice.release(time);
            }
        }
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.sustained.clear();
        }
    }
}

/// RPN 0/1 value (8192 = 0) to cents (-100..+100).
fn fine_tuning_cents(data: i16) -> f64 {
    (f64::from(data) - 8192.0) / 8192.0 * 100.0
}
