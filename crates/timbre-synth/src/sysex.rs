//! System Exclusive messages.
//!
//! Decoded here and applied only through the synthesizer's public parameter
//! surface. Unknown or malformed messages are logged and ignored.

use timbre_bank::MidiSystem;
use timbre_midi::cc;
use tracing::{debug, info, warn};

use crate::channel::is_default_drum_channel;
use crate::master::MasterParameter;
use crate::synthesizer::Synthesizer;
use crate::tuning::KeyTuning;

const UNIVERSAL_NON_REALTIME: u8 = 0x7E;
const UNIVERSAL_REALTIME: u8 = 0x7F;
const ROLAND: u8 = 0x41;
const YAMAHA: u8 = 0x43;
const BROADCAST_DEVICE: u8 = 0x7F;

/// Sub ID 1 values.
const GENERAL_MIDI: u8 = 0x09;
const TUNING_STANDARD: u8 = 0x08;
const DEVICE_CONTROL: u8 = 0x04;

/// MTS bulk dump: header, 16 name bytes, 128 three-byte entries.
const BULK_DUMP_DATA_OFFSET: usize = 21;
const BULK_DUMP_MIN_LEN: usize = BULK_DUMP_DATA_OFFSET + 128 * 3;

/// GS part number to MIDI channel: part 0 is the rhythm part on channel 10.
fn gs_part_to_channel(part: u8) -> usize {
    match part {
        0 => 9,
        1..=9 => usize::from(part) - 1,
        _ => usize::from(part),
    }
}

fn value14(lsb: u8, msb: u8) -> u16 {
    (u16::from(msb & 0x7F) << 7) | u16::from(lsb & 0x7F)
}

impl Synthesizer {
    /// Apply a SysEx body (without `F0`/`F7`).
    pub fn system_exclusive(&mut self, data: &[u8], channel_offset: usize) {
        let Some(&manufacturer) = data.first() else {
            warn!("Empty SysEx message");
            return;
        };
        match manufacturer {
            UNIVERSAL_NON_REALTIME | UNIVERSAL_REALTIME => {
                let Some(&device) = data.get(1) else {
                    warn!("Truncated universal SysEx");
                    return;
                };
                if !self.accepts_device(device) {
                    debug!("Ignoring SysEx for device {:#04x}", device);
                    return;
                }
                if manufacturer == UNIVERSAL_NON_REALTIME {
                    self.universal_non_realtime(data);
                } else {
                    self.universal_realtime(data);
                }
            }
            ROLAND => self.roland(data, channel_offset),
            YAMAHA => self.yamaha(data),
            other => warn!("Unrecognized SysEx manufacturer {:#04x}", other),
        }
    }

    fn accepts_device(&self, device: u8) -> bool {
        device == BROADCAST_DEVICE
            || self
                .master()
                .device_id
                .map_or(true, |id| id == device)
    }

    fn universal_non_realtime(&mut self, data: &[u8]) {
        match (data.get(2), data.get(3)) {
            (Some(&GENERAL_MIDI), Some(&mode)) => match mode {
                0x01 => {
                    info!("GM system on");
                    self.set_master_parameter(MasterParameter::MidiSystem(MidiSystem::Gm));
                    self.reset_all_controllers();
                }
                0x02 => {
                    info!("GM system off");
                    self.set_master_parameter(MasterParameter::MidiSystem(MidiSystem::Gs));
                }
                0x03 => {
                    info!("GM2 system on");
                    self.set_master_parameter(MasterParameter::MidiSystem(MidiSystem::Gm2));
                    self.reset_all_controllers();
                }
                other => warn!("Unrecognized GM mode {:#04x}", other),
            },
            (Some(&TUNING_STANDARD), Some(&0x01)) => self.mts_bulk_dump(data),
            (Some(&TUNING_STANDARD), Some(&0x08)) => self.mts_octave_tuning(data),
            _ => warn!("Unrecognized universal non-realtime SysEx: {:02X?}", data),
        }
    }

    fn universal_realtime(&mut self, data: &[u8]) {
        match (data.get(2), data.get(3)) {
            (Some(&DEVICE_CONTROL), Some(&sub)) => {
                let (Some(&lsb), Some(&msb)) = (data.get(4), data.get(5)) else {
                    warn!("Truncated device control SysEx");
                    return;
                };
                match sub {
                    0x01 => {
                        let gain = f64::from(value14(lsb, msb)) / 16383.0;
                        self.set_master_parameter(MasterParameter::Gain(gain));
                    }
                    0x03 => {
                        let cents = (f64::from(value14(lsb, msb)) - 8192.0) / 8192.0 * 100.0;
                        self.set_master_parameter(MasterParameter::MasterTuning(cents));
                    }
                    0x04 => {
                        let semitones = f64::from(msb) - 64.0;
                        self.set_master_parameter(MasterParameter::Transposition(semitones));
                    }
                    other => warn!("Unrecognized device control SysEx {:#04x}", other),
                }
            }
            (Some(&TUNING_STANDARD), Some(&0x02)) => {
                if let Some((&program, rest)) = data.get(4..).and_then(<[u8]>::split_first) {
                    self.mts_note_changes(program, rest);
                }
            }
            (Some(&TUNING_STANDARD), Some(&0x07)) => {
                // Bank number at 4 is not used: tables are per program.
                if let Some((&program, rest)) = data.get(5..).and_then(<[u8]>::split_first) {
                    self.mts_note_changes(program, rest);
                }
            }
            _ => warn!("Unrecognized universal realtime SysEx: {:02X?}", data),
        }
    }

    fn mts_bulk_dump(&mut self, data: &[u8]) {
        if data.len() < BULK_DUMP_MIN_LEN {
            warn!(
                "MTS bulk dump too short: {} bytes, need {}",
                data.len(),
                BULK_DUMP_MIN_LEN
            );
            return;
        }
        let program = data[4] & 0x7F;
        let entries = data[BULK_DUMP_DATA_OFFSET..BULK_DUMP_MIN_LEN].chunks_exact(3);
        for (key, entry) in (0u8..).zip(entries) {
            if let Some(tuning) = KeyTuning::from_mts_bytes(entry[0], entry[1], entry[2]) {
                self.set_key_tuning(program, key, Some(tuning));
            }
        }
        info!("MTS bulk dump applied to program {}", program);
    }

    /// `rest` is the change count followed by (key, semitone, msb, lsb) entries.
    fn mts_note_changes(&mut self, program: u8, rest: &[u8]) {
        let Some((&count, entries)) = rest.split_first() else {
            warn!("Truncated MTS note change");
            return;
        };
        let program = program & 0x7F;
        for entry in entries.chunks_exact(4).take(usize::from(count)) {
            if let Some(tuning) = KeyTuning::from_mts_bytes(entry[1], entry[2], entry[3]) {
                self.set_key_tuning(program, entry[0] & 0x7F, Some(tuning));
            }
        }
    }

    /// Scale/octave tuning, 1-byte form: three channel mask bytes, 12 values.
    fn mts_octave_tuning(&mut self, data: &[u8]) {
        let Some(body) = data.get(4..19) else {
            warn!("Truncated MTS octave tuning");
            return;
        };
        let mask = (u32::from(body[0] & 0x03) << 14)
            | (u32::from(body[1] & 0x7F) << 7)
            | u32::from(body[2] & 0x7F);
        let mut cents = [0i8; 12];
        for (slot, &value) in cents.iter_mut().zip(&body[3..15]) {
            *slot = (i16::from(value & 0x7F) - 64) as i8;
        }
        for channel in (0..16).filter(|bit| mask & (1 << bit) != 0) {
            self.set_octave_tuning(channel, cents);
        }
    }

    fn roland(&mut self, data: &[u8], channel_offset: usize) {
        // 41 dev 42 12 addr(3) value...
        if data.len() < 8 || data[2] != 0x42 || data[3] != 0x12 {
            warn!("Unrecognized Roland SysEx: {:02X?}", data);
            return;
        }
        if !self.accepts_device(data[1]) {
            return;
        }
        let (address, value) = ([data[4], data[5], data[6]], data[7]);
        match address {
            [0x40, 0x00, 0x7F] => {
                info!("GS reset");
                self.set_master_parameter(MasterParameter::MidiSystem(MidiSystem::Gs));
                self.reset_all_controllers();
            }
            [0x40, 0x00, 0x04] => {
                self.set_master_parameter(MasterParameter::Gain(f64::from(value) / 127.0));
            }
            [0x40, part, 0x15] if part & 0xF0 == 0x10 => {
                let channel = gs_part_to_channel(part & 0x0F) + channel_offset;
                debug!("GS rhythm part {} on channel {}", value, channel);
                self.set_drums(channel, value > 0);
            }
            _ => warn!("Unrecognized GS SysEx address {:02X?}", address),
        }
    }

    fn yamaha(&mut self, data: &[u8]) {
        // 43 1n 4C 00 00 7E 00
        match data {
            [_, device, 0x4C, 0x00, 0x00, 0x7E, 0x00, ..] if device & 0xF0 == 0x10 => {
                info!("XG reset");
                self.set_master_parameter(MasterParameter::MidiSystem(MidiSystem::Xg));
                self.reset_all_controllers();
                for channel in (0..self.channel_count()).filter(|&c| is_default_drum_channel(c)) {
                    self.controller_change(channel, cc::BANK_SELECT, 127, false);
                    let program = self.channel(channel).map_or(0, |ch| ch.program);
                    self.program_change(channel, program);
                }
            }
            _ => warn!("Unrecognized XG SysEx: {:02X?}", data),
        }
    }
}
