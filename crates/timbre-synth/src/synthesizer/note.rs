//! Note on/off, pressure and pitch wheel.

use std::sync::Arc;

use timbre_bank::{general, MidiPatch, Preset};
use timbre_midi::cc;
use tracing::debug;

use super::Synthesizer;
use crate::channel::{source_index, PORTAMENTO_CONTROL_UNSET};
use crate::events::SynthEvent;
use crate::portamento::Glide;
use crate::voice::{cache_key, VoiceStart, VoiceTemplate};

impl Synthesizer {
    /// Start a note. Velocity 0 is a note-off.
    pub fn note_on(&mut self, channel: usize, note: u8, velocity: u8) {
        let note = note & 0x7F;
        if velocity == 0 {
            self.note_off(channel, note);
            return;
        }
        self.sync_bank_stack();

        let time = self.current_time;
        let system = self.master.midi_system;
        let Some(ch) = self.channels.get(channel) else {
            return;
        };
        if ch.muted {
            return;
        }
        let velocity = match ch.velocity_override {
            0 => velocity & 0x7F,
            fixed => fixed,
        };
        let drum = *ch.drum_params.key(note);
        if ch.is_drum && !drum.rx_note_on {
            return;
        }
        let Some(preset) = ch.preset() else {
            debug!("Channel {} has no preset, note {} is silent", channel, note);
            return;
        };

        let mut shifted = i32::from(note) + ch.key_shift();
        let mut tuning_cents = 0.0;
        if !ch.is_drum {
            let semitones = self.master.transposition.trunc();
            shifted += semitones as i32;
            tuning_cents += (self.master.transposition - semitones) * 100.0;
        }
        let Ok(mut key) = u8::try_from(shifted) else {
            return;
        };
        if key > 127 {
            return;
        }
        if let Some(tuning) = self.tuning.get(ch.program, key) {
            key = tuning.midi_note;
            tuning_cents += tuning.cents;
        }
        if ch.is_drum {
            tuning_cents += drum.pitch;
        }

        let portamento = !ch.is_drum && ch.controllers.cc(cc::PORTAMENTO_ON_OFF) >= 64;
        let glide = if portamento
            && ch.controllers.get(usize::from(cc::PORTAMENTO_CONTROL)) != PORTAMENTO_CONTROL_UNSET
        {
            Glide::new(
                ch.controllers.cc(cc::PORTAMENTO_CONTROL),
                key,
                ch.controllers.cc(cc::PORTAMENTO_TIME),
                time,
            )
        } else {
            None
        };

        let (gain, pan_override, reverb_gain, chorus_gain) = if ch.is_drum {
            (drum.gain, drum.pan_override(), drum.reverb_gain, drum.chorus_gain)
        } else {
            (1.0, None, 1.0, 1.0)
        };
        let drum_class = if ch.is_drum { drum.exclusive_class } else { 0 };
        let patch = ch.requested_patch(system);

        let templates = self.voices_for_preset(&preset, patch, key, velocity);
        let class_of = |template: &VoiceTemplate| match drum_class {
            0 => template.exclusive_class,
            class => class,
        };

        for template in templates.iter() {
            let class = class_of(template);
            if class != 0 {
                self.kill_exclusive_class(channel, class, time);
            }
        }

        for (index, template) in templates.iter().enumerate() {
            let channels = &self.channels;
            let (slot, _stolen) = self
                .voices
                .assign(time, |c| channels.get(c).is_some_and(|ch| ch.is_drum));
            let serial = self.voices.next_serial();
            let start = VoiceStart {
                templates: templates.clone(),
                template_index: index,
                channel,
                note,
                key,
                velocity,
                time,
                tuning_cents,
                glide,
                gain,
                pan_override,
                reverb_gain,
                chorus_gain,
                exclusive_class: class_of(template),
            };
            let ch = &self.channels[channel];
            if let Some(voice) = self.voices.get_mut(slot) {
                voice.start(start, serial);
                voice.update_modulated(ch);
                voice.trigger();
            }
        }

        if portamento {
            self.channels[channel]
                .controllers
                .set_cc(cc::PORTAMENTO_CONTROL, key);
        }
        self.events.send(SynthEvent::NoteOn {
            channel,
            note,
            velocity,
        });
    }

    /// Release a note, or hand it to the hold pedal.
    pub fn note_off(&mut self, channel: usize, note: u8) {
        let note = note & 0x7F;
        let time = self.current_time;
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        if ch.is_drum && !ch.drum_params.key(note).rx_note_off {
            return;
        }
        let hold = ch.sustain_pedal_down();
        for (index, voice) in self.voices.voices_mut().iter_mut().enumerate() {
            if voice.channel != channel || voice.note != note || !voice.is_held() {
                continue;
            }
            if hold {
                let entry = (index, voice.serial);
                if !ch.sustained.contains(&entry) {
                    ch.sustained.push(entry);
                }
            } else {
                voice.release(time);
            }
        }
        self.events.send(SynthEvent::NoteOff { channel, note });
    }

    /// Templates for `key` and `velocity` on `preset`, from the voice cache.
    ///
    /// Zones whose sample has no audio are discarded. An empty result means a
    /// silent note.
    pub fn voices_for_preset(
        &mut self,
        preset: &Arc<Preset>,
        patch: MidiPatch,
        key: u8,
        velocity: u8,
    ) -> Arc<[VoiceTemplate]> {
        let sample_rate = self.config.sample_rate;
        self.cache
            .get_or_build(cache_key(patch, key, velocity), preset, || {
                preset
                    .voice_parameters(key, velocity)
                    .iter()
                    .filter_map(|parameters| {
                        let template = VoiceTemplate::new(parameters, sample_rate);
                        if template.is_none() {
                            debug!(
                                "Discarding zone of '{}': sample '{}' has no audio",
                                preset.name, parameters.sample.name
                            );
                        }
                        template
                    })
                    .collect()
            })
    }

    /// Quickly release every voice of `class` on `channel`.
    fn kill_exclusive_class(&mut self, channel: usize, class: u8, time: f64) {
        for voice in self.voices.voices_mut() {
            if voice.is_active() && voice.channel == channel && voice.exclusive_class == class {
                voice.kill(time);
            }
        }
    }

    /// Polyphonic aftertouch for the voices of one note.
    pub fn poly_pressure(&mut self, channel: usize, note: u8, pressure: u8) {
        if channel >= self.channels.len() {
            return;
        }
        for voice in self.voices.voices_mut() {
            if voice.is_active() && voice.channel == channel && voice.note == note {
                voice.pressure = pressure & 0x7F;
            }
        }
        self.events.send(SynthEvent::PolyPressure {
            channel,
            note,
            pressure,
        });
    }

    pub fn channel_pressure(&mut self, channel: usize, pressure: u8) {
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        if ch.controllers.is_locked(source_index(general::CHANNEL_PRESSURE)) {
            return;
        }
        ch.controllers
            .set_source(general::CHANNEL_PRESSURE, i16::from(pressure & 0x7F) << 7);
        self.events
            .send(SynthEvent::ChannelPressure { channel, pressure });
    }

    /// 14-bit pitch wheel, 8192 = center.
    pub fn pitch_wheel(&mut self, channel: usize, value: u16) {
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        if ch.controllers.is_locked(source_index(general::PITCH_WHEEL)) {
            return;
        }
        let value = value.min(16383);
        ch.controllers.set_source(general::PITCH_WHEEL, value as i16);
        self.events.send(SynthEvent::PitchWheel { channel, value });
    }
}
