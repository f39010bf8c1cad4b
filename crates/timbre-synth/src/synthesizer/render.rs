//! Quantum rendering: input drain, scheduled events, voices, effects.

use tracing::debug;

use super::Synthesizer;
use crate::effects::EffectSlot;
use crate::voice::{RenderContext, VoiceOutput};

impl Synthesizer {
    /// Render stereo audio, adding nothing to what the caller passed in:
    /// both buffers are overwritten.
    ///
    /// The buffers are processed in quanta of the configured size; a shorter
    /// final quantum is allowed.
    pub fn render(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len().min(right.len());
        let quantum = self.config.quantum_size;
        let mut offset = 0;
        while offset < frames {
            let end = (offset + quantum).min(frames);
            self.render_quantum(&mut left[offset..end], &mut right[offset..end]);
            offset = end;
        }
    }

    fn render_quantum(&mut self, left: &mut [f32], right: &mut [f32]) {
        let frames = left.len();
        left.fill(0.0);
        right.fill(0.0);

        self.sync_bank_stack();
        self.drain_input();
        while let Some(scheduled) = self.scheduler.pop_due(self.current_time) {
            let message = scheduled.event;
            self.execute(message.bytes(), message.channel_offset, message.force);
        }

        self.sends.clear();
        let ctx = RenderContext {
            time: self.current_time,
            interpolation: self.master.interpolation,
            master_gain: self.master.gain,
            master_pan: self.master.pan,
            master_tuning: self.master.tuning,
            effects_enabled: self.master.effects_enabled,
            reverb_gain: self.master.reverb_gain,
            chorus_gain: self.master.chorus_gain,
            pan_table: &self.pan_table,
        };
        let mut output = VoiceOutput {
            left: &mut left[..],
            right: &mut right[..],
            reverb: &mut self.sends.reverb[..frames],
            chorus_left: &mut self.sends.chorus_left[..frames],
            chorus_right: &mut self.sends.chorus_right[..frames],
        };
        for voice in self.voices.voices_mut() {
            if !voice.is_active() {
                continue;
            }
            let Some(channel) = self.channels.get(voice.channel) else {
                voice.force_stop();
                continue;
            };
            voice.render(channel, &ctx, &mut output);
        }
        self.voices.recycle_finished();

        if self.master.effects_enabled {
            if let Some(reverb) = self.reverb.as_mut() {
                feed(reverb, frames, &[&self.sends.reverb[..frames]]);
                reverb.processor.process(frames, left, right);
            }
            if let Some(chorus) = self.chorus.as_mut() {
                feed(
                    chorus,
                    frames,
                    &[
                        &self.sends.chorus_left[..frames],
                        &self.sends.chorus_right[..frames],
                    ],
                );
                chorus.processor.process(frames, left, right);
            }
        }

        self.current_time += frames as f64 / self.config.sample_rate;
    }

    /// Move everything queued by the input producer into the scheduler, or
    /// run it now when it is already due.
    fn drain_input(&mut self) {
        let Some(mut input) = self.input.take() else {
            return;
        };
        let mut count = 0usize;
        while let Some(message) = input.pop() {
            self.process_timed(message);
            count += 1;
        }
        if count > 0 {
            debug!("Drained {} MIDI input messages", count);
        }
        self.input = Some(input);
    }
}

/// Copy send buses into a processor's inputs. A processor with fewer inputs
/// than buses gets their average.
fn feed(slot: &mut EffectSlot, frames: usize, buses: &[&[f32]]) {
    slot.prepare(frames);
    let inputs = slot.processor.inputs_mut();
    match inputs.len() {
        0 => {}
        n if n >= buses.len() => {
            for (input, bus) in inputs.iter_mut().zip(buses) {
                input[..frames].copy_from_slice(bus);
            }
        }
        _ => {
            let scale = 1.0 / buses.len() as f32;
            for bus in buses {
                for (sample, &value) in inputs[0][..frames].iter_mut().zip(bus.iter()) {
                    *sample += value * scale;
                }
            }
        }
    }
}
