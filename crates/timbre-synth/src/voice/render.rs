//! Per-voice rendering for one quantum.
//!
//! Release check, modulation, pitch, oscillator, filter, volume envelope, then
//! pan and mix into the dry bus and the effect sends.

use timbre_bank::{GeneratorType, LoopMode, GENERATOR_COUNT};

use super::{Voice, VoiceState};
use crate::channel::{CustomController, MidiChannel};
use crate::dsp::filter::CUTOFF_SMOOTHING;
use crate::dsp::lfo::triangle;
use crate::dsp::units::{absolute_cents_to_hz, timecents_to_seconds};
use crate::dsp::{InterpolationType, PanTable};
use crate::modulation::{compute_modulated, ModulationContext};

/// Modulated attenuation above which synthesis is skipped.
pub const SILENCE_THRESHOLD_CB: f64 = 2500.0;

/// Engine-wide values every voice reads during a quantum.
#[derive(Debug, Clone, Copy)]
pub struct RenderContext<'a> {
    /// Time at the start of the quantum.
    pub time: f64,
    pub interpolation: InterpolationType,
    pub master_gain: f64,
    /// -1 (left) to 1 (right).
    pub master_pan: f64,
    /// Cents added to every voice.
    pub master_tuning: f64,
    pub effects_enabled: bool,
    pub reverb_gain: f64,
    pub chorus_gain: f64,
    pub pan_table: &'a PanTable,
}

/// Buses a voice mixes into. All slices have the quantum's length.
#[derive(Debug)]
pub struct VoiceOutput<'a> {
    pub left: &'a mut [f32],
    pub right: &'a mut [f32],
    /// Mono reverb input.
    pub reverb: &'a mut [f32],
    pub chorus_left: &'a mut [f32],
    pub chorus_right: &'a mut [f32],
}

impl Voice {
    /// Recompute the modulated generator table from the channel's controllers.
    pub(crate) fn update_modulated(&mut self, channel: &MidiChannel) {
        let Some(template) = self.template() else {
            return;
        };
        let ctx = ModulationContext {
            controllers: &channel.controllers,
            velocity: template.velocity.unwrap_or(self.velocity),
            key: template.target_key.unwrap_or(self.key),
            poly_pressure: self.pressure,
            modulation_multiplier: channel.custom.get(CustomController::ModulationMultiplier),
        };
        let offsets = channel
            .generator_offsets_enabled
            .then_some(&channel.generator_offsets);
        let mut modulated = [0i16; GENERATOR_COUNT];
        compute_modulated(
            &self.generators,
            &template.modulators,
            &ctx,
            offsets,
            &mut modulated,
        );
        self.modulated = modulated;
    }

    /// Render one quantum into `output`.
    pub(crate) fn render(
        &mut self,
        channel: &MidiChannel,
        ctx: &RenderContext<'_>,
        output: &mut VoiceOutput<'_>,
    ) {
        if !self.is_active() {
            return;
        }
        let Some(templates) = self.templates.clone() else {
            self.finish();
            return;
        };
        let Some(template) = templates.get(self.template_index) else {
            self.finish();
            return;
        };

        if self.state == VoiceState::Active
            && self.release_time.is_some_and(|release| ctx.time >= release)
        {
            self.begin_release(ctx.time);
        }

        self.update_modulated(channel);
        let g = |ty: GeneratorType| f64::from(self.modulated[ty.index()]);

        if g(GeneratorType::InitialAttenuation) > SILENCE_THRESHOLD_CB {
            if self.is_releasing() {
                self.finish();
            }
            return;
        }

        let frames = output.left.len().min(self.buffer.len());
        let lfo_value = |delay: GeneratorType, frequency: GeneratorType| {
            triangle(
                self.start_time + timecents_to_seconds(g(delay)),
                absolute_cents_to_hz(g(frequency)),
                ctx.time,
            )
        };

        // Pitch in cents relative to the sample's recorded pitch.
        let key = template.target_key.unwrap_or(self.key);
        let mut cents = g(GeneratorType::FineTune)
            + g(GeneratorType::CoarseTune) * 100.0
            + (f64::from(key) - f64::from(template.root_key)) * g(GeneratorType::ScaleTuning)
            + template.pitch_correction
            + self.tuning_cents
            + channel.octave_tuning_cents(self.key)
            + channel.custom.tuning_cents()
            + ctx.master_tuning;

        if let Some(glide) = self.glide {
            cents += glide.cents(self.key, ctx.time);
        }

        let vibrato_depth = g(GeneratorType::VibLfoToPitch);
        if vibrato_depth != 0.0 {
            cents += lfo_value(GeneratorType::DelayVibLfo, GeneratorType::FreqVibLfo)
                * vibrato_depth;
        }

        let mod_lfo_pitch = g(GeneratorType::ModLfoToPitch);
        let mod_lfo_filter = g(GeneratorType::ModLfoToFilterFc);
        let mod_lfo_volume = g(GeneratorType::ModLfoToVolume);
        let mod_lfo = if mod_lfo_pitch != 0.0 || mod_lfo_filter != 0.0 || mod_lfo_volume != 0.0 {
            lfo_value(GeneratorType::DelayModLfo, GeneratorType::FreqModLfo)
        } else {
            0.0
        };
        cents += mod_lfo * mod_lfo_pitch;

        if channel.vibrato.is_active() {
            let start = self.start_time + channel.vibrato.delay;
            cents += triangle(start, channel.vibrato.rate, ctx.time) * channel.vibrato.depth;
        }

        let mod_env = self.modulation_envelope.process(ctx.time);
        cents += mod_env * g(GeneratorType::ModEnvToPitch);

        let cutoff = g(GeneratorType::InitialFilterFc)
            + mod_lfo * mod_lfo_filter
            + mod_env * g(GeneratorType::ModEnvToFilterFc);
        let resonance = g(GeneratorType::InitialFilterQ) - template.resonance_offset;
        // A positive LFO excursion raises the volume.
        let attenuation = (g(GeneratorType::InitialAttenuation) - mod_lfo * mod_lfo_volume).max(0.0);
        let pan = self
            .pan_override
            .unwrap_or_else(|| g(GeneratorType::Pan))
            + ctx.master_pan * 500.0;
        let reverb_send = (g(GeneratorType::ReverbEffectsSend) / 1000.0).clamp(0.0, 1.0)
            * ctx.reverb_gain
            * self.reverb_gain;
        let chorus_send = (g(GeneratorType::ChorusEffectsSend) / 1000.0).clamp(0.0, 1.0)
            * ctx.chorus_gain
            * self.chorus_gain;

        if self.glide.is_some_and(|glide| glide.is_done(ctx.time)) {
            self.glide = None;
        }

        let rounded = cents.round() as i32;
        if rounded != self.cached_cents {
            self.cached_cents = rounded;
            self.cached_ratio = (f64::from(rounded) / 1200.0).exp2();
        }
        let step = template.playback_rate * self.cached_ratio;

        // Silent until released; only the envelope advances.
        if self.loop_mode == LoopMode::StartOnRelease && !self.is_releasing() {
            if self.volume_envelope.skip(frames) {
                self.finish();
            }
            return;
        }

        let buffer = &mut self.buffer[..frames];
        let oscillator_done =
            self.oscillator
                .render(&template.audio, step, buffer, ctx.interpolation);
        self.filter
            .apply(buffer, cutoff, resonance, CUTOFF_SMOOTHING);
        let envelope_done = self.volume_envelope.apply(buffer, attenuation);

        if !channel.muted {
            let (left_gain, right_gain) = ctx.pan_table.gains(pan);
            let gain = (ctx.master_gain * self.gain) as f32;
            for (i, &sample) in buffer.iter().enumerate() {
                let sample = sample * gain;
                output.left[i] += sample * left_gain;
                output.right[i] += sample * right_gain;
            }

            if ctx.effects_enabled {
                if reverb_send > 0.0 {
                    let send = reverb_send as f32;
                    for (bus, &sample) in output.reverb.iter_mut().zip(buffer.iter()) {
                        *bus += sample * gain * send;
                    }
                }
                if chorus_send > 0.0 {
                    let send = chorus_send as f32;
                    for (i, &sample) in buffer.iter().enumerate() {
                        let sample = sample * gain * send;
                        output.chorus_left[i] += sample * left_gain;
                        output.chorus_right[i] += sample * right_gain;
                    }
                }
            }
        }

        if oscillator_done || envelope_done {
            self.finish();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::start;
    use super::*;

    struct Buses {
        left: Vec<f32>,
        right: Vec<f32>,
        reverb: Vec<f32>,
        chorus_left: Vec<f32>,
        chorus_right: Vec<f32>,
    }

    impl Buses {
        fn new(frames: usize) -> Self {
            Self {
                left: vec![0.0; frames],
                right: vec![0.0; frames],
                reverb: vec![0.0; frames],
                chorus_left: vec![0.0; frames],
                chorus_right: vec![0.0; frames],
            }
        }

        fn output(&mut self) -> VoiceOutput<'_> {
            VoiceOutput {
                left: &mut self.left,
                right: &mut self.right,
                reverb: &mut self.reverb,
                chorus_left: &mut self.chorus_left,
                chorus_right: &mut self.chorus_right,
            }
        }
    }

    fn context(pan_table: &PanTable, time: f64) -> RenderContext<'_> {
        RenderContext {
            time,
            interpolation: InterpolationType::Linear,
            master_gain: 1.0,
            master_pan: 0.0,
            master_tuning: 0.0,
            effects_enabled: true,
            reverb_gain: 1.0,
            chorus_gain: 1.0,
            pan_table,
        }
    }

    fn started_voice() -> Voice {
        let mut voice = Voice::new(44100.0, 128);
        voice.start(start(0, 60, 100, 0.0), 1);
        voice.trigger();
        voice
    }

    #[test]
    fn test_renders_audio() {
        let channel = MidiChannel::new(0);
        let pan_table = PanTable::new();
        let mut voice = started_voice();
        let mut buses = Buses::new(128);
        for quantum in 0..8 {
            let ctx = context(&pan_table, quantum as f64 * 128.0 / 44100.0);
            buses.left.fill(0.0);
            buses.right.fill(0.0);
            voice.render(&channel, &ctx, &mut buses.output());
        }
        assert!(voice.is_active());
        assert!(buses.left.iter().any(|s| s.abs() > 0.0));
        // Centered pan.
        assert!((buses.left[127] - buses.right[127]).abs() < 1e-6);
    }

    #[test]
    fn test_muted_channel_does_not_mix() {
        let mut channel = MidiChannel::new(0);
        channel.muted = true;
        let pan_table = PanTable::new();
        let mut voice = started_voice();
        let mut buses = Buses::new(128);
        voice.render(&channel, &context(&pan_table, 0.0), &mut buses.output());
        assert!(buses.left.iter().all(|s| *s == 0.0));
        assert!(voice.is_active());
    }

    #[test]
    fn test_scheduled_release_takes_effect() {
        let channel = MidiChannel::new(0);
        let pan_table = PanTable::new();
        let mut voice = started_voice();
        voice.release(0.0);
        let mut buses = Buses::new(128);
        voice.render(&channel, &context(&pan_table, 0.0), &mut buses.output());
        assert_eq!(voice.state(), VoiceState::Active);
        voice.render(&channel, &context(&pan_table, 0.05), &mut buses.output());
        assert_eq!(voice.state(), VoiceState::Releasing);
    }

    #[test]
    fn test_huge_attenuation_finishes_releasing_voice() {
        let channel = MidiChannel::new(0);
        let pan_table = PanTable::new();
        let mut voice = started_voice();
        voice.generators[GeneratorType::InitialAttenuation.index()] = 3000;
        voice.kill(0.0);
        let mut buses = Buses::new(128);
        voice.render(&channel, &context(&pan_table, 0.0), &mut buses.output());
        assert_eq!(voice.state(), VoiceState::Finished);
    }
}
