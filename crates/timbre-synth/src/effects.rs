//! Effect processor slots.
//!
//! Reverb and chorus algorithms live outside this crate. The synthesizer fills
//! their input buffers with the voices' sends and asks them to process once per
//! quantum, adding their output to the main mix.

/// An externally implemented send effect.
pub trait EffectProcessor: Send {
    /// Input buffers: one for a mono processor, two for a stereo one. The
    /// synthesizer sizes them to the quantum and clears them before each quantum.
    fn inputs_mut(&mut self) -> &mut [Vec<f32>];

    /// Process `quantum` frames of input and add the result to the outputs.
    fn process(&mut self, quantum: usize, out_left: &mut [f32], out_right: &mut [f32]);
}

/// An installed processor.
pub(crate) struct EffectSlot {
    pub processor: Box<dyn EffectProcessor>,
}

impl EffectSlot {
    pub fn new(processor: Box<dyn EffectProcessor>) -> Self {
        Self { processor }
    }

    /// Resize and clear every input buffer for the next quantum.
    pub fn prepare(&mut self, quantum: usize) {
        for input in self.processor.inputs_mut() {
            input.clear();
            input.resize(quantum, 0.0);
        }
    }
}
