//! Sample metadata and lazily decoded PCM.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde::{Deserialize, Serialize};

type Decoder = Box<dyn Fn() -> Option<Vec<f32>> + Send + Sync>;

/// SF2 `sampleModes` looping behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    #[default]
    NoLoop,
    /// Loop continuously, including through the release.
    Loop,
    /// Silent until the note is released, then play without looping.
    StartOnRelease,
    /// Loop while held, play to the end once released.
    LoopUntilRelease,
}

impl LoopMode {
    /// Decode a `sampleModes` generator value.
    pub fn from_generator(value: i16) -> Self {
        match value {
            1 => LoopMode::Loop,
            2 => LoopMode::StartOnRelease,
            3 => LoopMode::LoopUntilRelease,
            _ => LoopMode::NoLoop,
        }
    }
}

/// A mono sample owned by a sound bank.
///
/// Audio is either supplied decoded or produced on first access by a decoder
/// closure from the external loader. A decoder returning `None` marks the
/// sample as silent; voices referencing it are discarded.
pub struct Sample {
    pub name: String,
    pub sample_rate: u32,
    /// MIDI key at which the sample plays at its recorded pitch.
    pub original_key: u8,
    /// Pitch correction in cents.
    pub pitch_correction: i8,
    /// Loop start in sample frames.
    pub loop_start: usize,
    /// Loop end in sample frames (exclusive).
    pub loop_end: usize,
    audio: OnceLock<Option<Arc<[f32]>>>,
    decoder: Option<Decoder>,
}

impl Sample {
    /// Create a sample from already decoded audio.
    pub fn new(name: impl Into<String>, sample_rate: u32, audio: Vec<f32>) -> Self {
        let loop_end = audio.len();
        Self {
            name: name.into(),
            sample_rate,
            original_key: 60,
            pitch_correction: 0,
            loop_start: 0,
            loop_end,
            audio: OnceLock::from(Some(Arc::<[f32]>::from(audio))),
            decoder: None,
        }
    }

    /// Create a sample decoded on first use.
    pub fn lazy<F>(name: impl Into<String>, sample_rate: u32, decoder: F) -> Self
    where
        F: Fn() -> Option<Vec<f32>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            sample_rate,
            original_key: 60,
            pitch_correction: 0,
            loop_start: 0,
            loop_end: 0,
            audio: OnceLock::new(),
            decoder: Some(Box::new(decoder)),
        }
    }

    pub fn with_original_key(mut self, key: u8) -> Self {
        self.original_key = key.min(127);
        self
    }

    pub fn with_pitch_correction(mut self, cents: i8) -> Self {
        self.pitch_correction = cents;
        self
    }

    pub fn with_loop(mut self, start: usize, end: usize) -> Self {
        self.loop_start = start;
        self.loop_end = end;
        self
    }

    /// Decoded PCM, decoding on first call.
    pub fn audio_data(&self) -> Option<&Arc<[f32]>> {
        self.audio
            .get_or_init(|| {
                let decoded = self.decoder.as_ref().and_then(|decode| decode())?;
                if decoded.is_empty() {
                    tracing::warn!("Sample '{}' decoded to no audio", self.name);
                    return None;
                }
                Some(Arc::from(decoded))
            })
            .as_ref()
    }

    /// True once audio is available without decoding.
    pub fn is_decoded(&self) -> bool {
        matches!(self.audio.get(), Some(Some(_)))
    }
}

impl fmt::Debug for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sample")
            .field("name", &self.name)
            .field("sample_rate", &self.sample_rate)
            .field("original_key", &self.original_key)
            .field("pitch_correction", &self.pitch_correction)
            .field("loop_start", &self.loop_start)
            .field("loop_end", &self.loop_end)
            .field("decoded", &self.is_decoded())
            .finish()
    }
}
