//! Per-voice signal processing building blocks.

pub mod filter;
pub mod lfo;
pub mod modulation_envelope;
pub mod oscillator;
pub mod pan;
pub mod units;
pub mod volume_envelope;

pub use filter::LowpassFilter;
pub use modulation_envelope::ModulationEnvelope;
pub use oscillator::{InterpolationType, WavetableOscillator};
pub use pan::PanTable;
pub use volume_envelope::{EnvelopeStage, VolumeEnvelope};
