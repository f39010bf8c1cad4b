//! Synthesizer notifications.
//!
//! Events go out over a bounded crossbeam channel with `try_send`; when nobody
//! drains it the newest events are dropped so the render thread never blocks.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use timbre_bank::MidiPatch;

use crate::channel::DrumParameter;

/// Something observable happened inside the synthesizer.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthEvent {
    NoteOn {
        channel: usize,
        note: u8,
        velocity: u8,
    },
    NoteOff {
        channel: usize,
        note: u8,
    },
    ControllerChange {
        channel: usize,
        controller: u8,
        value: u8,
    },
    ProgramChange {
        channel: usize,
        program: u8,
        bank_msb: u8,
        bank_lsb: u8,
        is_drum: bool,
        preset_name: Option<String>,
    },
    PitchWheel {
        channel: usize,
        value: u16,
    },
    ChannelPressure {
        channel: usize,
        pressure: u8,
    },
    PolyPressure {
        channel: usize,
        note: u8,
        pressure: u8,
    },
    DrumChange {
        channel: usize,
        is_drum: bool,
    },
    DrumParameterChange {
        channel: usize,
        key: u8,
        parameter: DrumParameter,
    },
    StopAll {
        force: bool,
    },
    ControllersReset {
        channel: usize,
    },
    MissingPreset {
        channel: usize,
        patch: MidiPatch,
    },
    NewChannel {
        channel: usize,
    },
    MuteChannel {
        channel: usize,
        muted: bool,
    },
    BankStackChanged {
        generation: u64,
    },
}

/// Sending half owned by the synthesizer.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<SynthEvent>,
    rx: Receiver<SynthEvent>,
}

impl EventSender {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = crossbeam_channel::bounded(capacity.max(1));
        Self { tx, rx }
    }

    /// Publish without blocking. Returns false when the event was dropped.
    pub fn send(&self, event: SynthEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// A receiver for listeners. All receivers share one queue.
    pub fn subscribe(&self) -> Receiver<SynthEvent> {
        self.rx.clone()
    }
}
