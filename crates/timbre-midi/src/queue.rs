//! Lock-free timestamped MIDI input queue.
//!
//! Single producer (a MIDI input or sequencer thread) and single consumer (the
//! render thread). The consumer side never blocks; ordering by timestamp is the
//! scheduler's job, the queue only preserves arrival order.

use ringbuf::{traits::*, HeapCons, HeapProd, HeapRb};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

/// Default capacity for the MIDI input ring buffer
const DEFAULT_CAPACITY: usize = 1024;

/// Raw MIDI bytes plus the routing information `process_message` needs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimedMessage {
    /// Audio time in seconds; anything at or before the current time runs immediately.
    pub time: f64,
    /// Added to the status nibble to address channels beyond 16.
    pub channel_offset: usize,
    /// Bypass controller locks and allow pseudo-controllers.
    pub force: bool,
    data: SmallVec<[u8; 8]>,
}

impl TimedMessage {
    pub fn new(time: f64, bytes: &[u8]) -> Self {
        Self {
            time,
            channel_offset: 0,
            force: false,
            data: SmallVec::from_slice(bytes),
        }
    }

    pub fn with_channel_offset(mut self, channel_offset: usize) -> Self {
        self.channel_offset = channel_offset;
        self
    }

    pub fn forced(mut self) -> Self {
        self.force = true;
        self
    }

    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Producer half, owned by the thread that receives MIDI.
pub struct MidiInputProducer {
    producer: HeapProd<TimedMessage>,
}

impl MidiInputProducer {
    /// Push a message.
    ///
    /// Returns the message back if the buffer is full.
    #[inline]
    pub fn push(&mut self, message: TimedMessage) -> Result<(), TimedMessage> {
        self.producer.try_push(message)
    }

    /// Push a message, dropping it when the buffer is full.
    ///
    /// Returns false if the message was dropped.
    pub fn send(&mut self, message: TimedMessage) -> bool {
        match self.producer.try_push(message) {
            Ok(()) => true,
            Err(dropped) => {
                debug!("MIDI input queue full, dropping message at {:.3}s", dropped.time);
                false
            }
        }
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.producer.is_full()
    }
}

/// Consumer half, owned by the render thread.
pub struct MidiInputConsumer {
    consumer: HeapCons<TimedMessage>,
}

impl MidiInputConsumer {
    #[inline]
    pub fn pop(&mut self) -> Option<TimedMessage> {
        self.consumer.try_pop()
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.consumer.is_empty()
    }

    #[inline]
    pub fn pending_count(&self) -> usize {
        self.consumer.occupied_len()
    }
}

/// Create a new MIDI input channel
pub fn midi_input_channel() -> (MidiInputProducer, MidiInputConsumer) {
    midi_input_channel_with_capacity(DEFAULT_CAPACITY)
}

/// Create a new MIDI input channel with specified capacity
pub fn midi_input_channel_with_capacity(capacity: usize) -> (MidiInputProducer, MidiInputConsumer) {
    let rb = HeapRb::new(capacity);
    let (producer, consumer) = rb.split();
    (
        MidiInputProducer { producer },
        MidiInputConsumer { consumer },
    )
}
