//! Fixed-capacity voice pool with priority-based stealing.
//!
//! All voices are allocated up front; assignment never allocates.

use tracing::debug;

use super::Voice;

/// A voice that was cut to make room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StolenVoice {
    pub index: usize,
    pub channel: usize,
    pub note: u8,
}

#[derive(Debug, Clone)]
pub struct VoicePool {
    voices: Vec<Voice>,
    /// Usable voices, at most `voices.len()`.
    cap: usize,
    /// Time the priorities were last computed.
    priority_time: Option<f64>,
    next_serial: u64,
}

impl VoicePool {
    pub fn new(capacity: usize, sample_rate: f64, quantum_size: usize) -> Self {
        Self {
            voices: (0..capacity)
                .map(|_| Voice::new(sample_rate, quantum_size))
                .collect(),
            cap: capacity,
            priority_time: None,
            next_serial: 1,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.voices.len()
    }

    #[inline]
    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Limit the usable voices. Voices above the cap keep sounding until they end.
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap.clamp(1, self.voices.len());
    }

    #[inline]
    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    #[inline]
    pub fn voices_mut(&mut self) -> &mut [Voice] {
        &mut self.voices
    }

    #[inline]
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Voice> {
        self.voices.get_mut(index)
    }

    pub fn active_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_active()).count()
    }

    /// Serial for the next started voice.
    pub fn next_serial(&mut self) -> u64 {
        let serial = self.next_serial;
        self.next_serial += 1;
        serial
    }

    /// Pick a slot for a new voice at `time`.
    ///
    /// The first idle slot wins. Otherwise priorities are computed (once per
    /// time instant) and the first lowest-priority voice is stolen. The chosen
    /// slot is marked unstealable for the rest of this instant.
    pub fn assign<F>(&mut self, time: f64, is_drum_channel: F) -> (usize, Option<StolenVoice>)
    where
        F: Fn(usize) -> bool,
    {
        let cap = self.cap.min(self.voices.len());
        if let Some(index) = self.voices[..cap].iter().position(|v| !v.is_active()) {
            self.voices[index].force_stop();
            self.voices[index].priority = f64::INFINITY;
            return (index, None);
        }

        if self.priority_time != Some(time) {
            for voice in &mut self.voices[..cap] {
                voice.priority = voice.compute_priority(is_drum_channel(voice.channel));
            }
            self.priority_time = Some(time);
        }

        let mut lowest = 0;
        for (index, voice) in self.voices[..cap].iter().enumerate() {
            if voice.priority < self.voices[lowest].priority {
                lowest = index;
            }
        }

        let voice = &mut self.voices[lowest];
        let stolen = StolenVoice {
            index: lowest,
            channel: voice.channel,
            note: voice.note,
        };
        debug!(
            "Stealing voice {} (channel {}, note {}, priority {:.2})",
            lowest, stolen.channel, stolen.note, voice.priority
        );
        voice.force_stop();
        voice.priority = f64::INFINITY;
        (lowest, Some(stolen))
    }

    /// Return finished voices to Idle.
    pub fn recycle_finished(&mut self) {
        for voice in &mut self.voices {
            voice.recycle();
        }
    }

    pub fn stop_all(&mut self) {
        for voice in &mut self.voices {
            voice.force_stop();
        }
    }
}
