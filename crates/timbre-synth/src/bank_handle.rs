//! Cross-thread bank stack publication.
//!
//! A loader thread publishes a replacement stack; the render thread compares the
//! generation before each note resolution and rebuilds its view when it moved.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use timbre_bank::SoundBankStack;

#[derive(Debug)]
struct Shared {
    stack: ArcSwap<SoundBankStack>,
    generation: AtomicU64,
}

/// Cloneable handle to the synthesizer's bank stack.
#[derive(Debug, Clone)]
pub struct BankStackHandle {
    shared: Arc<Shared>,
}

impl BankStackHandle {
    pub fn new(stack: SoundBankStack) -> Self {
        Self {
            shared: Arc::new(Shared {
                stack: ArcSwap::from_pointee(stack),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Replace the stack. The generation moves after the store, so an observer
    /// that sees the new generation also sees the new stack.
    pub fn publish(&self, stack: SoundBankStack) -> u64 {
        self.shared.stack.store(Arc::new(stack));
        self.shared.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    #[inline]
    pub fn load(&self) -> Arc<SoundBankStack> {
        self.shared.stack.load_full()
    }

    #[inline]
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::Acquire)
    }
}
