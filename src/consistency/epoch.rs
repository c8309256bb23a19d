//! Invalidation epochs
//!
//! Every invalidation advances the epoch. A computation records the epoch
//! before reading the ledger and may publish its result only if the epoch is
//! unchanged, so a result that raced an invalidation is never cached.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct Epoch {
    generation: AtomicU64,
    // Held exclusively while invalidating, shared while publishing
    gate: RwLock<()>,
}

impl Epoch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Advance the epoch and run `invalidate` with publishers excluded
    pub fn advance<T>(&self, invalidate: impl FnOnce() -> T) -> T {
        let _gate = self.gate.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        invalidate()
    }

    /// Run `publish` if the epoch still equals `seen`
    ///
    /// Returns whether `publish` ran.
    pub fn publish_if_current(&self, seen: u64, publish: impl FnOnce()) -> bool {
        let _gate = self.gate.read().unwrap_or_else(PoisonError::into_inner);
        if self.current() != seen {
            return false;
        }
        publish();
        true
    }
}
