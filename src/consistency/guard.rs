//! Per-key computation serialization

use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;

/// Allows at most one in-flight computation per key
///
/// Callers arriving while a computation for the same key is running block
/// until it finishes; computations for different keys run in parallel.
pub struct ConsistencyGuard<K>
where
    K: Eq + Hash + Clone,
{
    in_flight: DashMap<K, Arc<Mutex<()>>>,
}

impl<K> Default for ConsistencyGuard<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> ConsistencyGuard<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            in_flight: DashMap::new(),
        }
    }

    /// Run `compute` while holding the slot for `key`
    pub fn with_computation<T>(&self, key: K, compute: impl FnOnce() -> T) -> T {
        // The map shard lock is released at the end of this statement,
        // before blocking on the slot.
        let slot: Arc<Mutex<()>> = self
            .in_flight
            .entry(key.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _held = slot.lock().unwrap_or_else(PoisonError::into_inner);
            compute()
        };

        drop(slot);
        self.in_flight
            .remove_if(&key, |_, slot| Arc::strong_count(slot) == 1);
        result
    }

    /// Number of keys with a running or waiting computation
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}
