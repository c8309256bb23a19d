//! Consistency layer
//!
//! Serializes recomputation per key, tracks invalidation epochs and holds the
//! usage and statistics caches the engine publishes into.

pub mod cache;
pub mod epoch;
pub mod guard;

pub use cache::{StatisticsCache, StatisticsKey, UsageCache, UsageKey, DEFAULT_CACHE_CAPACITY};
pub use epoch::Epoch;
pub use guard::ConsistencyGuard;
