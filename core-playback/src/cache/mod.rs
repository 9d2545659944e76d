//! # Expiring Caches
//!
//! Process-lifetime caches for probe results and compatibility reports.
//!
//! Entries expire after a fixed TTL and the cache is size-bounded with
//! oldest-first eviction. Nothing here is persisted; hosts can clear the
//! caches on demand through the engine.

pub mod stats;
pub mod ttl;

pub use stats::CacheStats;
pub use ttl::{CacheEntry, TtlCache};
