//! Cache Module
//!
//! Provides a sharded in-memory cache with sliding TTL expiration, per-shard
//! LRU eviction and a single eviction hook shared by every removal path.

mod entry;
mod hasher;
mod hook;
mod shard;
mod stats;
mod store;


// Re-export public types
pub use hasher::{normalize_shard_count, per_shard_capacity};
pub use stats::CacheStats;
pub use store::CacheStore;

pub(crate) use entry::CacheEntry;
pub(crate) use hook::EvictHook;
pub(crate) use stats::StatsRecorder;

// == Public Constants ==
/// Shard count used when the requested one is not a positive power of two
pub const DEFAULT_SHARD_COUNT: usize = 256;
