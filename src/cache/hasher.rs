//! Shard Hasher Module
//!
//! Routes keys to shards with a per-instance randomly seeded hash.

use std::collections::hash_map::RandomState;
use std::hash::BuildHasher;

use super::DEFAULT_SHARD_COUNT;

// == Shard Hasher ==
/// Maps a key to a shard index.
///
/// The seed is drawn once when the hasher is built, so a key's shard is
/// stable for the lifetime of one cache instance only.
#[derive(Debug, Clone)]
pub struct ShardHasher {
    state: RandomState,
    mask: u64,
}

impl ShardHasher {
    /// Creates a hasher for `shard_count` shards.
    ///
    /// `shard_count` must already be normalised to a power of two.
    pub fn new(shard_count: usize) -> Self {
        debug_assert!(shard_count.is_power_of_two());
        Self {
            state: RandomState::new(),
            mask: (shard_count as u64).wrapping_sub(1),
        }
    }

    /// Returns the shard index for `key`.
    pub fn index(&self, key: &str) -> usize {
        (self.state.hash_one(key) & self.mask) as usize
    }
}

/// Returns `requested` if it is a positive power of two, else the default of 256.
pub fn normalize_shard_count(requested: usize) -> usize {
    if requested.is_power_of_two() {
        requested
    } else {
        DEFAULT_SHARD_COUNT
    }
}

/// Splits a total capacity across shards, rounding up. `0` stays unbounded.
pub fn per_shard_capacity(capacity: usize, shard_count: usize) -> usize {
    capacity.div_ceil(shard_count)
}
