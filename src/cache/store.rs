//! Cache Store Module
//!
//! Main cache engine: routes every operation to one shard, aggregates across
//! shards and owns the background cleaner.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::cache::hasher::{normalize_shard_count, per_shard_capacity, ShardHasher};
use crate::cache::shard::Shard;
use crate::cache::{CacheStats, EvictHook, StatsRecorder};
use crate::tasks::{Cleaner, CleanerState, Sweep};

// == Shard Set ==
/// The shards of one store, shared with the cleaner task.
struct ShardSet<V> {
    shards: Box<[Shard<V>]>,
}

impl<V: Send + Sync + 'static> Sweep for ShardSet<V> {
    // One shard lock at a time; different shards are not swept atomically.
    fn sweep_expired(&self, now: Instant) -> usize {
        self.shards
            .iter()
            .map(|shard| shard.sweep_expired(now))
            .sum()
    }
}

// == Cache Store ==
/// Sharded in-memory cache with sliding TTL and per-shard LRU eviction.
///
/// Each shard has its own lock; operations on different shards run in
/// parallel. Aggregate operations (`len`, `keys`, `purge`) visit the shards
/// one after another and never hold more than one shard lock.
///
/// # Example
/// ```
/// use shard_cache::cache::CacheStore;
/// use std::time::Duration;
///
/// let cache = CacheStore::new(1000, 16, Duration::ZERO);
/// cache.set("user:1", "alice".to_string(), Duration::from_secs(60));
/// assert_eq!(cache.get("user:1"), Some("alice".to_string()));
/// ```
pub struct CacheStore<V> {
    shard_set: Arc<ShardSet<V>>,
    hasher: ShardHasher,
    hook: Arc<EvictHook<V>>,
    stats: Arc<StatsRecorder>,
    cleaner: Cleaner,
}

impl<V> CacheStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates a new CacheStore.
    ///
    /// # Arguments
    /// * `capacity` - Total number of entries; `0` means unbounded
    /// * `shard_count` - Number of shards; anything but a positive power of
    ///   two is replaced by [`DEFAULT_SHARD_COUNT`](crate::cache::DEFAULT_SHARD_COUNT)
    /// * `clean_interval` - Period of the background sweep; `Duration::ZERO`
    ///   leaves expiry passive (detected on read only)
    pub fn new(capacity: usize, shard_count: usize, clean_interval: Duration) -> Self {
        let count = normalize_shard_count(shard_count);
        if count != shard_count {
            debug!(
                "Shard count {} is not a power of two, using {}",
                shard_count, count
            );
        }

        let shard_capacity = per_shard_capacity(capacity, count);
        let hook = Arc::new(EvictHook::new());
        let stats = Arc::new(StatsRecorder::new());

        let shards = (0..count)
            .map(|_| Shard::new(shard_capacity, hook.clone(), stats.clone()))
            .collect();
        let shard_set = Arc::new(ShardSet { shards });

        let cleaner = Cleaner::start(shard_set.clone(), clean_interval);

        debug!(
            "Cache store created: capacity={}, shards={}, per_shard_capacity={}, clean_interval={}ms",
            capacity,
            count,
            shard_capacity,
            clean_interval.as_millis()
        );

        Self {
            shard_set,
            hasher: ShardHasher::new(count),
            hook,
            stats,
            cleaner,
        }
    }

    fn shard(&self, key: &str) -> &Shard<V> {
        &self.shard_set.shards[self.hasher.index(key)]
    }

    // == Set ==
    /// Stores a key-value pair.
    ///
    /// An existing key gets the new value and TTL and becomes most recently
    /// used. A new key may push its shard over capacity, evicting that
    /// shard's least recently used entry.
    ///
    /// # Arguments
    /// * `key` - The key to store
    /// * `value` - The value to store
    /// * `ttl` - Time to live; `Duration::ZERO` means never expires
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        self.shard(&key).set(key, value, ttl);
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// A hit slides the entry's deadline to `now + ttl` and marks it most
    /// recently used. An expired entry is removed and reported as a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        self.shard(key).get(key)
    }

    // == Delete ==
    /// Removes an entry by key. No-op if absent.
    ///
    /// Returns `true` if an entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.shard(key).delete(key)
    }

    // == Length ==
    /// Returns the number of entries across all shards.
    ///
    /// May include expired entries not yet removed by a read or a sweep.
    pub fn len(&self) -> usize {
        let total: i64 = self.shard_set.shards.iter().map(Shard::len).sum();
        total.max(0) as usize
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Keys ==
    /// Returns every key currently stored.
    ///
    /// Shards are read one after another, so the result is not an atomic
    /// snapshot: concurrent writes to other shards may or may not show up.
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::with_capacity(self.len());
        for shard in self.shard_set.shards.iter() {
            shard.collect_keys(&mut keys);
        }
        keys
    }

    // == Purge ==
    /// Empties every shard. The eviction callback is not invoked.
    pub fn purge(&self) {
        for shard in self.shard_set.shards.iter() {
            shard.purge();
        }
    }

    // == On Evict ==
    /// Installs the callback fired on every removal: delete, LRU eviction
    /// and TTL expiry (passive or swept). Replaces any previous callback.
    ///
    /// The callback runs on the removing thread while the shard lock is held.
    /// It must not call back into this cache, or it will deadlock.
    pub fn set_on_evict<F>(&self, callback: F)
    where
        F: Fn(&str, &V) + Send + Sync + 'static,
    {
        self.hook.set(Arc::new(callback));
    }

    // == Close ==
    /// Stops the background sweep. Safe to call more than once.
    ///
    /// The cache itself keeps working; expiry falls back to passive detection.
    pub fn close(&self) {
        self.cleaner.stop();
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.stats.snapshot(self.len())
    }

    pub fn cleaner_state(&self) -> CleanerState {
        self.cleaner.state()
    }

    /// Number of shards after normalisation.
    pub fn shard_count(&self) -> usize {
        self.shard_set.shards.len()
    }

    /// Removes every expired entry now, as one sweep of the cleaner would.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&self) -> usize {
        self.shard_set.sweep_expired(Instant::now())
    }
}

impl<V> fmt::Debug for CacheStore<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("shards", &self.shard_set.shards.len())
            .field("cleaner", &self.cleaner)
            .field("on_evict", &self.hook)
            .finish()
    }
}
