//! Cache Entry Module
//!
//! Defines a single cache entry: its value, sliding TTL and its links in the
//! owning shard's recency list.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// Represents a single cache entry with value, expiry metadata and list links.
///
/// The shard's map is the only owner of an entry. `prev` and `next` hold the
/// keys of the neighbouring entries in the recency list; they are used for
/// ordering only and never keep anything alive.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// TTL used to renew the deadline, `Duration::ZERO` = never expires
    pub ttl: Duration,
    /// Absolute expiry instant, None = no expiration
    pub expires_at: Option<Instant>,
    /// Key of the more recently used neighbour
    pub(crate) prev: Option<String>,
    /// Key of the less recently used neighbour
    pub(crate) next: Option<String>,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new, unlinked cache entry.
    ///
    /// # Arguments
    /// * `value` - The value to store
    /// * `ttl` - Time to live; `Duration::ZERO` means the entry never expires
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            ttl,
            expires_at: deadline(Instant::now(), ttl),
            prev: None,
            next: None,
        }
    }

    // == Replace ==
    /// Overwrites value and TTL in place, restarting the deadline from `now`.
    ///
    /// List links are left untouched.
    pub fn replace(&mut self, value: V, ttl: Duration, now: Instant) {
        self.value = value;
        self.ttl = ttl;
        self.expires_at = deadline(now, ttl);
    }

    // == Is Expired ==
    /// Checks if the entry has expired at `now`.
    ///
    /// An entry expires strictly after its deadline; entries without a
    /// deadline never expire.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now > expires,
            None => false,
        }
    }

    // == Renew ==
    /// Slides the deadline to `now + ttl`.
    ///
    /// No-op for never-expiring entries.
    pub fn renew(&mut self, now: Instant) {
        if self.expires_at.is_some() {
            self.expires_at = deadline(now, self.ttl);
        }
    }
}

fn deadline(now: Instant, ttl: Duration) -> Option<Instant> {
    if ttl.is_zero() {
        None
    } else {
        now.checked_add(ttl)
    }
}
