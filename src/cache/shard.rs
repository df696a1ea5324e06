//! Shard Module
//!
//! An independently locked partition of the key space: a key → entry map, a
//! recency list threaded through the entries, a capacity budget and a live
//! counter readable without the lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::cache::{CacheEntry, EvictHook, StatsRecorder};

// == Recency List ==
/// Entries of one shard, ordered by recency.
///
/// `head` is the most recently used key, `tail` the least recently used one.
/// Every key in `items` appears exactly once in the list. All methods assume
/// the caller holds the shard lock, which `&mut self` enforces.
#[derive(Debug)]
pub(crate) struct RecencyList<V> {
    capacity: usize,
    items: HashMap<String, CacheEntry<V>>,
    head: Option<String>,
    tail: Option<String>,
}

impl<V> RecencyList<V> {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            items: HashMap::new(),
            head: None,
            tail: None,
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    pub(crate) fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.items.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut CacheEntry<V>> {
        self.items.get_mut(key)
    }

    /// True when the list is bounded and holds more entries than its budget.
    pub(crate) fn over_capacity(&self) -> bool {
        self.capacity > 0 && self.items.len() > self.capacity
    }

    // == Add Node ==
    /// Inserts a new entry at the head. `key` must not be present.
    pub(crate) fn push_front(&mut self, key: String, entry: CacheEntry<V>) {
        debug_assert!(!self.items.contains_key(&key));
        self.items.insert(key.clone(), entry);
        self.link_front(&key);
    }

    // == Move To Head ==
    /// Marks `key` as most recently used.
    pub(crate) fn move_to_front(&mut self, key: &str) {
        if self.head.as_deref() == Some(key) || !self.items.contains_key(key) {
            return;
        }
        self.unlink(key);
        self.link_front(key);
    }

    // == Remove Node ==
    /// Unlinks `key` and drops it from the map, handing the entry back.
    pub(crate) fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        if !self.items.contains_key(key) {
            return None;
        }
        self.unlink(key);
        self.items.remove(key)
    }

    // == Remove LRU ==
    /// Removes the least recently used entry.
    pub(crate) fn pop_back(&mut self) -> Option<(String, CacheEntry<V>)> {
        let key = self.tail.clone()?;
        let entry = self.remove(&key)?;
        Some((key, entry))
    }

    /// Keys whose deadline has passed at `now`.
    pub(crate) fn expired_keys(&self, now: Instant) -> Vec<String> {
        self.items
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &String> {
        self.items.keys()
    }

    /// Keys from most to least recently used.
    #[cfg(test)]
    pub(crate) fn keys_by_recency(&self) -> Vec<String> {
        let mut order = Vec::with_capacity(self.items.len());
        let mut cursor = self.head.clone();
        while let Some(key) = cursor {
            cursor = self.items.get(&key).and_then(|e| e.next.clone());
            order.push(key);
        }
        order
    }

    /// Drops every entry and resets the list.
    pub(crate) fn clear(&mut self) {
        self.items = HashMap::new();
        self.head = None;
        self.tail = None;
    }

    // Pure bookkeeping: patches the neighbours and head/tail, keeps the entry in the map.
    fn unlink(&mut self, key: &str) {
        let (prev, next) = match self.items.get_mut(key) {
            Some(entry) => (entry.prev.take(), entry.next.take()),
            None => return,
        };

        match &prev {
            Some(p) => {
                if let Some(prev_entry) = self.items.get_mut(p) {
                    prev_entry.next = next.clone();
                }
            }
            None => self.head = next.clone(),
        }

        match &next {
            Some(n) => {
                if let Some(next_entry) = self.items.get_mut(n) {
                    next_entry.prev = prev;
                }
            }
            None => self.tail = prev,
        }
    }

    fn link_front(&mut self, key: &str) {
        let old_head = self.head.replace(key.to_string());
        if let Some(h) = &old_head {
            if let Some(head_entry) = self.items.get_mut(h) {
                head_entry.prev = Some(key.to_string());
            }
        }
        if let Some(entry) = self.items.get_mut(key) {
            entry.prev = None;
            entry.next = old_head;
        }
        if self.tail.is_none() {
            self.tail = Some(key.to_string());
        }
    }
}

// == Shard ==
/// One lock-protected partition of a [`CacheStore`](crate::cache::CacheStore).
///
/// Every removal from the map fires the shared eviction hook while the
/// shard lock is still held.
pub(crate) struct Shard<V> {
    list: Mutex<RecencyList<V>>,
    live: AtomicI64,
    hook: Arc<EvictHook<V>>,
    stats: Arc<StatsRecorder>,
}

impl<V> Shard<V> {
    pub(crate) fn new(capacity: usize, hook: Arc<EvictHook<V>>, stats: Arc<StatsRecorder>) -> Self {
        Self {
            list: Mutex::new(RecencyList::new(capacity)),
            live: AtomicI64::new(0),
            hook,
            stats,
        }
    }

    /// Live entry count, read without taking the lock.
    pub(crate) fn len(&self) -> i64 {
        self.live.load(Ordering::Acquire)
    }

    // == Set ==
    /// Inserts or updates `key`, evicting the shard's LRU entry when a new
    /// key pushes it over capacity.
    pub(crate) fn set(&self, key: String, value: V, ttl: Duration) {
        let mut guard = self.list.lock();
        let list = &mut *guard;

        if let Some(entry) = list.get_mut(&key) {
            entry.replace(value, ttl, Instant::now());
            list.move_to_front(&key);
        } else {
            list.push_front(key, CacheEntry::new(value, ttl));
            if list.over_capacity() {
                if let Some((evicted_key, evicted)) = list.pop_back() {
                    self.stats.record_eviction();
                    self.hook.fire(&evicted_key, &evicted.value);
                }
            }
        }

        self.sync_len(list);
    }

    // == Get ==
    /// Returns the value for `key`, sliding its deadline on a hit.
    ///
    /// An expired entry is removed (firing the hook) and reported as a miss.
    pub(crate) fn get(&self, key: &str) -> Option<V>
    where
        V: Clone,
    {
        let mut guard = self.list.lock();
        let list = &mut *guard;
        let now = Instant::now();

        let expired = match list.get(key) {
            Some(entry) => entry.is_expired_at(now),
            None => {
                self.stats.record_miss();
                return None;
            }
        };

        if expired {
            if let Some(entry) = list.remove(key) {
                self.stats.record_expirations(1);
                self.hook.fire(key, &entry.value);
            }
            self.sync_len(list);
            self.stats.record_miss();
            return None;
        }

        let value = list.get_mut(key).map(|entry| {
            entry.renew(now);
            entry.value.clone()
        });
        list.move_to_front(key);
        self.stats.record_hit();
        value
    }

    // == Delete ==
    /// Removes `key` if present. Returns whether anything was removed.
    pub(crate) fn delete(&self, key: &str) -> bool {
        let mut guard = self.list.lock();
        let list = &mut *guard;

        let removed = match list.remove(key) {
            Some(entry) => {
                self.stats.record_deletion();
                self.hook.fire(key, &entry.value);
                true
            }
            None => false,
        };

        self.sync_len(list);
        removed
    }

    /// Appends this shard's keys to `out`.
    pub(crate) fn collect_keys(&self, out: &mut Vec<String>) {
        let list = self.list.lock();
        out.extend(list.keys().cloned());
    }

    // == Purge ==
    /// Drops every entry without firing the hook.
    pub(crate) fn purge(&self) {
        let mut list = self.list.lock();
        list.clear();
        self.sync_len(&list);
    }

    // == Sweep ==
    /// Removes every entry expired at `now`, firing the hook for each.
    ///
    /// Returns the number of entries removed.
    pub(crate) fn sweep_expired(&self, now: Instant) -> usize {
        let mut guard = self.list.lock();
        let list = &mut *guard;

        let mut removed = 0;
        for key in list.expired_keys(now) {
            if let Some(entry) = list.remove(&key) {
                self.hook.fire(&key, &entry.value);
                removed += 1;
            }
        }

        if removed > 0 {
            self.stats.record_expirations(removed);
            self.sync_len(list);
        }
        removed
    }

    #[cfg(test)]
    pub(crate) fn keys_by_recency(&self) -> Vec<String> {
        self.list.lock().keys_by_recency()
    }

    fn sync_len(&self, list: &RecencyList<V>) {
        self.live.store(list.len() as i64, Ordering::Release);
    }
}
