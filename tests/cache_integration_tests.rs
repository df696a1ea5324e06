//! Integration Tests for the Cache Store
//!
//! Exercises the public store API end to end: LRU pressure, sliding TTL,
//! permanent entries, unbounded mode, shard normalisation, purge, the
//! background cleaner and concurrent use from many threads.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};
use std::thread::{self, sleep};
use std::time::Duration;

use shard_cache::{CacheStore, CleanerState};

// == Helper Functions ==

type EvictLog<V> = Arc<Mutex<Vec<(String, V)>>>;

fn record_evictions<V: Clone + Send + Sync + 'static>(cache: &CacheStore<V>) -> EvictLog<V> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let sink = log.clone();
    cache.set_on_evict(move |key, value: &V| {
        sink.lock().unwrap().push((key.to_string(), value.clone()));
    });
    log
}

// == LRU Tests ==

#[test]
fn test_lru_eviction_of_oldest_entry() {
    let cache = CacheStore::new(2, 1, Duration::ZERO);
    let log = record_evictions(&cache);

    cache.set("a", 1, Duration::ZERO);
    cache.set("b", 2, Duration::ZERO);
    cache.set("c", 3, Duration::ZERO);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.get("a"), None);
    assert_eq!(cache.get("b"), Some(2));
    assert_eq!(cache.get("c"), Some(3));
    assert_eq!(*log.lock().unwrap(), vec![("a".to_string(), 1)]);
}

#[test]
fn test_lru_respects_reads_and_writes() {
    let cache = CacheStore::new(3, 1, Duration::ZERO);
    let log = record_evictions(&cache);

    cache.set("a", 1, Duration::ZERO);
    cache.set("b", 2, Duration::ZERO);
    cache.set("c", 3, Duration::ZERO);
    cache.get("a");
    cache.set("b", 20, Duration::ZERO);

    // Recency is now b, a, c: c is the least recently touched.
    cache.set("d", 4, Duration::ZERO);

    assert_eq!(*log.lock().unwrap(), vec![("c".to_string(), 3)]);
    assert_eq!(cache.get("b"), Some(20));
}

#[test]
fn test_one_eviction_per_insert_over_the_limit() {
    let cache = CacheStore::new(5, 1, Duration::ZERO);
    let log = record_evictions(&cache);

    for i in 0..25 {
        cache.set(format!("k{}", i), i, Duration::ZERO);
        assert!(cache.len() <= 5);
    }

    let evicted: Vec<i32> = log.lock().unwrap().iter().map(|(_, v)| *v).collect();
    assert_eq!(evicted, (0..20).collect::<Vec<_>>());
    assert_eq!(cache.stats().evictions, 20);
}

// == TTL Tests ==

#[test]
fn test_passive_expiry_reports_miss_and_removes() {
    let cache = CacheStore::new(100, 4, Duration::ZERO);
    let log = record_evictions(&cache);

    cache.set("x", "v", Duration::from_millis(100));
    sleep(Duration::from_millis(150));

    assert_eq!(cache.get("x"), None);
    assert_eq!(cache.len(), 0);
    assert_eq!(*log.lock().unwrap(), vec![("x".to_string(), "v")]);
}

#[test]
fn test_sliding_expiration_keeps_hot_key_alive() {
    let cache = CacheStore::new(100, 4, Duration::ZERO);

    cache.set("x", "v", Duration::from_secs(1));
    for _ in 0..3 {
        sleep(Duration::from_millis(700));
        assert_eq!(cache.get("x"), Some("v"));
    }
}

#[test]
fn test_sliding_expiration_lapses_when_unread() {
    let cache = CacheStore::new(100, 4, Duration::ZERO);

    cache.set("x", "v", Duration::from_millis(200));
    sleep(Duration::from_millis(120));
    assert_eq!(cache.get("x"), Some("v"));
    sleep(Duration::from_millis(120));
    assert_eq!(cache.get("x"), Some("v"));

    sleep(Duration::from_millis(260));
    assert_eq!(cache.get("x"), None);
}

#[test]
fn test_permanent_entries_ignore_time() {
    let cache = CacheStore::new(100, 4, Duration::ZERO);
    let log = record_evictions(&cache);

    cache.set("forever", 1, Duration::ZERO);
    cache.set("brief", 2, Duration::from_millis(20));
    sleep(Duration::from_millis(60));

    assert_eq!(cache.sweep_expired(), 1);
    assert_eq!(cache.get("forever"), Some(1));
    sleep(Duration::from_millis(30));
    assert_eq!(cache.get("forever"), Some(1));
    assert_eq!(*log.lock().unwrap(), vec![("brief".to_string(), 2)]);
}

#[test]
fn test_permanent_entries_still_leave_by_delete_purge_and_lru() {
    let cache = CacheStore::new(1, 1, Duration::ZERO);
    let log = record_evictions(&cache);

    cache.set("a", 1, Duration::ZERO);
    cache.set("b", 2, Duration::ZERO);
    assert_eq!(cache.get("a"), None);

    cache.delete("b");
    cache.set("c", 3, Duration::ZERO);
    cache.purge();

    assert!(cache.is_empty());
    assert_eq!(
        *log.lock().unwrap(),
        vec![("a".to_string(), 1), ("b".to_string(), 2)]
    );
}

// == Capacity / Sharding Tests ==

#[test]
fn test_unbounded_cache_never_evicts_by_size() {
    let cache = CacheStore::new(0, 64, Duration::ZERO);
    let evictions = Arc::new(AtomicUsize::new(0));
    let counter = evictions.clone();
    cache.set_on_evict(move |_, _: &usize| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    for i in 0..100_000 {
        cache.set(format!("key_{}", i), i, Duration::ZERO);
    }

    assert_eq!(cache.len(), 100_000);
    assert_eq!(cache.keys().len(), 100_000);
    assert_eq!(evictions.load(Ordering::Relaxed), 0);
}

#[test]
fn test_non_power_of_two_shard_counts_use_default() {
    for requested in [3, 5, 7, 100] {
        let odd: CacheStore<i32> = CacheStore::new(10, requested, Duration::ZERO);
        let default: CacheStore<i32> = CacheStore::new(10, 256, Duration::ZERO);
        assert_eq!(odd.shard_count(), default.shard_count());

        // Per-shard capacity is ceil(10 / 256) = 1 for both.
        for cache in [&odd, &default] {
            for i in 0..1000 {
                cache.set(format!("k{}", i), i, Duration::ZERO);
            }
            assert!(cache.len() <= 256);
            assert_eq!(cache.len(), cache.keys().len());
        }
    }
}

// == Purge Tests ==

#[test]
fn test_purge_is_silent() {
    let cache = CacheStore::new(0, 16, Duration::ZERO);
    let log = record_evictions(&cache);

    for i in 0..500 {
        cache.set(format!("k{}", i), i, Duration::from_secs(60));
    }
    cache.purge();

    assert_eq!(cache.len(), 0);
    assert!(cache.keys().is_empty());
    assert!(log.lock().unwrap().is_empty());
}

// == Cleaner Tests ==

#[test]
fn test_active_sweep_removes_expired_without_reads() {
    let cache = CacheStore::new(100, 4, Duration::from_millis(25));
    let log = record_evictions(&cache);
    assert_eq!(cache.cleaner_state(), CleanerState::Running);

    cache.set("short", 1, Duration::from_millis(30));
    cache.set("long", 2, Duration::from_secs(60));
    sleep(Duration::from_millis(200));

    assert_eq!(cache.len(), 1);
    assert_eq!(*log.lock().unwrap(), vec![("short".to_string(), 1)]);
    cache.close();
}

#[tokio::test]
async fn test_active_sweep_inside_runtime() {
    let cache = CacheStore::new(100, 4, Duration::from_millis(25));

    cache.set("short", 1, Duration::from_millis(30));
    tokio::time::sleep(Duration::from_millis(200)).await;

    assert_eq!(cache.len(), 0);
    assert_eq!(cache.stats().expirations, 1);
    cache.close();
}

#[test]
fn test_store_outlives_runtime_it_was_built_in() {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let cache = runtime.block_on(async {
        CacheStore::new(100, 4, Duration::from_millis(25))
    });
    drop(runtime);

    cache.set("short", 1, Duration::from_millis(10));
    sleep(Duration::from_millis(200));

    assert_eq!(cache.cleaner_state(), CleanerState::Running);
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.stats().expirations, 1);
    cache.close();
}

#[test]
fn test_store_built_in_runtime_without_timers_still_sweeps() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .build()
        .unwrap();
    let cache = {
        let _guard = runtime.enter();
        CacheStore::new(100, 4, Duration::from_millis(25))
    };

    cache.set("short", 1, Duration::from_millis(10));
    sleep(Duration::from_millis(200));

    assert_eq!(cache.cleaner_state(), CleanerState::Running);
    assert_eq!(cache.len(), 0);
    assert_eq!(cache.stats().expirations, 1);
    cache.close();
}

#[test]
fn test_close_reverts_to_passive_expiry() {
    let cache = CacheStore::new(100, 4, Duration::from_millis(25));
    let log = record_evictions(&cache);

    cache.close();
    cache.close();
    assert_eq!(cache.cleaner_state(), CleanerState::Stopped);

    cache.set("x", 1, Duration::from_millis(20));
    sleep(Duration::from_millis(150));

    // No sweep ran, so the expired entry is still counted until read.
    assert_eq!(cache.len(), 1);
    assert!(log.lock().unwrap().is_empty());

    assert_eq!(cache.get("x"), None);
    assert_eq!(cache.len(), 0);
    assert_eq!(*log.lock().unwrap(), vec![("x".to_string(), 1)]);
}

#[test]
fn test_close_without_cleaner_is_safe() {
    let cache: CacheStore<i32> = CacheStore::new(10, 2, Duration::ZERO);
    cache.close();
    cache.close();
    assert_eq!(cache.cleaner_state(), CleanerState::Idle);

    cache.set("still", 1, Duration::ZERO);
    assert_eq!(cache.get("still"), Some(1));
}

// == Concurrency Tests ==

#[test]
fn test_concurrent_access_keeps_accounting_consistent() {
    let cache = Arc::new(CacheStore::new(256, 16, Duration::from_millis(5)));
    let removed = Arc::new(AtomicUsize::new(0));
    let counter = removed.clone();
    cache.set_on_evict(move |_, _: &usize| {
        counter.fetch_add(1, Ordering::Relaxed);
    });

    let threads = 8;
    let iters = 2000;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let cache = Arc::clone(&cache);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..iters {
                    let key = format!("k{}", (i * 31 + t) % 1024);
                    match i % 4 {
                        0 | 1 => cache.set(key, i, Duration::from_millis(3)),
                        2 => {
                            cache.get(&key);
                        }
                        _ => {
                            cache.delete(&key);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
    cache.close();

    assert!(cache.len() <= 16 * 16);
    assert_eq!(cache.len(), cache.keys().len());

    let stats = cache.stats();
    let total_removed = stats.evictions + stats.expirations + stats.deletions;
    assert_eq!(total_removed as usize, removed.load(Ordering::Relaxed));
}

#[test]
fn test_keys_while_writing_never_duplicates() {
    let cache = Arc::new(CacheStore::new(0, 8, Duration::ZERO));
    let writer = {
        let cache = Arc::clone(&cache);
        thread::spawn(move || {
            for i in 0..5000 {
                cache.set(format!("k{}", i % 500), i, Duration::ZERO);
            }
        })
    };

    for _ in 0..20 {
        let keys = cache.keys();
        let mut unique = keys.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), keys.len());
    }

    writer.join().unwrap();
    assert_eq!(cache.len(), 500);
}
