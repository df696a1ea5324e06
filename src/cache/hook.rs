//! Eviction Hook Module
//!
//! Holds the single callback fired by every removal path.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// Callback invoked with the key and value of every removed entry.
pub type EvictCallback<V> = Arc<dyn Fn(&str, &V) + Send + Sync + 'static>;

// == Evict Hook ==
/// Shared slot for the eviction callback.
///
/// The callback runs synchronously on the removing thread while the owning
/// shard's lock is held. It must stay short and must not call back into the
/// same cache: re-locking that shard deadlocks.
pub struct EvictHook<V> {
    callback: RwLock<Option<EvictCallback<V>>>,
}

impl<V> EvictHook<V> {
    pub fn new() -> Self {
        Self {
            callback: RwLock::new(None),
        }
    }

    /// Installs `callback`, replacing any previous one.
    pub fn set(&self, callback: EvictCallback<V>) {
        *self.callback.write() = Some(callback);
    }

    /// Invokes the installed callback, if any.
    pub fn fire(&self, key: &str, value: &V) {
        if let Some(cb) = self.callback.read().as_ref() {
            cb(key, value);
        }
    }
}

impl<V> Default for EvictHook<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for EvictHook<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EvictHook")
            .field("installed", &self.callback.read().is_some())
            .finish()
    }
}
