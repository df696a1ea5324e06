//! Configuration Module
//!
//! Handles loading and managing cache and server configuration from environment variables.

use std::env;
use std::time::Duration;

use crate::cache::CacheStore;

/// Default total cache capacity when unset
pub const DEFAULT_CAPACITY: usize = 100_000;

/// Default shard count when unset
pub const DEFAULT_SHARDS: usize = 64;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Total number of entries the cache can hold, 0 = unbounded
    pub capacity: usize,
    /// Number of cache shards (normalised by the store)
    pub shard_count: usize,
    /// Background sweep interval in milliseconds, 0 = passive expiry only
    pub clean_interval_ms: u64,
    /// TTL in seconds applied when a request omits one, 0 = never expires
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_CAPACITY` - Total cache entries (default: 100000; 0 = default,
    ///   negative = unbounded)
    /// - `CACHE_SHARDS` - Shard count (default: 64; 0 = default)
    /// - `CACHE_CLEAN_INTERVAL_MS` - Sweep frequency in milliseconds (default: 0, disabled)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 0, never expires)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        Self {
            capacity: capacity_from(parse_var::<i64>("CACHE_CAPACITY")),
            shard_count: match parse_var::<usize>("CACHE_SHARDS") {
                Some(0) | None => DEFAULT_SHARDS,
                Some(n) => n,
            },
            clean_interval_ms: parse_var("CACHE_CLEAN_INTERVAL_MS").unwrap_or(0),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(0),
            server_port: parse_var("SERVER_PORT").unwrap_or(3000),
        }
    }

    /// Background sweep interval as a Duration.
    pub fn clean_interval(&self) -> Duration {
        Duration::from_millis(self.clean_interval_ms)
    }

    /// TTL applied when a request omits one.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl)
    }

    /// Builds the cache store described by this configuration.
    pub fn build_cache<V>(&self) -> CacheStore<V>
    where
        V: Clone + Send + Sync + 'static,
    {
        CacheStore::new(self.capacity, self.shard_count, self.clean_interval())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            shard_count: DEFAULT_SHARDS,
            clean_interval_ms: 0,
            default_ttl: 0,
            server_port: 3000,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

// Unset or zero falls back to the default; a negative value asks for no bound.
fn capacity_from(raw: Option<i64>) -> usize {
    match raw {
        None | Some(0) => DEFAULT_CAPACITY,
        Some(n) if n < 0 => 0,
        Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
    }
}
