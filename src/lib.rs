//! Shard Cache - A sharded in-memory cache with sliding TTL and LRU eviction
//!
//! The core is [`cache::CacheStore`]: keys are spread over independently
//! locked shards, each bounded by its own LRU budget, with expired entries
//! dropped on read and, optionally, by a background sweep. A small HTTP
//! front end in [`api`] exposes one store to clients.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::CacheStore;
pub use config::Config;
pub use tasks::CleanerState;
