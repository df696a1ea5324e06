//! Background Tasks Module
//!
//! Contains background tasks that run alongside cache operations.
//!
//! # Tasks
//! - Cleaner: periodically sweeps every shard for expired entries

mod cleaner;

pub use cleaner::{Cleaner, CleanerState, Sweep};
