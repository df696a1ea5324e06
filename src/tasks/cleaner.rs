//! TTL Cleaner Task
//!
//! Background task that periodically removes expired cache entries.
//!
//! The cleaner moves through three states: `Idle` when no interval is
//! configured, `Running` while its sweep thread is alive, and `Stopped` after
//! [`Cleaner::stop`] or once that thread has exited. A stopped cleaner is
//! never restarted.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Builder;
use tokio::sync::oneshot;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Something the cleaner can sweep for expired entries.
pub trait Sweep: Send + Sync + 'static {
    /// Removes everything expired at `now` and returns how many entries went.
    fn sweep_expired(&self, now: std::time::Instant) -> usize;
}

/// Observable lifecycle of a [`Cleaner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanerState {
    /// No sweep interval configured; expiry is passive only.
    Idle,
    /// The periodic sweep is active.
    Running,
    /// The sweep was cancelled or has exited and will not run again.
    Stopped,
}

enum Slot {
    Idle,
    Running {
        stop_tx: oneshot::Sender<()>,
        thread: JoinHandle<()>,
    },
    Stopped,
}

// == Cleaner ==
/// Handle to the periodic sweep thread.
///
/// Dropping the handle drops the stop sender, which also ends the sweep.
pub struct Cleaner {
    slot: Mutex<Slot>,
    interval: Duration,
}

impl Cleaner {
    /// A cleaner that never runs.
    pub fn idle() -> Self {
        Self {
            slot: Mutex::new(Slot::Idle),
            interval: Duration::ZERO,
        }
    }

    /// Starts sweeping `target` every `interval`.
    ///
    /// A zero interval yields an idle cleaner. The sweep always runs on a
    /// dedicated `cache-cleaner` thread driving its own current-thread
    /// runtime, so it neither depends on nor blocks the caller's runtime.
    /// If that thread cannot be set up the cleaner stays idle and a warning
    /// is logged.
    ///
    /// # Example
    /// ```ignore
    /// let cleaner = Cleaner::start(shards.clone(), Duration::from_secs(1));
    /// // Later, during shutdown:
    /// cleaner.stop();
    /// ```
    pub fn start<S: Sweep>(target: Arc<S>, interval: Duration) -> Self {
        if interval.is_zero() {
            return Self::idle();
        }

        let runtime = match Builder::new_current_thread().enable_time().build() {
            Ok(rt) => rt,
            Err(e) => {
                warn!("Cache cleaner disabled, failed to build runtime: {}", e);
                return Self::idle();
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let spawned = thread::Builder::new()
            .name("cache-cleaner".to_string())
            .spawn(move || runtime.block_on(run(target, interval, stop_rx)));
        let thread = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Cache cleaner disabled, failed to spawn thread: {}", e);
                return Self::idle();
            }
        };

        Self {
            slot: Mutex::new(Slot::Running { stop_tx, thread }),
            interval,
        }
    }

    /// Signals the sweep to exit and waits for the sweep thread to finish.
    /// Safe to call any number of times.
    ///
    /// Once this returns, no further sweep runs.
    pub fn stop(&self) {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Stopped) {
            Slot::Running { stop_tx, thread } => {
                // Fails only if the thread already exited.
                let _ = stop_tx.send(());
                if thread.join().is_err() {
                    warn!("Cache cleaner thread panicked");
                }
            }
            Slot::Idle => *slot = Slot::Idle,
            Slot::Stopped => {}
        }
    }

    pub fn state(&self) -> CleanerState {
        match &*self.slot.lock() {
            Slot::Idle => CleanerState::Idle,
            Slot::Running { thread, .. } if thread.is_finished() => CleanerState::Stopped,
            Slot::Running { .. } => CleanerState::Running,
            Slot::Stopped => CleanerState::Stopped,
        }
    }
}

impl std::fmt::Debug for Cleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cleaner")
            .field("state", &self.state())
            .field("interval", &self.interval)
            .finish()
    }
}

async fn run<S: Sweep>(target: Arc<S>, interval: Duration, mut stop: oneshot::Receiver<()>) {
    info!(
        "Starting TTL cleaner with interval of {} ms",
        interval.as_millis()
    );

    let mut ticker = time::interval_at(time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            // Fires on an explicit stop and when the handle is dropped.
            _ = &mut stop => break,
            _ = ticker.tick() => {
                let removed = target.sweep_expired(std::time::Instant::now());
                if removed > 0 {
                    info!("TTL sweep: removed {} expired entries", removed);
                } else {
                    debug!("TTL sweep: no expired entries found");
                }
            }
        }
    }

    info!("TTL cleaner stopped");
}
