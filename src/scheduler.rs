//! Flush schedulers
//!
//! The cache never creates threads or timers; something outside it calls
//! `flush()`. Two ready-made drivers are provided:
//!
//! - [`TickFlusher`]: for hosts with their own loop (game frame, UI tick).
//!   Call `tick()` every iteration; it flushes once per interval.
//! - [`IntervalFlusher`]: owns a background thread that flushes on a fixed
//!   interval and performs a final flush when stopped.

use crate::backend::PersistenceBackend;
use crate::cache::{Flush, FlushOutcome, SettingsCache};
use crate::codec::SettingsCodec;
use crate::error::{Error, Result};
use crate::sync::MutexExt;

use log::{debug, warn};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// =============================================================================
// Tick Flusher
// =============================================================================

/// Host-driven flusher
///
/// A zero interval flushes on every tick, which is cheap because a clean
/// cache returns without I/O.
pub struct TickFlusher<F: Flush> {
    target: F,
    interval: Duration,
    last_attempt: Mutex<Option<Instant>>,
}

impl<F: Flush> TickFlusher<F> {
    /// Create a tick flusher. The first tick always flushes.
    pub fn new(target: F, interval: Duration) -> Self {
        Self {
            target,
            interval,
            last_attempt: Mutex::new(None),
        }
    }

    /// Call from the host loop. Returns `None` if the interval has not elapsed.
    pub fn tick(&self) -> Option<FlushOutcome> {
        self.tick_at(Instant::now())
    }

    /// Like [`tick`](Self::tick) with an explicit clock reading
    pub fn tick_at(&self, now: Instant) -> Option<FlushOutcome> {
        {
            let mut last = self.last_attempt.lock_recovered();
            if let Some(previous) = *last {
                if now.saturating_duration_since(previous) < self.interval {
                    return None;
                }
            }
            *last = Some(now);
        }
        Some(self.target.flush())
    }

    /// The flushed target
    pub fn target(&self) -> &F {
        &self.target
    }
}

impl<B, C> TickFlusher<Arc<SettingsCache<B, C>>>
where
    B: PersistenceBackend,
    C: SettingsCodec,
{
    /// Tick flusher using the cache's configured flush interval
    pub fn for_cache(cache: &Arc<SettingsCache<B, C>>) -> Self {
        Self::new(Arc::clone(cache), cache.config().flush_interval)
    }
}

// =============================================================================
// Interval Flusher
// =============================================================================

/// Background-thread flusher
///
/// Stopping (explicitly or by drop) wakes the thread, which performs a final
/// flush before exiting.
pub struct IntervalFlusher {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl IntervalFlusher {
    /// Spawn a thread that flushes `target` every `interval`.
    ///
    /// # Errors
    ///
    /// - `Error::Config` if `interval` is zero
    /// - `Error::FlusherSpawn` if the thread cannot be created
    pub fn spawn<F>(target: Arc<F>, interval: Duration) -> Result<Self>
    where
        F: Flush + ?Sized + 'static,
    {
        if interval.is_zero() {
            return Err(Error::Config(
                "Flush interval must be greater than 0".into(),
            ));
        }

        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name("prefcache-flusher".into())
            .spawn(move || {
                loop {
                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => {
                            target.flush();
                        }
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                let outcome = target.flush();
                debug!("Flusher stopped, final flush: {outcome:?}");
            })
            .map_err(Error::FlusherSpawn)?;

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
        })
    }

    /// Spawn a flusher using the cache's configured flush interval.
    ///
    /// # Errors
    ///
    /// Returns `Error::FlusherSpawn` if the thread cannot be created.
    pub fn for_cache<B, C>(cache: &Arc<SettingsCache<B, C>>) -> Result<Self>
    where
        B: PersistenceBackend + 'static,
        C: SettingsCodec + 'static,
    {
        Self::spawn(Arc::clone(cache), cache.config().flush_interval)
    }

    /// Stop the thread after a final flush and wait for it.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Flusher thread panicked");
            }
        }
    }
}

impl Drop for IntervalFlusher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// =============================================================================
// Tests
// =============================================================================
