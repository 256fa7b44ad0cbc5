//! Deferred persistence
//!
//! The flush protocol: under the settings lock, snapshot the map and clear
//! `dirty`; outside the lock, encode and write. Writes that land during the
//! I/O set `dirty` again, and a failed write restores it, so the next flush
//! always picks up the latest state.

use crate::backend::PersistenceBackend;
use crate::cache::core::SettingsCache;
use crate::codec::{Entries, SettingsCodec};
use crate::error::Result;
use crate::sync::MutexExt;

use log::{debug, warn};
use std::sync::Arc;
use time::OffsetDateTime;

/// Result of a single flush attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    /// Nothing changed since the last successful flush; no I/O was done
    Clean,
    /// The snapshot taken at `generation` was written (`bytes` long)
    Persisted { generation: u64, bytes: usize },
    /// Encoding or writing failed; the cache stays dirty and will retry
    Failed,
    /// Another flush was already running
    Busy,
}

impl FlushOutcome {
    /// Whether this attempt wrote to the backend
    #[must_use]
    pub fn is_persisted(&self) -> bool {
        matches!(self, FlushOutcome::Persisted { .. })
    }
}

/// Something a flush scheduler can drive
///
/// Schedulers depend only on this trait, never on a concrete cache type.
pub trait Flush: Send + Sync {
    /// Persist pending changes, if any
    fn flush(&self) -> FlushOutcome;
}

impl<F: Flush + ?Sized> Flush for Arc<F> {
    fn flush(&self) -> FlushOutcome {
        (**self).flush()
    }
}

impl<B: PersistenceBackend, C: SettingsCodec> SettingsCache<B, C> {
    /// Persist the settings if they changed since the last successful flush.
    ///
    /// Meant to be called by a flush scheduler (frame tick, timer, ...), not by
    /// application code. Cheap when nothing changed: a dirty check under the
    /// lock and no I/O. Persistence errors are logged and absorbed; the cache
    /// stays dirty so the next call retries with the latest state.
    pub fn flush(&self) -> FlushOutcome {
        let Some(_gate) = self.flush_gate.try_lock_recovered() else {
            debug!(
                "Flush of '{}' already in progress, skipping",
                self.backend.store_name()
            );
            return FlushOutcome::Busy;
        };

        let (snapshot, generation) = {
            let mut state = self.state.lock_recovered();
            if !state.dirty {
                return FlushOutcome::Clean;
            }
            state.dirty = false;
            (state.entries.clone(), state.generation)
        };

        match self.persist(&snapshot) {
            Ok(bytes) => {
                let mut stats = self.flush_stats.lock_recovered();
                stats.flushes += 1;
                stats.last_flush_at = Some(OffsetDateTime::now_utc());
                debug!(
                    "Flushed {} settings ({bytes} bytes) to '{}' at generation {generation}",
                    snapshot.len(),
                    self.backend.store_name()
                );
                FlushOutcome::Persisted { generation, bytes }
            }
            Err(e) => {
                self.state.lock_recovered().dirty = true;
                self.flush_stats.lock_recovered().failed_flushes += 1;
                warn!(
                    "Failed to persist settings store '{}', will retry on next flush: {e}",
                    self.backend.store_name()
                );
                FlushOutcome::Failed
            }
        }
    }

    /// Flush one last time and drop the cache.
    ///
    /// Without this, changes made after the last scheduled flush are lost
    /// when the process exits.
    pub fn flush_and_close(self) -> FlushOutcome {
        let outcome = self.flush();
        debug!(
            "Closed settings store '{}': {outcome:?}",
            self.backend.store_name()
        );
        outcome
    }

    fn persist(&self, snapshot: &Entries) -> Result<usize> {
        let bytes = self.codec.encode(snapshot)?;
        self.backend.write_blob(&bytes)?;
        Ok(bytes.len())
    }
}

impl<B: PersistenceBackend, C: SettingsCodec> Flush for SettingsCache<B, C> {
    fn flush(&self) -> FlushOutcome {
        SettingsCache::flush(self)
    }
}

// =============================================================================
// Tests
// =============================================================================
