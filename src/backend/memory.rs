//! In-memory persistence backend for testing

use super::PersistenceBackend;
use crate::error::Result;
use crate::sync::MutexExt;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-memory blob storage (not persisted across processes)
///
/// Wrap it in an `Arc` to share one store between successive caches, which
/// simulates a restart.
#[derive(Debug)]
pub struct MemoryBackend {
    name: String,
    blob: Mutex<Option<Vec<u8>>>,
    writes: AtomicUsize,
}

impl MemoryBackend {
    /// Create an empty memory backend
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            blob: Mutex::new(None),
            writes: AtomicUsize::new(0),
        }
    }

    /// Create a memory backend that already holds a blob
    #[must_use]
    pub fn with_blob(name: impl Into<String>, blob: impl Into<Vec<u8>>) -> Self {
        let backend = Self::new(name);
        *backend.blob.lock_recovered() = Some(blob.into());
        backend
    }

    /// Current blob contents, if any
    #[must_use]
    pub fn blob(&self) -> Option<Vec<u8>> {
        self.blob.lock_recovered().clone()
    }

    /// Number of successful `write_blob` calls
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new("settings")
    }
}

impl PersistenceBackend for MemoryBackend {
    fn store_name(&self) -> &str {
        &self.name
    }

    fn read_blob(&self) -> Result<Option<Vec<u8>>> {
        Ok(self.blob())
    }

    fn write_blob(&self, bytes: &[u8]) -> Result<()> {
        *self.blob.lock_recovered() = Some(bytes.to_vec());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
