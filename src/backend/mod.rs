//! Persistence backends
//!
//! A backend stores exactly one opaque blob under a fixed store name. It has
//! no notion of individual keys; the cache always reads and writes the whole
//! settings map at once.
//!
//! - **File**: one file per store, written atomically
//! - **Memory**: in-process only, for tests and ephemeral settings

mod file;
mod memory;

pub use file::FileBackend;
pub use memory::MemoryBackend;

use crate::error::Result;
use std::sync::Arc;

/// Trait for whole-blob persistence backends
pub trait PersistenceBackend: Send + Sync {
    /// Logical name of the settings store this backend holds
    fn store_name(&self) -> &str;

    /// Read the stored blob
    ///
    /// Returns `Ok(None)` when nothing has been persisted yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob exists but cannot be read.
    fn read_blob(&self) -> Result<Option<Vec<u8>>>;

    /// Replace the stored blob
    ///
    /// # Errors
    ///
    /// Returns an error if the blob cannot be written. The previous blob must
    /// remain intact in that case.
    fn write_blob(&self, bytes: &[u8]) -> Result<()>;
}

impl<B: PersistenceBackend + ?Sized> PersistenceBackend for Arc<B> {
    fn store_name(&self) -> &str {
        (**self).store_name()
    }

    fn read_blob(&self) -> Result<Option<Vec<u8>>> {
        (**self).read_blob()
    }

    fn write_blob(&self, bytes: &[u8]) -> Result<()> {
        (**self).write_blob(bytes)
    }
}

impl<B: PersistenceBackend + ?Sized> PersistenceBackend for Box<B> {
    fn store_name(&self) -> &str {
        (**self).store_name()
    }

    fn read_blob(&self) -> Result<Option<Vec<u8>>> {
        (**self).read_blob()
    }

    fn write_blob(&self, bytes: &[u8]) -> Result<()> {
        (**self).write_blob(bytes)
    }
}
