//! Common test utilities for prefcache integration tests
//!
//! Provides shared fixtures and a backend whose writes can be made to fail.

#![allow(dead_code)]

use prefcache::{Error, FileBackend, FileSettings, MemoryBackend, PersistenceBackend, Result};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;

/// Route `log` output through the test harness (`RUST_LOG=debug cargo test`)
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// =============================================================================
// File Fixture
// =============================================================================

/// A settings cache backed by a file in a temporary directory
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub cache: FileSettings,
}

impl TestFixture {
    pub fn new() -> Self {
        init_logging();
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let cache = FileSettings::open(Self::backend_in(&temp_dir)).expect("Failed to open cache");
        Self { temp_dir, cache }
    }

    pub fn backend_in(dir: &TempDir) -> FileBackend {
        FileBackend::new(dir.path(), "GameSettings", "json")
    }

    pub fn backend(&self) -> FileBackend {
        Self::backend_in(&self.temp_dir)
    }

    /// Open a second cache on the same file, as a restarted process would
    pub fn reopen(&self) -> FileSettings {
        FileSettings::open(self.backend()).expect("Failed to reopen cache")
    }

    pub fn settings_path(&self) -> std::path::PathBuf {
        self.backend().path()
    }
}

// =============================================================================
// Failing Backend
// =============================================================================

/// Memory backend that rejects writes while `failing` is set
pub struct FailingBackend {
    inner: MemoryBackend,
    failing: AtomicBool,
    attempts: AtomicUsize,
    rejected: Mutex<Vec<Vec<u8>>>,
}

impl FailingBackend {
    pub fn new() -> Self {
        Self {
            inner: MemoryBackend::new("failing"),
            failing: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
            rejected: Mutex::new(Vec::new()),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Total `write_blob` calls, successful or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Successful writes
    pub fn writes(&self) -> usize {
        self.inner.write_count()
    }

    pub fn blob(&self) -> Option<Vec<u8>> {
        self.inner.blob()
    }

    pub fn rejected(&self) -> usize {
        self.rejected.lock().unwrap().len()
    }
}

impl PersistenceBackend for FailingBackend {
    fn store_name(&self) -> &str {
        self.inner.store_name()
    }

    fn read_blob(&self) -> Result<Option<Vec<u8>>> {
        self.inner.read_blob()
    }

    fn write_blob(&self, bytes: &[u8]) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            self.rejected.lock().unwrap().push(bytes.to_vec());
            return Err(Error::BackendWrite {
                store: self.store_name().to_string(),
                reason: "simulated write failure".into(),
            });
        }
        self.inner.write_blob(bytes)
    }
}
