//! # prefcache - persistent settings cache
//!
//! A thread-safe, write-coalescing key-value cache for application settings.
//! The whole settings map lives in memory; writes only mark it dirty, and a
//! flush scheduler periodically persists it as one blob.
//!
//! ## Features
//!
//! - **In-memory reads/writes**: every access is a map operation under one lock, never I/O
//! - **Coalesced persistence**: any number of writes between flushes cost one backend write
//! - **Typed values**: a closed [`SettingValue`] variant with explicit coercion rules
//! - **Pluggable storage**: [`PersistenceBackend`] for where, [`SettingsCodec`] for how
//! - **Crash-tolerant startup**: a missing or corrupt blob starts an empty cache instead of failing
//! - **Retrying flushes**: a failed write leaves the cache dirty for the next flush
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use prefcache::{FileBackend, IntervalFlusher, SettingsCache};
//! use std::sync::Arc;
//!
//! let backend = FileBackend::for_app("my-game", "settings", "json")?;
//! let cache = Arc::new(SettingsCache::open(backend)?);
//!
//! // Persist pending changes every second on a background thread
//! let flusher = IntervalFlusher::for_cache(&cache)?;
//!
//! let volume: f64 = cache.get_value("volume", 1.0)?;
//! cache.set_value("volume", volume * 0.5)?;
//!
//! // Final flush on shutdown
//! flusher.stop();
//! # Ok::<(), prefcache::Error>(())
//! ```
//!
//! ## Host-Driven Flushing
//!
//! Applications with their own loop (games, UIs) can flush from it instead
//! of spawning a thread:
//!
//! ```rust
//! use prefcache::{MemoryBackend, SettingsCache, TickFlusher};
//! use std::sync::Arc;
//!
//! let cache = Arc::new(SettingsCache::open(MemoryBackend::default())?);
//! let flusher = TickFlusher::for_cache(&cache);
//!
//! cache.set_value("muted", true)?;
//!
//! // once per frame
//! flusher.tick();
//! assert!(!cache.is_dirty());
//! # Ok::<(), prefcache::Error>(())
//! ```
//!
//! ## Read-With-Default
//!
//! `get_value` inserts the default for missing keys, so the first read of a
//! setting also records it:
//!
//! ```rust
//! # use prefcache::{MemoryBackend, SettingsCache};
//! let cache = SettingsCache::open(MemoryBackend::default())?;
//!
//! assert_eq!(cache.get_value("volume", 1.0)?, 1.0);
//! assert!(cache.contains_key("volume"));
//! assert!(cache.is_dirty());
//! # Ok::<(), prefcache::Error>(())
//! ```
//!
//! ## Limitations
//!
//! Changes made after the last flush are lost if the process exits without
//! calling [`SettingsCache::flush_and_close`] or stopping the
//! [`IntervalFlusher`]. One process owns the store; there is no cross-process
//! synchronization.

// Core modules
mod cache;
mod config;
mod error;
mod events;
mod security;
mod sync;
mod value;

pub mod backend;
pub mod codec;
pub mod scheduler;

// Re-exports from core
pub use cache::{CacheStats, Flush, FlushOutcome, SettingsCache, SettingsCacheBuilder};
pub use config::{CacheConfig, DEFAULT_FLUSH_INTERVAL, Migrator};
pub use error::{Error, Result};
pub use events::{ChangeCallback, ChangeEvents};
pub use value::{IntoSetting, SettingKind, SettingValue};

pub use backend::{FileBackend, MemoryBackend, PersistenceBackend};
pub use codec::{Entries, JsonCodec, SettingsCodec};
pub use scheduler::{IntervalFlusher, TickFlusher};

// Optional codecs (feature-gated)
#[cfg(feature = "toml")]
pub use codec::TomlCodec;
#[cfg(feature = "yaml")]
pub use codec::YamlCodec;

// =============================================================================
// Convenient Type Aliases
// =============================================================================

/// Cache persisted as a JSON file
pub type FileSettings = SettingsCache<FileBackend, JsonCodec>;

/// Cache that lives only in memory, for tests and throwaway sessions
pub type MemorySettings = SettingsCache<MemoryBackend, JsonCodec>;
