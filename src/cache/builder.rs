//! Builder for SettingsCache
//!
//! This module contains [`SettingsCacheBuilder`] which provides a fluent API
//! for creating a [`SettingsCache`](super::SettingsCache).

use crate::backend::PersistenceBackend;
use crate::codec::{Entries, JsonCodec, SettingsCodec};
use crate::config::CacheConfig;
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;

use super::SettingsCache;

/// Builder for creating a [`SettingsCache`] with a fluent API.
///
/// # Example
///
/// ```
/// use prefcache::{MemoryBackend, SettingsCache};
///
/// let cache = SettingsCache::builder(MemoryBackend::default())
///     .migrator(|mut entries| {
///         // "sfx_volume" was renamed to "effects_volume"
///         if let Some(v) = entries.remove("sfx_volume") {
///             entries.insert("effects_volume".into(), v);
///         }
///         entries
///     })
///     .build()?;
/// # Ok::<(), prefcache::Error>(())
/// ```
pub struct SettingsCacheBuilder<B: PersistenceBackend, C: SettingsCodec = JsonCodec> {
    backend: B,
    codec: C,
    config: CacheConfig,
}

impl<B: PersistenceBackend> SettingsCacheBuilder<B, JsonCodec> {
    /// Create a new builder around a backend, with the default JSON codec.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            codec: JsonCodec::new(),
            config: CacheConfig::default(),
        }
    }
}

impl<B: PersistenceBackend, C: SettingsCodec> SettingsCacheBuilder<B, C> {
    /// Use a different codec for the persisted blob.
    pub fn codec<C2: SettingsCodec>(self, codec: C2) -> SettingsCacheBuilder<B, C2> {
        SettingsCacheBuilder {
            backend: self.backend,
            codec,
            config: self.config,
        }
    }

    /// Set how often the bundled flushers persist changes (default: 1s).
    pub fn flush_interval(mut self, interval: Duration) -> Self {
        self.config.flush_interval = interval;
        self
    }

    /// Set a migration function applied once to the loaded settings.
    ///
    /// If it changes the map, the migrated version is written on the first flush.
    pub fn migrator<F>(mut self, migrator: F) -> Self
    where
        F: Fn(Entries) -> Entries + Send + Sync + 'static,
    {
        self.config.migrator = Some(Arc::new(migrator));
        self
    }

    /// Replace the whole configuration.
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the [`SettingsCache`], loading the persisted blob.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn build(self) -> Result<SettingsCache<B, C>> {
        SettingsCache::new(self.backend, self.codec, self.config)
    }
}
