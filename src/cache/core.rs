use crate::backend::PersistenceBackend;
use crate::codec::{Entries, JsonCodec, SettingsCodec};
use crate::config::CacheConfig;
use crate::error::{Error, Result};
use crate::events::ChangeEvents;

use log::{debug, info, warn};
use std::sync::Mutex;
use time::OffsetDateTime;

/// Mutable state guarded by the cache lock
pub(crate) struct CacheState {
    /// Authoritative current settings
    pub entries: Entries,
    /// In-memory state differs from the last persisted snapshot
    pub dirty: bool,
    /// Bumped on every mutation
    pub generation: u64,
}

impl CacheState {
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
        self.generation += 1;
    }
}

/// Flush bookkeeping, guarded by its own lock rather than the settings lock.
/// `stats()` takes both, one after the other.
#[derive(Default)]
pub(crate) struct FlushStats {
    pub flushes: u64,
    pub failed_flushes: u64,
    pub last_flush_at: Option<OffsetDateTime>,
}

/// Point-in-time view of the cache, for diagnostics
#[derive(Debug, Clone, PartialEq)]
pub struct CacheStats {
    /// Number of entries in memory
    pub entries: usize,
    /// Whether changes are waiting to be persisted
    pub dirty: bool,
    /// Mutation counter
    pub generation: u64,
    /// Successful backend writes
    pub flushes: u64,
    /// Flushes whose encode or write failed
    pub failed_flushes: u64,
    /// Time of the last successful flush
    pub last_flush_at: Option<OffsetDateTime>,
}

/// Thread-safe settings cache with deferred, coalesced persistence.
///
/// Reads and writes only touch memory. Writes mark the cache dirty, and a
/// flush scheduler periodically calls [`flush`](Self::flush), which persists
/// the whole map in one backend write when something changed.
///
/// # Example
///
/// ```
/// use prefcache::{MemoryBackend, SettingsCache};
///
/// let cache = SettingsCache::open(MemoryBackend::new("game-settings"))?;
///
/// cache.set_value("volume", 0.8)?;
/// assert_eq!(cache.get_value("volume", 1.0)?, 0.8);
///
/// // Called by the host loop or a flusher, never by gameplay code
/// cache.flush();
/// # Ok::<(), prefcache::Error>(())
/// ```
///
/// # Type Parameters
///
/// * `B`: where the blob lives
/// * `C`: how the map is encoded (defaults to [`JsonCodec`])
pub struct SettingsCache<B: PersistenceBackend, C: SettingsCodec = JsonCodec> {
    pub(crate) backend: B,
    pub(crate) codec: C,
    pub(crate) config: CacheConfig,

    /// Settings map, dirty flag and generation
    pub(crate) state: Mutex<CacheState>,

    /// Held for the duration of a flush so flushes never overlap
    pub(crate) flush_gate: Mutex<()>,

    pub(crate) flush_stats: Mutex<FlushStats>,

    pub(crate) events: ChangeEvents,
}

impl<B: PersistenceBackend, C: SettingsCodec> SettingsCache<B, C> {
    /// Create a cache, loading the persisted blob once.
    ///
    /// A missing, unreadable or undecodable blob never fails startup: the
    /// cache starts empty and the problem is logged.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the configuration is invalid.
    pub fn new(backend: B, codec: C, config: CacheConfig) -> Result<Self> {
        config.validate()?;
        if backend.store_name().is_empty() {
            return Err(Error::Config("Store name must not be empty".into()));
        }

        let loaded = load_entries(&backend, &codec);
        let (entries, dirty) = match &config.migrator {
            Some(migrator) => {
                let migrated = retain_storable(migrator(loaded.clone()));
                let changed = migrated != loaded;
                if changed {
                    debug!(
                        "Migrated settings store '{}', will persist on next flush",
                        backend.store_name()
                    );
                }
                (migrated, changed)
            }
            None => (loaded, false),
        };

        info!(
            "Opened settings store '{}' with {} entries",
            backend.store_name(),
            entries.len()
        );

        Ok(Self {
            backend,
            codec,
            config,
            state: Mutex::new(CacheState {
                entries,
                dirty,
                generation: 0,
            }),
            flush_gate: Mutex::new(()),
            flush_stats: Mutex::new(FlushStats::default()),
            events: ChangeEvents::new(),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Get the persistence backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get the codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Get the change listener registry
    ///
    /// # Example
    ///
    /// ```
    /// # use prefcache::{MemoryBackend, SettingsCache};
    /// let cache = SettingsCache::open(MemoryBackend::default())?;
    ///
    /// cache.events().watch("volume", |key, old, new| {
    ///     println!("{key}: {old:?} -> {new:?}");
    /// });
    /// # Ok::<(), prefcache::Error>(())
    /// ```
    pub fn events(&self) -> &ChangeEvents {
        &self.events
    }
}

impl<B: PersistenceBackend> SettingsCache<B, JsonCodec> {
    /// Open a cache with the default JSON codec and configuration.
    ///
    /// # Errors
    ///
    /// See [`SettingsCache::new`].
    pub fn open(backend: B) -> Result<Self> {
        Self::new(backend, JsonCodec::new(), CacheConfig::default())
    }

    /// Create a builder for `SettingsCache` with a fluent API.
    ///
    /// # Example
    ///
    /// ```
    /// use prefcache::{JsonCodec, MemoryBackend, SettingsCache};
    /// use std::time::Duration;
    ///
    /// let cache = SettingsCache::builder(MemoryBackend::default())
    ///     .codec(JsonCodec::compact())
    ///     .flush_interval(Duration::from_millis(500))
    ///     .build()?;
    /// # Ok::<(), prefcache::Error>(())
    /// ```
    pub fn builder(backend: B) -> crate::cache::SettingsCacheBuilder<B> {
        crate::cache::SettingsCacheBuilder::new(backend)
    }
}

/// Drop entries that could not be read back as written: an empty key or a
/// non-finite float.
fn retain_storable(mut entries: Entries) -> Entries {
    entries.retain(|key, value| {
        if key.is_empty() {
            warn!("Dropping migrated setting with an empty key");
            return false;
        }
        match value.validate(key) {
            Ok(()) => true,
            Err(e) => {
                warn!("Dropping migrated setting: {e}");
                false
            }
        }
    });
    entries
}

/// Read and decode the persisted blob, falling back to an empty map.
fn load_entries<B: PersistenceBackend, C: SettingsCodec>(backend: &B, codec: &C) -> Entries {
    let store = backend.store_name();
    match backend.read_blob() {
        Ok(Some(bytes)) => codec.decode(&bytes).unwrap_or_else(|e| {
            warn!("Settings store '{store}' could not be decoded, starting empty: {e}");
            Entries::new()
        }),
        Ok(None) => {
            debug!("Settings store '{store}' not found, starting empty");
            Entries::new()
        }
        Err(e) => {
            warn!("Settings store '{store}' could not be read, starting empty: {e}");
            Entries::new()
        }
    }
}
