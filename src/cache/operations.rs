use crate::backend::PersistenceBackend;
use crate::cache::core::{CacheStats, SettingsCache};
use crate::codec::{Entries, SettingsCodec};
use crate::error::{Error, Result};
use crate::sync::MutexExt;
use crate::value::{IntoSetting, SettingKind, SettingValue};

use log::debug;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::hash_map::Entry;

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key must not be empty".into()));
    }
    Ok(())
}

/// Convert a value for storage, rejecting anything that would not read back unchanged.
fn to_stored<T: IntoSetting>(key: &str, value: T) -> Result<SettingValue> {
    let value = value.into_setting().map_err(|reason| Error::InvalidValue {
        key: key.to_string(),
        reason,
    })?;
    value.validate(key)?;
    Ok(value)
}

fn type_mismatch(key: &str, expected: &str, stored: &SettingValue) -> Error {
    Error::TypeMismatch {
        key: key.to_string(),
        expected: expected.to_string(),
        actual: stored.type_name().to_string(),
    }
}

impl<B: PersistenceBackend, C: SettingsCodec> SettingsCache<B, C> {
    /// Read a setting, inserting `default` if the key is absent.
    ///
    /// A lookup is never side-effect free: for a missing key the default is
    /// stored (and the cache marked dirty) under the same lock acquisition as
    /// the lookup, so concurrent callers all observe one value.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidKey` if `key` is empty
    /// - `Error::TypeMismatch` if the stored value cannot be coerced to `T`
    /// - `Error::InvalidValue` if `default` contains a non-finite float or a
    ///   `u64` above `i64::MAX`
    ///
    /// # Example
    ///
    /// ```
    /// # use prefcache::{MemoryBackend, SettingsCache};
    /// let cache = SettingsCache::open(MemoryBackend::default())?;
    ///
    /// let launches: i64 = cache.get_value("launch_count", 0)?;
    /// assert_eq!(launches, 0);
    /// assert!(cache.contains_key("launch_count"));
    /// # Ok::<(), prefcache::Error>(())
    /// ```
    pub fn get_value<T: SettingKind + Clone>(&self, key: &str, default: T) -> Result<T> {
        validate_key(key)?;

        let inserted = {
            let mut state = self.state.lock_recovered();
            if let Some(stored) = state.entries.get(key) {
                return T::from_setting(stored).ok_or_else(|| type_mismatch(key, T::NAME, stored));
            }

            let value = to_stored(key, default.clone())?;
            state.entries.insert(key.to_string(), value.clone());
            state.mark_dirty();
            value
        };

        debug!("Inserted default for setting '{key}'");
        self.events.notify(key, None, Some(&inserted));
        Ok(default)
    }

    /// Read a setting into any serde type, inserting `default` if absent.
    ///
    /// Useful for structured settings. Goes through `serde_json::Value`, so
    /// every stored variant is accepted as long as `T` can deserialize it.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidKey` if `key` is empty
    /// - `Error::TypeMismatch` if the stored value does not deserialize into `T`
    /// - `Error::Serialize` if `default` cannot be serialized
    /// - `Error::InvalidValue` if `default` would not read back unchanged (a
    ///   null or an integer above `i64::MAX` at any depth)
    pub fn get_deserialized<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: Serialize + DeserializeOwned,
    {
        validate_key(key)?;

        let inserted = {
            let mut state = self.state.lock_recovered();
            let value = match state.entries.entry(key.to_string()) {
                Entry::Occupied(stored) => {
                    let stored = stored.get();
                    return serde_json::from_value(stored.to_json()).map_err(|_| {
                        type_mismatch(key, std::any::type_name::<T>(), stored)
                    });
                }
                Entry::Vacant(slot) => {
                    let value = SettingValue::from_json_exact(serde_json::to_value(&default)?)
                        .map_err(|reason| Error::InvalidValue {
                            key: key.to_string(),
                            reason,
                        })?;
                    value.validate(key)?;
                    slot.insert(value.clone());
                    value
                }
            };
            state.mark_dirty();
            value
        };

        self.events.notify(key, None, Some(&inserted));
        Ok(default)
    }

    /// Store a setting, replacing any previous value (last writer wins).
    ///
    /// Only memory is touched; the change is persisted by the next flush.
    ///
    /// # Errors
    ///
    /// - `Error::InvalidKey` if `key` is empty
    /// - `Error::InvalidValue` if the value contains a non-finite float or a
    ///   `u64` above `i64::MAX`
    pub fn set_value<T: IntoSetting>(&self, key: &str, value: T) -> Result<()> {
        validate_key(key)?;
        let value = to_stored(key, value)?;

        let new = self.events.has_listeners().then(|| value.clone());
        let old = {
            let mut state = self.state.lock_recovered();
            let old = state.entries.insert(key.to_string(), value);
            state.mark_dirty();
            old
        };

        if let Some(new) = new {
            self.events.notify(key, old.as_ref(), Some(&new));
        }
        Ok(())
    }

    /// Check whether a key is present. Never changes the dirty flag.
    pub fn contains_key(&self, key: &str) -> bool {
        self.state.lock_recovered().entries.contains_key(key)
    }

    /// Remove a setting. Returns whether an entry was removed.
    ///
    /// Removing an absent key is not an error and leaves the dirty flag
    /// untouched, since the persisted state cannot differ because of it.
    pub fn remove(&self, key: &str) -> bool {
        let old = {
            let mut state = self.state.lock_recovered();
            let old = state.entries.remove(key);
            if old.is_some() {
                state.mark_dirty();
            }
            old
        };

        match old {
            Some(old) => {
                self.events.notify(key, Some(&old), None);
                true
            }
            None => false,
        }
    }

    /// All keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock_recovered().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.state.lock_recovered().entries.len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether changes are waiting for a flush
    pub fn is_dirty(&self) -> bool {
        self.state.lock_recovered().dirty
    }

    /// Copy of the current settings map
    pub fn snapshot(&self) -> Entries {
        self.state.lock_recovered().entries.clone()
    }

    /// Diagnostics snapshot
    pub fn stats(&self) -> CacheStats {
        let (entries, dirty, generation) = {
            let state = self.state.lock_recovered();
            (state.entries.len(), state.dirty, state.generation)
        };
        let flush_stats = self.flush_stats.lock_recovered();
        CacheStats {
            entries,
            dirty,
            generation,
            flushes: flush_stats.flushes,
            failed_flushes: flush_stats.failed_flushes,
            last_flush_at: flush_stats.last_flush_at,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
