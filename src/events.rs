//! Change notifications for cached settings
//!
//! Listeners run after the cache lock has been released, so a callback may
//! read from or write to the cache without deadlocking.

use crate::sync::RwLockExt;
use crate::value::SettingValue;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Type alias for a change callback
///
/// Receives (`key`, `old_value`, `new_value`). `old_value` is `None` for a new
/// key and `new_value` is `None` for a removal.
pub type ChangeCallback =
    Arc<dyn Fn(&str, Option<&SettingValue>, Option<&SettingValue>) + Send + Sync>;

/// Manages listeners for settings changes
pub struct ChangeEvents {
    /// Global listeners (called for all changes)
    global_listeners: RwLock<Vec<ChangeCallback>>,

    /// Per-key listeners
    key_listeners: RwLock<HashMap<String, Vec<ChangeCallback>>>,
}

impl ChangeEvents {
    /// Create an empty listener registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            global_listeners: RwLock::new(Vec::new()),
            key_listeners: RwLock::new(HashMap::new()),
        }
    }

    /// Register a listener called for every change
    pub fn on_change<F>(&self, callback: F)
    where
        F: Fn(&str, Option<&SettingValue>, Option<&SettingValue>) + Send + Sync + 'static,
    {
        self.global_listeners
            .write_recovered()
            .push(Arc::new(callback));
    }

    /// Register a listener for a single key
    pub fn watch<F>(&self, key: &str, callback: F)
    where
        F: Fn(&str, Option<&SettingValue>, Option<&SettingValue>) + Send + Sync + 'static,
    {
        self.key_listeners
            .write_recovered()
            .entry(key.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Remove all listeners for a specific key
    pub fn unwatch(&self, key: &str) {
        self.key_listeners.write_recovered().remove(key);
    }

    /// Remove every listener
    pub fn clear(&self) {
        self.global_listeners.write_recovered().clear();
        self.key_listeners.write_recovered().clear();
    }

    /// Notify listeners about a change
    ///
    /// Callbacks are cloned out of the registry first, so a listener may
    /// register or remove listeners without deadlocking.
    pub fn notify(&self, key: &str, old: Option<&SettingValue>, new: Option<&SettingValue>) {
        let mut callbacks: Vec<ChangeCallback> =
            self.global_listeners.read_recovered().iter().cloned().collect();
        if let Some(listeners) = self.key_listeners.read_recovered().get(key) {
            callbacks.extend(listeners.iter().cloned());
        }

        for callback in callbacks {
            callback(key, old, new);
        }
    }

    /// Check whether any listener is registered
    ///
    /// Lets the cache skip cloning old values when nobody is listening.
    #[must_use]
    pub fn has_listeners(&self) -> bool {
        !self.global_listeners.read_recovered().is_empty()
            || !self.key_listeners.read_recovered().is_empty()
    }
}

impl Default for ChangeEvents {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
