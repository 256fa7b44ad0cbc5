//! Cache configuration
//!
//! [`CacheConfig`] holds everything the cache needs besides its backend and
//! codec. It is normally built through [`SettingsCacheBuilder`](crate::SettingsCacheBuilder).

use crate::codec::Entries;
use crate::error::{Error, Result};
use std::sync::Arc;
use std::time::Duration;

/// Migration applied to the decoded settings once, when the cache opens
pub type Migrator = Arc<dyn Fn(Entries) -> Entries + Send + Sync>;

/// Default flush interval used by the bundled flushers
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(1);

/// Configuration for a [`SettingsCache`](crate::SettingsCache)
#[derive(Clone)]
pub struct CacheConfig {
    /// How often the bundled flushers persist pending changes
    pub flush_interval: Duration,

    /// Optional migration for old settings layouts (lazy migration)
    ///
    /// If the migrator changes the decoded map, the cache starts dirty so the
    /// migrated version is written on the first flush.
    pub migrator: Option<Migrator>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            migrator: None,
        }
    }
}

impl std::fmt::Debug for CacheConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheConfig")
            .field("flush_interval", &self.flush_interval)
            .field("migrator", &self.migrator.as_ref().map(|_| "Some(Fn)"))
            .finish()
    }
}

impl CacheConfig {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the flush interval is zero.
    pub fn validate(&self) -> Result<()> {
        if self.flush_interval.is_zero() {
            return Err(Error::Config(
                "Flush interval must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
