//! The settings cache
//!
//! - `core`: the [`SettingsCache`] struct, its state and startup loading
//! - `operations`: get/set/remove and introspection
//! - `flush`: deferred persistence and the [`Flush`] trait
//! - `builder`: [`SettingsCacheBuilder`]

mod builder;
mod core;
mod flush;
mod operations;

pub use self::builder::SettingsCacheBuilder;
pub use self::core::{CacheStats, SettingsCache};
pub use self::flush::{Flush, FlushOutcome};
