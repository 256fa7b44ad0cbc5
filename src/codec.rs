//! Settings codec trait and implementations
//!
//! A codec turns the whole settings map into one blob and back. The cache is
//! generic over it, so JSON can be swapped for TOML or YAML without touching
//! cache logic.

use crate::error::{Error, Result};
use crate::value::SettingValue;
use log::warn;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

/// The decoded form of a settings blob
pub type Entries = HashMap<String, SettingValue>;

/// Trait for settings codec implementations
pub trait SettingsCodec: Send + Sync {
    /// File extension for this format (e.g., "json", "toml")
    fn extension(&self) -> &str;

    /// Encode the full settings map into a blob
    ///
    /// # Errors
    ///
    /// Returns `Error::Encode` if the map cannot be represented in this format.
    fn encode(&self, entries: &Entries) -> Result<Vec<u8>>;

    /// Decode a blob into the full settings map
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` if the blob is malformed or is not a top-level map.
    fn decode(&self, bytes: &[u8]) -> Result<Entries>;
}

/// Sorted view of the entries so encoded blobs are stable between flushes.
fn sorted(entries: &Entries) -> BTreeMap<&str, &SettingValue> {
    entries.iter().map(|(k, v)| (k.as_str(), v)).collect()
}

/// Turn a parsed document into entries, dropping null values and empty keys.
fn entries_from_document(document: Value) -> Result<Entries> {
    let Value::Object(map) = document else {
        return Err(Error::Decode(
            "settings blob is not a top-level map".into(),
        ));
    };

    let mut entries = HashMap::with_capacity(map.len());
    for (key, value) in map {
        if key.is_empty() {
            warn!("Dropping setting with an empty key");
            continue;
        }
        match SettingValue::from_json(value) {
            Some(value) => {
                entries.insert(key, value);
            }
            None => warn!("Dropping null value for setting '{key}'"),
        }
    }
    Ok(entries)
}

// =============================================================================
// JSON Codec
// =============================================================================

/// JSON codec (default)
#[derive(Debug, Clone)]
pub struct JsonCodec {
    /// Pretty print JSON output
    pretty: bool,
}

impl JsonCodec {
    /// Create a JSON codec with pretty printing enabled
    #[must_use]
    pub fn new() -> Self {
        Self { pretty: true }
    }

    /// Create a compact JSON codec (no pretty printing)
    #[must_use]
    pub fn compact() -> Self {
        Self { pretty: false }
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl SettingsCodec for JsonCodec {
    fn extension(&self) -> &str {
        "json"
    }

    fn encode(&self, entries: &Entries) -> Result<Vec<u8>> {
        let view = sorted(entries);
        if self.pretty {
            serde_json::to_vec_pretty(&view)
        } else {
            serde_json::to_vec(&view)
        }
        .map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entries> {
        let document: Value =
            serde_json::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))?;
        entries_from_document(document)
    }
}

// =============================================================================
// TOML Codec
// =============================================================================

/// TOML codec (requires `toml` feature)
#[cfg(feature = "toml")]
#[derive(Debug, Clone, Default)]
pub struct TomlCodec;

#[cfg(feature = "toml")]
impl TomlCodec {
    /// Create a new TOML codec
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "toml")]
impl SettingsCodec for TomlCodec {
    fn extension(&self) -> &str {
        "toml"
    }

    fn encode(&self, entries: &Entries) -> Result<Vec<u8>> {
        toml::to_string_pretty(&sorted(entries))
            .map(String::into_bytes)
            .map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entries> {
        let text = std::str::from_utf8(bytes).map_err(|e| Error::Decode(e.to_string()))?;
        let document: Value = toml::from_str(text).map_err(|e| Error::Decode(e.to_string()))?;
        entries_from_document(document)
    }
}

// =============================================================================
// YAML Codec
// =============================================================================

/// YAML codec (requires `yaml` feature)
#[cfg(feature = "yaml")]
#[derive(Debug, Clone, Default)]
pub struct YamlCodec;

#[cfg(feature = "yaml")]
impl YamlCodec {
    /// Create a new YAML codec
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "yaml")]
impl SettingsCodec for YamlCodec {
    fn extension(&self) -> &str {
        "yaml"
    }

    fn encode(&self, entries: &Entries) -> Result<Vec<u8>> {
        serde_yaml::to_string(&sorted(entries))
            .map(String::into_bytes)
            .map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Entries> {
        let document: Value =
            serde_yaml::from_slice(bytes).map_err(|e| Error::Decode(e.to_string()))?;
        entries_from_document(document)
    }
}

// =============================================================================
// Tests
// =============================================================================
