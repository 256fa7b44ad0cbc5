//! Error types for prefcache

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for prefcache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for prefcache
#[derive(Error, Debug)]
pub enum Error {
    // -------------------------------------------------------------------------
    // Caller Errors
    // -------------------------------------------------------------------------
    #[error("Invalid setting key: {0}")]
    InvalidKey(String),

    #[error("Invalid setting value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Type mismatch for {key}: expected {expected}, got {actual}")]
    TypeMismatch {
        key: String,
        expected: String,
        actual: String,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to decode settings blob: {0}")]
    Decode(String),

    #[error("Failed to encode settings blob: {0}")]
    Encode(String),

    // -------------------------------------------------------------------------
    // Persistence Errors
    // -------------------------------------------------------------------------
    #[error("Failed to read file '{path}': {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write settings store '{store}': {reason}")]
    BackendWrite { store: String, reason: String },

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to spawn flusher thread: {0}")]
    FlusherSpawn(#[source] std::io::Error),
}

impl Error {
    /// Check if this error came from the persistence layer (backend or codec)
    ///
    /// These are absorbed by the cache and turned into a retry on the next flush.
    #[must_use]
    pub fn is_persistence_error(&self) -> bool {
        matches!(
            self,
            Error::Decode(_)
                | Error::Encode(_)
                | Error::FileRead { .. }
                | Error::FileWrite { .. }
                | Error::DirectoryCreate { .. }
                | Error::BackendWrite { .. }
        )
    }

    /// Check if this is a type mismatch on read
    #[must_use]
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Error::TypeMismatch { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let mismatch = Error::TypeMismatch {
            key: "volume".into(),
            expected: "bool".into(),
            actual: "float".into(),
        };
        assert!(mismatch.is_type_mismatch());
        assert!(!mismatch.is_persistence_error());

        let write = Error::BackendWrite {
            store: "settings".into(),
            reason: "disk full".into(),
        };
        assert!(write.is_persistence_error());
        assert!(Error::Decode("bad".into()).is_persistence_error());
        assert!(!Error::InvalidKey(String::new()).is_persistence_error());
    }

    #[test]
    fn test_type_mismatch_message() {
        let err = Error::TypeMismatch {
            key: "volume".into(),
            expected: "bool".into(),
            actual: "float".into(),
        };
        assert_eq!(
            err.to_string(),
            "Type mismatch for volume: expected bool, got float"
        );
    }
}
