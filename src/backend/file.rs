//! File persistence backend
//!
//! Stores the blob at `<dir>/<store_name>.<extension>`.

use super::PersistenceBackend;
use crate::error::{Error, Result};
use log::debug;
use std::path::{Path, PathBuf};

/// File-based persistence backend
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
    name: String,
    extension: String,
}

impl FileBackend {
    /// Create a file backend for `<dir>/<name>.<extension>`
    ///
    /// Supports `~` expansion for the home directory.
    pub fn new(
        dir: impl Into<PathBuf>,
        name: impl Into<String>,
        extension: impl Into<String>,
    ) -> Self {
        Self {
            dir: expand_home(dir.into()),
            name: name.into(),
            extension: extension.into(),
        }
    }

    /// Create a file backend in the platform config directory for `app_name`
    ///
    /// (e.g. `~/.config/<app_name>/<name>.json` on Linux)
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the platform has no config directory.
    pub fn for_app(
        app_name: &str,
        name: impl Into<String>,
        extension: impl Into<String>,
    ) -> Result<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| Error::Config("No platform config directory available".into()))?;
        Ok(Self::new(base.join(app_name), name, extension))
    }

    /// Full path of the settings file
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.{}", self.name, self.extension))
    }

    /// Directory holding the settings file
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn expand_home(path: PathBuf) -> PathBuf {
    if !path.starts_with("~") {
        return path;
    }
    match dirs::home_dir() {
        Some(home) => home.join(path.strip_prefix("~").unwrap_or(&path)),
        None => path,
    }
}

impl PersistenceBackend for FileBackend {
    fn store_name(&self) -> &str {
        &self.name
    }

    fn read_blob(&self) -> Result<Option<Vec<u8>>> {
        let path = self.path();
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::FileRead { path, source: e }),
        }
    }

    /// Atomic write: temp file + rename, so a failed write never truncates
    /// the previous blob.
    fn write_blob(&self, bytes: &[u8]) -> Result<()> {
        if !self.dir.exists() {
            crate::security::ensure_secure_dir(&self.dir)?;
        }

        let path = self.path();
        let mut temp_filename = path
            .file_name()
            .ok_or_else(|| {
                Error::Config(format!(
                    "Invalid path '{}': must have a filename",
                    path.display()
                ))
            })?
            .to_os_string();
        temp_filename.push(".tmp");
        let temp_path = path.with_file_name(temp_filename);

        std::fs::write(&temp_path, bytes).map_err(|e| Error::FileWrite {
            path: temp_path.clone(),
            source: e,
        })?;
        crate::security::set_secure_file_permissions(&temp_path)?;

        std::fs::rename(&temp_path, &path).map_err(|e| Error::FileWrite {
            path: path.clone(),
            source: e,
        })?;

        debug!("Wrote {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_path_layout() {
        let backend = FileBackend::new("/tmp/game", "MobileSettings", "json");
        assert_eq!(
            backend.path(),
            PathBuf::from("/tmp/game/MobileSettings.json")
        );
        assert_eq!(backend.store_name(), "MobileSettings");
    }

    #[test]
    fn test_read_missing_file_is_absent() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path(), "settings", "json");
        assert_eq!(backend.read_blob().unwrap(), None);
    }

    #[test]
    fn test_write_creates_dir_and_roundtrips() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested/dir"), "settings", "json");

        backend.write_blob(br#"{"a":1}"#).unwrap();
        assert_eq!(backend.read_blob().unwrap(), Some(br#"{"a":1}"#.to_vec()));

        backend.write_blob(b"{}").unwrap();
        assert_eq!(backend.read_blob().unwrap(), Some(b"{}".to_vec()));
        assert!(!backend.path().with_file_name("settings.json.tmp").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_written_file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path(), "settings", "json");
        backend.write_blob(b"{}").unwrap();

        let mode = std::fs::metadata(backend.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_read_directory_in_place_of_file_fails() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::new(dir.path(), "settings", "json");
        std::fs::create_dir_all(backend.path()).unwrap();

        assert!(matches!(backend.read_blob(), Err(Error::FileRead { .. })));
    }
}
