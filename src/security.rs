//! Owner-only permissions for persisted settings
//!
//! Unix: directories 0o700, files 0o600. Other platforms rely on their
//! default ACLs and these helpers only create directories.

use crate::error::{Error, Result};
use std::path::Path;

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode)).map_err(|e| {
        Error::FileWrite {
            path: path.to_path_buf(),
            source: e,
        }
    })
}

/// Restrict a settings file to its owner
///
/// # Errors
///
/// Returns `Error::FileWrite` if permissions cannot be changed.
#[cfg(unix)]
pub(crate) fn set_secure_file_permissions(path: &Path) -> Result<()> {
    set_mode(path, 0o600)
}

#[cfg(not(unix))]
pub(crate) fn set_secure_file_permissions(_path: &Path) -> Result<()> {
    Ok(())
}

/// Create a directory (and parents) restricted to its owner
///
/// # Errors
///
/// Returns `Error::DirectoryCreate` if the directory cannot be created, or
/// `Error::FileWrite` if its permissions cannot be changed.
pub(crate) fn ensure_secure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| Error::DirectoryCreate {
        path: path.to_path_buf(),
        source: e,
    })?;

    #[cfg(unix)]
    set_mode(path, 0o700)?;

    Ok(())
}
