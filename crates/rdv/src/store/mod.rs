//! Profile persistence
//!
//! Every provider keeps its profiles behind [`ProfileStore`], whatever the
//! bytes on disk look like:
//!
//! - [`SectionStore`] - INI sections split across a secrets file and a
//!   settings file (AWS shared credentials/config)
//! - [`DocumentStore`] - one YAML document mapping name to record
//! - [`ProfileFileStore`] - one YAML document per profile
//!
//! Nothing is cached: every call goes back to disk. Saves are
//! read-merge-write without locking, so two concurrent writers can lose an
//! update (last writer wins).

pub mod document;
pub mod per_profile;
pub mod sections;

use std::fs;
use std::path::{Path, PathBuf};

use rdv_core::{RdvError, Result};

pub use document::DocumentStore;
pub use per_profile::ProfileFileStore;
pub use sections::{SectionRecord, SectionStore};

/// CRUD over one provider's named profiles
pub trait ProfileStore {
    type Profile;

    /// Load a profile. Fails with `ProfileNotFound` when absent.
    fn load(&self, name: &str) -> Result<Self::Profile>;

    /// Create or fully replace a profile, keeping every other profile
    fn save(&self, name: &str, profile: &Self::Profile) -> Result<()>;

    /// Remove a profile. Removing an absent profile is not an error.
    fn delete(&self, name: &str) -> Result<()>;

    /// All profile names, sorted
    fn list(&self) -> Result<Vec<String>>;

    /// Where the profiles live, for messages
    fn location(&self, name: &str) -> PathBuf;
}

/// Profile names are case-sensitive and must be non-empty
pub fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(RdvError::usage("profile name cannot be empty"));
    }
    Ok(())
}

/// Read a file, treating a missing one as `None`
pub(crate) fn read_optional(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RdvError::read(path, e)),
    }
}

/// Write a file readable only by the owner, creating parent directories
pub(crate) fn write_private(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_private_dir(parent)?;
    }

    fs::write(path, content).map_err(|e| RdvError::write(path, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .map_err(|e| RdvError::write(path, e))?;
    }

    Ok(())
}

/// Create a directory (and parents) with owner-only permissions
pub(crate) fn create_private_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }

    fs::create_dir_all(dir).map_err(|e| RdvError::write(dir, e))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| RdvError::write(dir, e))?;
    }

    Ok(())
}

/// Remove a file, ignoring absence
pub(crate) fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RdvError::write(path, e)),
    }
}
