//! Single-node create operations, plus file removal.
//!
//! An entity is bound to a parent directory; every name handed to it is
//! reduced to its final component, so callers can never reach outside the
//! parent through separators or `..`.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};
use crate::path;

/// Directories inside a fixed parent.
#[derive(Debug, Clone)]
pub struct DirectoryEntity {
    parent: PathBuf,
}

impl DirectoryEntity {
    pub fn new(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: parent.into(),
        }
    }

    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// Returns the path `name` would occupy inside the parent.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidName` for `""`, `.`, `..` and names with
    /// no usable final component.
    pub fn path_for(&self, name: &str) -> CoreResult<PathBuf> {
        target_path(&self.parent, name)
    }

    /// Creates an empty directory named `name`. Non-recursive.
    ///
    /// # Errors
    ///
    /// - `CoreError::AlreadyExists` if anything (even a dangling symlink)
    ///   occupies the target.
    /// - `CoreError::InvalidName` for unusable names.
    /// - `CoreError::NotFound` / `PermissionDenied` / `Io` from the OS.
    pub fn create(&self, name: &str) -> CoreResult<PathBuf> {
        let target = self.path_for(name)?;
        ensure_vacant(&target)?;
        std::fs::create_dir(&target).map_err(|e| CoreError::from_io(e, &target))?;
        tracing::debug!("created directory {}", target.display());
        Ok(target)
    }
}

/// Regular files inside a fixed parent.
#[derive(Debug, Clone)]
pub struct FileEntity {
    parent: PathBuf,
}

impl FileEntity {
    pub fn new(parent: impl Into<PathBuf>) -> Self {
        Self {
            parent: parent.into(),
        }
    }

    pub fn parent(&self) -> &Path {
        &self.parent
    }

    /// Returns the path `name` would occupy inside the parent.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidName` for `""`, `.`, `..` and names with
    /// no usable final component.
    pub fn path_for(&self, name: &str) -> CoreResult<PathBuf> {
        target_path(&self.parent, name)
    }

    /// Creates a zero-length file named `name` with an exclusive create.
    ///
    /// # Errors
    ///
    /// - `CoreError::AlreadyExists` if anything occupies the target.
    /// - `CoreError::InvalidName` for unusable names.
    /// - `CoreError::NotFound` / `PermissionDenied` / `Io` from the OS.
    pub fn create(&self, name: &str) -> CoreResult<PathBuf> {
        let target = self.path_for(name)?;
        ensure_vacant(&target)?;
        OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .map_err(|e| CoreError::from_io(e, &target))?;
        tracing::debug!("created file {}", target.display());
        Ok(target)
    }

    /// Unlinks the file `name`.
    pub fn remove(&self, name: &str) -> CoreResult<()> {
        let target = self.path_for(name)?;
        std::fs::remove_file(&target).map_err(|e| CoreError::from_io(e, &target))
    }
}

fn target_path(parent: &Path, name: &str) -> CoreResult<PathBuf> {
    if name.contains('\0') {
        return Err(CoreError::InvalidName(name.replace('\0', "\\0")));
    }
    let base = path::basename(name).ok_or_else(|| CoreError::InvalidName(name.to_string()))?;
    Ok(parent.join(base))
}

fn ensure_vacant(target: &Path) -> CoreResult<()> {
    // symlink_metadata so a dangling symlink still counts as occupied
    if std::fs::symlink_metadata(target).is_ok() {
        return Err(CoreError::AlreadyExists(target.to_path_buf()));
    }
    Ok(())
}
