//! Error types for `sfm-core`.
//!
//! Filesystem-facing operations return [`CoreResult<T>`], an alias for
//! `Result<T, CoreError>`. The dispatcher turns these into the `error`
//! field of an operation response; they never cross the protocol boundary
//! as exceptions.

use std::path::{Path, PathBuf};

/// Unified error type for all filesystem operations.
///
/// Each variant carries the path (or name) the operation was attempting so
/// the message shown to the client identifies what failed.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The target path does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// The process lacks permission to access the path.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// A directory was expected but the path points to something else.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// A create operation found an existing node at the target path.
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    /// A file or directory name is invalid (empty, `.`, `..`, contains NUL).
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Classifies an I/O error raised while operating on `path`.
    pub fn from_io(err: std::io::Error, path: &Path) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => CoreError::PermissionDenied(path.to_path_buf()),
            std::io::ErrorKind::AlreadyExists => CoreError::AlreadyExists(path.to_path_buf()),
            _ => CoreError::Io(err),
        }
    }
}

/// Convenience alias used throughout `sfm-core`.
pub type CoreResult<T> = Result<T, CoreError>;
