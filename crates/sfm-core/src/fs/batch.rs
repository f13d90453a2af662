//! Best-effort batch mutations over lists of paths.
//!
//! Every operation attempts each path independently. A failure is logged
//! and skipped; it never aborts the rest of the batch. The return value is
//! the number of paths that succeeded, with no per-path detail.

use std::os::unix::fs::{MetadataExt, PermissionsExt};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, CoreResult};

/// Maximum recursion depth for tree walks, guarding against symlink loops
/// and pathological nesting.
const MAX_DEPTH: usize = 64;

/// Moves each path into `destination`, keeping its file name.
pub fn move_files(files: &[PathBuf], destination: &Path) -> usize {
    apply_each(files, "move", |src| {
        let dest = target_in(destination, src)?;
        move_path(src, &dest)
    })
}

/// Copies each path into `destination`, keeping its file name.
///
/// Directories are copied recursively; symlinks are copied as symlinks.
pub fn copy_files(files: &[PathBuf], destination: &Path) -> usize {
    apply_each(files, "copy", |src| {
        let dest = target_in(destination, src)?;
        copy_path(src, &dest)
    })
}

/// Removes each path; directories are removed with their contents.
pub fn remove_files(files: &[PathBuf]) -> usize {
    apply_each(files, "remove", |path| remove_path(path))
}

/// Sets the permission bits of each path to `mode`.
///
/// For a directory with `recursive` set, every entry below it is changed
/// and counted, but the directory itself is left alone. Otherwise only the
/// path itself is changed.
pub fn chmod_files(files: &[PathBuf], mode: u32, recursive: bool) -> usize {
    let mut changed = 0;
    for path in files {
        let is_dir = std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false);
        if is_dir && recursive {
            changed += chmod_tree(path, mode, 0);
        } else {
            match set_mode(path, mode) {
                Ok(()) => changed += 1,
                Err(e) => tracing::debug!("chmod skipped {}: {e}", path.display()),
            }
        }
    }
    changed
}

fn apply_each<F>(files: &[PathBuf], operation: &str, mut op: F) -> usize
where
    F: FnMut(&Path) -> CoreResult<()>,
{
    files
        .iter()
        .filter(|path| match op(path) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("{operation} skipped {}: {e}", path.display());
                false
            }
        })
        .count()
}

fn target_in(destination: &Path, src: &Path) -> CoreResult<PathBuf> {
    let name = src
        .file_name()
        .ok_or_else(|| CoreError::InvalidName(src.display().to_string()))?;
    Ok(destination.join(name))
}

/// Moves a file or directory to `dest`.
///
/// Uses `rename`; only when source and destination live on different
/// devices does it fall back to copy + delete.
pub fn move_path(src: &Path, dest: &Path) -> CoreResult<()> {
    let meta = std::fs::symlink_metadata(src).map_err(|e| CoreError::from_io(e, src))?;

    match std::fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(e) => {
            let dest_dir = dest.parent().unwrap_or(dest);
            let crosses_device = std::fs::metadata(dest_dir)
                .map(|d| d.dev() != meta.dev())
                .unwrap_or(false);
            if !crosses_device {
                return Err(CoreError::from_io(e, src));
            }
            copy_path(src, dest)?;
            remove_path(src)
        }
    }
}

/// Copies a file or directory (recursively) to `dest`.
///
/// Refuses to copy a node onto itself or a directory into its own subtree.
pub fn copy_path(src: &Path, dest: &Path) -> CoreResult<()> {
    let meta = std::fs::symlink_metadata(src).map_err(|e| CoreError::from_io(e, src))?;
    ensure_distinct(src, &meta, dest)?;

    if meta.is_dir() {
        let src_real = std::fs::canonicalize(src)?;
        let dest_parent = dest.parent().unwrap_or(dest);
        let dest_real = std::fs::canonicalize(dest_parent)?;
        if dest_real.starts_with(&src_real) {
            return Err(invalid_input(format!(
                "cannot copy {} into itself",
                src.display()
            )));
        }
        copy_dir_recursive(src, dest, 0)
    } else if meta.file_type().is_symlink() {
        let link_target = std::fs::read_link(src)?;
        std::os::unix::fs::symlink(&link_target, dest)?;
        Ok(())
    } else {
        std::fs::copy(src, dest).map_err(|e| CoreError::from_io(e, dest))?;
        Ok(())
    }
}

fn copy_dir_recursive(src: &Path, dest: &Path, depth: usize) -> CoreResult<()> {
    if depth > MAX_DEPTH {
        return Err(invalid_input(format!(
            "maximum recursion depth ({MAX_DEPTH}) exceeded during copy"
        )));
    }

    std::fs::create_dir_all(dest)?;

    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let entry_path = entry.path();
        let target = dest.join(entry.file_name());

        // file_type() does not follow symlinks
        let ft = entry.file_type()?;

        if ft.is_symlink() {
            let link_target = std::fs::read_link(&entry_path)?;
            std::os::unix::fs::symlink(&link_target, &target)?;
        } else {
            ensure_distinct(&entry_path, &entry.metadata()?, &target)?;
            if ft.is_dir() {
                copy_dir_recursive(&entry_path, &target, depth + 1)?;
            } else {
                std::fs::copy(&entry_path, &target)?;
            }
        }
    }

    Ok(())
}

/// Fails if `dest` is `src`, either directly or through a symlink.
/// Copying through such a link would truncate the source.
fn ensure_distinct(src: &Path, src_meta: &std::fs::Metadata, dest: &Path) -> CoreResult<()> {
    let same = |m: std::fs::Metadata| m.dev() == src_meta.dev() && m.ino() == src_meta.ino();
    let lstat_same = std::fs::symlink_metadata(dest).map(same).unwrap_or(false);
    let stat_same = std::fs::metadata(dest).map(same).unwrap_or(false);
    if lstat_same || stat_same {
        return Err(invalid_input(format!(
            "{} and {} are the same file",
            src.display(),
            dest.display()
        )));
    }
    Ok(())
}

/// Deletes a file, symlink or directory (recursively).
///
/// Symlinks are unlinked, never followed.
pub fn remove_path(path: &Path) -> CoreResult<()> {
    let meta = std::fs::symlink_metadata(path).map_err(|e| CoreError::from_io(e, path))?;

    if meta.is_dir() {
        std::fs::remove_dir_all(path).map_err(|e| CoreError::from_io(e, path))?;
    } else {
        std::fs::remove_file(path).map_err(|e| CoreError::from_io(e, path))?;
    }

    Ok(())
}

fn chmod_tree(dir: &Path, mode: u32, depth: usize) -> usize {
    if depth > MAX_DEPTH {
        tracing::warn!("chmod stopped at depth {depth} under {}", dir.display());
        return 0;
    }

    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) => {
            tracing::debug!("chmod cannot read {}: {e}", dir.display());
            return 0;
        }
    };

    let mut changed = 0;
    let mut subdirs = Vec::new();

    for entry in read_dir.flatten() {
        let path = entry.path();
        match set_mode(&path, mode) {
            Ok(()) => changed += 1,
            Err(e) => tracing::debug!("chmod skipped {}: {e}", path.display()),
        }
        if entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false) {
            subdirs.push(path);
        }
    }

    for sub in subdirs {
        changed += chmod_tree(&sub, mode, depth + 1);
    }

    changed
}

fn set_mode(path: &Path, mode: u32) -> CoreResult<()> {
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))
        .map_err(|e| CoreError::from_io(e, path))
}

fn invalid_input(message: String) -> CoreError {
    CoreError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, message))
}
