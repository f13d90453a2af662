//! Lexical path helpers.
//!
//! Paths stored in session state are always normalized lexically, the way
//! POSIX `normpath` does it: no `.` segments, no redundant separators, and
//! `..` collapsed against the preceding segment. The filesystem is never
//! consulted, so a normalized path may point at nothing.

use std::path::{Component, Path, PathBuf};

/// Normalizes `path` without touching the filesystem.
///
/// `..` directly under the root stays at the root. A relative path keeps
/// leading `..` segments it cannot collapse. An empty result becomes `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }

    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().collect()
}

/// Joins `name` onto `base` and normalizes the result.
///
/// An absolute `name` replaces `base` entirely, matching `Path::join`.
pub fn resolve(base: &Path, name: &str) -> PathBuf {
    normalize(&base.join(name))
}

/// Returns the final component of `name`, or `None` for names that have no
/// usable final component (`""`, `.`, `..`, `/`).
pub fn basename(name: &str) -> Option<&str> {
    match Path::new(name).components().next_back()? {
        Component::Normal(part) => part.to_str(),
        _ => None,
    }
}
