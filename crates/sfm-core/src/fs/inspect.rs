//! Filesystem inspector: per-node descriptors and directory listings.

use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::{CoreError, CoreResult};
use crate::fs::sniff;
use crate::path::normalize;

/// A snapshot of one filesystem node, as shown in a listing.
///
/// Descriptors are recomputed on every listing and never cached. The
/// serialized keys are the wire format of the `list_dir` response; the
/// `real_*` keys appear only for symbolic links to non-directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDescriptor {
    name: String,
    #[serde(rename = "path")]
    parent_path: String,
    #[serde(rename = "mime")]
    media_type: String,
    #[serde(rename = "type")]
    entry_type: String,
    #[serde(rename = "size")]
    size_bytes: u64,
    mode: String,
    owner_id: u32,
    owner_name: String,
    group_id: u32,
    group_name: String,
    #[serde(flatten)]
    link: Option<LinkTarget>,
}

/// Where a symbolic link points, and what is there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkTarget {
    real_path: String,
    real_mime: String,
    real_type: String,
}

impl FileDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory containing this node.
    pub fn parent_path(&self) -> &str {
        &self.parent_path
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// Media type with `/` replaced by `-`, used as an icon/category tag.
    pub fn entry_type(&self) -> &str {
        &self.entry_type
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Low nine permission bits in octal, without prefix (`"644"`).
    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn owner_id(&self) -> u32 {
        self.owner_id
    }

    pub fn owner_name(&self) -> &str {
        &self.owner_name
    }

    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    pub fn group_name(&self) -> &str {
        &self.group_name
    }

    /// Link target details; `Some` exactly when this node is a symlink
    /// that does not resolve to a directory.
    pub fn link(&self) -> Option<&LinkTarget> {
        self.link.as_ref()
    }
}

impl LinkTarget {
    pub fn real_path(&self) -> &str {
        &self.real_path
    }

    pub fn real_media_type(&self) -> &str {
        &self.real_mime
    }

    pub fn real_entry_type(&self) -> &str {
        &self.real_type
    }
}

/// Describes the node `name` inside `parent`.
///
/// Ownership, size and mode follow symlinks; a dangling symlink reports
/// the link itself. Anything that resolves to a directory, symlink or not,
/// is [`sniff::DIRECTORY`]. Any other symlink is [`sniff::SYMLINK`], with
/// the resolved target described in [`FileDescriptor::link`].
///
/// # Errors
///
/// - [`CoreError::NotFound`] if the node vanished before it could be stat'ed.
/// - [`CoreError::PermissionDenied`] / [`CoreError::Io`] for other stat failures.
pub fn describe(parent: &Path, name: impl AsRef<Path>) -> CoreResult<FileDescriptor> {
    let name = name.as_ref();
    let target = parent.join(name);

    let link_meta =
        std::fs::symlink_metadata(&target).map_err(|e| CoreError::from_io(e, &target))?;
    let is_symlink = link_meta.file_type().is_symlink();
    let meta = if is_symlink {
        std::fs::metadata(&target).unwrap_or(link_meta)
    } else {
        link_meta
    };

    let (media_type, link) = if meta.is_dir() {
        (sniff::DIRECTORY.to_string(), None)
    } else if is_symlink {
        (sniff::SYMLINK.to_string(), Some(resolve_link(&target)))
    } else {
        (media_type_of(&target, &meta), None)
    };

    Ok(FileDescriptor {
        name: name.to_string_lossy().nfc().collect(),
        parent_path: parent.to_string_lossy().into_owned(),
        entry_type: sniff::category(&media_type),
        media_type,
        size_bytes: meta.len(),
        mode: format!("{:o}", meta.mode() & 0o777),
        owner_id: meta.uid(),
        owner_name: owner_name(meta.uid()),
        group_id: meta.gid(),
        group_name: group_name(meta.gid()),
        link,
    })
}

/// Lists the immediate children of `dir` in enumeration order.
///
/// Children that disappear (or otherwise cannot be described) between
/// enumeration and stat are dropped from the result with a warning.
///
/// # Errors
///
/// - [`CoreError::NotFound`]: `dir` does not exist.
/// - [`CoreError::NotADirectory`]: `dir` is not a directory.
/// - [`CoreError::PermissionDenied`]: read access is denied.
/// - [`CoreError::Io`]: any other I/O error.
pub fn list(dir: &Path) -> CoreResult<Vec<FileDescriptor>> {
    let meta = std::fs::metadata(dir).map_err(|e| CoreError::from_io(e, dir))?;
    if !meta.is_dir() {
        return Err(CoreError::NotADirectory(dir.to_path_buf()));
    }

    let read_dir = std::fs::read_dir(dir).map_err(|e| CoreError::from_io(e, dir))?;

    let mut descriptors = Vec::new();
    for dir_entry in read_dir {
        let dir_entry = match dir_entry {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!("skipping unreadable entry in {}: {e}", dir.display());
                continue;
            }
        };
        match describe(dir, dir_entry.file_name()) {
            Ok(descriptor) => descriptors.push(descriptor),
            Err(e) => tracing::warn!("skipping entry in {}: {e}", dir.display()),
        }
    }

    Ok(descriptors)
}

/// Only regular files are opened for content sniffing.
fn media_type_of(path: &Path, meta: &std::fs::Metadata) -> String {
    if meta.is_dir() {
        sniff::DIRECTORY.to_string()
    } else if meta.is_file() {
        sniff::sniff_file(path)
    } else {
        sniff::special_file(&meta.file_type()).to_string()
    }
}

fn resolve_link(link: &Path) -> LinkTarget {
    let real = std::fs::canonicalize(link).unwrap_or_else(|_| dangling_target(link));
    let real_mime = match std::fs::metadata(&real) {
        Ok(meta) => media_type_of(&real, &meta),
        Err(_) => sniff::OCTET_STREAM.to_string(),
    };

    LinkTarget {
        real_path: real.to_string_lossy().into_owned(),
        real_type: sniff::category(&real_mime),
        real_mime,
    }
}

/// Best-effort target of a link that cannot be canonicalized.
fn dangling_target(link: &Path) -> PathBuf {
    match std::fs::read_link(link) {
        Ok(target) => {
            let base = link.parent().unwrap_or_else(|| Path::new("/"));
            normalize(&base.join(target))
        }
        Err(_) => link.to_path_buf(),
    }
}

fn owner_name(uid: u32) -> String {
    uzers::get_user_by_uid(uid)
        .map(|u| u.name().to_string_lossy().into_owned())
        .unwrap_or_else(|| uid.to_string())
}

fn group_name(gid: u32) -> String {
    uzers::get_group_by_gid(gid)
        .map(|g| g.name().to_string_lossy().into_owned())
        .unwrap_or_else(|| gid.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn describe_regular_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("hello.txt");
        fs::write(&path, "hello").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        let d = describe(tmp.path(), "hello.txt").unwrap();

        assert_eq!(d.name(), "hello.txt");
        assert_eq!(d.parent_path(), tmp.path().to_string_lossy());
        assert_eq!(d.media_type(), "text/plain");
        assert_eq!(d.entry_type(), "text-plain");
        assert_eq!(d.size_bytes(), 5);
        assert_eq!(d.mode(), "640");
        assert!(d.link().is_none());
    }

    #[test]
    fn describe_directory_uses_sentinel() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let d = describe(tmp.path(), "sub").unwrap();

        assert_eq!(d.media_type(), sniff::DIRECTORY);
        assert_eq!(d.entry_type(), "inode-directory");
    }

    #[test]
    fn describe_reports_owner_of_current_process() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("mine"), "x").unwrap();
        let expected_uid = fs::metadata(tmp.path().join("mine")).unwrap().uid();

        let d = describe(tmp.path(), "mine").unwrap();

        assert_eq!(d.owner_id(), expected_uid);
        assert!(!d.owner_name().is_empty());
        assert!(!d.group_name().is_empty());
    }

    #[test]
    fn describe_symlink_reports_real_target() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("real.txt");
        fs::write(&target, "data").unwrap();
        std::os::unix::fs::symlink(&target, tmp.path().join("link")).unwrap();

        let d = describe(tmp.path(), "link").unwrap();

        assert_eq!(d.media_type(), sniff::SYMLINK);
        assert_eq!(d.entry_type(), "inode-symlink");
        let link = d.link().expect("symlink must carry its target");
        assert_eq!(
            link.real_path(),
            fs::canonicalize(&target).unwrap().to_string_lossy()
        );
        assert_eq!(link.real_media_type(), "text/plain");
        assert_eq!(link.real_entry_type(), "text-plain");
    }

    #[test]
    fn describe_symlink_to_directory() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("dir")).unwrap();
        std::os::unix::fs::symlink(tmp.path().join("dir"), tmp.path().join("dirlink")).unwrap();

        let d = describe(tmp.path(), "dirlink").unwrap();

        assert_eq!(d.media_type(), sniff::DIRECTORY);
        assert_eq!(d.entry_type(), "inode-directory");
        assert!(d.link().is_none());

        let value = serde_json::to_value(&d).unwrap();
        assert!(value.get("real_path").is_none());
    }

    #[test]
    fn list_classifies_fifo_without_opening_it() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("plain.txt"), "text").unwrap();
        let status = std::process::Command::new("mkfifo")
            .arg(tmp.path().join("pipe"))
            .status()
            .unwrap();
        assert!(status.success());

        let entries = list(tmp.path()).unwrap();

        let pipe = entries.iter().find(|d| d.name() == "pipe").unwrap();
        assert_eq!(pipe.media_type(), sniff::FIFO);
        assert_eq!(pipe.entry_type(), "inode-fifo");
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn describe_socket_and_link_to_fifo() {
        let tmp = TempDir::new().unwrap();
        let _listener =
            std::os::unix::net::UnixListener::bind(tmp.path().join("sock")).unwrap();
        std::process::Command::new("mkfifo")
            .arg(tmp.path().join("pipe"))
            .status()
            .unwrap();
        std::os::unix::fs::symlink(tmp.path().join("pipe"), tmp.path().join("to_pipe")).unwrap();

        assert_eq!(describe(tmp.path(), "sock").unwrap().media_type(), sniff::SOCKET);

        let link = describe(tmp.path(), "to_pipe").unwrap();
        assert_eq!(link.media_type(), sniff::SYMLINK);
        assert_eq!(link.link().unwrap().real_media_type(), sniff::FIFO);
    }

    #[test]
    fn describe_dangling_symlink() {
        let tmp = TempDir::new().unwrap();
        std::os::unix::fs::symlink("gone.txt", tmp.path().join("broken")).unwrap();

        let d = describe(tmp.path(), "broken").unwrap();

        let link = d.link().unwrap();
        assert_eq!(
            link.real_path(),
            tmp.path().join("gone.txt").to_string_lossy()
        );
        assert_eq!(link.real_media_type(), sniff::OCTET_STREAM);
    }

    #[test]
    fn describe_vanished_node_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = describe(tmp.path(), "never-existed").unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn serialized_regular_file_has_no_real_keys() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("plain"), "abc").unwrap();

        let value = serde_json::to_value(describe(tmp.path(), "plain").unwrap()).unwrap();
        let obj = value.as_object().unwrap();

        for key in [
            "name", "path", "mime", "type", "size", "mode", "owner_id", "owner_name",
            "group_id", "group_name",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert!(!obj.contains_key("real_path"));
        assert!(!obj.contains_key("real_mime"));
        assert!(!obj.contains_key("real_type"));
    }

    #[test]
    fn serialized_symlink_has_all_real_keys() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("t"), "abc").unwrap();
        std::os::unix::fs::symlink(tmp.path().join("t"), tmp.path().join("l")).unwrap();

        let value = serde_json::to_value(describe(tmp.path(), "l").unwrap()).unwrap();
        let obj = value.as_object().unwrap();

        assert!(obj.contains_key("real_path"));
        assert!(obj.contains_key("real_mime"));
        assert!(obj.contains_key("real_type"));
    }

    #[test]
    fn list_empty_directory() {
        let tmp = TempDir::new().unwrap();
        assert!(list(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn list_returns_immediate_children_only() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("top.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub").join("nested.txt"), "").unwrap();

        let entries = list(tmp.path()).unwrap();

        let mut names: Vec<&str> = entries.iter().map(|d| d.name()).collect();
        names.sort();
        assert_eq!(names, vec!["sub", "top.txt"]);
    }

    #[test]
    fn list_nonexistent_is_not_found() {
        let err = list(Path::new("/nonexistent/path/that/does/not/exist")).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[test]
    fn list_on_file_is_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, "").unwrap();

        assert!(matches!(list(&file).unwrap_err(), CoreError::NotADirectory(_)));
    }

    #[test]
    fn list_unicode_names() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("한글.txt"), "").unwrap();
        fs::create_dir(tmp.path().join("émojis_🎉")).unwrap();

        let entries = list(tmp.path()).unwrap();

        let names: Vec<&str> = entries.iter().map(|d| d.name()).collect();
        assert!(names.contains(&"한글.txt"));
        assert!(names.contains(&"émojis_🎉"));
    }
}
