//! Media type detection.
//!
//! Regular files are classified by their content, never by extension:
//! magic bytes first (`infer`), then a text/binary heuristic
//! (`content_inspector`) over the same head of the file. Other node kinds
//! are classified from their file type alone and are never opened.

use std::fs::{File, FileType};
use std::io::Read;
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

/// Media type reported for directories.
pub const DIRECTORY: &str = "inode/directory";
/// Media type reported for symbolic links.
pub const SYMLINK: &str = "inode/symlink";
/// Media type reported for named pipes.
pub const FIFO: &str = "inode/fifo";
/// Media type reported for unix domain sockets.
pub const SOCKET: &str = "inode/socket";
pub const CHAR_DEVICE: &str = "inode/chardevice";
pub const BLOCK_DEVICE: &str = "inode/blockdevice";
/// Media type reported for zero-length files.
pub const EMPTY: &str = "inode/x-empty";
/// Media type reported for readable text without a more specific signature.
pub const TEXT: &str = "text/plain";
/// Fallback when nothing better is known or the probe fails.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Number of leading bytes inspected.
const SNIFF_LEN: u64 = 8192;

/// Detects the media type of the regular file at `path`.
///
/// Never fails: an unreadable file yields [`OCTET_STREAM`].
pub fn sniff_file(path: &Path) -> String {
    match probe(path) {
        Ok(mime) => mime,
        Err(e) => {
            tracing::debug!("media type probe failed for {}: {e}", path.display());
            OCTET_STREAM.to_string()
        }
    }
}

/// Fixed media type of a node that is neither a regular file nor a
/// directory. Opening a FIFO or device would block or have side effects.
pub fn special_file(file_type: &FileType) -> &'static str {
    if file_type.is_fifo() {
        FIFO
    } else if file_type.is_socket() {
        SOCKET
    } else if file_type.is_char_device() {
        CHAR_DEVICE
    } else if file_type.is_block_device() {
        BLOCK_DEVICE
    } else {
        OCTET_STREAM
    }
}

/// Detects the media type of an in-memory file head.
pub fn sniff_bytes(head: &[u8]) -> String {
    if head.is_empty() {
        return EMPTY.to_string();
    }
    if let Some(kind) = infer::get(head) {
        return kind.mime_type().to_string();
    }
    if content_inspector::inspect(head).is_text() {
        TEXT.to_string()
    } else {
        OCTET_STREAM.to_string()
    }
}

fn probe(path: &Path) -> std::io::Result<String> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_LEN as usize);
    file.take(SNIFF_LEN).read_to_end(&mut head)?;
    Ok(sniff_bytes(&head))
}

/// Coarse category tag derived from a media type (`text/plain` → `text-plain`).
pub fn category(media_type: &str) -> String {
    media_type.replace('/', "-")
}
