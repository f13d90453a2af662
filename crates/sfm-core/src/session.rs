//! Per-workspace session state: the current directory and the clipboard.
//!
//! A [`SessionState`] is plain data. Whoever owns it (the web server keeps
//! one behind a mutex per workspace) passes it by `&mut` into the
//! dispatcher for every command.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::path;

/// What the next paste or remove will do with the clipboard files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardAction {
    /// Nothing pending.
    #[default]
    #[serde(rename = "")]
    None,
    Cut,
    Copy,
    Remove,
}

impl ClipboardAction {
    /// Wire name: `""`, `"cut"`, `"copy"` or `"remove"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "",
            Self::Cut => "cut",
            Self::Copy => "copy",
            Self::Remove => "remove",
        }
    }

    /// Parses a wire name; `None` for anything unrecognized.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "" => Some(Self::None),
            "cut" => Some(Self::Cut),
            "copy" => Some(Self::Copy),
            "remove" => Some(Self::Remove),
            _ => None,
        }
    }
}

impl fmt::Display for ClipboardAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files captured by `update_buffer`, as absolute normalized paths.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Clipboard {
    action: ClipboardAction,
    files: Vec<PathBuf>,
}

impl Clipboard {
    pub fn action(&self) -> ClipboardAction {
        self.action
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn is_empty(&self) -> bool {
        self.action == ClipboardAction::None && self.files.is_empty()
    }
}

/// The shared cursor and clipboard of one workspace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    current_directory: PathBuf,
    clipboard: Clipboard,
}

impl SessionState {
    /// Starts at `home` (normalized) with an empty clipboard.
    pub fn new(home: impl AsRef<Path>) -> Self {
        Self {
            current_directory: path::normalize(home.as_ref()),
            clipboard: Clipboard::default(),
        }
    }

    pub fn current_directory(&self) -> &Path {
        &self.current_directory
    }

    /// Moves the cursor to `base/name`, returning the new directory.
    ///
    /// An empty `base` means the current directory; a relative `base` is
    /// taken relative to it. The target is not checked for existence; the
    /// next listing reports a missing directory.
    pub fn chdir(&mut self, base: &str, name: &str) -> &Path {
        let base = if base.is_empty() {
            self.current_directory.clone()
        } else {
            self.current_directory.join(base)
        };
        self.current_directory = path::resolve(&base, name);
        &self.current_directory
    }

    /// Re-normalizes the current directory in place.
    pub fn normalize_current(&mut self) -> &Path {
        self.current_directory = path::normalize(&self.current_directory);
        &self.current_directory
    }

    /// Resolves `name` against the current directory.
    pub fn resolve(&self, name: &str) -> PathBuf {
        path::resolve(&self.current_directory, name)
    }

    /// Replaces the clipboard wholesale with `names` resolved against the
    /// current directory. Returns the number of files captured.
    pub fn set_clipboard<S: AsRef<str>>(&mut self, action: ClipboardAction, names: &[S]) -> usize {
        let files: Vec<PathBuf> = names.iter().map(|n| self.resolve(n.as_ref())).collect();
        let count = files.len();
        self.clipboard = Clipboard { action, files };
        count
    }

    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Empties the clipboard, returning what it held.
    pub fn take_clipboard(&mut self) -> Clipboard {
        std::mem::take(&mut self.clipboard)
    }
}
