//! Typed commands decoded from inbound JSON objects.
//!
//! Commands flow **client → core**. Each variant carries exactly the fields
//! its action needs, already checked for type.

use serde_json::{Map, Value};

use crate::action::Action;
use crate::protocol::ProtocolError;
use crate::session::ClipboardAction;

/// Highest permission value `update_perms` accepts (`0o7777`).
pub const MAX_MODE: u32 = 0o7777;

/// An operation requested over the command channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Change directory to `path/name` (`path` empty = current directory).
    Chdir { path: String, name: String },
    /// List the current directory.
    ListDir,
    /// Report the current directory.
    Pwd,
    /// Create an empty directory in the current directory.
    CreateDir { name: String },
    /// Create an empty file in the current directory.
    CreateFile { name: String },
    /// Set permission bits on the listed files.
    UpdatePerms {
        files: Vec<String>,
        mode: u32,
        recursive: bool,
    },
    /// Replace the clipboard.
    UpdateBuffer {
        files: Vec<String>,
        action: ClipboardAction,
    },
    /// Paste the clipboard into the current directory.
    PasteFiles,
    /// Delete the files held by a `remove` clipboard.
    RemoveFiles,
}

impl Command {
    /// Decodes the fields of a command object for a known `action`.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::NotEnoughData` if a required field is missing,
    ///   `null`, or of the wrong JSON type.
    /// - `ProtocolError::InvalidBufferAction` for an unrecognized clipboard
    ///   action.
    /// - `ProtocolError::InvalidMode` for a mode outside `0..=0o7777`.
    pub fn decode(action: Action, fields: &Map<String, Value>) -> Result<Self, ProtocolError> {
        let command = match action {
            Action::Chdir => Self::Chdir {
                path: string_field(fields, "path")?,
                name: string_field(fields, "name")?,
            },
            Action::ListDir => Self::ListDir,
            Action::Pwd => Self::Pwd,
            Action::CreateDir => Self::CreateDir {
                name: string_field(fields, "name")?,
            },
            Action::CreateFile => Self::CreateFile {
                name: string_field(fields, "name")?,
            },
            Action::UpdatePerms => Self::UpdatePerms {
                files: files_field(fields)?,
                mode: mode_field(fields)?,
                recursive: bool_field(fields, "recursive")?,
            },
            Action::UpdateBuffer => {
                let files = files_field(fields)?;
                let raw = string_field(fields, "action")?;
                let action = ClipboardAction::parse(&raw)
                    .ok_or(ProtocolError::InvalidBufferAction(raw))?;
                Self::UpdateBuffer { files, action }
            }
            Action::PasteFiles => Self::PasteFiles,
            Action::RemoveFiles => Self::RemoveFiles,
        };
        Ok(command)
    }

    /// The action this command performs.
    pub fn action(&self) -> Action {
        match self {
            Self::Chdir { .. } => Action::Chdir,
            Self::ListDir => Action::ListDir,
            Self::Pwd => Action::Pwd,
            Self::CreateDir { .. } => Action::CreateDir,
            Self::CreateFile { .. } => Action::CreateFile,
            Self::UpdatePerms { .. } => Action::UpdatePerms,
            Self::UpdateBuffer { .. } => Action::UpdateBuffer,
            Self::PasteFiles => Action::PasteFiles,
            Self::RemoveFiles => Action::RemoveFiles,
        }
    }
}

fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Result<&'a Value, ProtocolError> {
    match fields.get(key) {
        None | Some(Value::Null) => Err(ProtocolError::NotEnoughData),
        Some(value) => Ok(value),
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Result<String, ProtocolError> {
    present(fields, key)?
        .as_str()
        .map(str::to_owned)
        .ok_or(ProtocolError::NotEnoughData)
}

fn bool_field(fields: &Map<String, Value>, key: &str) -> Result<bool, ProtocolError> {
    present(fields, key)?
        .as_bool()
        .ok_or(ProtocolError::NotEnoughData)
}

/// `files` must be an array; string items are taken as-is, anything else is
/// rendered as its JSON text.
fn files_field(fields: &Map<String, Value>) -> Result<Vec<String>, ProtocolError> {
    let items = present(fields, "files")?
        .as_array()
        .ok_or(ProtocolError::NotEnoughData)?;
    Ok(items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect())
}

/// `mode` is either the numeric value (`493`) or an octal string (`"755"`,
/// `"0o755"`).
fn mode_field(fields: &Map<String, Value>) -> Result<u32, ProtocolError> {
    let mode = match present(fields, "mode")? {
        Value::Number(n) => n
            .as_u64()
            .and_then(|m| u32::try_from(m).ok())
            .ok_or_else(|| ProtocolError::InvalidMode(n.to_string()))?,
        Value::String(s) => parse_octal(s).ok_or_else(|| ProtocolError::InvalidMode(s.clone()))?,
        _ => return Err(ProtocolError::NotEnoughData),
    };
    if mode > MAX_MODE {
        return Err(ProtocolError::InvalidMode(format!("{mode:o}")));
    }
    Ok(mode)
}

fn parse_octal(s: &str) -> Option<u32> {
    let digits = s.trim();
    let digits = digits
        .strip_prefix("0o")
        .or_else(|| digits.strip_prefix("0O"))
        .unwrap_or(digits);
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 8).ok()
}
