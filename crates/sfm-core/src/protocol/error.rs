//! Protocol-level rejections.

/// A command that was rejected before any operation ran.
///
/// The `Display` text is exactly the `exception` string sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is not a JSON object.
    #[error("Invalid JSON data")]
    InvalidJson,

    /// The object has no `do` field.
    #[error("No action")]
    NoAction,

    /// `do` names no registered action.
    #[error("Unknown action")]
    UnknownAction(String),

    /// A required field is missing or has the wrong JSON type.
    #[error("Not enough data")]
    NotEnoughData,

    /// `update_buffer` received an action other than cut, copy or remove.
    #[error("Invalid buffer action")]
    InvalidBufferAction(String),

    /// `update_perms` received a mode that is not a valid permission value.
    #[error("Invalid mode")]
    InvalidMode(String),
}
