//! SFM core library: the file manager logic behind the web server.
//!
//! `sfm-core` knows nothing about HTTP or WebSockets. It exposes the
//! filesystem operations, the per-workspace session state and the command
//! dispatcher that turns a JSON request frame into a JSON reply frame.
//!
//! # Modules
//!
//! - [`fs`]: Filesystem access: descriptors and listings, media type sniffing,
//!   batch move/copy/remove/chmod, single-node entities.
//! - [`session`]: [`SessionState`]: the current directory and the clipboard.
//! - [`action`]: The closed [`Action`] set and its [`ActionRegistry`].
//! - [`protocol`]: Command decoding, reply envelopes and the [`Dispatcher`].
//! - [`path`]: Lexical path normalization.
//! - [`error`]: Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod action;
pub mod error;
pub mod fs;
pub mod path;
pub mod protocol;
pub mod session;

pub use action::{Action, ActionDescriptor, ActionRegistry};
pub use error::{CoreError, CoreResult};
pub use fs::{DirectoryEntity, FileDescriptor, FileEntity};
pub use protocol::{Command, Dispatcher, Envelope, ProtocolError, Response};
pub use session::{Clipboard, ClipboardAction, SessionState};
