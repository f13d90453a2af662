//! Routes inbound command frames to operations.
//!
//! The dispatcher holds no state of its own. Each call validates the frame,
//! decodes a [`Command`], runs it against the caller's [`SessionState`] and
//! folds the outcome into an [`Envelope`]. Nothing here panics or returns
//! an error: every failure becomes either an `exception` (malformed
//! request) or a `response` carrying `error` (the operation failed).

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::action::{Action, ActionRegistry};
use crate::fs::batch;
use crate::fs::entity::{DirectoryEntity, FileEntity};
use crate::fs::inspect;
use crate::protocol::{Command, Envelope, ProtocolError, Response};
use crate::session::{ClipboardAction, SessionState};

/// Reported when `paste_files` finds a clipboard that is neither cut nor copy.
pub const CUT_AND_COPY_ONLY: &str = "Cut and copy only";
/// Reported when `remove_files` finds a clipboard not marked for removal.
pub const WRONG_ACTION: &str = "Wrong action";

#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    registry: ActionRegistry,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Handles one raw text frame.
    pub fn dispatch(&self, state: &mut SessionState, raw: &str) -> Envelope {
        let fields = match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => return reject(None, ProtocolError::NoAction),
            Err(e) => {
                tracing::warn!("rejecting frame: {e}");
                return reject(None, ProtocolError::InvalidJson);
            }
        };

        let id = match fields.get("do") {
            None | Some(Value::Null) => return reject(None, ProtocolError::NoAction),
            Some(Value::String(id)) => id.as_str(),
            Some(other) => {
                return reject(None, ProtocolError::UnknownAction(other.to_string()));
            }
        };

        match self.registry.find_by_id(id) {
            Some(action) => self.execute(state, action, &fields),
            None => reject(Some(id), ProtocolError::UnknownAction(id.to_string())),
        }
    }

    /// Runs an already identified action with its raw fields.
    pub fn execute(
        &self,
        state: &mut SessionState,
        action: Action,
        fields: &Map<String, Value>,
    ) -> Envelope {
        let id = action.id();

        let missing = self
            .registry
            .descriptor_for(action)
            .map(|d| d.required.iter().any(|key| !fields.contains_key(*key)))
            .unwrap_or(false);
        if missing {
            return reject(Some(id), ProtocolError::NotEnoughData);
        }

        match Command::decode(action, fields) {
            Ok(command) => self.run(state, command),
            Err(e) => reject(Some(id), e),
        }
    }

    /// Runs a decoded command.
    pub fn run(&self, state: &mut SessionState, command: Command) -> Envelope {
        let action = command.action();
        tracing::debug!(action = action.id(), "dispatching");

        let response = match command {
            Command::Chdir { path, name } => Response::Path {
                result: display(state.chdir(&path, &name)),
            },
            Command::ListDir => list_dir(state),
            Command::Pwd => Response::Path {
                result: display(state.current_directory()),
            },
            Command::CreateDir { name } => {
                created(DirectoryEntity::new(state.current_directory()).create(&name))
            }
            Command::CreateFile { name } => {
                created(FileEntity::new(state.current_directory()).create(&name))
            }
            Command::UpdatePerms {
                files,
                mode,
                recursive,
            } => {
                let paths: Vec<PathBuf> = files.iter().map(|f| state.resolve(f)).collect();
                Response::Count {
                    result: batch::chmod_files(&paths, mode, recursive),
                }
            }
            Command::UpdateBuffer { files, action } => Response::Buffered {
                result: state.set_clipboard(action, files.as_slice()),
                action,
            },
            Command::PasteFiles => paste_files(state),
            Command::RemoveFiles => remove_files(state),
        };

        if response.is_error() {
            tracing::debug!(action = action.id(), "operation failed: {response:?}");
        }
        Envelope::response(action.id(), response)
    }
}

fn reject(action: Option<&str>, error: ProtocolError) -> Envelope {
    tracing::warn!(action, "rejecting command: {error:?}");
    Envelope::exception(action, &error)
}

fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn created(outcome: crate::error::CoreResult<PathBuf>) -> Response {
    match outcome {
        Ok(_) => Response::Created { result: true },
        Err(e) => Response::failed(e),
    }
}

fn list_dir(state: &mut SessionState) -> Response {
    let dir = state.normalize_current().to_path_buf();
    match inspect::list(&dir) {
        Ok(files) => Response::Listing {
            files,
            dir: display(&dir),
        },
        Err(e) => Response::ListingFailed {
            error: e.to_string(),
            dir: display(&dir),
        },
    }
}

fn paste_files(state: &mut SessionState) -> Response {
    let destination = state.current_directory().to_path_buf();
    match state.clipboard().action() {
        ClipboardAction::Cut => {
            let clipboard = state.take_clipboard();
            Response::Buffered {
                result: batch::move_files(clipboard.files(), &destination),
                action: ClipboardAction::Cut,
            }
        }
        ClipboardAction::Copy => Response::Buffered {
            result: batch::copy_files(state.clipboard().files(), &destination),
            action: ClipboardAction::Copy,
        },
        ClipboardAction::None | ClipboardAction::Remove => Response::failed(CUT_AND_COPY_ONLY),
    }
}

fn remove_files(state: &mut SessionState) -> Response {
    if state.clipboard().action() != ClipboardAction::Remove {
        return Response::failed(WRONG_ACTION);
    }
    let clipboard = state.take_clipboard();
    Response::Count {
        result: batch::remove_files(clipboard.files()),
    }
}
