//! Action table for the command channel.
//!
//! Every operation a client can request is represented by the [`Action`]
//! enum. [`ActionRegistry`] maps the wire id carried in the `do` field to
//! an action and records which fields the action requires.

/// Every operation the command channel accepts.
///
/// Variants carry no parameters; fields are decoded into a
/// [`Command`](crate::protocol::Command) once the action is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    // Navigation
    Chdir,
    ListDir,
    Pwd,
    // Creation
    CreateDir,
    CreateFile,
    // Permissions
    UpdatePerms,
    // Clipboard
    UpdateBuffer,
    PasteFiles,
    RemoveFiles,
}

impl Action {
    /// Wire id, as sent in `do` and echoed in the reply's `action`.
    pub fn id(self) -> &'static str {
        match self {
            Self::Chdir => "chdir",
            Self::ListDir => "list_dir",
            Self::Pwd => "pwd",
            Self::CreateDir => "create_dir",
            Self::CreateFile => "create_file",
            Self::UpdatePerms => "update_perms",
            Self::UpdateBuffer => "update_buffer",
            Self::PasteFiles => "paste_files",
            Self::RemoveFiles => "remove_files",
        }
    }
}

/// Metadata for a single action.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub action: Action,
    /// Snake-case identifier used on the wire (e.g. `"list_dir"`).
    pub id: &'static str,
    /// Short description (e.g. `"List the current directory"`).
    pub description: &'static str,
    /// Command fields that must be present for the action to run.
    pub required: &'static [&'static str],
}

/// Registry of all actions the dispatcher knows.
#[derive(Debug, Clone)]
pub struct ActionRegistry {
    descriptors: Vec<ActionDescriptor>,
}

impl ActionRegistry {
    /// Builds the registry containing every known action.
    pub fn new() -> Self {
        let descriptors = vec![
            // Navigation
            ActionDescriptor {
                action: Action::Chdir,
                id: Action::Chdir.id(),
                description: "Change the current directory",
                required: &["path", "name"],
            },
            ActionDescriptor {
                action: Action::ListDir,
                id: Action::ListDir.id(),
                description: "List the current directory",
                required: &[],
            },
            ActionDescriptor {
                action: Action::Pwd,
                id: Action::Pwd.id(),
                description: "Report the current directory",
                required: &[],
            },
            // Creation
            ActionDescriptor {
                action: Action::CreateDir,
                id: Action::CreateDir.id(),
                description: "Create an empty directory",
                required: &["name"],
            },
            ActionDescriptor {
                action: Action::CreateFile,
                id: Action::CreateFile.id(),
                description: "Create an empty file",
                required: &["name"],
            },
            // Permissions
            ActionDescriptor {
                action: Action::UpdatePerms,
                id: Action::UpdatePerms.id(),
                description: "Change permission bits",
                required: &["files", "mode", "recursive"],
            },
            // Clipboard
            ActionDescriptor {
                action: Action::UpdateBuffer,
                id: Action::UpdateBuffer.id(),
                description: "Replace the clipboard",
                required: &["files", "action"],
            },
            ActionDescriptor {
                action: Action::PasteFiles,
                id: Action::PasteFiles.id(),
                description: "Move or copy clipboard files here",
                required: &[],
            },
            ActionDescriptor {
                action: Action::RemoveFiles,
                id: Action::RemoveFiles.id(),
                description: "Delete clipboard files",
                required: &[],
            },
        ];
        Self { descriptors }
    }

    /// Returns all descriptors.
    pub fn all(&self) -> &[ActionDescriptor] {
        &self.descriptors
    }

    /// Finds an action by its wire id.
    pub fn find_by_id(&self, id: &str) -> Option<Action> {
        self.descriptors
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.action)
    }

    /// Returns the descriptor for a given action.
    pub fn descriptor_for(&self, action: Action) -> Option<&ActionDescriptor> {
        self.descriptors.iter().find(|d| d.action == action)
    }
}

impl Default for ActionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
