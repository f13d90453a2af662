//! Filesystem access for the file manager.
//!
//! - [`inspect`] builds [`FileDescriptor`]s and directory listings.
//! - [`sniff`] detects media types from file content.
//! - [`batch`] applies move, copy, remove and chmod to lists of paths.
//! - [`entity`] creates and removes single files and directories.

pub mod batch;
pub mod entity;
pub mod inspect;
pub mod sniff;

pub use entity::{DirectoryEntity, FileEntity};
pub use inspect::{describe, list, FileDescriptor, LinkTarget};
