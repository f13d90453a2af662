//! The JSON command protocol spoken over the WebSocket channel.
//!
//! - [`command`] decodes request objects into typed [`Command`]s.
//! - [`envelope`] defines the reply frames.
//! - [`dispatcher`] ties the two together against a [`SessionState`](crate::session::SessionState).

pub mod command;
pub mod dispatcher;
pub mod envelope;
pub mod error;

pub use command::Command;
pub use dispatcher::Dispatcher;
pub use envelope::{Envelope, Outcome, Response};
pub use error::ProtocolError;
