//! Reply envelopes sent back over the command channel.
//!
//! Every reply is either `{action, response: {...}}` or
//! `{action, exception: "..."}`. `action` is omitted when the request did
//! not name one.

use serde::Serialize;

use crate::fs::inspect::FileDescriptor;
use crate::protocol::ProtocolError;
use crate::session::ClipboardAction;

/// One reply frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    #[serde(skip_serializing_if = "Option::is_none")]
    action: Option<String>,
    #[serde(flatten)]
    outcome: Outcome,
}

/// Exactly one of `response` or `exception`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Response(Response),
    Exception(String),
}

/// Body of a `response`. Operation failures are responses too; they carry
/// an `error` key instead of `result`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Listing {
        files: Vec<FileDescriptor>,
        dir: String,
    },
    ListingFailed {
        error: String,
        dir: String,
    },
    Path {
        result: String,
    },
    Created {
        result: bool,
    },
    Buffered {
        result: usize,
        action: ClipboardAction,
    },
    Count {
        result: usize,
    },
    Failed {
        error: String,
    },
}

impl Response {
    pub fn failed(error: impl ToString) -> Self {
        Self::Failed {
            error: error.to_string(),
        }
    }

    /// True for the variants that report an operation failure.
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed { .. } | Self::ListingFailed { .. })
    }
}

impl Envelope {
    pub fn response(action: impl Into<String>, response: Response) -> Self {
        Self {
            action: Some(action.into()),
            outcome: Outcome::Response(response),
        }
    }

    /// Builds a rejection; `action` is `None` when the request named none.
    pub fn exception(action: Option<&str>, error: &ProtocolError) -> Self {
        Self {
            action: action.map(str::to_owned),
            outcome: Outcome::Exception(error.to_string()),
        }
    }

    pub fn action(&self) -> Option<&str> {
        self.action.as_deref()
    }

    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    pub fn response_body(&self) -> Option<&Response> {
        match &self.outcome {
            Outcome::Response(r) => Some(r),
            Outcome::Exception(_) => None,
        }
    }

    pub fn exception_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Exception(m) => Some(m),
            Outcome::Response(_) => None,
        }
    }
}
