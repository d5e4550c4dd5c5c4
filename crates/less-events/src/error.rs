use thiserror::Error;

use crate::listener::ListenerId;

// ---------------------------------------------------------------------------
// ListenerFailure
// ---------------------------------------------------------------------------

/// One listener that failed during an emission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ListenerFailure {
    pub id: ListenerId,
    pub message: String,
}

// ---------------------------------------------------------------------------
// EmitError
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitError {
    /// One or more listeners failed. Every other listener still ran and
    /// fired `once` listeners were still removed.
    #[error("Event {event} threw the following errors: {}", join_messages(.failures))]
    ListenersFailed {
        event: String,
        failures: Vec<ListenerFailure>,
    },
}

impl EmitError {
    /// Name of the event whose emission failed.
    pub fn event(&self) -> &str {
        match self {
            Self::ListenersFailed { event, .. } => event,
        }
    }

    /// Failures in invocation order.
    pub fn failures(&self) -> &[ListenerFailure] {
        match self {
            Self::ListenersFailed { failures, .. } => failures,
        }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.failures().iter().map(|f| f.message.as_str()).collect()
    }
}

fn join_messages(failures: &[ListenerFailure]) -> String {
    failures
        .iter()
        .map(|f| f.message.as_str())
        .collect::<Vec<_>>()
        .join(" | ")
}

pub type Result<T, E = EmitError> = std::result::Result<T, E>;
