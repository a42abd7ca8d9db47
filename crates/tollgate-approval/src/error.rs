//! Error types for the confirmation gate.

use tollgate_core::Severity;

use crate::action::{ActionId, CancelReason};

/// Errors surfaced by the confirmation gate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    /// The action was cancelled before it was confirmed.
    #[error("action {id} {reason}")]
    Cancelled {
        /// The cancelled action.
        id: ActionId,
        /// Why it was cancelled.
        reason: CancelReason,
    },

    /// A high or critical action was confirmed without the confirmation phrase.
    #[error("{severity} action {id} requires the confirmation phrase")]
    PhraseRequired {
        /// The action awaiting confirmation.
        id: ActionId,
        /// Severity that triggered enhanced confirmation.
        severity: Severity,
    },

    /// The supplied confirmation phrase did not match.
    #[error("confirmation phrase for action {id} does not match")]
    PhraseMismatch {
        /// The action awaiting confirmation.
        id: ActionId,
    },

    /// No action with this id is known to the gate.
    #[error("unknown action: {0}")]
    UnknownAction(ActionId),

    /// The gate was dropped before the action settled.
    #[error("confirmation gate closed before the action settled")]
    Closed,
}

impl GateError {
    /// Whether this error represents a cancellation (by the user or by expiry).
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Whether this error is a rejected confirmation phrase.
    #[must_use]
    pub fn is_phrase_rejection(&self) -> bool {
        matches!(self, Self::PhraseRequired { .. } | Self::PhraseMismatch { .. })
    }
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;

/// Error raised by an [`ActionExecutor`](crate::executor::ActionExecutor)
/// while taking over a confirmed action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ExecutorError {
    message: String,
}

impl ExecutorError {
    /// Create an executor error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for ExecutorError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for ExecutorError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<std::io::Error> for ExecutorError {
    fn from(e: std::io::Error) -> Self {
        Self::new(e.to_string())
    }
}
