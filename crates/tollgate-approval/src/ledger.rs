//! Final outcomes of actions, keyed by action id.
//!
//! The ledger is independent of the registry's partitions: a row survives
//! after its action is cleared from view unless the gate is configured to
//! drop it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::action::{ActionId, CancelReason};

/// Captured process output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutput {
    /// Standard output.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Standard error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    /// Process exit code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
}

/// Final outcome of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action succeeded.
    pub success: bool,
    /// Human-readable result summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// Error message on failure or cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Execution time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Captured output, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<ActionOutput>,
}

impl ActionResult {
    /// A successful outcome with no summary.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            result: None,
            error: None,
            duration_ms: None,
            output: None,
        }
    }

    /// A successful outcome with a summary.
    #[must_use]
    pub fn success(result: impl Into<String>) -> Self {
        Self {
            result: Some(result.into()),
            ..Self::ok()
        }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::ok()
        }
    }

    /// The outcome recorded when a pending action is cancelled.
    #[must_use]
    pub fn cancelled(reason: CancelReason) -> Self {
        Self::failure(reason.to_string())
    }

    /// Set the execution time.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Attach captured output.
    #[must_use]
    pub fn with_output(mut self, output: ActionOutput) -> Self {
        self.output = Some(output);
        self
    }
}

/// Map from action id to final outcome.
#[derive(Debug, Default)]
pub struct ResultLedger {
    rows: HashMap<ActionId, ActionResult>,
}

impl ResultLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an outcome, replacing any earlier row for the same id.
    pub fn record(&mut self, id: ActionId, result: ActionResult) {
        self.rows.insert(id, result);
    }

    /// Look up an outcome.
    #[must_use]
    pub fn get(&self, id: &ActionId) -> Option<&ActionResult> {
        self.rows.get(id)
    }

    /// Remove an outcome.
    pub fn remove(&mut self, id: &ActionId) -> Option<ActionResult> {
        self.rows.remove(id)
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the ledger is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
