//! Mock executors.

use std::sync::{Arc, Mutex};

use tollgate_approval::{ActionExecutor, ActionId, ExecutorError, PendingAction};

/// Executor that accepts every action and remembers what it was given.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    dispatched: Arc<Mutex<Vec<PendingAction>>>,
}

impl RecordingExecutor {
    /// Create an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every action dispatched so far, in dispatch order.
    #[must_use]
    pub fn dispatched(&self) -> Vec<PendingAction> {
        self.dispatched
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    /// Ids of dispatched actions, in dispatch order.
    #[must_use]
    pub fn dispatched_ids(&self) -> Vec<ActionId> {
        self.dispatched().into_iter().map(|a| a.id).collect()
    }

    /// Number of dispatches.
    #[must_use]
    pub fn count(&self) -> usize {
        self.dispatched.lock().map(|guard| guard.len()).unwrap_or(0)
    }
}

impl ActionExecutor for RecordingExecutor {
    fn dispatch(&self, action: &PendingAction) -> Result<(), ExecutorError> {
        if let Ok(mut guard) = self.dispatched.lock() {
            guard.push(action.clone());
        }
        Ok(())
    }
}

/// Executor that refuses every action with a fixed message.
#[derive(Debug, Clone)]
pub struct FailingExecutor {
    message: String,
}

impl FailingExecutor {
    /// Refuse with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl ActionExecutor for FailingExecutor {
    fn dispatch(&self, _action: &PendingAction) -> Result<(), ExecutorError> {
        Err(ExecutorError::new(self.message.clone()))
    }
}

/// Executor that panics inside `dispatch`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanickingExecutor;

impl ActionExecutor for PanickingExecutor {
    fn dispatch(&self, action: &PendingAction) -> Result<(), ExecutorError> {
        panic!("executor crashed on {}", action.id);
    }
}
