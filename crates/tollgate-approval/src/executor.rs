//! The handoff seam between the gate and whatever performs actions.
//!
//! The gate calls [`ActionExecutor::dispatch`] once, at the moment an action
//! enters `executing`. Dispatch should hand the work off and return quickly;
//! the executor reports the final outcome later through
//! [`ConfirmationGate::complete_action`](crate::gate::ConfirmationGate::complete_action).

use tokio::sync::mpsc;

use crate::action::PendingAction;
use crate::error::ExecutorError;

/// Performs confirmed actions.
///
/// Any `Fn(&PendingAction) -> Result<(), ExecutorError>` closure is an executor.
///
/// # Example
///
/// ```
/// use tollgate_approval::{ActionExecutor, ExecutorError, PendingAction};
///
/// struct Refuse;
///
/// impl ActionExecutor for Refuse {
///     fn dispatch(&self, action: &PendingAction) -> Result<(), ExecutorError> {
///         Err(ExecutorError::new(format!("refusing {}", action.kind)))
///     }
/// }
/// ```
pub trait ActionExecutor: Send + Sync {
    /// Take over a confirmed action.
    ///
    /// # Errors
    ///
    /// An error marks the action `failed` with the error message recorded
    /// in the result ledger.
    fn dispatch(&self, action: &PendingAction) -> Result<(), ExecutorError>;
}

impl<F> ActionExecutor for F
where
    F: Fn(&PendingAction) -> Result<(), ExecutorError> + Send + Sync,
{
    fn dispatch(&self, action: &PendingAction) -> Result<(), ExecutorError> {
        self(action)
    }
}

/// Executor that forwards each confirmed action over an unbounded channel.
///
/// Lets an async task own the real execution and call back into the gate
/// when it finishes.
#[derive(Debug, Clone)]
pub struct ChannelExecutor {
    tx: mpsc::UnboundedSender<PendingAction>,
}

impl ChannelExecutor {
    /// Create the executor and the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PendingAction>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ActionExecutor for ChannelExecutor {
    fn dispatch(&self, action: &PendingAction) -> Result<(), ExecutorError> {
        self.tx
            .send(action.clone())
            .map_err(|_| ExecutorError::new("executor channel closed"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::ActionCandidate;

    fn action() -> PendingAction {
        PendingAction::from_candidate(ActionCandidate::new("run-shell-command").with_param("command", "ls"))
    }

    #[test]
    fn test_closure_is_an_executor() {
        let exec = |a: &PendingAction| -> Result<(), ExecutorError> {
            if a.title.is_empty() {
                Err("no title".into())
            } else {
                Ok(())
            }
        };
        assert!(exec.dispatch(&action()).is_ok());
    }

    #[test]
    fn test_channel_executor_forwards() {
        let (exec, mut rx) = ChannelExecutor::new();
        let a = action();
        exec.dispatch(&a).unwrap();
        assert_eq!(rx.try_recv().unwrap().id, a.id);
    }

    #[test]
    fn test_channel_executor_fails_when_receiver_dropped() {
        let (exec, rx) = ChannelExecutor::new();
        drop(rx);
        let err = exec.dispatch(&action()).unwrap_err();
        assert_eq!(err.message(), "executor channel closed");
    }
}
