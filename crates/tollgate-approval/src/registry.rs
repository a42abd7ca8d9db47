//! The pending-action registry and its state machine.
//!
//! Every tracked action lives in exactly one of three partitions. The only
//! way to change the registry is [`ActionRegistry::apply`], which reads the
//! current state, validates the transition and moves the action in one
//! step. The registry itself is not synchronized; the gate owns it behind a
//! lock.

use std::fmt;
use std::time::Duration;
use tollgate_core::Timestamp;

use crate::action::{ActionId, ActionStatus, CancelReason, PendingAction};

/// The three disjoint collections an action can occupy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Status `pending`.
    Pending,
    /// Status `executing`.
    Executing,
    /// Status `completed`, `failed` or `cancelled`.
    Completed,
}

impl Partition {
    /// The partition an action with `status` belongs to.
    #[must_use]
    pub fn for_status(status: ActionStatus) -> Self {
        match status {
            ActionStatus::Pending => Self::Pending,
            ActionStatus::Confirmed | ActionStatus::Executing => Self::Executing,
            ActionStatus::Completed | ActionStatus::Failed | ActionStatus::Cancelled => {
                Self::Completed
            },
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Executing => f.write_str("executing"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

/// A requested change to the registry.
#[derive(Debug, Clone)]
pub enum Transition {
    /// Track a new action in the pending partition.
    Submit(PendingAction),
    /// Track a new action directly in the executing partition.
    Bypass(PendingAction),
    /// Move a pending action to executing.
    Confirm(ActionId),
    /// Move a pending action to completed with status `cancelled`.
    Cancel {
        /// Action to cancel.
        id: ActionId,
        /// Why.
        reason: CancelReason,
    },
    /// Move an executing action to completed with status `completed` or `failed`.
    Complete {
        /// Action to complete.
        id: ActionId,
        /// Whether the executor succeeded.
        success: bool,
    },
}

/// Why a transition was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// An action with this id is already tracked.
    #[error("action {0} is already tracked")]
    Duplicate(ActionId),
    /// No action with this id is tracked.
    #[error("action {0} is not tracked")]
    NotFound(ActionId),
    /// The action is tracked but its status does not allow the transition.
    #[error("action {id} is {status}; cannot move to {attempted}")]
    InvalidState {
        /// The action.
        id: ActionId,
        /// Its current status.
        status: ActionStatus,
        /// The status the transition wanted.
        attempted: ActionStatus,
    },
}

/// In-memory store of all tracked actions.
#[derive(Debug, Default)]
pub struct ActionRegistry {
    pending: Vec<PendingAction>,
    executing: Vec<PendingAction>,
    completed: Vec<PendingAction>,
}

impl ActionRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a transition, returning a snapshot of the moved action.
    ///
    /// # Errors
    ///
    /// Returns a [`TransitionError`] if the id is unknown, already tracked
    /// (for submissions), or in a status that does not permit the move.
    /// A refused transition leaves the registry unchanged.
    pub fn apply(&mut self, transition: Transition) -> Result<PendingAction, TransitionError> {
        match transition {
            Transition::Submit(action) => self.track(action, ActionStatus::Pending),
            Transition::Bypass(action) => self.track(action, ActionStatus::Executing),
            Transition::Confirm(id) => {
                self.advance(&id, Partition::Pending, ActionStatus::Executing, |a| {
                    a.started_at = Some(Timestamp::now());
                })
            },
            Transition::Cancel { id, reason } => {
                self.advance(&id, Partition::Pending, ActionStatus::Cancelled, |a| {
                    a.cancel_reason = Some(reason);
                    a.finished_at = Some(Timestamp::now());
                })
            },
            Transition::Complete { id, success } => {
                let next = if success {
                    ActionStatus::Completed
                } else {
                    ActionStatus::Failed
                };
                self.advance(&id, Partition::Executing, next, |a| {
                    a.finished_at = Some(Timestamp::now());
                })
            },
        }
    }

    fn track(
        &mut self,
        mut action: PendingAction,
        status: ActionStatus,
    ) -> Result<PendingAction, TransitionError> {
        if self.partition_of(&action.id).is_some() {
            return Err(TransitionError::Duplicate(action.id));
        }
        action.status = status;
        if status == ActionStatus::Executing {
            action.started_at = Some(Timestamp::now());
        }
        let snapshot = action.clone();
        self.partition_mut(Partition::for_status(status)).push(action);
        Ok(snapshot)
    }

    fn advance(
        &mut self,
        id: &ActionId,
        from: Partition,
        next: ActionStatus,
        update: impl FnOnce(&mut PendingAction),
    ) -> Result<PendingAction, TransitionError> {
        let Some(index) = self.partition(from).iter().position(|a| &a.id == id) else {
            return Err(match self.get(id) {
                Some(action) => TransitionError::InvalidState {
                    id: id.clone(),
                    status: action.status,
                    attempted: next,
                },
                None => TransitionError::NotFound(id.clone()),
            });
        };

        let current = self.partition(from)[index].status;
        if !current.can_transition_to(next) {
            return Err(TransitionError::InvalidState {
                id: id.clone(),
                status: current,
                attempted: next,
            });
        }

        let mut action = self.partition_mut(from).remove(index);
        action.status = next;
        update(&mut action);
        let snapshot = action.clone();
        self.partition_mut(Partition::for_status(next)).push(action);
        Ok(snapshot)
    }

    fn partition_mut(&mut self, partition: Partition) -> &mut Vec<PendingAction> {
        match partition {
            Partition::Pending => &mut self.pending,
            Partition::Executing => &mut self.executing,
            Partition::Completed => &mut self.completed,
        }
    }

    /// Actions in a partition, in the order they entered it.
    #[must_use]
    pub fn partition(&self, partition: Partition) -> &[PendingAction] {
        match partition {
            Partition::Pending => &self.pending,
            Partition::Executing => &self.executing,
            Partition::Completed => &self.completed,
        }
    }

    /// Actions awaiting a decision.
    #[must_use]
    pub fn pending(&self) -> &[PendingAction] {
        &self.pending
    }

    /// Actions handed to the executor.
    #[must_use]
    pub fn executing(&self) -> &[PendingAction] {
        &self.executing
    }

    /// Actions in a terminal status.
    #[must_use]
    pub fn completed(&self) -> &[PendingAction] {
        &self.completed
    }

    /// Which partition holds an action.
    #[must_use]
    pub fn partition_of(&self, id: &ActionId) -> Option<Partition> {
        [Partition::Pending, Partition::Executing, Partition::Completed]
            .into_iter()
            .find(|p| self.partition(*p).iter().any(|a| &a.id == id))
    }

    /// Look up an action in any partition.
    #[must_use]
    pub fn get(&self, id: &ActionId) -> Option<&PendingAction> {
        self.pending
            .iter()
            .chain(&self.executing)
            .chain(&self.completed)
            .find(|a| &a.id == id)
    }

    /// Remove and return every action in the completed partition.
    pub fn drain_completed(&mut self) -> Vec<PendingAction> {
        std::mem::take(&mut self.completed)
    }

    /// Ids of pending actions that have waited at least `ttl`.
    #[must_use]
    pub fn expired_pending(&self, ttl: Duration) -> Vec<ActionId> {
        self.pending
            .iter()
            .filter(|a| a.created_at.elapsed() >= ttl)
            .map(|a| a.id.clone())
            .collect()
    }

    /// Total number of tracked actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pending
            .len()
            .saturating_add(self.executing.len())
            .saturating_add(self.completed.len())
    }

    /// Whether nothing is tracked.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
