//! The confirmation gate.
//!
//! [`ConfirmationGate`] is the single entry point for every state change:
//! submission, operator decisions, executor completion and housekeeping.
//! The registry, the result ledger, the waiter table and the enable flag
//! sit behind one mutex, so each operation reads, validates and writes in
//! one step and two racing calls on the same id cannot both succeed.
//!
//! # Flow
//!
//! 1. [`submit`](ConfirmationGate::submit) classifies the candidate and
//!    shows it in the pending partition.
//! 2. The originator may await a [`PendingConfirmation`] for the id.
//! 3. [`confirm`](ConfirmationGate::confirm) moves it to executing, wakes
//!    waiters with `true` and hands it to the [`ActionExecutor`].
//!    [`cancel`](ConfirmationGate::cancel) instead moves it to completed
//!    as `cancelled` and wakes waiters with [`GateError::Cancelled`].
//! 4. The executor reports back with
//!    [`complete_action`](ConfirmationGate::complete_action).

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tollgate_core::Severity;
use tracing::{debug, info, warn};

use crate::action::{ActionCandidate, ActionId, ActionStatus, CancelReason, PendingAction};
use crate::error::{GateError, GateResult};
use crate::executor::ActionExecutor;
use crate::ledger::{ActionResult, ResultLedger};
use crate::registry::{ActionRegistry, Transition};

/// Phrase an operator must type to confirm a high or critical action.
pub const CONFIRMATION_PHRASE: &str = "CONFIRM";

/// Default capacity of the event broadcast channel.
const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Construction-time settings for a [`ConfirmationGate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateOptions {
    /// When `false`, new submissions skip `pending` and go straight to the
    /// executor. Actions already pending are left for the operator.
    pub enabled: bool,
    /// How long an action may stay pending before
    /// [`ConfirmationGate::reap_expired`] cancels it. `None` waits forever.
    pub pending_timeout: Option<Duration>,
    /// Keep result-ledger rows when their actions are cleared from view.
    pub retain_results_on_clear: bool,
    /// Capacity of the [`GateEvent`] broadcast channel.
    pub event_capacity: usize,
}

impl Default for GateOptions {
    fn default() -> Self {
        Self {
            enabled: true,
            pending_timeout: None,
            retain_results_on_clear: false,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl GateOptions {
    /// Set the initial enable flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Expire actions that stay pending longer than `timeout`.
    #[must_use]
    pub fn with_pending_timeout(mut self, timeout: Duration) -> Self {
        self.pending_timeout = Some(timeout);
        self
    }

    /// Keep ledger rows after `clear_completed`.
    #[must_use]
    pub fn retaining_results(mut self) -> Self {
        self.retain_results_on_clear = true;
        self
    }

    /// Set the event channel capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }
}

/// Notification published whenever the gate changes state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateEvent {
    /// An action was submitted.
    Submitted {
        /// The action.
        id: ActionId,
        /// Its severity.
        severity: Severity,
    },
    /// An action was handed to the executor.
    Executing {
        /// The action.
        id: ActionId,
    },
    /// A pending action was cancelled.
    Cancelled {
        /// The action.
        id: ActionId,
        /// Why.
        reason: CancelReason,
    },
    /// An executing action reached `completed` or `failed`.
    Finished {
        /// The action.
        id: ActionId,
        /// Its terminal status.
        status: ActionStatus,
    },
    /// The completed partition was cleared.
    Cleared {
        /// How many actions were removed.
        count: usize,
    },
}

/// Result of a [`ConfirmationGate::confirm`] call that passed phrase checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmOutcome {
    /// The action is executing.
    Executing,
    /// The action was confirmed but the executor handoff failed; it is now `failed`.
    ExecutorFailed {
        /// The executor's error message.
        error: String,
    },
    /// Nothing happened: the action was not pending.
    Ignored {
        /// Its status, or `None` if the id is unknown.
        status: Option<ActionStatus>,
    },
}

/// Result of a cancel or completion call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The transition happened.
    Applied,
    /// The action was not in the expected partition; nothing changed.
    Ignored,
}

/// Consistent view of all three partitions.
#[derive(Debug, Clone)]
pub struct GateSnapshot {
    /// Actions awaiting a decision.
    pub pending: Vec<PendingAction>,
    /// Actions handed to the executor.
    pub executing: Vec<PendingAction>,
    /// Actions in a terminal status.
    pub completed: Vec<PendingAction>,
    /// Whether the gate is enabled.
    pub enabled: bool,
}

#[derive(Debug, Clone, Copy)]
enum Settlement {
    Confirmed,
    Cancelled(CancelReason),
}

/// Future resolving once the operator decides on an action.
///
/// Resolves to `Ok(true)` on confirmation and to [`GateError::Cancelled`]
/// on cancellation. Dropping it does not affect the action.
#[derive(Debug)]
#[must_use = "a confirmation does nothing unless awaited"]
pub struct PendingConfirmation {
    id: ActionId,
    rx: oneshot::Receiver<Settlement>,
}

impl PendingConfirmation {
    /// The action this confirmation belongs to.
    pub fn id(&self) -> &ActionId {
        &self.id
    }
}

impl Future for PendingConfirmation {
    type Output = GateResult<bool>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let polled = Pin::new(&mut self.rx).poll(cx);
        match polled {
            Poll::Ready(Ok(Settlement::Confirmed)) => Poll::Ready(Ok(true)),
            Poll::Ready(Ok(Settlement::Cancelled(reason))) => Poll::Ready(Err(GateError::Cancelled {
                id: self.id.clone(),
                reason,
            })),
            Poll::Ready(Err(_)) => Poll::Ready(Err(GateError::Closed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

#[derive(Debug)]
struct GateState {
    registry: ActionRegistry,
    ledger: ResultLedger,
    waiters: HashMap<ActionId, Vec<oneshot::Sender<Settlement>>>,
    enabled: bool,
}

/// Human-in-the-loop gate for side-effecting actions.
pub struct ConfirmationGate {
    state: Mutex<GateState>,
    executor: Arc<dyn ActionExecutor>,
    options: GateOptions,
    events: broadcast::Sender<GateEvent>,
}

impl ConfirmationGate {
    /// Create a gate that hands confirmed actions to `executor`.
    #[must_use]
    pub fn new(options: GateOptions, executor: Arc<dyn ActionExecutor>) -> Self {
        let (events, _) = broadcast::channel(options.event_capacity.max(1));
        Self {
            state: Mutex::new(GateState {
                registry: ActionRegistry::new(),
                ledger: ResultLedger::new(),
                waiters: HashMap::new(),
                enabled: options.enabled,
            }),
            executor,
            options,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(|e| {
            warn!("gate state lock poisoned, recovering");
            e.into_inner()
        })
    }

    fn emit(&self, event: GateEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Subscribe to state-change notifications.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<GateEvent> {
        self.events.subscribe()
    }

    /// The options the gate was built with.
    #[must_use]
    pub fn options(&self) -> &GateOptions {
        &self.options
    }

    /// Submit an action. It is visible in the pending partition on return.
    ///
    /// While the gate is disabled the action is dispatched immediately
    /// instead.
    pub fn submit(&self, candidate: ActionCandidate) -> ActionId {
        self.submit_inner(candidate, None)
    }

    /// Submit an action and register a confirmation waiter in the same step.
    pub fn submit_and_wait(&self, candidate: ActionCandidate) -> (ActionId, PendingConfirmation) {
        let (tx, rx) = oneshot::channel();
        let id = self.submit_inner(candidate, Some(tx));
        let waiter = PendingConfirmation { id: id.clone(), rx };
        (id, waiter)
    }

    fn submit_inner(
        &self,
        candidate: ActionCandidate,
        waiter: Option<oneshot::Sender<Settlement>>,
    ) -> ActionId {
        let action = PendingAction::from_candidate(candidate);
        let id = action.id.clone();
        let severity = action.severity;

        let bypassed = {
            let mut state = self.lock();
            if state.enabled {
                if let Err(e) = state.registry.apply(Transition::Submit(action)) {
                    warn!(action_id = %id, error = %e, "submission refused");
                }
                if let Some(tx) = waiter {
                    state.waiters.entry(id.clone()).or_default().push(tx);
                }
                None
            } else {
                match state.registry.apply(Transition::Bypass(action)) {
                    Ok(action) => {
                        if let Some(tx) = waiter {
                            let _ = tx.send(Settlement::Confirmed);
                        }
                        Some(action)
                    },
                    Err(e) => {
                        warn!(action_id = %id, error = %e, "submission refused");
                        None
                    },
                }
            }
        };

        info!(action_id = %id, %severity, bypassed = bypassed.is_some(), "action submitted");
        self.emit(GateEvent::Submitted {
            id: id.clone(),
            severity,
        });

        if let Some(action) = bypassed {
            debug!(action_id = %id, "gate disabled, dispatching without confirmation");
            self.emit(GateEvent::Executing { id: id.clone() });
            self.hand_off(&action);
        }

        id
    }

    /// Get a future that settles when the operator decides on `id`.
    ///
    /// If the action has already been decided the future is ready at once.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::UnknownAction`] if the id is not tracked.
    pub fn confirmation(&self, id: &ActionId) -> GateResult<PendingConfirmation> {
        let (tx, rx) = oneshot::channel();
        let mut state = self.lock();
        let (status, cancel_reason) = match state.registry.get(id) {
            Some(action) => (action.status, action.cancel_reason),
            None => return Err(GateError::UnknownAction(id.clone())),
        };

        match status {
            ActionStatus::Pending => {
                let senders = state.waiters.entry(id.clone()).or_default();
                senders.retain(|tx| !tx.is_closed());
                senders.push(tx);
            },
            ActionStatus::Cancelled => {
                let _ = tx.send(Settlement::Cancelled(
                    cancel_reason.unwrap_or(CancelReason::User),
                ));
            },
            _ => {
                let _ = tx.send(Settlement::Confirmed);
            },
        }

        Ok(PendingConfirmation { id: id.clone(), rx })
    }

    /// Confirm a pending action and hand it to the executor.
    ///
    /// High and critical actions need `phrase` to equal
    /// [`CONFIRMATION_PHRASE`]; lower severities ignore it. Confirming an
    /// action that is not pending is a logged no-op.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::PhraseRequired`] or [`GateError::PhraseMismatch`]
    /// when the phrase check fails. The action stays pending and its
    /// waiters are not woken.
    pub fn confirm(&self, id: &ActionId, phrase: Option<&str>) -> GateResult<ConfirmOutcome> {
        let (action, waiters) = {
            let mut state = self.lock();
            let (status, severity) = match state.registry.get(id) {
                Some(action) => (action.status, action.severity),
                None => {
                    warn!(action_id = %id, "confirm ignored: unknown action");
                    return Ok(ConfirmOutcome::Ignored { status: None });
                },
            };

            if status != ActionStatus::Pending {
                warn!(action_id = %id, %status, "confirm ignored: action is not pending");
                return Ok(ConfirmOutcome::Ignored {
                    status: Some(status),
                });
            }

            if severity.requires_enhanced_confirmation() {
                match phrase {
                    None => {
                        debug!(action_id = %id, %severity, "confirmation phrase missing");
                        return Err(GateError::PhraseRequired {
                            id: id.clone(),
                            severity,
                        });
                    },
                    Some(p) if p != CONFIRMATION_PHRASE => {
                        debug!(action_id = %id, "confirmation phrase mismatch");
                        return Err(GateError::PhraseMismatch { id: id.clone() });
                    },
                    Some(_) => {},
                }
            }

            let action = match state.registry.apply(Transition::Confirm(id.clone())) {
                Ok(action) => action,
                Err(e) => {
                    warn!(action_id = %id, error = %e, "confirm ignored");
                    return Ok(ConfirmOutcome::Ignored {
                        status: Some(status),
                    });
                },
            };
            let waiters = state.waiters.remove(id).unwrap_or_default();
            (action, waiters)
        };

        info!(action_id = %id, severity = %action.severity, "action confirmed");
        self.emit(GateEvent::Executing { id: id.clone() });
        settle(waiters, Settlement::Confirmed);

        match self.hand_off(&action) {
            None => Ok(ConfirmOutcome::Executing),
            Some(error) => Ok(ConfirmOutcome::ExecutorFailed { error }),
        }
    }

    /// Cancel a pending action.
    ///
    /// Records `cancelled by user` in the ledger and rejects waiters with
    /// [`GateError::Cancelled`]. Cancelling anything not pending is a
    /// logged no-op.
    pub fn cancel(&self, id: &ActionId) -> TransitionOutcome {
        self.cancel_with(id, CancelReason::User)
    }

    fn cancel_with(&self, id: &ActionId, reason: CancelReason) -> TransitionOutcome {
        let waiters = {
            let mut state = self.lock();
            if let Err(e) = state.registry.apply(Transition::Cancel {
                id: id.clone(),
                reason,
            }) {
                warn!(action_id = %id, error = %e, "cancel ignored");
                return TransitionOutcome::Ignored;
            }
            state.ledger.record(id.clone(), ActionResult::cancelled(reason));
            state.waiters.remove(id).unwrap_or_default()
        };

        info!(action_id = %id, %reason, "action cancelled");
        self.emit(GateEvent::Cancelled {
            id: id.clone(),
            reason,
        });
        settle(waiters, Settlement::Cancelled(reason));
        TransitionOutcome::Applied
    }

    /// Record the executor's outcome for an executing action.
    ///
    /// The action moves to `completed` or `failed` according to
    /// `result.success`. A missing `duration_ms` is filled from the time the
    /// action entered executing. Unknown or non-executing ids are a logged
    /// no-op.
    pub fn complete_action(&self, id: &ActionId, mut result: ActionResult) -> TransitionOutcome {
        let status = {
            let mut state = self.lock();
            let action = match state.registry.apply(Transition::Complete {
                id: id.clone(),
                success: result.success,
            }) {
                Ok(action) => action,
                Err(e) => {
                    warn!(action_id = %id, error = %e, "completion ignored");
                    return TransitionOutcome::Ignored;
                },
            };
            if result.duration_ms.is_none() {
                result.duration_ms = action.started_at.map(|t| millis(t.elapsed()));
            }
            state.ledger.record(id.clone(), result);
            action.status
        };

        info!(action_id = %id, %status, "action finished");
        self.emit(GateEvent::Finished {
            id: id.clone(),
            status,
        });
        TransitionOutcome::Applied
    }

    /// Dispatch an executing action; on failure mark it `failed`.
    ///
    /// Returns the failure message, if any.
    fn hand_off(&self, action: &PendingAction) -> Option<String> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.executor.dispatch(action)));
        let error = match outcome {
            Ok(Ok(())) => return None,
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("executor panicked: {}", panic_message(payload.as_ref())),
        };

        warn!(action_id = %action.id, %error, "executor handoff failed");
        if self.complete_action(&action.id, ActionResult::failure(error.clone()))
            == TransitionOutcome::Ignored
        {
            debug!(action_id = %action.id, "action already finished before handoff error");
        }
        Some(error)
    }

    /// Remove every terminal action from the completed partition.
    ///
    /// Their ledger rows are dropped too unless the gate retains results.
    /// Returns how many actions were removed.
    pub fn clear_completed(&self) -> usize {
        let count = {
            let mut state = self.lock();
            let drained = state.registry.drain_completed();
            if !self.options.retain_results_on_clear {
                for action in &drained {
                    state.ledger.remove(&action.id);
                }
            }
            drained.len()
        };

        debug!(count, "cleared completed actions");
        self.emit(GateEvent::Cleared { count });
        count
    }

    /// Cancel pending actions older than the configured timeout.
    ///
    /// Returns the ids that expired. Does nothing without a timeout.
    pub fn reap_expired(&self) -> Vec<ActionId> {
        let Some(ttl) = self.options.pending_timeout else {
            return Vec::new();
        };
        let overdue = self.lock().registry.expired_pending(ttl);
        overdue
            .into_iter()
            .filter(|id| self.cancel_with(id, CancelReason::Expired) == TransitionOutcome::Applied)
            .collect()
    }

    /// Turn the gate on or off. Affects only future submissions.
    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
        info!(enabled, "confirmation gate toggled");
    }

    /// Whether new submissions wait for confirmation.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    /// Actions awaiting a decision, oldest first.
    #[must_use]
    pub fn pending(&self) -> Vec<PendingAction> {
        self.lock().registry.pending().to_vec()
    }

    /// Actions handed to the executor, in confirmation order.
    #[must_use]
    pub fn executing(&self) -> Vec<PendingAction> {
        self.lock().registry.executing().to_vec()
    }

    /// Terminal actions, in the order they finished.
    #[must_use]
    pub fn completed(&self) -> Vec<PendingAction> {
        self.lock().registry.completed().to_vec()
    }

    /// All three partitions read under one lock.
    #[must_use]
    pub fn snapshot(&self) -> GateSnapshot {
        let state = self.lock();
        GateSnapshot {
            pending: state.registry.pending().to_vec(),
            executing: state.registry.executing().to_vec(),
            completed: state.registry.completed().to_vec(),
            enabled: state.enabled,
        }
    }

    /// Look up an action in any partition.
    #[must_use]
    pub fn get(&self, id: &ActionId) -> Option<PendingAction> {
        self.lock().registry.get(id).cloned()
    }

    /// Look up the recorded outcome of an action.
    #[must_use]
    pub fn result(&self, id: &ActionId) -> Option<ActionResult> {
        self.lock().ledger.get(id).cloned()
    }

    /// Number of actions with registered, unsettled waiters.
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.lock().waiters.len()
    }
}

impl std::fmt::Debug for ConfirmationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfirmationGate")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn settle(waiters: Vec<oneshot::Sender<Settlement>>, settlement: Settlement) {
    for tx in waiters {
        // The waiter may have been dropped.
        let _ = tx.send(settlement);
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutorError;
    use crate::executor::ChannelExecutor;

    fn gate() -> (ConfirmationGate, tokio::sync::mpsc::UnboundedReceiver<PendingAction>) {
        gate_with(GateOptions::default())
    }

    fn gate_with(
        options: GateOptions,
    ) -> (ConfirmationGate, tokio::sync::mpsc::UnboundedReceiver<PendingAction>) {
        let (exec, rx) = ChannelExecutor::new();
        (ConfirmationGate::new(options, Arc::new(exec)), rx)
    }

    fn write(path: &str) -> ActionCandidate {
        ActionCandidate::new("write-file").with_param("filePath", path)
    }

    #[test]
    fn test_submit_is_visible_immediately() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        let pending = gate.pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, id);
        assert!(gate.executing().is_empty());
    }

    #[test]
    fn test_medium_confirm_needs_no_phrase() {
        let (gate, mut rx) = gate();
        let id = gate.submit(write("src/app.ts"));
        assert_eq!(gate.confirm(&id, None).unwrap(), ConfirmOutcome::Executing);
        assert_eq!(gate.executing()[0].id, id);
        assert_eq!(rx.try_recv().unwrap().id, id);
    }

    #[test]
    fn test_high_confirm_requires_exact_phrase() {
        let (gate, mut rx) = gate();
        let id = gate.submit(write(".env"));

        let err = gate.confirm(&id, None).unwrap_err();
        assert!(matches!(err, GateError::PhraseRequired { severity: Severity::High, .. }));
        let err = gate.confirm(&id, Some("confirm")).unwrap_err();
        assert!(matches!(err, GateError::PhraseMismatch { .. }));
        let err = gate.confirm(&id, Some("CONFIRM ")).unwrap_err();
        assert!(err.is_phrase_rejection());
        assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Pending);
        assert!(rx.try_recv().is_err());

        assert_eq!(
            gate.confirm(&id, Some(CONFIRMATION_PHRASE)).unwrap(),
            ConfirmOutcome::Executing
        );
        assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Executing);
    }

    #[tokio::test]
    async fn test_phrase_rejection_keeps_waiter() {
        let (gate, _rx) = gate();
        let (id, waiter) = gate.submit_and_wait(write("package.json"));
        assert!(gate.confirm(&id, Some("nope")).is_err());
        assert_eq!(gate.waiting_count(), 1);

        gate.confirm(&id, Some(CONFIRMATION_PHRASE)).unwrap();
        assert!(waiter.await.unwrap());
        assert_eq!(gate.waiting_count(), 0);
    }

    #[tokio::test]
    async fn test_confirmation_resolves_true() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        let waiter = gate.confirmation(&id).unwrap();
        gate.confirm(&id, None).unwrap();
        assert!(waiter.await.unwrap());
    }

    #[tokio::test]
    async fn test_cancel_rejects_every_waiter() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        let first = gate.confirmation(&id).unwrap();
        let second = gate.confirmation(&id).unwrap();
        assert_eq!(gate.waiting_count(), 1);

        assert_eq!(gate.cancel(&id), TransitionOutcome::Applied);
        for waiter in [first, second] {
            let err = waiter.await.unwrap_err();
            assert!(err.is_cancellation());
            assert_eq!(
                err,
                GateError::Cancelled {
                    id: id.clone(),
                    reason: CancelReason::User
                }
            );
        }
        assert_eq!(gate.waiting_count(), 0);

        let row = gate.result(&id).unwrap();
        assert!(!row.success);
        assert_eq!(row.error.as_deref(), Some("cancelled by user"));
    }

    #[tokio::test]
    async fn test_confirmation_after_settlement_is_ready() {
        let (gate, _rx) = gate();
        let cancelled = gate.submit(write("a.txt"));
        gate.cancel(&cancelled);
        assert!(gate.confirmation(&cancelled).unwrap().await.is_err());

        let confirmed = gate.submit(write("b.txt"));
        gate.confirm(&confirmed, None).unwrap();
        assert!(gate.confirmation(&confirmed).unwrap().await.unwrap());
        assert_eq!(gate.waiting_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_confirmations_are_pruned() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        for _ in 0..10 {
            drop(gate.confirmation(&id).unwrap());
        }
        let kept = gate.confirmation(&id).unwrap();
        assert_eq!(gate.lock().waiters.get(&id).map(Vec::len), Some(1));

        gate.confirm(&id, None).unwrap();
        assert!(kept.await.unwrap());
        assert_eq!(gate.waiting_count(), 0);
    }

    #[test]
    fn test_confirmation_for_unknown_id() {
        let (gate, _rx) = gate();
        let id = ActionId::new();
        assert_eq!(
            gate.confirmation(&id).unwrap_err(),
            GateError::UnknownAction(id)
        );
    }

    #[test]
    fn test_double_cancel_is_noop() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        assert_eq!(gate.cancel(&id), TransitionOutcome::Applied);
        assert_eq!(gate.cancel(&id), TransitionOutcome::Ignored);
        assert_eq!(gate.completed().len(), 1);
    }

    #[test]
    fn test_confirm_after_cancel_is_noop() {
        let (gate, mut rx) = gate();
        let id = gate.submit(write("notes.txt"));
        gate.cancel(&id);
        assert_eq!(
            gate.confirm(&id, None).unwrap(),
            ConfirmOutcome::Ignored {
                status: Some(ActionStatus::Cancelled)
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_double_confirm_dispatches_once() {
        let (gate, mut rx) = gate();
        let id = gate.submit(write("notes.txt"));
        gate.confirm(&id, None).unwrap();
        assert_eq!(
            gate.confirm(&id, None).unwrap(),
            ConfirmOutcome::Ignored {
                status: Some(ActionStatus::Executing)
            }
        );
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_cancel_executing_is_noop() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        gate.confirm(&id, None).unwrap();
        assert_eq!(gate.cancel(&id), TransitionOutcome::Ignored);
        assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Executing);
    }

    #[test]
    fn test_complete_action_records_result_and_duration() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        gate.confirm(&id, None).unwrap();
        assert_eq!(
            gate.complete_action(&id, ActionResult::success("written")),
            TransitionOutcome::Applied
        );

        let action = gate.get(&id).unwrap();
        assert_eq!(action.status, ActionStatus::Completed);
        assert!(action.finished_at.is_some());
        let row = gate.result(&id).unwrap();
        assert_eq!(row.result.as_deref(), Some("written"));
        assert!(row.duration_ms.is_some());
    }

    #[test]
    fn test_complete_action_keeps_reported_duration() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        gate.confirm(&id, None).unwrap();
        gate.complete_action(&id, ActionResult::failure("disk full").with_duration_ms(7));

        assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Failed);
        assert_eq!(gate.result(&id).unwrap().duration_ms, Some(7));
    }

    #[test]
    fn test_complete_unknown_or_pending_is_tolerated() {
        let (gate, _rx) = gate();
        assert_eq!(
            gate.complete_action(&ActionId::new(), ActionResult::ok()),
            TransitionOutcome::Ignored
        );
        let id = gate.submit(write("notes.txt"));
        assert_eq!(
            gate.complete_action(&id, ActionResult::ok()),
            TransitionOutcome::Ignored
        );
        assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Pending);
        assert!(gate.result(&id).is_none());
    }

    #[test]
    fn test_executor_error_marks_failed() {
        let exec = |_: &PendingAction| -> Result<(), ExecutorError> {
            Err(ExecutorError::new("sandbox unavailable"))
        };
        let gate = ConfirmationGate::new(GateOptions::default(), Arc::new(exec));
        let id = gate.submit(write("notes.txt"));

        assert_eq!(
            gate.confirm(&id, None).unwrap(),
            ConfirmOutcome::ExecutorFailed {
                error: "sandbox unavailable".to_string()
            }
        );
        assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Failed);
        assert!(gate.executing().is_empty());
        let row = gate.result(&id).unwrap();
        assert_eq!(row.error.as_deref(), Some("sandbox unavailable"));
    }

    #[test]
    fn test_executor_panic_marks_failed() {
        let exec = |_: &PendingAction| -> Result<(), ExecutorError> { panic!("executor bug") };
        let gate = ConfirmationGate::new(GateOptions::default(), Arc::new(exec));
        let id = gate.submit(write("notes.txt"));

        let outcome = gate.confirm(&id, None).unwrap();
        assert!(matches!(
            outcome,
            ConfirmOutcome::ExecutorFailed { ref error } if error.contains("executor bug")
        ));
        assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Failed);
    }

    #[tokio::test]
    async fn test_disabled_gate_bypasses_new_submissions() {
        let (gate, mut rx) = gate_with(GateOptions::default().with_enabled(false));
        let (id, waiter) = gate.submit_and_wait(write(".env"));

        assert!(gate.pending().is_empty());
        assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Executing);
        assert_eq!(rx.try_recv().unwrap().id, id);
        assert!(waiter.await.unwrap());
    }

    #[test]
    fn test_disabling_leaves_pending_actions_alone() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        gate.set_enabled(false);
        assert!(!gate.is_enabled());
        let bypassed = gate.submit(write("other.txt"));

        assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Pending);
        assert_eq!(gate.get(&bypassed).unwrap().status, ActionStatus::Executing);

        gate.set_enabled(true);
        let gated = gate.submit(write("third.txt"));
        assert_eq!(gate.get(&gated).unwrap().status, ActionStatus::Pending);
    }

    #[test]
    fn test_clear_completed_drops_results_by_default() {
        let (gate, _rx) = gate();
        let id = gate.submit(write("notes.txt"));
        let still_pending = gate.submit(write("other.txt"));
        gate.cancel(&id);

        assert_eq!(gate.clear_completed(), 1);
        assert!(gate.completed().is_empty());
        assert!(gate.get(&id).is_none());
        assert!(gate.result(&id).is_none());
        assert!(gate.get(&still_pending).is_some());
    }

    #[test]
    fn test_clear_completed_can_retain_results() {
        let (gate, _rx) = gate_with(GateOptions::default().retaining_results());
        let id = gate.submit(write("notes.txt"));
        gate.cancel(&id);

        gate.clear_completed();
        assert!(gate.get(&id).is_none());
        assert!(gate.result(&id).is_some());
    }

    #[tokio::test]
    async fn test_reap_expired_cancels_overdue_actions() {
        let (gate, _rx) = gate_with(GateOptions::default().with_pending_timeout(Duration::ZERO));
        let (id, waiter) = gate.submit_and_wait(write("notes.txt"));

        assert_eq!(gate.reap_expired(), vec![id.clone()]);
        let err = waiter.await.unwrap_err();
        assert_eq!(
            err,
            GateError::Cancelled {
                id: id.clone(),
                reason: CancelReason::Expired
            }
        );
        assert_eq!(
            gate.get(&id).unwrap().cancel_reason,
            Some(CancelReason::Expired)
        );
        assert!(gate.reap_expired().is_empty());
    }

    #[test]
    fn test_reap_expired_without_timeout_is_noop() {
        let (gate, _rx) = gate();
        gate.submit(write("notes.txt"));
        assert!(gate.reap_expired().is_empty());
        assert_eq!(gate.pending().len(), 1);
    }

    #[tokio::test]
    async fn test_dropping_gate_closes_waiters() {
        let (gate, _rx) = gate();
        let (_, waiter) = gate.submit_and_wait(write("notes.txt"));
        drop(gate);
        assert_eq!(waiter.await.unwrap_err(), GateError::Closed);
    }

    #[test]
    fn test_events_follow_lifecycle() {
        let (gate, _rx) = gate();
        let mut events = gate.subscribe();
        let id = gate.submit(write("notes.txt"));
        gate.confirm(&id, None).unwrap();
        gate.complete_action(&id, ActionResult::ok());
        gate.clear_completed();

        assert_eq!(
            events.try_recv().unwrap(),
            GateEvent::Submitted {
                id: id.clone(),
                severity: Severity::Low
            }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            GateEvent::Executing { id: id.clone() }
        );
        assert_eq!(
            events.try_recv().unwrap(),
            GateEvent::Finished {
                id,
                status: ActionStatus::Completed
            }
        );
        assert_eq!(events.try_recv().unwrap(), GateEvent::Cleared { count: 1 });
    }

    #[test]
    fn test_snapshot_is_consistent() {
        let (gate, _rx) = gate();
        let a = gate.submit(write("a.txt"));
        let b = gate.submit(write("b.txt"));
        gate.confirm(&a, None).unwrap();
        gate.cancel(&b);

        let snapshot = gate.snapshot();
        assert!(snapshot.enabled);
        assert!(snapshot.pending.is_empty());
        assert_eq!(snapshot.executing.len(), 1);
        assert_eq!(snapshot.completed.len(), 1);
    }
}
