//! Tollgate Approval - human confirmation for side-effecting actions.
//!
//! An originator turns a proposed operation into an [`ActionCandidate`] and
//! submits it to a [`ConfirmationGate`]. The gate classifies it with a
//! [`Severity`](tollgate_core::Severity), security warnings and an impact
//! summary, then holds it in `pending` until an operator confirms or
//! cancels. Confirmed actions go to an [`ActionExecutor`], which later
//! reports back with an [`ActionResult`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tollgate_approval::{
//!     ActionCandidate, ActionResult, ActionStatus, ChannelExecutor, ConfirmationGate, GateOptions,
//!     CONFIRMATION_PHRASE,
//! };
//!
//! let (executor, mut handed_off) = ChannelExecutor::new();
//! let gate = ConfirmationGate::new(GateOptions::default(), Arc::new(executor));
//!
//! let id = gate.submit(ActionCandidate::new("write-file").with_param("filePath", ".env"));
//! assert!(gate.confirm(&id, None).is_err()); // high severity needs the phrase
//! gate.confirm(&id, Some(CONFIRMATION_PHRASE)).unwrap();
//!
//! let action = handed_off.try_recv().unwrap();
//! gate.complete_action(&action.id, ActionResult::success("written"));
//! assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Completed);
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod action;
pub mod classifier;
/// Error types and results for the gate.
pub mod error;
pub mod executor;
pub mod gate;
pub mod ledger;
pub mod registry;

pub use action::{
    ActionCandidate, ActionId, ActionKind, ActionParameter, ActionStatus, CancelReason,
    PendingAction,
};
pub use classifier::{ActionImpact, Classification, SecurityWarning, WarningLevel};
pub use error::{ExecutorError, GateError, GateResult};
pub use executor::{ActionExecutor, ChannelExecutor};
pub use gate::{
    CONFIRMATION_PHRASE, ConfirmOutcome, ConfirmationGate, GateEvent, GateOptions, GateSnapshot,
    PendingConfirmation, TransitionOutcome,
};
pub use ledger::{ActionOutput, ActionResult, ResultLedger};
pub use registry::{ActionRegistry, Partition, Transition, TransitionError};
