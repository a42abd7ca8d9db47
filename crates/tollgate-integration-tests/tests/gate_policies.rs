//! Disabled gates, expiry, retention and executor failures.

#![allow(clippy::arithmetic_side_effects)]

mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tollgate_approval::{
    ActionStatus, CancelReason, ConfirmOutcome, ConfirmationGate, GateError, GateEvent,
    GateOptions, TransitionOutcome,
};
use tollgate_test::{
    FailingExecutor, PanickingExecutor, critical_action, high_action, init_test_tracing,
    low_action, medium_action, test_gate, test_gate_with,
};

#[tokio::test]
async fn disabled_gate_is_transparent_for_new_work() {
    init_test_tracing();
    let (gate, executor) = test_gate_with(GateOptions::default().with_enabled(false));

    let (id, waiter) = gate.submit_and_wait(critical_action());
    assert!(gate.pending().is_empty());
    assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Executing);
    assert_eq!(executor.dispatched_ids(), vec![id]);
    assert!(waiter.await.unwrap());
}

#[test]
fn toggling_does_not_release_pending_work() {
    let (gate, executor) = test_gate();
    let held = gate.submit(medium_action());
    gate.set_enabled(false);
    let passed = gate.submit(low_action());

    assert_eq!(common::pending_ids(&gate), vec![held.clone()]);
    assert_eq!(executor.dispatched_ids(), vec![passed]);

    gate.set_enabled(true);
    assert!(gate.is_enabled());
    assert_eq!(gate.confirm(&held, None).unwrap(), ConfirmOutcome::Executing);
    assert_eq!(executor.count(), 2);
}

#[tokio::test]
async fn overdue_actions_expire() {
    let (gate, executor) =
        test_gate_with(GateOptions::default().with_pending_timeout(Duration::from_millis(20)));
    let (id, waiter) = gate.submit_and_wait(high_action());

    assert!(gate.reap_expired().is_empty());
    tokio::time::sleep(Duration::from_millis(40)).await;
    assert_eq!(gate.reap_expired(), vec![id.clone()]);

    let err = waiter.await.unwrap_err();
    assert_eq!(
        err,
        GateError::Cancelled {
            id: id.clone(),
            reason: CancelReason::Expired
        }
    );
    let row = gate.result(&id).unwrap();
    assert!(!row.success);
    assert_eq!(row.error.as_deref(), Some("expired awaiting confirmation"));
    assert_eq!(executor.count(), 0);
}

#[test]
fn clear_completed_policy() {
    let (dropping, _) = test_gate();
    let (retaining, _) = test_gate_with(GateOptions::default().retaining_results());

    for gate in [&dropping, &retaining] {
        let id = gate.submit(low_action());
        gate.cancel(&id);
        assert_eq!(gate.clear_completed(), 1);
        assert!(gate.completed().is_empty());
        assert!(gate.get(&id).is_none());
    }

    let id = dropping.submit(low_action());
    dropping.cancel(&id);
    dropping.clear_completed();
    assert!(dropping.result(&id).is_none());

    let id = retaining.submit(low_action());
    retaining.cancel(&id);
    retaining.clear_completed();
    assert!(retaining.result(&id).is_some());
}

#[test]
fn clear_completed_leaves_live_actions() {
    let (gate, _) = test_gate();
    let pending = gate.submit(low_action());
    let executing = gate.submit(low_action());
    gate.confirm(&executing, None).unwrap();
    let cancelled = gate.submit(low_action());
    gate.cancel(&cancelled);

    assert_eq!(gate.clear_completed(), 1);
    assert_eq!(gate.get(&pending).unwrap().status, ActionStatus::Pending);
    assert_eq!(gate.get(&executing).unwrap().status, ActionStatus::Executing);
}

#[test]
fn failing_executor_marks_action_failed() {
    let gate = ConfirmationGate::new(
        GateOptions::default(),
        Arc::new(FailingExecutor::new("no sandbox available")),
    );
    let id = gate.submit(low_action());

    let outcome = gate.confirm(&id, None).unwrap();
    assert_eq!(
        outcome,
        ConfirmOutcome::ExecutorFailed {
            error: "no sandbox available".to_owned()
        }
    );
    assert!(gate.executing().is_empty());
    assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Failed);
    assert_eq!(
        gate.result(&id).unwrap().error.as_deref(),
        Some("no sandbox available")
    );
}

#[test]
fn panicking_executor_does_not_poison_gate() {
    let gate = ConfirmationGate::new(GateOptions::default(), Arc::new(PanickingExecutor));
    let first = gate.submit(low_action());
    let second = gate.submit(low_action());

    assert!(matches!(
        gate.confirm(&first, None).unwrap(),
        ConfirmOutcome::ExecutorFailed { .. }
    ));
    assert_eq!(gate.get(&first).unwrap().status, ActionStatus::Failed);

    assert_eq!(gate.cancel(&second), TransitionOutcome::Applied);
    assert_eq!(gate.completed().len(), 2);
}

#[test]
fn bypass_with_failing_executor_records_failure() {
    let gate = ConfirmationGate::new(
        GateOptions::default().with_enabled(false),
        Arc::new(FailingExecutor::new("offline")),
    );
    let id = gate.submit(low_action());
    assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Failed);
    assert_eq!(gate.result(&id).unwrap().error.as_deref(), Some("offline"));
}

#[test]
fn racing_confirm_and_cancel_has_one_winner() {
    let (gate, executor) = test_gate();
    let ids: Vec<_> = (0..64).map(|_| gate.submit(low_action())).collect();

    let confirmer = {
        let gate = Arc::clone(&gate);
        let ids = ids.clone();
        thread::spawn(move || {
            ids.iter()
                .filter(|id| gate.confirm(id, None).unwrap() == ConfirmOutcome::Executing)
                .count()
        })
    };
    let canceller = {
        let gate = Arc::clone(&gate);
        let ids = ids.clone();
        thread::spawn(move || {
            ids.iter()
                .rev()
                .filter(|id| gate.cancel(id) == TransitionOutcome::Applied)
                .count()
        })
    };

    let confirmed = confirmer.join().unwrap();
    let cancelled = canceller.join().unwrap();
    assert_eq!(confirmed + cancelled, ids.len());
    assert_eq!(executor.count(), confirmed);
    assert_eq!(gate.executing().len(), confirmed);
    assert_eq!(gate.completed().len(), cancelled);
    common::assert_partitions_consistent(&gate.snapshot());
}

#[tokio::test]
async fn waiter_table_is_released_on_settlement() {
    let (gate, _) = test_gate();
    let mut waiters = Vec::new();
    for _ in 0..10 {
        waiters.push(gate.submit_and_wait(low_action()));
    }
    assert_eq!(gate.waiting_count(), 10);

    for (i, (id, _)) in waiters.iter().enumerate() {
        if i % 2 == 0 {
            gate.confirm(id, None).unwrap();
        } else {
            gate.cancel(id);
        }
    }
    assert_eq!(gate.waiting_count(), 0);

    for (i, (_, waiter)) in waiters.into_iter().enumerate() {
        let outcome = waiter.await;
        assert_eq!(outcome.is_ok(), i % 2 == 0);
    }
}

#[tokio::test]
async fn abandoned_waiter_does_not_block_settlement() {
    let (gate, _) = test_gate();
    let (id, waiter) = gate.submit_and_wait(low_action());
    drop(waiter);
    assert_eq!(gate.cancel(&id), TransitionOutcome::Applied);
    assert_eq!(gate.waiting_count(), 0);
}

#[tokio::test]
async fn events_reach_subscribers() {
    let (gate, _) = test_gate();
    let mut events = gate.subscribe();
    let id = gate.submit(low_action());
    gate.cancel(&id);

    assert!(matches!(
        events.recv().await.unwrap(),
        GateEvent::Submitted { .. }
    ));
    assert_eq!(
        events.recv().await.unwrap(),
        GateEvent::Cancelled {
            id,
            reason: CancelReason::User
        }
    );
}
