//! Shared assertions for integration tests.

use std::collections::HashSet;

use tollgate_approval::{ActionId, ConfirmationGate, GateSnapshot, Partition};

/// Assert every tracked id sits in exactly one partition and its status
/// belongs to that partition. Returns all ids seen.
#[allow(dead_code)]
pub fn assert_partitions_consistent(snapshot: &GateSnapshot) -> HashSet<ActionId> {
    let mut seen = HashSet::new();
    let partitions = [
        (Partition::Pending, &snapshot.pending),
        (Partition::Executing, &snapshot.executing),
        (Partition::Completed, &snapshot.completed),
    ];
    for (partition, actions) in partitions {
        for action in actions {
            assert!(
                seen.insert(action.id.clone()),
                "{} appears in more than one partition",
                action.id
            );
            assert_eq!(
                Partition::for_status(action.status),
                partition,
                "{} has status {} but sits in {partition}",
                action.id,
                action.status
            );
        }
    }
    seen
}

/// Ids currently in the pending partition.
#[allow(dead_code)]
pub fn pending_ids(gate: &ConfirmationGate) -> Vec<ActionId> {
    gate.pending().into_iter().map(|a| a.id).collect()
}
