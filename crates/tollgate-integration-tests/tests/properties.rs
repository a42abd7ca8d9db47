//! Randomized operation sequences against the gate.

#![allow(clippy::arithmetic_side_effects)]

mod common;

use std::collections::{HashMap, HashSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tollgate_approval::{
    ActionCandidate, ActionId, ActionResult, ActionStatus, CONFIRMATION_PHRASE, GateOptions,
    classifier,
};
use tollgate_core::Severity;
use tollgate_test::{
    critical_action, credential_action, high_action, install_package, low_action, medium_action,
    shell_command, test_gate_with, write_file,
};

const SEEDS: [u64; 4] = [1, 7, 42, 2024];
const STEPS: usize = 400;

fn random_candidate(rng: &mut StdRng) -> ActionCandidate {
    match rng.gen_range(0..8) {
        0 => low_action(),
        1 => medium_action(),
        2 => high_action(),
        3 => critical_action(),
        4 => credential_action(),
        5 => install_package("left-pad"),
        6 => shell_command("git status"),
        _ => ActionCandidate::new("send-email").with_param("to", "ops@example.com"),
    }
}

#[test]
fn partitions_stay_exclusive_and_transitions_monotonic() {
    for seed in SEEDS {
        let mut rng = StdRng::seed_from_u64(seed);
        let (gate, executor) = test_gate_with(GateOptions::default());
        let mut known: Vec<ActionId> = Vec::new();
        let mut last_status: HashMap<ActionId, ActionStatus> = HashMap::new();
        let mut cleared: HashSet<ActionId> = HashSet::new();

        for step in 0..STEPS {
            let target = known.choose(&mut rng).cloned();
            match (rng.gen_range(0..10), target) {
                (0..=2, _) | (_, None) => known.push(gate.submit(random_candidate(&mut rng))),
                (3..=4, Some(id)) => {
                    let phrase = rng.gen_bool(0.5).then_some(CONFIRMATION_PHRASE);
                    let _ = gate.confirm(&id, phrase);
                },
                (5, Some(id)) => {
                    let _ = gate.confirm(&id, Some("wrong"));
                },
                (6, Some(id)) => {
                    gate.cancel(&id);
                },
                (7..=8, Some(id)) => {
                    let result = if rng.gen_bool(0.7) {
                        ActionResult::ok()
                    } else {
                        ActionResult::failure("boom")
                    };
                    gate.complete_action(&id, result);
                },
                (_, Some(_)) => {
                    let before: HashSet<ActionId> =
                        gate.completed().into_iter().map(|a| a.id).collect();
                    gate.clear_completed();
                    cleared.extend(before);
                },
            }

            let snapshot = gate.snapshot();
            let present = common::assert_partitions_consistent(&snapshot);

            for id in &cleared {
                assert!(!present.contains(id), "seed {seed} step {step}: {id} reappeared");
            }

            for action in snapshot
                .pending
                .iter()
                .chain(&snapshot.executing)
                .chain(&snapshot.completed)
            {
                if let Some(previous) = last_status.get(&action.id)
                    && previous.is_terminal()
                {
                    assert_eq!(
                        *previous, action.status,
                        "seed {seed} step {step}: {} left a terminal status",
                        action.id
                    );
                }
                last_status.insert(action.id.clone(), action.status);
            }
        }

        let dispatched: HashSet<ActionId> = executor.dispatched_ids().into_iter().collect();
        assert_eq!(dispatched.len(), executor.count(), "seed {seed}: double dispatch");
    }
}

#[test]
fn enhanced_actions_never_dispatch_without_phrase() {
    let mut rng = StdRng::seed_from_u64(99);
    let (gate, executor) = test_gate_with(GateOptions::default());

    for _ in 0..200 {
        let id = gate.submit(random_candidate(&mut rng));
        let severity = gate.get(&id).unwrap().severity;
        let attempt = gate.confirm(&id, None);

        if severity >= Severity::High {
            assert!(attempt.is_err());
            assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Pending);
            assert!(!executor.dispatched_ids().contains(&id));
        } else {
            assert!(attempt.is_ok());
            assert_eq!(gate.get(&id).unwrap().status, ActionStatus::Executing);
        }
    }
}

#[test]
fn classification_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(5);
    let alphabet = ["rm", "git", "npm", ".env", "config", "src/", ".ts", "ls", "sudo", "x"];

    for _ in 0..300 {
        let parts: Vec<&str> = (0..rng.gen_range(1..4))
            .map(|_| *alphabet.choose(&mut rng).unwrap_or(&"x"))
            .collect();
        let text = parts.join(" ");

        for candidate in [write_file(&text), shell_command(&text), install_package(&text)] {
            let first = classifier::classify(&candidate.kind, &candidate.parameters);
            let second = classifier::classify(&candidate.kind, &candidate.parameters);
            assert_eq!(first, second);
        }

        let shell = shell_command(&text);
        let severity = classifier::severity(&shell.kind, &shell.parameters);
        if text.contains("rm") {
            assert_eq!(severity, Severity::Critical, "{text}");
        }
        let install = install_package(&text);
        assert_eq!(
            classifier::severity(&install.kind, &install.parameters),
            Severity::High
        );
    }
}
