//! Classify command - show how an action would be presented.

use tollgate_approval::{ActionCandidate, PendingAction};

use crate::theme::Theme;

/// Classify an action and print it.
pub(crate) fn run_classify(kind: &str, params: &[(String, String)], json: bool) -> anyhow::Result<()> {
    let action = PendingAction::from_candidate(build_candidate(kind, params));

    if json {
        println!("{}", serde_json::to_string_pretty(&action)?);
        return Ok(());
    }

    println!("\n{}", Theme::action_box(&action));
    if action.requires_enhanced_confirmation() {
        println!(
            "{}",
            Theme::warning("Confirming this action requires the confirmation phrase")
        );
    }
    println!();
    Ok(())
}

pub(crate) fn build_candidate(kind: &str, params: &[(String, String)]) -> ActionCandidate {
    params
        .iter()
        .fold(ActionCandidate::new(kind), |candidate, (name, raw)| {
            candidate.with_param(name.clone(), parse_value(raw))
        })
}

/// Read a value as JSON when it parses, otherwise as a plain string.
fn parse_value(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_owned()))
}
