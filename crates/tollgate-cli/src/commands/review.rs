//! Review command - walk an operator through submitted actions.
//!
//! Each line of the input file is one submission:
//!
//! ```json
//! {"type": "write-file", "parameters": {"filePath": ".env", "content": "X=1"}, "requestId": "r-1"}
//! ```
//!
//! Confirmed actions are handed to a dry-run executor that records a
//! result without performing anything.

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use colored::Colorize;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use serde::Deserialize;
use tokio::sync::broadcast::error::RecvError;
use tollgate_approval::{
    ActionCandidate, ActionId, ActionResult, CONFIRMATION_PHRASE, ChannelExecutor, ConfirmOutcome,
    ConfirmationGate, GateOptions, PendingAction,
};
use tracing::{debug, info};

use crate::theme::Theme;

const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// One line of a submission file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Submission {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    parameters: serde_json::Value,
    #[serde(default)]
    request_id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl Submission {
    fn into_candidate(self) -> ActionCandidate {
        let mut candidate = ActionCandidate::from_json_object(self.kind.as_str(), &self.parameters);
        candidate.original_request = Some(self.parameters);
        candidate.request_id = self.request_id;
        candidate.title = self.title;
        candidate.description = self.description;
        candidate
    }
}

/// Parse a JSON-lines submission file. Blank lines and `#` comments are skipped.
pub(crate) fn read_submissions(path: &Path) -> anyhow::Result<Vec<Submission>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(|(index, line)| {
            serde_json::from_str(line).with_context(|| {
                format!("{}:{}: invalid submission", path.display(), index.saturating_add(1))
            })
        })
        .collect()
}

fn dry_run(action: &PendingAction) -> ActionResult {
    ActionResult::success(format!("dry run: {} not performed", action.kind))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Confirm,
    Cancel,
    Skip,
}

impl Decision {
    const ALL: [Self; 3] = [Self::Confirm, Self::Cancel, Self::Skip];

    fn label(self) -> &'static str {
        match self {
            Self::Confirm => "Confirm",
            Self::Cancel => "Cancel",
            Self::Skip => "Skip for now",
        }
    }
}

/// Submit every line of `file` and review the resulting pending actions.
pub(crate) async fn run_review(file: &Path, options: GateOptions) -> anyhow::Result<()> {
    let submissions = read_submissions(file)?;
    if submissions.is_empty() {
        println!("{}", Theme::info("No submissions found"));
        return Ok(());
    }

    let (executor, mut handed_off) = ChannelExecutor::new();
    let gate = Arc::new(ConfirmationGate::new(options, Arc::new(executor)));
    let mut events = gate.subscribe();

    let worker = {
        let gate = Arc::clone(&gate);
        tokio::spawn(async move {
            while let Some(action) = handed_off.recv().await {
                gate.complete_action(&action.id, dry_run(&action));
            }
        })
    };

    for submission in submissions {
        let (id, waiter) = gate.submit_and_wait(submission.into_candidate());
        tokio::spawn(async move {
            match waiter.await {
                Ok(_) => debug!(action_id = %id, "originator notified: confirmed"),
                Err(e) => debug!(action_id = %id, error = %e, "originator notified"),
            }
        });
    }

    review_pending(&gate)?;

    while !gate.executing().is_empty() {
        match tokio::time::timeout(DRAIN_TIMEOUT, events.recv()).await {
            Ok(Ok(_) | Err(RecvError::Lagged(_))) => {},
            Ok(Err(RecvError::Closed)) | Err(_) => break,
        }
    }
    worker.abort();

    print_summary(&gate);
    Ok(())
}

fn review_pending(gate: &ConfirmationGate) -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();
    let mut skipped: HashSet<ActionId> = HashSet::new();

    loop {
        for id in gate.reap_expired() {
            println!("{}", Theme::warning(&format!("{id} expired awaiting confirmation")));
        }

        let pending = gate.pending();
        let remaining = pending.iter().filter(|a| !skipped.contains(&a.id)).count();
        let Some(action) = pending.into_iter().find(|a| !skipped.contains(&a.id)) else {
            break;
        };

        println!("\n{}", Theme::action_box(&action));
        let labels: Vec<&str> = Decision::ALL.iter().map(|d| d.label()).collect();
        let selection = Select::with_theme(&theme)
            .with_prompt(format!("{remaining} pending"))
            .items(&labels)
            .default(0)
            .interact()?;

        match Decision::ALL.get(selection).copied().unwrap_or(Decision::Skip) {
            Decision::Confirm => confirm_action(gate, &action, &theme)?,
            Decision::Cancel => {
                gate.cancel(&action.id);
                println!("{}", Theme::warning("Cancelled"));
            },
            Decision::Skip => {
                skipped.insert(action.id.clone());
            },
        }
    }

    Ok(())
}

fn confirm_action(
    gate: &ConfirmationGate,
    action: &PendingAction,
    theme: &ColorfulTheme,
) -> anyhow::Result<()> {
    let phrase = if action.requires_enhanced_confirmation() {
        let typed: String = Input::with_theme(theme)
            .with_prompt(format!(
                "{} action. Type {CONFIRMATION_PHRASE} to proceed",
                Theme::severity(action.severity)
            ))
            .allow_empty(true)
            .interact_text()?;
        Some(typed).filter(|s| !s.is_empty())
    } else {
        None
    };

    match gate.confirm(&action.id, phrase.as_deref()) {
        Ok(ConfirmOutcome::Executing) => {
            info!(action_id = %action.id, "operator confirmed action");
            println!("{}", Theme::success("Confirmed"));
        },
        Ok(ConfirmOutcome::ExecutorFailed { error }) => {
            println!("{}", Theme::error(&format!("Executor failed: {error}")));
        },
        Ok(ConfirmOutcome::Ignored { .. }) => {
            println!("{}", Theme::warning("Action is no longer pending"));
        },
        Err(e) if e.is_phrase_rejection() => {
            println!("{}", Theme::error(&e.to_string()));
        },
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

fn print_summary(gate: &ConfirmationGate) {
    let snapshot = gate.snapshot();

    println!("\n{}", Theme::header("Review summary"));
    println!("{}", Theme::separator());
    for action in &snapshot.completed {
        let detail = gate
            .result(&action.id)
            .and_then(|r| r.result.or(r.error))
            .unwrap_or_default();
        println!(
            "{:>10}  {}  {}",
            Theme::status(action.status),
            action.title,
            detail.dimmed()
        );
    }
    if !snapshot.executing.is_empty() {
        println!(
            "{}",
            Theme::warning(&format!("{} still executing", snapshot.executing.len()))
        );
    }
    if !snapshot.pending.is_empty() {
        println!(
            "{}",
            Theme::info(&format!("{} left pending", snapshot.pending.len()))
        );
    }
    println!();
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tollgate_approval::ActionKind;

    use super::*;

    #[test]
    fn test_read_submissions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# queued by the assistant").unwrap();
        writeln!(
            file,
            r#"{{"type": "write-file", "parameters": {{"filePath": ".env"}}, "requestId": "r-1"}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"type": "run_shell_command", "parameters": {{"command": "ls"}}}}"#).unwrap();

        let submissions = read_submissions(file.path()).unwrap();
        assert_eq!(submissions.len(), 2);

        let mut candidates = submissions.into_iter().map(Submission::into_candidate);
        let first = candidates.next().unwrap();
        assert_eq!(first.kind, ActionKind::WriteFile);
        assert_eq!(first.request_id.as_deref(), Some("r-1"));
        assert_eq!(first.parameters[0].name, "filePath");
        let second = candidates.next().unwrap();
        assert_eq!(second.kind, ActionKind::RunShellCommand);
    }

    #[test]
    fn test_read_submissions_reports_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"type": "write-file"}}"#).unwrap();
        writeln!(file, "not json").unwrap();

        let err = read_submissions(file.path()).unwrap_err();
        assert!(format!("{err}").ends_with(":2: invalid submission"), "{err}");
    }

    #[test]
    fn test_dry_run_result() {
        let action = PendingAction::from_candidate(ActionCandidate::new("install-package"));
        let result = dry_run(&action);
        assert!(result.success);
        assert_eq!(
            result.result.as_deref(),
            Some("dry run: install-package not performed")
        );
    }
}
