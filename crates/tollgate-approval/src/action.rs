//! Proposed actions and their lifecycle.
//!
//! An [`ActionCandidate`] is what the originator submits. The gate stamps it
//! with a classification and turns it into a [`PendingAction`], which then
//! moves through the [`ActionStatus`] state machine.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tollgate_core::{Severity, Timestamp};
use uuid::Uuid;

use crate::classifier::{self, ActionImpact, SecurityWarning};

/// Unique identifier for a submitted action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionId(pub Uuid);

impl ActionId {
    /// Create a new random action ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "action-{}", self.0)
    }
}

impl FromStr for ActionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.strip_prefix("action-").unwrap_or(s);
        Uuid::parse_str(raw).map(Self)
    }
}

/// The kind of side effect an action performs.
///
/// Unknown kinds are carried verbatim in [`ActionKind::Other`] so that new
/// tool calls flow through the gate without a code change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActionKind {
    /// Write (create or overwrite) a file.
    WriteFile,
    /// Install a package into the project's dependency graph.
    InstallPackage,
    /// Execute a shell command.
    RunShellCommand,
    /// Any other action type.
    Other(String),
}

impl ActionKind {
    /// Parse an action type label. Never fails.
    #[must_use]
    pub fn parse(label: &str) -> Self {
        let normalized = label.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "write-file" => Self::WriteFile,
            "install-package" => Self::InstallPackage,
            "run-shell-command" => Self::RunShellCommand,
            _ => Self::Other(label.trim().to_string()),
        }
    }

    /// The canonical label for this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::WriteFile => "write-file",
            Self::InstallPackage => "install-package",
            Self::RunShellCommand => "run-shell-command",
            Self::Other(label) => label,
        }
    }
}

impl From<String> for ActionKind {
    fn from(label: String) -> Self {
        Self::parse(&label)
    }
}

impl From<&str> for ActionKind {
    fn from(label: &str) -> Self {
        Self::parse(label)
    }
}

impl From<ActionKind> for String {
    fn from(kind: ActionKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A named argument of an action.
///
/// `value_type` and `sensitive` are always derived from the name and value,
/// including when deserializing; supplied values for them are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawParameter")]
pub struct ActionParameter {
    /// Parameter name as supplied by the originator.
    pub name: String,
    /// Parameter value.
    pub value: serde_json::Value,
    /// JSON kind of the value (`string`, `number`, ...).
    #[serde(rename = "type")]
    pub value_type: String,
    /// Whether the name or value looks like a credential.
    pub sensitive: bool,
    /// Optional human-readable description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ActionParameter {
    /// Build a parameter, deriving its type and sensitivity.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        let name = name.into();
        let value = value.into();
        let sensitive = classifier::is_sensitive_parameter(&name, &value);
        Self {
            value_type: json_kind(&value).to_string(),
            name,
            value,
            sensitive,
            description: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The value as a string slice, if it is a JSON string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.value.as_str()
    }

    /// Value suitable for display; sensitive values are masked.
    #[must_use]
    pub fn display_value(&self) -> String {
        if self.sensitive {
            return "********".to_string();
        }
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Deserialize)]
struct RawParameter {
    name: String,
    #[serde(default)]
    value: serde_json::Value,
    #[serde(default)]
    description: Option<String>,
}

impl From<RawParameter> for ActionParameter {
    fn from(raw: RawParameter) -> Self {
        let param = Self::new(raw.name, raw.value);
        Self {
            description: raw.description,
            ..param
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// An action proposed by the originator, before classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCandidate {
    /// What the action does.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Ordered parameters.
    #[serde(default)]
    pub parameters: Vec<ActionParameter>,
    /// Correlation id from the originator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Opaque payload forwarded to the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_request: Option<serde_json::Value>,
    /// Title override; derived from the kind when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Description override; derived from the parameters when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ActionCandidate {
    /// Create a candidate with no parameters.
    #[must_use]
    pub fn new(kind: impl Into<ActionKind>) -> Self {
        Self {
            kind: kind.into(),
            parameters: Vec::new(),
            request_id: None,
            original_request: None,
            title: None,
            description: None,
        }
    }

    /// Build a candidate from a free-form JSON parameter bag.
    ///
    /// Non-object values yield a candidate without parameters.
    #[must_use]
    pub fn from_json_object(kind: impl Into<ActionKind>, params: &serde_json::Value) -> Self {
        let mut candidate = Self::new(kind);
        if let Some(map) = params.as_object() {
            candidate.parameters = map
                .iter()
                .map(|(name, value)| ActionParameter::new(name.clone(), value.clone()))
                .collect();
        }
        candidate
    }

    /// Append a parameter.
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.parameters.push(ActionParameter::new(name, value));
        self
    }

    /// Set the originator's correlation id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Attach the payload the executor needs.
    #[must_use]
    pub fn with_original_request(mut self, payload: serde_json::Value) -> Self {
        self.original_request = Some(payload);
        self
    }

    /// Override the derived title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Override the derived description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Lifecycle status of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Awaiting an operator decision.
    Pending,
    /// Approved; collapsed into `Executing` at handoff and never stored.
    Confirmed,
    /// Handed to the executor.
    Executing,
    /// Executor reported success.
    Completed,
    /// Executor reported failure, or the handoff itself failed.
    Failed,
    /// Cancelled before confirmation.
    Cancelled,
}

impl ActionStatus {
    /// Whether no further transition is possible.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether the state machine permits moving from `self` to `next`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Confirmed | Self::Executing | Self::Cancelled)
                | (Self::Confirmed, Self::Executing)
                | (Self::Executing, Self::Completed | Self::Failed)
        )
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Executing => "executing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

/// Why a pending action was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The operator cancelled it.
    User,
    /// It stayed pending longer than the configured timeout.
    Expired,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => f.write_str("cancelled by user"),
            Self::Expired => f.write_str("expired awaiting confirmation"),
        }
    }
}

/// A classified action tracked by the gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// Unique action id.
    pub id: ActionId,
    /// What the action does.
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Short summary.
    pub title: String,
    /// Longer summary.
    pub description: String,
    /// Ordered parameters.
    pub parameters: Vec<ActionParameter>,
    /// What the action touches.
    pub impact: ActionImpact,
    /// Advisory warnings.
    pub security_warnings: Vec<SecurityWarning>,
    /// Severity computed at submission.
    pub severity: Severity,
    /// Current lifecycle status.
    pub status: ActionStatus,
    /// When the action was submitted.
    pub created_at: Timestamp,
    /// When the action was handed to the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the action reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
    /// Set when `status` is `Cancelled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_reason: Option<CancelReason>,
    /// Correlation id from the originator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Opaque payload forwarded to the executor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_request: Option<serde_json::Value>,
}

impl PendingAction {
    /// Classify a candidate and build a fresh pending action with a new id.
    #[must_use]
    pub fn from_candidate(mut candidate: ActionCandidate) -> Self {
        for param in &mut candidate.parameters {
            param.sensitive = classifier::is_sensitive_parameter(&param.name, &param.value);
            param.value_type = json_kind(&param.value).to_string();
        }
        let classification = classifier::classify(&candidate.kind, &candidate.parameters);
        let (title, description) = classifier::describe(&candidate.kind, &candidate.parameters);
        Self {
            id: ActionId::new(),
            title: candidate.title.unwrap_or(title),
            description: candidate.description.unwrap_or(description),
            kind: candidate.kind,
            parameters: candidate.parameters,
            impact: classification.impact,
            security_warnings: classification.warnings,
            severity: classification.severity,
            status: ActionStatus::Pending,
            created_at: Timestamp::now(),
            started_at: None,
            finished_at: None,
            cancel_reason: None,
            request_id: candidate.request_id,
            original_request: candidate.original_request,
        }
    }

    /// Look up a parameter by name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&ActionParameter> {
        self.parameters.iter().find(|p| p.name == name)
    }

    /// Whether confirming this action needs the confirmation phrase.
    #[must_use]
    pub fn requires_enhanced_confirmation(&self) -> bool {
        self.severity.requires_enhanced_confirmation()
    }
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} - {}", self.severity, self.title, self.description)
    }
}
