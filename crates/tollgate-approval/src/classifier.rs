//! Risk classification for proposed actions.
//!
//! Classification is pure: the same kind and parameters always produce the
//! same [`Classification`]. Substring rules live in the predicate tables at
//! the top of this module so they can be reviewed and tested on their own.
//!
//! Warnings are advisory. They never change the severity; severity alone
//! decides how much confirmation friction the gate applies.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tollgate_core::Severity;

use crate::action::{ActionKind, ActionParameter};

/// Path fragments that mark a write as touching configuration or secrets.
pub const SENSITIVE_PATH_FRAGMENTS: &[&str] = &["package.json", ".env", "config"];

/// File extensions treated as source code.
pub const SOURCE_EXTENSIONS: &[&str] = &[
    "js", "jsx", "mjs", "cjs", "ts", "tsx", "py", "rs", "go", "java", "rb", "php", "c", "h", "cpp",
    "hpp", "cs", "swift", "kt", "vue", "svelte",
];

/// Command tokens that mark a shell command as destructive or privileged.
pub const DESTRUCTIVE_COMMAND_TOKENS: &[&str] = &["rm", "delete", "sudo"];

/// Command tokens that mark a shell command as invoking package or VCS tooling.
pub const TOOLING_COMMAND_TOKENS: &[&str] = &["git", "npm"];

/// Tokens that mark a parameter name or value as credential-like.
pub const CREDENTIAL_TOKENS: &[&str] = &["password", "token", "key", "secret", "auth"];

/// Resources an install touches.
const INSTALL_AFFECTS: &[&str] = &["package.json", "package-lock.json", "node_modules/"];

const PATH_PARAMS: &[&str] = &["filePath", "file_path", "path"];
const PACKAGE_PARAMS: &[&str] = &["packageName", "package_name", "package", "name"];
const COMMAND_PARAMS: &[&str] = &["command", "cmd"];

/// Level of an advisory security warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningLevel {
    /// Worth a look.
    Warning,
    /// Likely to cause harm if the operator is not careful.
    Danger,
    /// Almost certainly harmful unless intended.
    Critical,
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warning => f.write_str("warning"),
            Self::Danger => f.write_str("danger"),
            Self::Critical => f.write_str("critical"),
        }
    }
}

/// Advisory text shown next to an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityWarning {
    /// How serious the warning is.
    pub level: WarningLevel,
    /// What the operator should know.
    pub message: String,
    /// What the operator should check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

impl SecurityWarning {
    /// Create a warning without a recommendation.
    #[must_use]
    pub fn new(level: WarningLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            recommendation: None,
        }
    }

    /// Add a recommendation.
    #[must_use]
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

/// What an action touches and whether it can be undone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionImpact {
    /// Short natural-language description.
    pub description: String,
    /// Resources affected.
    pub affects: Vec<String>,
    /// Whether the effect can be undone.
    pub reversible: bool,
    /// Severity of the action.
    pub risk_level: Severity,
}

/// Output of [`classify`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    /// Severity driving confirmation friction.
    pub severity: Severity,
    /// Impact description.
    pub impact: ActionImpact,
    /// Advisory warnings.
    pub warnings: Vec<SecurityWarning>,
}

impl Classification {
    /// Whether any warning is at `critical` level.
    #[must_use]
    pub fn has_critical_warning(&self) -> bool {
        self.warnings
            .iter()
            .any(|w| w.level == WarningLevel::Critical)
    }
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let haystack = haystack.to_lowercase();
    needles.iter().any(|n| haystack.contains(n))
}

/// Whether a path names a manifest, env file or configuration file.
#[must_use]
pub fn is_sensitive_path(path: &str) -> bool {
    contains_any(path, SENSITIVE_PATH_FRAGMENTS)
}

/// Whether a path's extension marks it as source code.
#[must_use]
pub fn is_source_file(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            let ext = ext.to_ascii_lowercase();
            SOURCE_EXTENSIONS.contains(&ext.as_str())
        })
}

/// Whether a command contains a destructive or privileged token.
///
/// Matching is by substring, so `"rm"` also matches inside longer words.
#[must_use]
pub fn is_destructive_command(command: &str) -> bool {
    contains_any(command, DESTRUCTIVE_COMMAND_TOKENS)
}

/// Whether a command invokes package or VCS tooling.
#[must_use]
pub fn is_tooling_command(command: &str) -> bool {
    contains_any(command, TOOLING_COMMAND_TOKENS)
}

/// Whether a parameter looks like it carries a credential.
#[must_use]
pub fn is_sensitive_parameter(name: &str, value: &serde_json::Value) -> bool {
    contains_any(name, CREDENTIAL_TOKENS)
        || value
            .as_str()
            .is_some_and(|s| contains_any(s, CREDENTIAL_TOKENS))
}

fn lookup<'a>(params: &'a [ActionParameter], names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| params.iter().find(|p| p.name == *name))
        .and_then(ActionParameter::as_str)
}

/// Severity for an action, per kind.
#[must_use]
pub fn severity(kind: &ActionKind, params: &[ActionParameter]) -> Severity {
    match kind {
        ActionKind::WriteFile => match lookup(params, PATH_PARAMS) {
            Some(path) if is_sensitive_path(path) => Severity::High,
            Some(path) if is_source_file(path) => Severity::Medium,
            _ => Severity::Low,
        },
        ActionKind::InstallPackage => Severity::High,
        ActionKind::RunShellCommand => match lookup(params, COMMAND_PARAMS) {
            Some(cmd) if is_destructive_command(cmd) => Severity::Critical,
            Some(cmd) if is_tooling_command(cmd) => Severity::Medium,
            _ => Severity::Low,
        },
        ActionKind::Other(_) => Severity::Medium,
    }
}

/// Advisory warnings for an action.
#[must_use]
pub fn warnings(kind: &ActionKind, params: &[ActionParameter]) -> Vec<SecurityWarning> {
    let mut out = Vec::new();

    match kind {
        ActionKind::WriteFile => {
            let path = lookup(params, PATH_PARAMS).unwrap_or_default().to_lowercase();
            if path.contains(".env") {
                out.push(
                    SecurityWarning::new(
                        WarningLevel::Critical,
                        "Writing to an environment file that may hold secrets",
                    )
                    .with_recommendation(
                        "Check the content for API keys, passwords or tokens before confirming",
                    ),
                );
            }
            if path.contains("package.json") {
                out.push(
                    SecurityWarning::new(WarningLevel::Warning, "Modifying the package manifest")
                        .with_recommendation("Review dependency and script changes"),
                );
            }
            if path.contains("config") {
                out.push(
                    SecurityWarning::new(WarningLevel::Warning, "Modifying a configuration file")
                        .with_recommendation("Make sure the change does not break the build"),
                );
            }
        },
        ActionKind::InstallPackage => {
            out.push(
                SecurityWarning::new(
                    WarningLevel::Warning,
                    "Installing third-party code may introduce supply-chain risk",
                )
                .with_recommendation("Verify the package name, publisher and download count"),
            );
        },
        ActionKind::RunShellCommand => {
            let command = lookup(params, COMMAND_PARAMS).unwrap_or_default().to_lowercase();
            out.push(
                SecurityWarning::new(
                    WarningLevel::Warning,
                    "Shell commands run with the permissions of the current user",
                )
                .with_recommendation("Read the full command before confirming"),
            );
            if command.contains("rm") {
                out.push(
                    SecurityWarning::new(WarningLevel::Critical, "Command may permanently delete files")
                        .with_recommendation("Double-check the target paths"),
                );
            }
            if command.contains("sudo") {
                out.push(
                    SecurityWarning::new(WarningLevel::Danger, "Command requests elevated privileges")
                        .with_recommendation("Run without sudo unless root access is required"),
                );
            }
        },
        ActionKind::Other(label) => {
            out.push(SecurityWarning::new(
                WarningLevel::Warning,
                format!("Unrecognized action type '{label}'"),
            ));
        },
    }

    if params.iter().any(|p| p.sensitive) {
        out.push(
            SecurityWarning::new(
                WarningLevel::Danger,
                "Parameters appear to contain credentials",
            )
            .with_recommendation("Make sure secrets are not written to disk or logs"),
        );
    }

    out
}

/// Impact description for an action.
#[must_use]
pub fn impact(kind: &ActionKind, params: &[ActionParameter], risk_level: Severity) -> ActionImpact {
    let (description, affects, reversible) = match kind {
        ActionKind::WriteFile => {
            let path = lookup(params, PATH_PARAMS).unwrap_or("a file");
            (
                format!("Creates or overwrites {path}"),
                vec![path.to_string()],
                true,
            )
        },
        ActionKind::InstallPackage => {
            let package = lookup(params, PACKAGE_PARAMS).unwrap_or("a package");
            (
                format!("Adds {package} to the project's dependencies"),
                INSTALL_AFFECTS.iter().map(ToString::to_string).collect(),
                true,
            )
        },
        ActionKind::RunShellCommand => {
            let command = lookup(params, COMMAND_PARAMS).unwrap_or("a command");
            (
                format!("Runs `{command}` in a shell"),
                vec!["shell environment".to_string()],
                false,
            )
        },
        ActionKind::Other(label) => (
            format!("Performs a '{label}' action"),
            Vec::new(),
            false,
        ),
    };

    ActionImpact {
        description,
        affects,
        reversible,
        risk_level,
    }
}

/// Classify an action. Never fails; unknown kinds get `medium` severity.
#[must_use]
pub fn classify(kind: &ActionKind, params: &[ActionParameter]) -> Classification {
    let severity = severity(kind, params);
    Classification {
        severity,
        impact: impact(kind, params, severity),
        warnings: warnings(kind, params),
    }
}

/// Default title and description for an action.
#[must_use]
pub fn describe(kind: &ActionKind, params: &[ActionParameter]) -> (String, String) {
    match kind {
        ActionKind::WriteFile => (
            "Write file".to_string(),
            format!("Write to {}", lookup(params, PATH_PARAMS).unwrap_or("<unspecified path>")),
        ),
        ActionKind::InstallPackage => (
            "Install package".to_string(),
            format!(
                "Install {}",
                lookup(params, PACKAGE_PARAMS).unwrap_or("<unspecified package>")
            ),
        ),
        ActionKind::RunShellCommand => (
            "Run shell command".to_string(),
            format!(
                "Run: {}",
                lookup(params, COMMAND_PARAMS).unwrap_or("<unspecified command>")
            ),
        ),
        ActionKind::Other(label) => (
            format!("Perform {label}"),
            format!("Perform '{label}' with {} parameter(s)", params.len()),
        ),
    }
}
