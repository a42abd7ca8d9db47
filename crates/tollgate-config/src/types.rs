//! Configuration struct definitions.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Confirmation gate behaviour.
    pub gate: GateSection,
    /// Logging and tracing.
    pub logging: LoggingSection,
}

/// Confirmation gate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSection {
    /// Whether new submissions wait for an operator decision.
    pub enabled: bool,
    /// Seconds an action may stay pending before it is cancelled as expired.
    /// `None` waits forever.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_timeout_secs: Option<u64>,
    /// Keep result-ledger rows when completed actions are cleared.
    pub retain_results_on_clear: bool,
    /// Capacity of the gate event broadcast channel.
    pub event_capacity: usize,
}

impl Default for GateSection {
    fn default() -> Self {
        Self {
            enabled: true,
            pending_timeout_secs: None,
            retain_results_on_clear: false,
            event_capacity: 64,
        }
    }
}

/// Logging and tracing configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Global level filter (`"trace"`, `"debug"`, `"info"`, `"warn"`,
    /// `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, `"json"` or `"full"`.
    pub format: String,
    /// Per-crate directives such as `"tollgate_approval=debug"`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
