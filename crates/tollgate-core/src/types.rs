//! Common types used throughout Tollgate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// A point in time (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Time elapsed since this timestamp.
    ///
    /// Timestamps in the future report zero.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.0)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

/// Risk severity of a proposed action.
///
/// Ordered from least to most dangerous. The gate uses it to decide how
/// much friction a confirmation needs.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Routine change with little blast radius.
    Low,
    /// Touches code or tooling; plain confirmation is enough.
    #[default]
    Medium,
    /// Touches configuration, secrets or dependencies.
    High,
    /// Destructive or privileged; may not be undoable.
    Critical,
}

impl Severity {
    /// Whether a confirmation must carry the literal confirmation phrase.
    #[must_use]
    pub fn requires_enhanced_confirmation(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }

    /// Lowercase label (`"low"`, `"medium"`, ...).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
