//! Environment variable fallbacks.
//!
//! Environment variables are a fallback, not an override: they only apply to
//! fields that no config file set.

use std::collections::HashMap;
use std::hash::BuildHasher;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::merge::{ConfigLayer, FieldSources};

#[derive(Debug, Clone, Copy)]
enum Kind {
    Bool,
    Integer,
    String,
}

struct EnvMapping {
    var_name: &'static str,
    field_path: &'static str,
    kind: Kind,
}

const ENV_MAPPINGS: &[EnvMapping] = &[
    EnvMapping {
        var_name: "TOLLGATE_ENABLED",
        field_path: "gate.enabled",
        kind: Kind::Bool,
    },
    EnvMapping {
        var_name: "TOLLGATE_PENDING_TIMEOUT_SECS",
        field_path: "gate.pending_timeout_secs",
        kind: Kind::Integer,
    },
    EnvMapping {
        var_name: "TOLLGATE_LOG",
        field_path: "logging.level",
        kind: Kind::String,
    },
    EnvMapping {
        var_name: "TOLLGATE_LOG_FORMAT",
        field_path: "logging.format",
        kind: Kind::String,
    },
];

/// Apply environment fallbacks to fields that only carry their default.
///
/// Returns the number of variables applied.
///
/// # Errors
///
/// Returns [`ConfigError::EnvError`] if a variable cannot be read as the
/// type of its field.
pub fn apply_env_fallbacks<S: BuildHasher>(
    merged: &mut toml::Value,
    sources: &mut FieldSources,
    env_vars: &HashMap<String, String, S>,
) -> ConfigResult<usize> {
    let mut count: usize = 0;

    for mapping in ENV_MAPPINGS {
        let set_by_file = sources
            .get(mapping.field_path)
            .is_some_and(|layer| *layer != ConfigLayer::Defaults);
        if set_by_file {
            continue;
        }
        let Some(raw) = env_vars.get(mapping.var_name) else {
            continue;
        };

        debug!(
            var = mapping.var_name,
            field = mapping.field_path,
            "applying env var fallback"
        );
        let value = coerce(mapping, raw)?;
        set_field(merged, mapping.field_path, value);
        sources.insert(mapping.field_path.to_owned(), ConfigLayer::Environment);
        count = count.saturating_add(1);
    }

    Ok(count)
}

fn coerce(mapping: &EnvMapping, raw: &str) -> ConfigResult<toml::Value> {
    let trimmed = raw.trim();
    let err = |message: &str| ConfigError::EnvError {
        var_name: mapping.var_name.to_owned(),
        message: message.to_owned(),
    };

    match mapping.kind {
        Kind::Bool => match trimmed.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(toml::Value::Boolean(true)),
            "0" | "false" | "no" | "off" => Ok(toml::Value::Boolean(false)),
            _ => Err(err("expected a boolean (true/false)")),
        },
        Kind::Integer => trimmed
            .parse::<u32>()
            .map(|n| toml::Value::Integer(i64::from(n)))
            .map_err(|_| err("expected a non-negative integer")),
        Kind::String => Ok(toml::Value::String(trimmed.to_owned())),
    }
}

fn set_field(root: &mut toml::Value, path: &str, value: toml::Value) {
    let Some(root) = root.as_table_mut() else {
        return;
    };
    let Some((section, leaf)) = path.split_once('.') else {
        root.insert(path.to_owned(), value);
        return;
    };
    let section = root
        .entry(section.to_owned())
        .or_insert(toml::Value::Table(toml::map::Map::new()));
    if let Some(table) = section.as_table_mut() {
        table.insert(leaf.to_owned(), value);
    }
}

/// Collect the current process environment.
#[must_use]
pub fn collect_env_vars() -> HashMap<String, String> {
    std::env::vars().collect()
}
