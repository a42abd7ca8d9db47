//! Bridge from `tollgate_config::Config` to gate and logging options.

use tollgate_approval::GateOptions;
use tollgate_config::Config;
use tollgate_telemetry::{LogConfig, LogFormat};

/// Gate options described by the `[gate]` section.
pub(crate) fn to_gate_options(config: &Config) -> GateOptions {
    GateOptions {
        enabled: config.gate.enabled,
        pending_timeout: config.pending_timeout(),
        retain_results_on_clear: config.gate.retain_results_on_clear,
        event_capacity: config.gate.event_capacity,
    }
}

/// Logging setup described by the `[logging]` section.
pub(crate) fn to_log_config(config: &Config) -> LogConfig {
    let format: LogFormat = config.logging.format.parse().unwrap_or_default();
    let mut log_config = LogConfig::new(config.logging.level.clone()).with_format(format);
    for directive in &config.logging.directives {
        log_config = log_config.with_directive(directive.clone());
    }
    log_config
}
