//! Gate construction helpers.

use std::sync::Arc;

use tollgate_approval::{ConfirmationGate, GateOptions};

use crate::mocks::RecordingExecutor;

/// A gate with default options backed by a [`RecordingExecutor`].
#[must_use]
pub fn test_gate() -> (Arc<ConfirmationGate>, RecordingExecutor) {
    test_gate_with(GateOptions::default())
}

/// A gate with `options` backed by a [`RecordingExecutor`].
#[must_use]
pub fn test_gate_with(options: GateOptions) -> (Arc<ConfirmationGate>, RecordingExecutor) {
    let executor = RecordingExecutor::new();
    let gate = ConfirmationGate::new(options, Arc::new(executor.clone()));
    (Arc::new(gate), executor)
}

/// Route `tracing` output through the test harness.
///
/// Honors `RUST_LOG`. Safe to call from every test.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    tracing::trace!("test tracing initialized");
}
