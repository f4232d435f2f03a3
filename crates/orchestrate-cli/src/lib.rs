//! orchestrate CLI — library surface shared by the binary and tests.
//!
//! The binary resolves a pipeline, drives it with the configured executor,
//! and renders the final report. `run_pipeline` is the piece worth sharing:
//! integration tests exercise the same code path without spawning the
//! binary.

pub mod dryrun;
pub mod render;

use std::sync::Arc;
use std::time::Duration;

use orchestrate_core::{
    CancelSignal, ExecutionRun, OrchestrateError, Orchestrator, TaskExecutor, WorkflowDefinition,
};

/// Drive `definition` to a terminal state with the given executor.
///
/// Returns the run alongside the engine result so the caller can render a
/// report even when the run failed. The report is always derivable: the
/// run is terminal on return.
pub async fn run_pipeline(
    executor: Arc<dyn TaskExecutor>,
    definition: WorkflowDefinition,
    description: &str,
    timeout_secs: Option<u64>,
    cancel: CancelSignal,
) -> (ExecutionRun, Result<(), OrchestrateError>) {
    let mut orchestrator = Orchestrator::new(executor);
    if let Some(secs) = timeout_secs {
        orchestrator = orchestrator.with_step_timeout(Duration::from_secs(secs));
    }

    let mut run = ExecutionRun::new(definition, description);
    let result = orchestrator.start(&mut run, cancel).await;
    (run, result)
}
