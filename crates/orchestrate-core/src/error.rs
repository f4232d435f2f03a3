//! Core error type for the orchestration engine.
//!
//! `OrchestrateError` is used throughout the core domain (catalog, engine,
//! aggregator). Catalog errors surface before any step executes; task
//! failures are also recorded in the `ExecutionRun` history so a report can
//! still be produced for a failed run.

#[derive(Debug, thiserror::Error)]
pub enum OrchestrateError {
    #[error("Unknown workflow type: {0}")]
    UnknownWorkflowType(String),

    #[error("Custom workflow has no steps")]
    EmptyStepList,

    #[error("Invalid pipeline definition: {0}")]
    InvalidPipeline(String),

    #[error("Task '{task}' failed: {cause}")]
    TaskExecutionFailure { task: String, cause: String },

    #[error("Run has already been started")]
    AlreadyStarted,

    #[error("Run is not terminal; a report can only be aggregated from a completed, failed, or aborted run")]
    RunNotTerminal,
}
