//! Orchestrate Core — transport-agnostic workflow orchestration engine.
//!
//! Sequences named specialist tasks into pipelines, threads a structured
//! handoff document between them, runs parallel phases as bounded fork-join
//! groups, and aggregates the results into a final report.
//!
//! # Architecture
//!
//! ```text
//! workflow type ──► WorkflowCatalog ──► WorkflowDefinition
//!                                            │
//!                                       Orchestrator ──► TaskExecutor (injected)
//!                                            │
//!                                       ExecutionRun (HandoffDocument chain)
//!                                            │
//!                                      ReportAggregator ──► FinalReport
//! ```
//!
//! How a step's content is produced is a capability ([`TaskExecutor`])
//! injected by the caller; this crate has no agent-backend dependency.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod handoff;
pub mod orchestration;
pub mod report;
pub mod run;

// Convenience re-exports
pub use catalog::{PipelineStep, WorkflowCatalog, WorkflowDefinition, WorkflowType};
pub use error::OrchestrateError;
pub use executor::TaskExecutor;
pub use handoff::HandoffDocument;
pub use orchestration::{cancel_pair, CancelHandle, CancelSignal, Orchestrator};
pub use report::{FinalReport, Recommendation, ReportAggregator, StepReport, StepStatus};
pub use run::{ExecutionRun, InvocationStatus, RunStatus, StepRecord, TaskInvocation};
