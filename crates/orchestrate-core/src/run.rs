//! Execution-run state — the mutable record of one orchestration invocation.
//!
//! An `ExecutionRun` is created per invocation, mutated only by the
//! orchestrator driving it, and read-only once terminal. Each attempted
//! `PipelineStep` contributes exactly one `StepRecord`; a parallel group is
//! one record holding N member invocations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::WorkflowDefinition;
use crate::handoff::HandoffDocument;

/// Run lifecycle: `NotStarted → Running → {Completed, Failed, Aborted}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    NotStarted,
    Running,
    Completed,
    Failed,
    Aborted,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Aborted
        )
    }
}

/// Status of one task invocation.
///
/// An invocation left `Running` in a terminal run was in flight when the run
/// was aborted; the aggregator reports it as aborted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

/// One execution of a named task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInvocation {
    pub task: String,
    pub status: InvocationStatus,

    /// Present iff the invocation succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handoff: Option<HandoffDocument>,

    /// Present iff the invocation failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TaskInvocation {
    pub fn running(task: &str) -> Self {
        Self {
            task: task.to_string(),
            status: InvocationStatus::Running,
            handoff: None,
            error: None,
        }
    }

    pub fn succeed(&mut self, handoff: HandoffDocument) {
        self.status = InvocationStatus::Succeeded;
        self.handoff = Some(handoff);
        self.error = None;
    }

    pub fn fail(&mut self, cause: String) {
        self.status = InvocationStatus::Failed;
        self.handoff = None;
        self.error = Some(cause);
    }
}

/// Record of one attempted pipeline step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    /// Whether this record covers a parallel group.
    pub parallel: bool,
    /// One entry for a single step, N entries for a parallel group,
    /// in step-definition order.
    pub invocations: Vec<TaskInvocation>,
}

impl StepRecord {
    pub fn single(invocation: TaskInvocation) -> Self {
        Self {
            parallel: false,
            invocations: vec![invocation],
        }
    }

    pub fn group(invocations: Vec<TaskInvocation>) -> Self {
        Self {
            parallel: true,
            invocations,
        }
    }

    /// All failure messages in this record, paired with the failing task.
    pub fn failures(&self) -> Vec<(String, String)> {
        self.invocations
            .iter()
            .filter(|inv| inv.status == InvocationStatus::Failed)
            .map(|inv| {
                (
                    inv.task.clone(),
                    inv.error.clone().unwrap_or_else(|| "unknown".to_string()),
                )
            })
            .collect()
    }
}

/// Mutable state for one orchestration invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRun {
    pub id: String,
    pub workflow_type: String,
    pub task_description: String,
    pub status: RunStatus,

    /// One record per attempted step, in pipeline order.
    pub records: Vec<StepRecord>,

    /// The most recent handoff (or the merge of a parallel group's outputs).
    pub current_handoff: Option<HandoffDocument>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,

    /// The resolved pipeline, immutable for the lifetime of the run.
    #[serde(skip)]
    pub definition: WorkflowDefinition,
}

impl ExecutionRun {
    pub fn new(definition: WorkflowDefinition, task_description: &str) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            workflow_type: definition.name.clone(),
            task_description: task_description.to_string(),
            status: RunStatus::NotStarted,
            records: Vec::new(),
            current_handoff: None,
            started_at: None,
            finished_at: None,
            definition,
        }
    }

    pub(crate) fn finish(&mut self, status: RunStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }
}
