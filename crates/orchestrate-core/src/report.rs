//! Report aggregation — folds a terminal run into a final report.
//!
//! Aggregation is pure and idempotent: calling it twice on the same
//! terminal run yields identical output. Every terminal state (completed,
//! failed, aborted) is reportable; partial progress is never discarded.

use serde::{Deserialize, Serialize};

use crate::error::OrchestrateError;
use crate::handoff::union_into;
use crate::run::{ExecutionRun, InvocationStatus, RunStatus};

/// Findings with this prefix are blocking by convention.
pub const BLOCKING_PREFIX: &str = "CRITICAL:";

const EXTRACT_MAX_CHARS: usize = 120;

/// Terminal recommendation of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Recommendation {
    Ready,
    NeedsWork,
    Blocked,
}

/// Per-invocation status as reported. An invocation still in flight when
/// the run was aborted is reported as `Aborted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    Failed,
    Aborted,
}

/// One reported step (parallel-group members are listed individually).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepReport {
    pub name: String,
    pub status: StepStatus,
    /// First line of the step's handoff context, truncated.
    pub context_extract: String,
}

/// Read-only view over a terminal run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalReport {
    pub workflow_type: String,
    pub task_description: String,
    pub steps: Vec<StepReport>,
    /// Set union of every invocation's `filesModified`, duplicate-free,
    /// first-seen order.
    pub files_modified: Vec<String>,
    /// All open questions across steps, deduplicated, first-seen order.
    pub open_questions: Vec<String>,
    pub recommendation: Recommendation,
}

/// Derives a [`FinalReport`] from a terminal [`ExecutionRun`].
pub struct ReportAggregator;

impl ReportAggregator {
    /// Fails with `RunNotTerminal` unless the run is completed, failed, or
    /// aborted.
    pub fn aggregate(run: &ExecutionRun) -> Result<FinalReport, OrchestrateError> {
        if !run.status.is_terminal() {
            return Err(OrchestrateError::RunNotTerminal);
        }

        let mut steps = Vec::new();
        let mut files_modified: Vec<String> = Vec::new();
        let mut open_questions: Vec<String> = Vec::new();
        let mut any_failed = false;
        let mut any_blocking = false;

        for record in &run.records {
            for invocation in &record.invocations {
                let status = match invocation.status {
                    InvocationStatus::Succeeded => StepStatus::Succeeded,
                    InvocationStatus::Failed => StepStatus::Failed,
                    // Only reachable in aborted runs.
                    InvocationStatus::Pending | InvocationStatus::Running => StepStatus::Aborted,
                };
                if status == StepStatus::Failed {
                    any_failed = true;
                }

                let context_extract = match &invocation.handoff {
                    Some(doc) => extract(&doc.context),
                    None => invocation.error.clone().unwrap_or_default(),
                };

                if let Some(doc) = &invocation.handoff {
                    union_into(&mut files_modified, &doc.files_modified);
                    for question in &doc.open_questions {
                        if !open_questions.iter().any(|q| q == question) {
                            open_questions.push(question.clone());
                        }
                    }
                    if doc.findings.iter().any(|f| f.starts_with(BLOCKING_PREFIX)) {
                        any_blocking = true;
                    }
                }

                steps.push(StepReport {
                    name: invocation.task.clone(),
                    status,
                    context_extract,
                });
            }
        }

        let recommendation = if any_failed || any_blocking || run.status == RunStatus::Failed {
            Recommendation::Blocked
        } else if run.status == RunStatus::Completed {
            Recommendation::Ready
        } else {
            Recommendation::NeedsWork
        };

        Ok(FinalReport {
            workflow_type: run.workflow_type.clone(),
            task_description: run.task_description.clone(),
            steps,
            files_modified,
            open_questions,
            recommendation,
        })
    }
}

/// First line of `context`, truncated to a displayable width.
fn extract(context: &str) -> String {
    let line = context.lines().next().unwrap_or("");
    if line.chars().count() <= EXTRACT_MAX_CHARS {
        line.to_string()
    } else {
        let truncated: String = line.chars().take(EXTRACT_MAX_CHARS - 1).collect();
        format!("{}…", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PipelineStep, WorkflowDefinition};
    use crate::handoff::HandoffDocument;
    use crate::run::{StepRecord, TaskInvocation};

    fn terminal_run(status: RunStatus, records: Vec<StepRecord>) -> ExecutionRun {
        let mut run = ExecutionRun::new(
            WorkflowDefinition {
                name: "feature".to_string(),
                steps: vec![PipelineStep::Single("planner".to_string())],
            },
            "Add portal page",
        );
        run.records = records;
        run.status = status;
        run
    }

    fn succeeded(task: &str, doc: HandoffDocument) -> TaskInvocation {
        let mut inv = TaskInvocation::running(task);
        inv.succeed(doc);
        inv
    }

    #[test]
    fn test_aggregate_rejects_non_terminal_run() {
        let run = terminal_run(RunStatus::Running, Vec::new());
        assert!(matches!(
            ReportAggregator::aggregate(&run),
            Err(OrchestrateError::RunNotTerminal)
        ));
    }

    #[test]
    fn test_clean_completed_run_is_ready() {
        let mut doc = HandoffDocument::produced_by("planner");
        doc.context = "Planned the feature\nmore detail".to_string();
        doc.findings = vec!["consider caching".to_string()];

        let run = terminal_run(
            RunStatus::Completed,
            vec![StepRecord::single(succeeded("planner", doc))],
        );
        let report = ReportAggregator::aggregate(&run).unwrap();
        assert_eq!(report.recommendation, Recommendation::Ready);
        assert_eq!(report.steps.len(), 1);
        assert_eq!(report.steps[0].context_extract, "Planned the feature");
    }

    #[test]
    fn test_blocking_finding_blocks_completed_run() {
        let mut doc = HandoffDocument::produced_by("security-reviewer");
        doc.findings = vec!["CRITICAL: missing CSRF token".to_string()];

        let run = terminal_run(
            RunStatus::Completed,
            vec![StepRecord::single(succeeded("security-reviewer", doc))],
        );
        let report = ReportAggregator::aggregate(&run).unwrap();
        assert_eq!(report.recommendation, Recommendation::Blocked);
    }

    #[test]
    fn test_aborted_run_needs_work() {
        let in_flight = TaskInvocation::running("code-reviewer");
        let run = terminal_run(
            RunStatus::Aborted,
            vec![StepRecord::single(in_flight)],
        );
        let report = ReportAggregator::aggregate(&run).unwrap();
        assert_eq!(report.recommendation, Recommendation::NeedsWork);
        assert_eq!(report.steps[0].status, StepStatus::Aborted);
    }

    #[test]
    fn test_files_and_questions_are_deduplicated() {
        let mut a = HandoffDocument::produced_by("tdd-guide");
        a.files_modified = vec!["models/sale_order.py".to_string()];
        a.open_questions = vec!["Which Odoo version?".to_string()];

        let mut b = HandoffDocument::produced_by("code-reviewer");
        b.files_modified = vec![
            "models/sale_order.py".to_string(),
            "views/sale.xml".to_string(),
        ];
        b.open_questions = vec!["Which Odoo version?".to_string()];

        let run = terminal_run(
            RunStatus::Completed,
            vec![
                StepRecord::single(succeeded("tdd-guide", a)),
                StepRecord::single(succeeded("code-reviewer", b)),
            ],
        );
        let report = ReportAggregator::aggregate(&run).unwrap();
        assert_eq!(
            report.files_modified,
            vec!["models/sale_order.py", "views/sale.xml"]
        );
        assert_eq!(report.open_questions, vec!["Which Odoo version?"]);
    }

    #[test]
    fn test_aggregate_is_idempotent() {
        let mut doc = HandoffDocument::produced_by("planner");
        doc.context = "done".to_string();
        let run = terminal_run(
            RunStatus::Completed,
            vec![StepRecord::single(succeeded("planner", doc))],
        );

        let first = ReportAggregator::aggregate(&run).unwrap();
        let second = ReportAggregator::aggregate(&run).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_report_wire_shape() {
        let run = terminal_run(RunStatus::Completed, Vec::new());
        let report = ReportAggregator::aggregate(&run).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["workflowType"], "feature");
        assert_eq!(json["recommendation"], "ready");
        assert!(json["filesModified"].is_array());
        assert!(json["openQuestions"].is_array());
    }
}
