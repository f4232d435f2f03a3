//! End-to-end orchestration tests with a scripted mock executor.
//!
//! These exercise the same code paths a real front-end would: catalog
//! resolution, pipeline execution (sequential, parallel, timeout,
//! cancellation), and report aggregation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use orchestrate_core::{
    cancel_pair, HandoffDocument, InvocationStatus, OrchestrateError, Orchestrator, PipelineStep,
    Recommendation, ReportAggregator, RunStatus, StepStatus, TaskExecutor, WorkflowCatalog,
    WorkflowDefinition,
};

/// Scripted behavior for one task name.
#[derive(Default, Clone)]
struct Script {
    findings: Vec<&'static str>,
    files: Vec<&'static str>,
    open_questions: Vec<&'static str>,
    delay_ms: u64,
    fail_with: Option<&'static str>,
}

/// Executor that replays per-task scripts. Unscripted tasks succeed with an
/// empty handoff.
#[derive(Default)]
struct MockExecutor {
    scripts: HashMap<&'static str, Script>,
}

impl MockExecutor {
    fn script(mut self, task: &'static str, script: Script) -> Self {
        self.scripts.insert(task, script);
        self
    }
}

#[async_trait]
impl TaskExecutor for MockExecutor {
    async fn execute(
        &self,
        task: &str,
        _handoff: &HandoffDocument,
        description: &str,
    ) -> Result<HandoffDocument, String> {
        let script = self.scripts.get(task).cloned().unwrap_or_default();
        if script.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(script.delay_ms)).await;
        }
        if let Some(cause) = script.fail_with {
            return Err(cause.to_string());
        }

        let mut doc = HandoffDocument::produced_by(task);
        doc.context = format!("{} reviewed: {}", task, description);
        doc.findings = script.findings.iter().map(|s| s.to_string()).collect();
        doc.files_modified = script.files.iter().map(|s| s.to_string()).collect();
        doc.open_questions = script
            .open_questions
            .iter()
            .map(|s| s.to_string())
            .collect();
        Ok(doc)
    }
}

fn parallel_definition(members: &[&str]) -> WorkflowDefinition {
    WorkflowDefinition {
        name: "release-audit".to_string(),
        steps: vec![PipelineStep::Parallel(
            members.iter().map(|m| m.to_string()).collect(),
        )],
    }
}

#[tokio::test]
async fn test_full_feature_workflow_is_ready() {
    let catalog = WorkflowCatalog::new();
    let definition = catalog.resolve("feature").unwrap();

    let executor = MockExecutor::default().script(
        "tdd-guide",
        Script {
            files: vec!["tests/test_sale_order.py"],
            ..Default::default()
        },
    );
    let orchestrator = Orchestrator::new(Arc::new(executor));
    let mut run = orchestrate_core::ExecutionRun::new(definition, "Add portal page");

    let (_handle, signal) = cancel_pair();
    orchestrator.start(&mut run, signal).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.records.len(), 5);

    let report = ReportAggregator::aggregate(&run).unwrap();
    assert_eq!(report.workflow_type, "feature");
    assert_eq!(report.recommendation, Recommendation::Ready);
    assert_eq!(report.files_modified, vec!["tests/test_sale_order.py"]);
    assert!(report
        .steps
        .iter()
        .all(|s| s.status == StepStatus::Succeeded));
}

#[tokio::test]
async fn test_critical_finding_blocks_security_workflow() {
    // Scenario from the security review flow: step 1 reports a blocking
    // finding, every later step still succeeds.
    let catalog = WorkflowCatalog::new();
    let definition = catalog.resolve("security").unwrap();

    let executor = MockExecutor::default().script(
        "security-reviewer",
        Script {
            findings: vec!["CRITICAL: missing CSRF token"],
            ..Default::default()
        },
    );
    let orchestrator = Orchestrator::new(Arc::new(executor));
    let mut run = orchestrate_core::ExecutionRun::new(definition, "Review payment controller");

    let (_handle, signal) = cancel_pair();
    orchestrator.start(&mut run, signal).await.unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    let report = ReportAggregator::aggregate(&run).unwrap();
    assert_eq!(report.recommendation, Recommendation::Blocked);
}

#[tokio::test]
async fn test_sequential_failure_is_fail_fast() {
    // bugfix has 4 steps; step 2 (tdd-guide) fails, steps 3 and 4 never run.
    let catalog = WorkflowCatalog::new();
    let definition = catalog.resolve("bugfix").unwrap();

    let executor = MockExecutor::default().script(
        "tdd-guide",
        Script {
            fail_with: Some("agent backend unavailable"),
            ..Default::default()
        },
    );
    let orchestrator = Orchestrator::new(Arc::new(executor));
    let mut run = orchestrate_core::ExecutionRun::new(definition, "Fix invoice rounding");

    let (_handle, signal) = cancel_pair();
    let err = orchestrator.start(&mut run, signal).await.unwrap_err();

    assert!(matches!(
        err,
        OrchestrateError::TaskExecutionFailure { ref task, .. } if task == "tdd-guide"
    ));
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.records.len(), 2);
    assert_eq!(run.records[0].invocations[0].task, "explorer");
    assert_eq!(
        run.records[1].invocations[0].status,
        InvocationStatus::Failed
    );

    // A failed run is still reportable, with partial progress intact.
    let report = ReportAggregator::aggregate(&run).unwrap();
    assert_eq!(report.recommendation, Recommendation::Blocked);
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.steps[1].status, StepStatus::Failed);
}

#[tokio::test]
async fn test_parallel_partial_failure_retains_successes() {
    let executor = MockExecutor::default()
        .script(
            "code-reviewer",
            Script {
                files: vec!["models/sale_order.py"],
                ..Default::default()
            },
        )
        .script(
            "odoo-reviewer",
            Script {
                fail_with: Some("connection refused"),
                ..Default::default()
            },
        );
    let orchestrator = Orchestrator::new(Arc::new(executor));
    let mut run = orchestrate_core::ExecutionRun::new(
        parallel_definition(&["code-reviewer", "odoo-reviewer", "security-reviewer"]),
        "Quick check",
    );

    let (_handle, signal) = cancel_pair();
    let err = orchestrator.start(&mut run, signal).await.unwrap_err();

    assert!(matches!(err, OrchestrateError::TaskExecutionFailure { .. }));
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.records.len(), 1);

    // One group record holding all three member invocations.
    let record = &run.records[0];
    assert!(record.parallel);
    assert_eq!(record.invocations.len(), 3);
    assert_eq!(record.invocations[0].status, InvocationStatus::Succeeded);
    assert_eq!(record.invocations[1].status, InvocationStatus::Failed);
    assert_eq!(record.invocations[2].status, InvocationStatus::Succeeded);

    // Successful member output is not lost.
    let report = ReportAggregator::aggregate(&run).unwrap();
    assert_eq!(report.files_modified, vec!["models/sale_order.py"]);
}

#[tokio::test]
async fn test_parallel_group_error_collects_every_failure() {
    // Two members fail; the group error must name both, not just the first.
    let executor = MockExecutor::default()
        .script(
            "code-reviewer",
            Script {
                fail_with: Some("lint backend crashed"),
                ..Default::default()
            },
        )
        .script(
            "odoo-reviewer",
            Script {
                fail_with: Some("connection refused"),
                ..Default::default()
            },
        );
    let orchestrator = Orchestrator::new(Arc::new(executor));
    let mut run = orchestrate_core::ExecutionRun::new(
        parallel_definition(&["code-reviewer", "odoo-reviewer", "security-reviewer"]),
        "Quick check",
    );

    let (_handle, signal) = cancel_pair();
    let err = orchestrator.start(&mut run, signal).await.unwrap_err();

    match err {
        OrchestrateError::TaskExecutionFailure { task, cause } => {
            assert_eq!(task, "code-reviewer");
            assert!(
                cause.contains("code-reviewer: lint backend crashed"),
                "cause was: {}",
                cause
            );
            assert!(
                cause.contains("odoo-reviewer: connection refused"),
                "cause was: {}",
                cause
            );
        }
        other => panic!("expected TaskExecutionFailure, got {:?}", other),
    }

    let record = &run.records[0];
    assert_eq!(record.invocations[0].status, InvocationStatus::Failed);
    assert_eq!(record.invocations[1].status, InvocationStatus::Failed);
    assert_eq!(record.invocations[2].status, InvocationStatus::Succeeded);
}

#[tokio::test]
async fn test_parallel_merge_order_ignores_completion_order() {
    // The first-listed member finishes last; merge order must still follow
    // the step definition.
    let executor = MockExecutor::default()
        .script(
            "code-reviewer",
            Script {
                findings: vec!["first-listed"],
                files: vec!["a.py"],
                delay_ms: 80,
                ..Default::default()
            },
        )
        .script(
            "odoo-reviewer",
            Script {
                findings: vec!["second-listed"],
                files: vec!["b.py", "a.py"],
                delay_ms: 5,
                ..Default::default()
            },
        );
    let orchestrator = Orchestrator::new(Arc::new(executor));
    let mut run = orchestrate_core::ExecutionRun::new(
        parallel_definition(&["code-reviewer", "odoo-reviewer"]),
        "Quick check",
    );

    let (_handle, signal) = cancel_pair();
    orchestrator.start(&mut run, signal).await.unwrap();

    let merged = run.current_handoff.as_ref().unwrap();
    assert_eq!(merged.from_task, "code-reviewer+odoo-reviewer");
    assert_eq!(merged.findings, vec!["first-listed", "second-listed"]);
    assert_eq!(merged.files_modified, vec!["a.py", "b.py"]);
}

#[tokio::test]
async fn test_step_timeout_fails_the_run() {
    let executor = MockExecutor::default().script(
        "planner",
        Script {
            delay_ms: 5_000,
            ..Default::default()
        },
    );
    let orchestrator =
        Orchestrator::new(Arc::new(executor)).with_step_timeout(Duration::from_millis(50));
    let mut run = orchestrate_core::ExecutionRun::new(
        WorkflowDefinition {
            name: "custom".to_string(),
            steps: vec![PipelineStep::Single("planner".to_string())],
        },
        "Plan something slow",
    );

    let (_handle, signal) = cancel_pair();
    let err = orchestrator.start(&mut run, signal).await.unwrap_err();

    match err {
        OrchestrateError::TaskExecutionFailure { task, cause } => {
            assert_eq!(task, "planner");
            assert!(cause.contains("timed out"), "cause was: {}", cause);
        }
        other => panic!("expected TaskExecutionFailure, got {:?}", other),
    }
    assert_eq!(run.status, RunStatus::Failed);
}

#[tokio::test]
async fn test_cancellation_aborts_and_preserves_progress() {
    let executor = MockExecutor::default().script(
        "tdd-guide",
        Script {
            delay_ms: 10_000,
            ..Default::default()
        },
    );
    let orchestrator = Orchestrator::new(Arc::new(executor));
    let mut run = orchestrate_core::ExecutionRun::new(
        WorkflowDefinition {
            name: "custom".to_string(),
            steps: vec![
                PipelineStep::Single("planner".to_string()),
                PipelineStep::Single("tdd-guide".to_string()),
            ],
        },
        "Long running task",
    );

    let (handle, signal) = cancel_pair();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });
    orchestrator.start(&mut run, signal).await.unwrap();

    assert_eq!(run.status, RunStatus::Aborted);
    assert_eq!(run.records.len(), 2);
    assert_eq!(
        run.records[0].invocations[0].status,
        InvocationStatus::Succeeded
    );
    // The in-flight step is reported as aborted, completed work is kept.
    let report = ReportAggregator::aggregate(&run).unwrap();
    assert_eq!(report.recommendation, Recommendation::NeedsWork);
    assert_eq!(report.steps[0].status, StepStatus::Succeeded);
    assert_eq!(report.steps[1].status, StepStatus::Aborted);
}

#[tokio::test]
async fn test_custom_two_step_pipeline() {
    let catalog = WorkflowCatalog::new();
    let definition = catalog
        .resolve_custom(
            &"code-reviewer,odoo-reviewer"
                .split(',')
                .collect::<Vec<_>>(),
        )
        .unwrap();
    assert_eq!(definition.steps.len(), 2);
    assert!(definition
        .steps
        .iter()
        .all(|s| matches!(s, PipelineStep::Single(_))));

    let orchestrator = Orchestrator::new(Arc::new(MockExecutor::default()));
    let mut run = orchestrate_core::ExecutionRun::new(definition, "Quick check");

    let (_handle, signal) = cancel_pair();
    orchestrator.start(&mut run, signal).await.unwrap();
    assert_eq!(run.status, RunStatus::Completed);

    let report = ReportAggregator::aggregate(&run).unwrap();
    assert_eq!(report.steps.len(), 2);
    assert_eq!(report.steps[0].name, "code-reviewer");
    assert_eq!(report.steps[1].name, "odoo-reviewer");
}
