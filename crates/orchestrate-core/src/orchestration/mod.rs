//! Orchestrator — drives execution of a resolved pipeline.
//!
//! The engine advances one `PipelineStep` at a time, in definition order:
//!   1. A single step invokes the executor and, on success, its output
//!      becomes the current handoff. Failure is fatal to the run (fail-fast).
//!   2. A parallel group dispatches all members concurrently against the
//!      same input handoff, joins them all, and merges their outputs in
//!      step-definition order. Any member failure fails the group, but the
//!      results of the other members are retained in the run record.
//!
//! The coordinating task suspends only at step invocations and at group
//! join points. A cancellation signal is honored at the next suspension
//! point: in-flight work is aborted and the run becomes `Aborted`, with all
//! completed invocations preserved for reporting.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::catalog::PipelineStep;
use crate::error::OrchestrateError;
use crate::executor::TaskExecutor;
use crate::handoff::HandoffDocument;
use crate::run::{ExecutionRun, RunStatus, StepRecord, TaskInvocation};

/// Sender half of a run's cancellation signal.
pub struct CancelHandle(watch::Sender<bool>);

/// Receiver half, passed to [`Orchestrator::start`].
pub type CancelSignal = watch::Receiver<bool>;

impl CancelHandle {
    /// Request cancellation. Honored at the run's next suspension point.
    pub fn cancel(&self) {
        let _ = self.0.send(true);
    }
}

/// Create a linked cancellation handle/signal pair.
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle(tx), rx)
}

/// The pipeline execution engine.
pub struct Orchestrator {
    executor: Arc<dyn TaskExecutor>,
    /// Upper bound on each executor call; a timeout fails the step.
    step_timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn new(executor: Arc<dyn TaskExecutor>) -> Self {
        Self {
            executor,
            step_timeout: None,
        }
    }

    /// Bound every executor call by `timeout`.
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    /// Execute the run's pipeline to a terminal state.
    ///
    /// Returns `AlreadyStarted` if the run is not `NotStarted`. A task
    /// failure leaves the run `Failed` (with the full invocation history
    /// intact) and is also returned as `TaskExecutionFailure`. Cancellation
    /// is not an error: the run ends `Aborted` and `Ok(())` is returned.
    pub async fn start(
        &self,
        run: &mut ExecutionRun,
        mut cancel: CancelSignal,
    ) -> Result<(), OrchestrateError> {
        if run.status != RunStatus::NotStarted {
            return Err(OrchestrateError::AlreadyStarted);
        }
        run.status = RunStatus::Running;
        run.started_at = Some(chrono::Utc::now());

        tracing::info!(
            "[Orchestrator] Run {} started: workflow '{}', {} step(s)",
            run.id,
            run.workflow_type,
            run.definition.steps.len()
        );

        let steps = run.definition.steps.clone();
        for (index, step) in steps.iter().enumerate() {
            if *cancel.borrow() {
                tracing::info!("[Orchestrator] Run {} cancelled before step {}", run.id, index + 1);
                run.finish(RunStatus::Aborted);
                return Ok(());
            }

            let input = run
                .current_handoff
                .clone()
                .unwrap_or_else(|| HandoffDocument::initial(&step.label()));
            let next_label = steps.get(index + 1).map(|s| s.label());

            tracing::info!(
                "[Orchestrator] Step {}/{}: {}",
                index + 1,
                steps.len(),
                step.label()
            );

            match step {
                PipelineStep::Single(task) => {
                    if !self
                        .run_single(run, task, input, next_label.as_deref(), &mut cancel)
                        .await?
                    {
                        return Ok(()); // aborted
                    }
                }
                PipelineStep::Parallel(members) => {
                    if !self
                        .run_group(run, members, input, next_label.as_deref(), &mut cancel)
                        .await?
                    {
                        return Ok(()); // aborted
                    }
                }
            }
        }

        run.finish(RunStatus::Completed);
        tracing::info!("[Orchestrator] Run {} completed", run.id);
        Ok(())
    }

    /// Execute a single step. Returns `Ok(false)` when the run was aborted.
    async fn run_single(
        &self,
        run: &mut ExecutionRun,
        task: &str,
        input: HandoffDocument,
        next_label: Option<&str>,
        cancel: &mut CancelSignal,
    ) -> Result<bool, OrchestrateError> {
        let mut invocation = TaskInvocation::running(task);

        let call = invoke_once(
            self.executor.clone(),
            self.step_timeout,
            task.to_string(),
            input,
            run.task_description.clone(),
        );

        let outcome = tokio::select! {
            result = call => Some(result),
            _ = cancel_requested(cancel) => None,
        };

        match outcome {
            Some(Ok(mut doc)) => {
                doc.to_task = next_label.unwrap_or_default().to_string();
                invocation.succeed(doc.clone());
                run.records.push(StepRecord::single(invocation));
                run.current_handoff = Some(doc);
                Ok(true)
            }
            Some(Err(cause)) => {
                tracing::warn!("[Orchestrator] Task '{}' failed: {}", task, cause);
                invocation.fail(cause.clone());
                run.records.push(StepRecord::single(invocation));
                run.finish(RunStatus::Failed);
                Err(OrchestrateError::TaskExecutionFailure {
                    task: task.to_string(),
                    cause,
                })
            }
            None => {
                // Dropping the call future aborts the in-flight execution.
                tracing::info!("[Orchestrator] Task '{}' cancelled mid-flight", task);
                run.records.push(StepRecord::single(invocation));
                run.finish(RunStatus::Aborted);
                Ok(false)
            }
        }
    }

    /// Execute a parallel group with fork-join semantics.
    /// Returns `Ok(false)` when the run was aborted.
    async fn run_group(
        &self,
        run: &mut ExecutionRun,
        members: &[String],
        input: HandoffDocument,
        next_label: Option<&str>,
        cancel: &mut CancelSignal,
    ) -> Result<bool, OrchestrateError> {
        // Fork: every member receives the same input handoff.
        let handles: Vec<JoinHandle<Result<HandoffDocument, String>>> = members
            .iter()
            .map(|member| {
                tokio::spawn(invoke_once(
                    self.executor.clone(),
                    self.step_timeout,
                    member.clone(),
                    input.clone(),
                    run.task_description.clone(),
                ))
            })
            .collect();

        let mut invocations: Vec<TaskInvocation> =
            members.iter().map(|m| TaskInvocation::running(m)).collect();
        let mut cancelled = false;

        // Join in definition order so the merge is deterministic regardless
        // of completion order.
        for (idx, mut handle) in handles.into_iter().enumerate() {
            if !cancelled {
                tokio::select! {
                    joined = &mut handle => {
                        apply_join(&mut invocations[idx], joined);
                        continue;
                    }
                    _ = cancel_requested(cancel) => {
                        cancelled = true;
                    }
                }
            }

            // Cancelled: reap what already finished, abort the rest.
            handle.abort();
            match handle.await {
                Ok(result) => apply_result(&mut invocations[idx], result),
                Err(_) => {} // left Running; reported as aborted
            }
        }

        if cancelled {
            tracing::info!(
                "[Orchestrator] Parallel group [{}] cancelled",
                members.join(", ")
            );
            run.records.push(StepRecord::group(invocations));
            run.finish(RunStatus::Aborted);
            return Ok(false);
        }

        let record = StepRecord::group(invocations);
        let failures = record.failures();

        if !failures.is_empty() {
            // Successful member results stay in the record; the error
            // carries every collected failure, not just the first.
            let cause = failures
                .iter()
                .map(|(task, err)| format!("{}: {}", task, err))
                .collect::<Vec<_>>()
                .join("; ");
            let first_task = failures[0].0.clone();
            tracing::warn!(
                "[Orchestrator] Parallel group failed ({}/{} members): {}",
                failures.len(),
                members.len(),
                cause
            );
            run.records.push(record);
            run.finish(RunStatus::Failed);
            return Err(OrchestrateError::TaskExecutionFailure {
                task: first_task,
                cause,
            });
        }

        // All members succeeded: merge outputs in step-definition order.
        let docs: Vec<HandoffDocument> = record
            .invocations
            .iter()
            .filter_map(|inv| inv.handoff.clone())
            .collect();
        let merged = HandoffDocument::merge(&docs, next_label.unwrap_or_default());
        run.records.push(record);
        run.current_handoff = Some(merged);
        Ok(true)
    }
}

/// Resolves only once cancellation is actually requested. A closed channel
/// (the handle was dropped without cancelling) means the run can no longer
/// be cancelled, so this stays pending rather than firing spuriously.
async fn cancel_requested(signal: &mut CancelSignal) {
    loop {
        if *signal.borrow() {
            return;
        }
        if signal.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// One executor call, bounded by the optional step timeout.
async fn invoke_once(
    executor: Arc<dyn TaskExecutor>,
    timeout: Option<Duration>,
    task: String,
    input: HandoffDocument,
    description: String,
) -> Result<HandoffDocument, String> {
    let call = executor.execute(&task, &input, &description);
    match timeout {
        Some(limit) => match tokio::time::timeout(limit, call).await {
            Ok(result) => result,
            Err(_) => Err(format!("timed out after {}s", limit.as_secs())),
        },
        None => call.await,
    }
}

fn apply_join(
    invocation: &mut TaskInvocation,
    joined: Result<Result<HandoffDocument, String>, tokio::task::JoinError>,
) {
    match joined {
        Ok(result) => apply_result(invocation, result),
        Err(e) => invocation.fail(format!("worker panicked: {}", e)),
    }
}

fn apply_result(invocation: &mut TaskInvocation, result: Result<HandoffDocument, String>) {
    match result {
        Ok(doc) => invocation.succeed(doc),
        Err(cause) => invocation.fail(cause),
    }
}
