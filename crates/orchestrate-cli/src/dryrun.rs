//! Dry-run executor — synthesizes handoffs so a pipeline can be exercised
//! end-to-end without an agent backend.
//!
//! Useful for validating pipeline wiring (step order, parallel groups,
//! report shape) before connecting a real executor.

use async_trait::async_trait;

use orchestrate_core::{HandoffDocument, TaskExecutor};

pub struct DryRunExecutor;

#[async_trait]
impl TaskExecutor for DryRunExecutor {
    async fn execute(
        &self,
        task: &str,
        handoff: &HandoffDocument,
        description: &str,
    ) -> Result<HandoffDocument, String> {
        tracing::debug!("[DryRun] {} ← from '{}'", task, handoff.from_task);

        let mut doc = HandoffDocument::produced_by(task);
        doc.context = format!("Dry run of '{}' for: {}", task, description);
        doc.recommendations =
            vec!["Connect a task executor backend to produce real findings".to_string()];
        Ok(doc)
    }
}
