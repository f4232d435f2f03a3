//! Task execution capability — consumed, not implemented, by the engine.
//!
//! How a step's content is actually produced (an LLM agent, a spawned
//! process, a canned fixture) is opaque to the orchestrator. Backends
//! implement this trait and are injected at construction time.

use async_trait::async_trait;

use crate::handoff::HandoffDocument;

/// Executes one named task against the current handoff and the original
/// task description, returning the handoff the task produced.
///
/// The engine does not retry: a returned `Err` fails the step. Implementors
/// own any retry policy of their own. The returned document's `from_task`
/// should name the executed task; the engine fills in `to_task` when it
/// routes the document to the next step.
#[async_trait]
pub trait TaskExecutor: Send + Sync {
    async fn execute(
        &self,
        task: &str,
        handoff: &HandoffDocument,
        description: &str,
    ) -> Result<HandoffDocument, String>;
}
