//! Handoff document — the structured artifact threaded between pipeline steps.
//!
//! Every step produces a `HandoffDocument` and the next step receives it as
//! input. The field set is closed: every field is always present on the wire
//! (empty collections allowed, never omitted), so downstream steps and the
//! report aggregator can rely on a uniform shape.
//!
//! A document is immutable once produced. Parallel-group outputs are merged
//! into one synthetic document in step-definition order, regardless of which
//! member finished first.

use serde::{Deserialize, Serialize};

/// Separator used when concatenating free-text fields of merged documents.
const MERGE_SEPARATOR: &str = "\n---\n";

/// The artifact passed from one pipeline step to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HandoffDocument {
    /// Task that produced this document (empty for the initial document).
    pub from_task: String,

    /// Task this document is routed to (empty after the final step).
    pub to_task: String,

    /// Free-text summary of the work performed.
    pub context: String,

    /// Ordered findings. The `CRITICAL:` prefix marks a blocking finding.
    pub findings: Vec<String>,

    /// Paths touched by the step, duplicate-free, first-seen order.
    pub files_modified: Vec<String>,

    /// Domain references (models, views, controllers, ...).
    pub domain_context: String,

    /// Ordered open questions for downstream steps.
    pub open_questions: Vec<String>,

    /// Ordered recommendations for downstream steps.
    pub recommendations: Vec<String>,
}

impl HandoffDocument {
    /// The empty initial document fed to the first step of a pipeline.
    pub fn initial(to_task: &str) -> Self {
        Self {
            from_task: String::new(),
            to_task: to_task.to_string(),
            context: String::new(),
            findings: Vec::new(),
            files_modified: Vec::new(),
            domain_context: String::new(),
            open_questions: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    /// Build a document produced by `from_task`, not yet routed anywhere.
    pub fn produced_by(from_task: &str) -> Self {
        Self {
            from_task: from_task.to_string(),
            ..Self::initial("")
        }
    }

    /// Merge the outputs of a parallel group into one synthetic document.
    ///
    /// `docs` must be in step-definition order; the merge is deterministic
    /// and independent of completion order. List fields are concatenated
    /// (`files_modified` unioned, duplicate-free); free-text fields are
    /// joined with a separator, each fragment prefixed with its origin task.
    pub fn merge(docs: &[HandoffDocument], to_task: &str) -> Self {
        let mut merged = Self::initial(to_task);
        merged.from_task = docs
            .iter()
            .map(|d| d.from_task.as_str())
            .collect::<Vec<_>>()
            .join("+");

        let mut contexts: Vec<String> = Vec::new();
        let mut domains: Vec<String> = Vec::new();

        for doc in docs {
            if !doc.context.is_empty() {
                contexts.push(format!("[{}] {}", doc.from_task, doc.context));
            }
            if !doc.domain_context.is_empty() {
                domains.push(format!("[{}] {}", doc.from_task, doc.domain_context));
            }
            merged.findings.extend(doc.findings.iter().cloned());
            merged
                .open_questions
                .extend(doc.open_questions.iter().cloned());
            merged
                .recommendations
                .extend(doc.recommendations.iter().cloned());
            union_into(&mut merged.files_modified, &doc.files_modified);
        }

        merged.context = contexts.join(MERGE_SEPARATOR);
        merged.domain_context = domains.join(MERGE_SEPARATOR);
        merged
    }
}

/// Append `paths` into `acc`, skipping duplicates, preserving first-seen order.
pub fn union_into(acc: &mut Vec<String>, paths: &[String]) {
    for path in paths {
        if !acc.iter().any(|p| p == path) {
            acc.push(path.clone());
        }
    }
}
