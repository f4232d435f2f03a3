//! Workflow catalog — resolves workflow-type identifiers to pipelines.
//!
//! The six built-in workflow types map a development activity to a fixed
//! sequence of specialist tasks; `custom` is a literal comma-separated task
//! list. Pipelines with parallel groups can also be defined in a YAML file:
//!
//! ```yaml
//! name: "release-audit"
//! description: "Pre-release review pass"
//! steps:
//!   - task: security-reviewer
//!   - parallel: [code-reviewer, odoo-reviewer]
//!   - task: architect
//! ```
//!
//! Resolution is pure lookup/construction; the catalog is read-only after
//! initialization and safe for concurrent reads by multiple runs.

use serde::{Deserialize, Serialize};

use crate::error::OrchestrateError;

/// Closed enumeration of the recognized workflow types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowType {
    Feature,
    Bugfix,
    Refactor,
    Security,
    Performance,
    Migration,
    /// Caller-supplied sequential task list.
    Custom(Vec<String>),
}

impl WorkflowType {
    /// The six built-in types, in listing order.
    pub const BUILTINS: [WorkflowType; 6] = [
        WorkflowType::Feature,
        WorkflowType::Bugfix,
        WorkflowType::Refactor,
        WorkflowType::Security,
        WorkflowType::Performance,
        WorkflowType::Migration,
    ];

    /// Parse a built-in type identifier. `custom` is not parseable here
    /// because it carries its step list.
    pub fn parse(identifier: &str) -> Option<WorkflowType> {
        match identifier {
            "feature" => Some(WorkflowType::Feature),
            "bugfix" => Some(WorkflowType::Bugfix),
            "refactor" => Some(WorkflowType::Refactor),
            "security" => Some(WorkflowType::Security),
            "performance" => Some(WorkflowType::Performance),
            "migration" => Some(WorkflowType::Migration),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            WorkflowType::Feature => "feature",
            WorkflowType::Bugfix => "bugfix",
            WorkflowType::Refactor => "refactor",
            WorkflowType::Security => "security",
            WorkflowType::Performance => "performance",
            WorkflowType::Migration => "migration",
            WorkflowType::Custom(_) => "custom",
        }
    }

    /// The ordered task sequence for this type.
    pub fn tasks(&self) -> Vec<String> {
        let tasks: &[&str] = match self {
            WorkflowType::Feature => &[
                "planner",
                "tdd-guide",
                "code-reviewer",
                "security-reviewer",
                "odoo-reviewer",
            ],
            WorkflowType::Bugfix => &["explorer", "tdd-guide", "code-reviewer", "odoo-reviewer"],
            WorkflowType::Refactor => &["architect", "code-reviewer", "tdd-guide", "odoo-reviewer"],
            WorkflowType::Security => &[
                "security-reviewer",
                "code-reviewer",
                "odoo-reviewer",
                "architect",
            ],
            WorkflowType::Performance => &[
                "performance-agent",
                "planner",
                "code-reviewer",
                "odoo-reviewer",
            ],
            WorkflowType::Migration => &[
                "migration-agent",
                "code-reviewer",
                "odoo-reviewer",
                "security-reviewer",
            ],
            WorkflowType::Custom(steps) => return steps.clone(),
        };
        tasks.iter().map(|t| t.to_string()).collect()
    }
}

/// One step of a pipeline: a single task, or a fork-join group of tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineStep {
    Single(String),
    /// Members run concurrently against the same input handoff; their
    /// outputs are merged in the order listed here.
    Parallel(Vec<String>),
}

impl PipelineStep {
    /// Display label: the task name, or members joined with `+`.
    pub fn label(&self) -> String {
        match self {
            PipelineStep::Single(task) => task.clone(),
            PipelineStep::Parallel(members) => members.join("+"),
        }
    }

    /// Number of task invocations this step dispatches.
    pub fn width(&self) -> usize {
        match self {
            PipelineStep::Single(_) => 1,
            PipelineStep::Parallel(members) => members.len(),
        }
    }
}

/// A resolved, immutable pipeline: workflow name plus ordered steps.
///
/// Invariant: `steps` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowDefinition {
    /// Workflow-type identifier ("feature", "custom", or a pipeline-file name).
    pub name: String,
    pub steps: Vec<PipelineStep>,
}

impl WorkflowDefinition {
    /// Sequential pipeline for a workflow type.
    fn sequential(workflow_type: &WorkflowType) -> Self {
        Self {
            name: workflow_type.as_str().to_string(),
            steps: workflow_type
                .tasks()
                .into_iter()
                .map(PipelineStep::Single)
                .collect(),
        }
    }

    /// Parse a pipeline definition from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, OrchestrateError> {
        let file: PipelineFile = serde_yaml::from_str(yaml)
            .map_err(|e| OrchestrateError::InvalidPipeline(e.to_string()))?;
        file.into_definition()
    }

    /// Load a pipeline definition from a YAML file.
    pub fn from_file(path: &str) -> Result<Self, OrchestrateError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OrchestrateError::InvalidPipeline(format!("failed to read '{}': {}", path, e))
        })?;
        Self::from_yaml(&content)
    }
}

/// YAML schema for a pipeline file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct PipelineFile {
    name: String,

    #[serde(default)]
    #[allow(dead_code)]
    description: Option<String>,

    steps: Vec<PipelineStepSpec>,
}

/// One step entry in a pipeline file: `task: <name>` or `parallel: [..]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum PipelineStepSpec {
    Single { task: String },
    Parallel { parallel: Vec<String> },
}

impl PipelineFile {
    fn into_definition(self) -> Result<WorkflowDefinition, OrchestrateError> {
        if self.steps.is_empty() {
            return Err(OrchestrateError::InvalidPipeline(format!(
                "pipeline '{}' has no steps",
                self.name
            )));
        }

        let mut steps = Vec::with_capacity(self.steps.len());
        for spec in self.steps {
            match spec {
                PipelineStepSpec::Single { task } => steps.push(PipelineStep::Single(task)),
                PipelineStepSpec::Parallel { parallel } => {
                    if parallel.is_empty() {
                        return Err(OrchestrateError::InvalidPipeline(format!(
                            "pipeline '{}' has an empty parallel group",
                            self.name
                        )));
                    }
                    steps.push(PipelineStep::Parallel(parallel));
                }
            }
        }

        Ok(WorkflowDefinition {
            name: self.name,
            steps,
        })
    }
}

/// Registry mapping workflow-type identifiers to pipeline definitions.
pub struct WorkflowCatalog;

impl WorkflowCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a built-in workflow type to its pipeline definition.
    pub fn resolve(&self, workflow_type: &str) -> Result<WorkflowDefinition, OrchestrateError> {
        let wt = WorkflowType::parse(workflow_type)
            .ok_or_else(|| OrchestrateError::UnknownWorkflowType(workflow_type.to_string()))?;
        Ok(WorkflowDefinition::sequential(&wt))
    }

    /// Build a sequential pipeline from an explicit task list.
    pub fn resolve_custom<S: AsRef<str>>(
        &self,
        step_names: &[S],
    ) -> Result<WorkflowDefinition, OrchestrateError> {
        let steps: Vec<String> = step_names
            .iter()
            .map(|s| s.as_ref().trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        if steps.is_empty() {
            return Err(OrchestrateError::EmptyStepList);
        }

        Ok(WorkflowDefinition::sequential(&WorkflowType::Custom(steps)))
    }

    /// Registered workflow types with their task sequences, in listing order.
    pub fn entries(&self) -> Vec<(String, Vec<String>)> {
        WorkflowType::BUILTINS
            .iter()
            .map(|wt| (wt.as_str().to_string(), wt.tasks()))
            .collect()
    }
}

impl Default for WorkflowCatalog {
    fn default() -> Self {
        Self::new()
    }
}
