//! orchestrate — run specialist-agent review workflows from the command line.
//!
//! ```text
//! orchestrate <workflow-type> <task-description>
//! orchestrate custom "<step1>,<step2>,...,<stepN>" <task-description>
//! orchestrate --pipeline-file FILE <task-description>
//! orchestrate --list-workflows
//! ```

use std::sync::Arc;

use clap::Parser;

use orchestrate_core::{
    cancel_pair, OrchestrateError, ReportAggregator, WorkflowCatalog, WorkflowDefinition,
};

use orchestrate_cli::{dryrun::DryRunExecutor, render, run_pipeline};

/// Workflow orchestrator — sequences specialist agents into pipelines
#[derive(Parser)]
#[command(
    name = "orchestrate",
    version,
    about = "Workflow orchestrator — sequences specialist agents into pipelines"
)]
struct Cli {
    /// Workflow type: feature, bugfix, refactor, security, performance,
    /// migration, or custom
    workflow_type: Option<String>,

    /// For `custom`: the comma-separated step list, then the task
    /// description. Otherwise: the task description.
    args: Vec<String>,

    /// Run a YAML-defined pipeline instead of a built-in workflow type
    #[arg(long, value_name = "FILE")]
    pipeline_file: Option<String>,

    /// List the registered workflow types and exit
    #[arg(long)]
    list_workflows: bool,

    /// Per-step timeout in seconds (a timed-out step fails the run)
    #[arg(long, env = "ORCHESTRATE_STEP_TIMEOUT")]
    timeout_secs: Option<u64>,

    /// Print the final report as JSON instead of the human-readable view
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "orchestrate_core=warn,orchestrate_cli=info".into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), String> {
    let catalog = WorkflowCatalog::new();

    if cli.list_workflows {
        render::list_workflows(&catalog);
        return Ok(());
    }

    let (definition, description) = resolve(&cli, &catalog)?;

    // Ctrl-C aborts the run at the next suspension point; completed steps
    // are still reported.
    let (cancel_handle, cancel_signal) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, aborting run");
            cancel_handle.cancel();
        }
    });

    if !cli.json {
        render::print_banner(&definition, &description);
    }

    let executor = Arc::new(DryRunExecutor);
    let (run, result) = run_pipeline(
        executor,
        definition,
        &description,
        cli.timeout_secs,
        cancel_signal,
    )
    .await;

    let report = ReportAggregator::aggregate(&run).map_err(|e| e.to_string())?;
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?
        );
    } else {
        render::print_report(&report);
    }

    result.map_err(|e| e.to_string())
}

/// Resolve the pipeline and task description from the CLI arguments.
fn resolve(
    cli: &Cli,
    catalog: &WorkflowCatalog,
) -> Result<(WorkflowDefinition, String), String> {
    if let Some(file) = &cli.pipeline_file {
        // --pipeline-file FILE <task-description>
        let description = cli
            .workflow_type
            .clone()
            .ok_or("usage: orchestrate --pipeline-file FILE <task-description>")?;
        if !cli.args.is_empty() {
            return Err("usage: orchestrate --pipeline-file FILE <task-description>".to_string());
        }
        let definition = WorkflowDefinition::from_file(file).map_err(|e| e.to_string())?;
        return Ok((definition, description));
    }

    let workflow_type = cli
        .workflow_type
        .clone()
        .ok_or("usage: orchestrate <workflow-type> <task-description> (see --list-workflows)")?;

    if workflow_type == "custom" {
        // orchestrate custom "<step1>,...,<stepN>" <task-description>
        if cli.args.len() != 2 {
            return Err(
                "usage: orchestrate custom \"<step1>,<step2>,...\" <task-description>".to_string(),
            );
        }
        let steps: Vec<&str> = cli.args[0].split(',').collect();
        let definition = catalog.resolve_custom(&steps).map_err(|e| e.to_string())?;
        Ok((definition, cli.args[1].clone()))
    } else {
        if cli.args.len() != 1 {
            return Err("usage: orchestrate <workflow-type> <task-description>".to_string());
        }
        let definition = catalog.resolve(&workflow_type).map_err(|e| {
            match e {
                OrchestrateError::UnknownWorkflowType(_) => format!(
                    "{} (recognized: feature, bugfix, refactor, security, performance, migration, custom)",
                    e
                ),
                other => other.to_string(),
            }
        })?;
        Ok((definition, cli.args[0].clone()))
    }
}
