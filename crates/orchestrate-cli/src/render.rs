//! Terminal rendering for runs, reports, and the workflow listing.

use orchestrate_core::{
    FinalReport, Recommendation, StepStatus, WorkflowCatalog, WorkflowDefinition,
};

/// Print the run banner before execution starts.
pub fn print_banner(definition: &WorkflowDefinition, description: &str) {
    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Workflow Orchestrator                                   ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Workflow : {:<44} ║", truncate(&definition.name, 44));
    println!("║  Task     : {:<44} ║", truncate(&description, 44));
    println!("║  Steps    : {:<44} ║", definition.steps.len());
    println!("╚══════════════════════════════════════════════════════════╝");
    println!();
}

/// Print the human-readable final report.
pub fn print_report(report: &FinalReport) {
    println!("═══════════════════════════════════════════════════════════");
    println!("  Workflow : {}", report.workflow_type);
    println!("  Task     : {}", report.task_description);
    println!("───────────────────────────────────────────────────────────");

    for (i, step) in report.steps.iter().enumerate() {
        let icon = match step.status {
            StepStatus::Succeeded => "✅",
            StepStatus::Failed => "❌",
            StepStatus::Aborted => "⏹",
        };
        println!("  {}. {} {}", i + 1, icon, step.name);
        if !step.context_extract.is_empty() {
            println!("       {}", truncate(&step.context_extract, 70));
        }
    }

    if !report.files_modified.is_empty() {
        println!("───────────────────────────────────────────────────────────");
        println!("  Files modified:");
        for file in &report.files_modified {
            println!("    - {}", file);
        }
    }

    if !report.open_questions.is_empty() {
        println!("───────────────────────────────────────────────────────────");
        println!("  Open questions:");
        for question in &report.open_questions {
            println!("    - {}", question);
        }
    }

    let verdict = match report.recommendation {
        Recommendation::Ready => "✅ ready",
        Recommendation::NeedsWork => "🔶 needs-work",
        Recommendation::Blocked => "⛔ blocked",
    };
    println!("───────────────────────────────────────────────────────────");
    println!("  Recommendation: {}", verdict);
    println!("═══════════════════════════════════════════════════════════");
}

/// Print the registered workflow types as a table.
pub fn list_workflows(catalog: &WorkflowCatalog) {
    println!("┌──────────────┬──────────────────────────────────────────────────────────────┐");
    println!("│ Workflow     │ Pipeline                                                     │");
    println!("├──────────────┼──────────────────────────────────────────────────────────────┤");
    for (name, tasks) in catalog.entries() {
        println!(
            "│ {:<12} │ {:<60} │",
            truncate(&name, 12),
            truncate(&tasks.join(" → "), 60)
        );
    }
    println!(
        "│ {:<12} │ {:<60} │",
        "custom",
        "comma-separated task list, run sequentially"
    );
    println!("└──────────────┴──────────────────────────────────────────────────────────────┘");
}

fn truncate<T: ToString>(value: &T, max: usize) -> String {
    let s = value.to_string();
    if s.chars().count() <= max {
        s
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
