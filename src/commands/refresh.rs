use anyhow::Result;
use colored::Colorize;

use super::common::load_orchestrator;
use crate::git::RefreshOutcome;

/// Execute `ramp refresh`
pub fn execute() -> Result<()> {
    let orchestrator = load_orchestrator(false)?;
    println!("Refreshing {} repositories...", orchestrator.project().repos().len());

    let report = orchestrator.refresh();
    for result in &report.results {
        match &result.outcome {
            RefreshOutcome::Pulled => println!("  {} {}: pulled", "✓".green(), result.repo),
            RefreshOutcome::Fetched(reason) => {
                println!("  {} {}: fetched ({reason})", "✓".green(), result.repo)
            }
            RefreshOutcome::NoRemote => {
                println!("  {} {}: no remote", "-".dimmed(), result.repo)
            }
            RefreshOutcome::Failed(reason) => {
                println!("  {} {}: {reason}", "✗".red(), result.repo)
            }
        }
    }

    let failed = report.failures().count();
    println!(
        "\n{} succeeded, {} failed",
        report.success_count(),
        if failed > 0 {
            failed.to_string().red().bold()
        } else {
            failed.to_string().normal()
        }
    );
    Ok(())
}
