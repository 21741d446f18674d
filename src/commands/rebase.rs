use anyhow::Result;
use colored::Colorize;

use super::common::load_orchestrator;

/// Execute `ramp rebase`: switch all source checkouts to `branch`
pub fn execute(branch: String, yes: bool) -> Result<()> {
    let orchestrator = load_orchestrator(yes)?;
    let report = orchestrator.rebase(&branch)?;

    for state in report.repos.values() {
        let from = state.original_branch.as_deref().unwrap_or("?");
        if from == report.branch {
            println!("  {}: already on {}", state.repo, report.branch.cyan());
        } else {
            println!("  {}: {from} -> {}", state.repo, report.branch.cyan());
        }
    }
    for repo in &report.skipped {
        println!("  {}: {}", repo, "branch not found, skipped".dimmed());
    }
    println!("{} {}", "Switched to".green().bold(), report.branch);
    Ok(())
}
