use anyhow::Result;
use colored::Colorize;

use super::common::{load_orchestrator, print_warnings};

/// Execute `ramp rename`
pub fn execute(from: String, to: String, yes: bool) -> Result<()> {
    let orchestrator = load_orchestrator(yes)?;
    let report = orchestrator.rename(&from, &to)?;

    for state in report.repos.values() {
        println!("  {}: {}", state.repo, state.branch.cyan());
    }
    print_warnings(&report.warnings);
    println!(
        "{} {} -> {}",
        "Renamed".green().bold(),
        report.from,
        report.to.bold()
    );
    Ok(())
}
