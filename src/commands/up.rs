use anyhow::Result;
use colored::Colorize;

use super::common::{format_ports, load_orchestrator};
use crate::git::RefreshOutcome;
use crate::orchestrator::UpOptions;
use crate::scripts::CancelToken;

/// Execute `ramp up`
pub fn execute(name: String, options: UpOptions, yes: bool) -> Result<()> {
    let orchestrator = load_orchestrator(yes)?.with_cancel(CancelToken::from_ctrlc()?);
    println!("Creating feature '{}'...", name.bold());

    let report = orchestrator.up(&name, &options)?;

    if let Some(refresh) = &report.refresh {
        for result in refresh.failures() {
            if let RefreshOutcome::Failed(reason) = &result.outcome {
                eprintln!(
                    "  {} refresh of {}: {reason}",
                    "Warning:".yellow().bold(),
                    result.repo
                );
            }
        }
    }

    for state in report.repos.values() {
        let source = state
            .source
            .as_ref()
            .map(|s| format!(" ({s})"))
            .unwrap_or_default();
        println!(
            "  {} {}: {}{}",
            "✓".green(),
            state.repo,
            state.branch.cyan(),
            source.dimmed()
        );
    }
    if !report.ports.is_empty() {
        println!("  Ports: {}", format_ports(&report.ports));
    }
    if report.setup_ran {
        println!("  Setup script completed");
    }

    println!(
        "\n{} {}",
        "Feature ready:".green().bold(),
        report.trees_dir.display()
    );
    Ok(())
}
