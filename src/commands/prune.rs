use anyhow::Result;
use colored::Colorize;

use super::common::{load_orchestrator, print_warnings};
use crate::scripts::CancelToken;

/// Execute `ramp prune`: remove every merged feature
pub fn execute(yes: bool) -> Result<()> {
    let orchestrator = load_orchestrator(yes)?.with_cancel(CancelToken::from_ctrlc()?);
    let report = orchestrator.prune()?;

    if report.candidates.is_empty() {
        println!("No merged features to prune.");
        return Ok(());
    }

    for feature in &report.pruned {
        println!("  {} {feature}", "✓".green());
    }
    for (feature, error) in &report.failed {
        println!("  {} {feature}: {error}", "✗".red());
    }
    print_warnings(&report.warnings);

    println!(
        "\nPruned {} of {} merged feature(s)",
        report.pruned.len().to_string().bold(),
        report.candidates.len()
    );
    if !report.failed.is_empty() {
        anyhow::bail!("{} feature(s) could not be pruned", report.failed.len());
    }
    Ok(())
}
