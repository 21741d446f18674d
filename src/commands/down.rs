use anyhow::Result;
use colored::Colorize;

use super::common::{format_ports, load_orchestrator, print_warnings};
use crate::orchestrator::DownOptions;
use crate::scripts::CancelToken;

/// Execute `ramp down`
pub fn execute(name: String, options: DownOptions, yes: bool) -> Result<()> {
    let orchestrator = load_orchestrator(yes)?.with_cancel(CancelToken::from_ctrlc()?);
    println!("Removing feature '{}'...", name.bold());

    let report = orchestrator.down(&name, &options)?;

    if report.cleanup_ran {
        println!("  Cleanup script completed");
    }
    for (repo, teardown) in &report.repos {
        let branch = teardown.branch.as_deref().unwrap_or("-");
        let mut done = Vec::new();
        if teardown.worktree_removed {
            done.push("worktree removed");
        }
        if teardown.branch_deleted {
            done.push("branch deleted");
        }
        if done.is_empty() {
            done.push("nothing to remove");
        }
        println!("  {repo}: {} ({})", branch.cyan(), done.join(", "));
    }
    if let Some(ports) = &report.released_ports {
        println!("  Released ports: {}", format_ports(ports));
    }
    print_warnings(&report.warnings);

    println!("{} {name}", "Removed".green().bold());
    Ok(())
}
