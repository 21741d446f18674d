//! Helpers shared by command implementations

use anyhow::Result;
use colored::Colorize;

use crate::config::Project;
use crate::git::check_git_available;
use crate::orchestrator::{AutoConfirm, Orchestrator};

/// Load the project enclosing the current directory.
///
/// With `yes`, every confirmation prompt is answered automatically.
pub fn load_orchestrator(yes: bool) -> Result<Orchestrator> {
    check_git_available()?;
    let project = Project::discover(&std::env::current_dir()?)?;
    let orchestrator = Orchestrator::new(project);
    Ok(if yes {
        orchestrator.with_confirm(AutoConfirm(true))
    } else {
        orchestrator
    })
}

pub fn print_warnings(warnings: &[String]) {
    for warning in warnings {
        eprintln!("  {} {warning}", "Warning:".yellow().bold());
    }
}

pub fn format_ports(ports: &[u16]) -> String {
    ports
        .iter()
        .map(u16::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
