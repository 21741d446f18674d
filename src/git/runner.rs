//! Git command runner
//!
//! Every git invocation in ramp goes through these helpers so that errors
//! carry the command, the directory it ran in, and git's stderr.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::process::{Command, Output};

/// Run a git command and return the raw Output.
///
/// # Arguments
/// * `args` - Git command arguments (e.g., `&["branch", "-v"]`)
/// * `dir` - Working directory for the git command
pub fn run_git(args: &[&str], dir: &Path) -> Result<Output> {
    tracing::debug!(dir = %dir.display(), "git {}", args.join(" "));
    Command::new("git")
        .args(args)
        .current_dir(dir)
        .env("GIT_TERMINAL_PROMPT", "0")
        .output()
        .with_context(|| format!("Failed to execute: git {}", args.join(" ")))
}

/// Run a git command, check for success, and return stdout trimmed.
///
/// On failure, bails with the subcommand, directory and stderr.
pub fn run_git_checked(args: &[&str], dir: &Path) -> Result<String> {
    let output = run_git(args, dir)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let cmd = args.first().unwrap_or(&"");
        bail!(
            "git {cmd} failed in {}: {}",
            dir.display(),
            stderr.trim()
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Run a git command and return true if exit code is 0.
///
/// Swallows spawn failures and non-zero exits. Use for existence checks.
pub fn run_git_bool(args: &[&str], dir: &Path) -> bool {
    run_git(args, dir)
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// True when `dir` is inside a git work tree
pub fn is_git_repo(dir: &Path) -> bool {
    dir.is_dir() && run_git_bool(&["rev-parse", "--is-inside-work-tree"], dir)
}
