//! Git plumbing for multi-repository feature worktrees
//!
//! Everything here shells out to the `git` binary through [`runner`]:
//! - `branch`: existence checks, checkout, rename, ancestry and dirty-state
//! - `worktree`: add, remove, move and list worktrees
//! - `refresh`: concurrent fetch/pull across source repositories

pub mod branch;
pub mod refresh;
pub mod runner;
pub mod worktree;


pub use branch::{
    branch_exists, current_branch, default_branch, has_uncommitted_changes, remote_branch_exists,
};
pub use refresh::{refresh_repositories, RefreshOutcome, RefreshReport, RefreshResult};
pub use runner::{is_git_repo, run_git, run_git_checked};
pub use worktree::{add_worktree, list_worktrees, remove_worktree, WorktreeBranch, WorktreeInfo};

/// Check that a usable `git` binary is on PATH
pub fn check_git_available() -> anyhow::Result<()> {
    let output = std::process::Command::new("git")
        .arg("--version")
        .output()
        .map_err(|e| anyhow::anyhow!("git is not installed or not in PATH: {e}"))?;
    if !output.status.success() {
        anyhow::bail!("git --version failed");
    }
    Ok(())
}
