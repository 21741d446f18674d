//! Core branch operations: existence checks, delete, rename, checkout

use anyhow::{bail, Result};
use std::path::Path;

use crate::git::runner::{run_git, run_git_bool, run_git_checked};

/// Check if a local branch exists
pub fn branch_exists(name: &str, repo_dir: &Path) -> bool {
    let ref_path = format!("refs/heads/{name}");
    run_git_bool(&["rev-parse", "--verify", "--quiet", &ref_path], repo_dir)
}

/// Check if a remote-tracking ref exists, given as `<remote>/<branch>`
pub fn remote_branch_exists(remote_ref: &str, repo_dir: &Path) -> bool {
    let ref_path = format!("refs/remotes/{remote_ref}");
    run_git_bool(&["rev-parse", "--verify", "--quiet", &ref_path], repo_dir)
}

/// Names of the configured remotes
pub fn list_remotes(repo_dir: &Path) -> Result<Vec<String>> {
    let stdout = run_git_checked(&["remote"], repo_dir)?;
    Ok(stdout
        .lines()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect())
}

/// Delete a branch
pub fn delete_branch(name: &str, force: bool, repo_dir: &Path) -> Result<()> {
    let flag = if force { "-D" } else { "-d" };
    run_git_checked(&["branch", flag, name], repo_dir)?;
    Ok(())
}

/// Force-delete a branch if it exists
///
/// Returns `true` if the branch was deleted, `false` if it didn't exist.
pub fn delete_branch_if_exists(name: &str, repo_dir: &Path) -> Result<bool> {
    if !branch_exists(name, repo_dir) {
        return Ok(false);
    }
    delete_branch(name, true, repo_dir)?;
    Ok(true)
}

/// Rename a local branch
pub fn rename_branch(from: &str, to: &str, repo_dir: &Path) -> Result<()> {
    run_git_checked(&["branch", "-m", from, to], repo_dir)?;
    Ok(())
}

/// Get the branch checked out in `dir`, or `None` when HEAD is detached
pub fn current_branch(dir: &Path) -> Result<Option<String>> {
    let output = run_git(&["symbolic-ref", "--quiet", "--short", "HEAD"], dir)?;
    if output.status.success() {
        let name = String::from_utf8_lossy(&output.stdout).trim().to_string();
        return Ok(Some(name));
    }
    // symbolic-ref exits 1 on a detached HEAD; anything else is a real failure
    if output.status.code() == Some(1) {
        return Ok(None);
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    bail!("git symbolic-ref failed in {}: {}", dir.display(), stderr.trim())
}

/// Upstream of the current branch (e.g. `origin/main`), if one is configured
pub fn upstream_branch(dir: &Path) -> Option<String> {
    run_git_checked(
        &["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{u}"],
        dir,
    )
    .ok()
    .filter(|s| !s.is_empty())
}

/// Get the default branch (origin's HEAD, else main or master)
pub fn default_branch(repo_dir: &Path) -> Result<String> {
    if let Ok(output) = run_git(&["symbolic-ref", "refs/remotes/origin/HEAD"], repo_dir) {
        if output.status.success() {
            let result = String::from_utf8_lossy(&output.stdout);
            // refs/remotes/origin/main -> main
            if let Some(branch) = result.trim().strip_prefix("refs/remotes/origin/") {
                return Ok(branch.to_string());
            }
        }
    }

    for candidate in ["main", "master"] {
        if branch_exists(candidate, repo_dir)
            || remote_branch_exists(&format!("origin/{candidate}"), repo_dir)
        {
            return Ok(candidate.to_string());
        }
    }

    bail!("Could not determine default branch in {}", repo_dir.display())
}

/// Ref that feature branches are compared against and created from.
///
/// Prefers the remote-tracking `origin/<default>` (the freshest view after a
/// fetch), then the local branch. `None` when neither exists.
pub fn default_base_ref(default: &str, repo_dir: &Path) -> Option<String> {
    let remote = format!("origin/{default}");
    if remote_branch_exists(&remote, repo_dir) {
        Some(remote)
    } else if branch_exists(default, repo_dir) {
        Some(default.to_string())
    } else {
        None
    }
}

/// Check out an existing local branch
pub fn checkout_branch(name: &str, repo_dir: &Path) -> Result<()> {
    run_git_checked(&["checkout", name], repo_dir)?;
    Ok(())
}

/// Create a local branch tracking `remote_ref` and check it out
pub fn checkout_tracking_branch(name: &str, remote_ref: &str, repo_dir: &Path) -> Result<()> {
    run_git_checked(&["checkout", "--track", "-b", name, remote_ref], repo_dir)?;
    Ok(())
}
