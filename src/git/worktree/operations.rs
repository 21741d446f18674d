//! Worktree operations: add, remove, move, list, prune

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::git::runner::run_git_checked;

use super::parser::{parse_worktree_list, WorktreeInfo};

/// How the branch of a new worktree comes into being
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorktreeBranch<'a> {
    /// Check out a local branch that already exists
    Existing,
    /// Create the branch from a remote-tracking ref and track it
    TrackRemote(&'a str),
    /// Create the branch from a start point without tracking
    NewFrom(&'a str),
}

/// Create a worktree at `path` checked out on `branch`
///
/// - `Existing`: `git worktree add <path> <branch>`
/// - `TrackRemote(r)`: `git worktree add --track -b <branch> <path> <r>`
/// - `NewFrom(s)`: `git worktree add --no-track -b <branch> <path> <s>`
pub fn add_worktree(
    repo_dir: &Path,
    path: &Path,
    branch: &str,
    how: &WorktreeBranch<'_>,
) -> Result<()> {
    let path_str = path.to_string_lossy().into_owned();
    let args: Vec<&str> = match *how {
        WorktreeBranch::Existing => vec!["worktree", "add", path_str.as_str(), branch],
        WorktreeBranch::TrackRemote(remote_ref) => vec![
            "worktree",
            "add",
            "--track",
            "-b",
            branch,
            path_str.as_str(),
            remote_ref,
        ],
        WorktreeBranch::NewFrom(start) => vec![
            "worktree",
            "add",
            "--no-track",
            "-b",
            branch,
            path_str.as_str(),
            start,
        ],
    };
    run_git_checked(&args, repo_dir)
        .with_context(|| format!("Failed to create worktree {} on {branch}", path.display()))?;
    Ok(())
}

/// Remove a worktree, tolerating a directory that was already deleted.
///
/// Runs `git worktree remove --force`; if that fails the directory is removed
/// by hand. Stale registrations are pruned either way. Returns `true` when a
/// directory or a registration was actually removed.
pub fn remove_worktree(repo_dir: &Path, path: &Path) -> Result<bool> {
    let registered = find_worktree_by_path(repo_dir, path)?.is_some();

    if path.exists() {
        let path_str = path.to_string_lossy().into_owned();
        if let Err(e) =
            run_git_checked(&["worktree", "remove", "--force", path_str.as_str()], repo_dir)
        {
            tracing::warn!(
                path = %path.display(),
                "git worktree remove failed, removing directory: {e:#}"
            );
            fs::remove_dir_all(path).with_context(|| {
                format!(
                    "Failed to manually remove worktree at {} after git error: {e}",
                    path.display()
                )
            })?;
        }
        prune_worktrees(repo_dir)?;
        return Ok(true);
    }

    if registered {
        prune_worktrees(repo_dir)?;
    }
    Ok(registered)
}

/// Move a worktree to a new directory (`git worktree move`)
pub fn move_worktree(repo_dir: &Path, from: &Path, to: &Path) -> Result<()> {
    let from_str = from.to_string_lossy().into_owned();
    let to_str = to.to_string_lossy().into_owned();
    run_git_checked(
        &["worktree", "move", from_str.as_str(), to_str.as_str()],
        repo_dir,
    )
    .with_context(|| {
        format!(
            "Failed to move worktree {} to {}",
            from.display(),
            to.display()
        )
    })?;
    Ok(())
}

/// List all worktrees registered with a repository
pub fn list_worktrees(repo_dir: &Path) -> Result<Vec<WorktreeInfo>> {
    let stdout = run_git_checked(&["worktree", "list", "--porcelain"], repo_dir)?;
    Ok(parse_worktree_list(&stdout))
}

/// Clean stale worktree registrations (`git worktree prune`)
pub fn prune_worktrees(repo_dir: &Path) -> Result<()> {
    run_git_checked(&["worktree", "prune"], repo_dir)?;
    Ok(())
}

/// Find the registered worktree for a path, whether or not its directory still exists
pub fn find_worktree_by_path(repo_dir: &Path, path: &Path) -> Result<Option<WorktreeInfo>> {
    let wanted = normalize(path);
    Ok(list_worktrees(repo_dir)?
        .into_iter()
        .find(|wt| normalize(&wt.path) == wanted))
}

/// Canonicalize the longest existing ancestor and re-append the rest.
///
/// Works for paths whose directory is gone, which is exactly the orphaned
/// worktree case.
fn normalize(path: &Path) -> PathBuf {
    let mut existing = path;
    let mut rest: Vec<&std::ffi::OsStr> = Vec::new();
    loop {
        if let Ok(canonical) = existing.canonicalize() {
            let mut result = canonical;
            for part in rest.iter().rev() {
                result.push(part);
            }
            return result;
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                rest.push(name);
                existing = parent;
            }
            _ => return path.to_path_buf(),
        }
    }
}
