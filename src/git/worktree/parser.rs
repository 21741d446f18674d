//! Worktree output parsing
//!
//! Parses `git worktree list --porcelain` output into structured data.

use std::path::PathBuf;

/// Parsed worktree information from git worktree list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeInfo {
    pub path: PathBuf,
    pub head: String,
    pub branch: Option<String>,
    pub is_bare: bool,
    pub is_detached: bool,
    /// Registered, but git reports its directory as missing
    pub is_prunable: bool,
}

/// Parse git worktree list --porcelain output
///
/// Example input:
/// ```text
/// worktree /home/user/project/repos/api
/// HEAD abc123def456
/// branch refs/heads/main
///
/// worktree /home/user/project/trees/alpha/api
/// HEAD def789abc012
/// branch refs/heads/feature/alpha
/// prunable gitdir file points to non-existent location
/// ```
pub fn parse_worktree_list(output: &str) -> Vec<WorktreeInfo> {
    let mut worktrees = Vec::new();
    let mut current: Option<WorktreeInfo> = None;

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(wt) = current.take() {
                worktrees.push(wt);
            }
            current = Some(WorktreeInfo {
                path: PathBuf::from(path),
                head: String::new(),
                branch: None,
                is_bare: false,
                is_detached: false,
                is_prunable: false,
            });
            continue;
        }

        let Some(wt) = current.as_mut() else {
            continue;
        };
        if let Some(head) = line.strip_prefix("HEAD ") {
            wt.head = head.to_string();
        } else if let Some(branch_line) = line.strip_prefix("branch ") {
            let branch_name = branch_line
                .strip_prefix("refs/heads/")
                .unwrap_or(branch_line);
            wt.branch = Some(branch_name.to_string());
        } else if line == "bare" {
            wt.is_bare = true;
        } else if line == "detached" {
            wt.is_detached = true;
        } else if line == "prunable" || line.starts_with("prunable ") {
            wt.is_prunable = true;
        }
    }

    if let Some(wt) = current {
        worktrees.push(wt);
    }

    worktrees
}
