//! Working tree status: uncommitted change detection

use anyhow::{bail, Result};
use std::path::Path;

use crate::git::runner::run_git;

/// Files with uncommitted changes in one working tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeChanges {
    pub staged: Vec<String>,
    pub modified: Vec<String>,
    pub untracked: Vec<String>,
}

impl WorkingTreeChanges {
    /// Untracked files count: removing a worktree would lose them too
    pub fn is_dirty(&self) -> bool {
        !self.staged.is_empty() || !self.modified.is_empty() || !self.untracked.is_empty()
    }

    /// Human-readable one-line-per-kind summary, empty when clean
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        if !self.staged.is_empty() {
            summary.push_str(&format!("Staged: {}\n", self.staged.join(", ")));
        }
        if !self.modified.is_empty() {
            summary.push_str(&format!("Modified: {}\n", self.modified.join(", ")));
        }
        if !self.untracked.is_empty() {
            summary.push_str(&format!("Untracked: {}\n", self.untracked.join(", ")));
        }
        summary
    }
}

/// Collect uncommitted changes with `git status --porcelain`
pub fn working_tree_changes(dir: &Path) -> Result<WorkingTreeChanges> {
    // Not run_git_checked: trimming would eat the leading status column
    let output = run_git(&["status", "--porcelain", "--untracked-files=normal"], dir)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("git status failed in {}: {}", dir.display(), stderr.trim());
    }
    Ok(parse_porcelain(&String::from_utf8_lossy(&output.stdout)))
}

/// Check if a working tree has staged, modified or untracked files
pub fn has_uncommitted_changes(dir: &Path) -> Result<bool> {
    Ok(working_tree_changes(dir)?.is_dirty())
}

fn parse_porcelain(output: &str) -> WorkingTreeChanges {
    let mut changes = WorkingTreeChanges::default();

    for line in output.lines() {
        // Porcelain format: XY filename
        if line.len() < 4 {
            continue;
        }
        let mut chars = line.chars();
        let index_status = chars.next().unwrap_or(' ');
        let worktree_status = chars.next().unwrap_or(' ');
        let filename = line[3..].to_string();

        if index_status == '?' {
            changes.untracked.push(filename);
            continue;
        }
        if index_status != ' ' {
            changes.staged.push(filename.clone());
        }
        if worktree_status != ' ' {
            changes.modified.push(filename);
        }
    }

    changes
}
