//! Compensating rollback for multi-repository operations
//!
//! Git gives no transaction across repositories, so every side effect an
//! operation applies is recorded here right after it succeeds. On failure
//! the journal is consumed in reverse order, undoing each action exactly
//! once. Undo failures are logged and collected, never raised: the caller
//! still reports the error that triggered the rollback.

use anyhow::{Context, Result};
use std::fs;
use std::path::PathBuf;

use crate::fs::MetadataStore;
use crate::git::branch::{checkout_branch, delete_branch_if_exists, rename_branch};
use crate::git::worktree::{move_worktree, remove_worktree};
use crate::ports::PortAllocator;

/// One applied side effect, carrying what is needed to undo it
#[derive(Debug, Clone)]
pub enum Action {
    /// A feature trees directory this call created
    CreatedDir(PathBuf),
    CreatedWorktree {
        repo: String,
        repo_dir: PathBuf,
        path: PathBuf,
    },
    /// A branch that did not exist before this call
    CreatedBranch {
        repo: String,
        repo_dir: PathBuf,
        branch: String,
    },
    AllocatedPorts {
        allocator: PortAllocator,
        feature: String,
    },
    MovedWorktree {
        repo: String,
        repo_dir: PathBuf,
        from: PathBuf,
        to: PathBuf,
    },
    RenamedBranch {
        repo: String,
        repo_dir: PathBuf,
        from: String,
        to: String,
    },
    MovedPorts {
        allocator: PortAllocator,
        from: String,
        to: String,
    },
    MovedMetadata {
        store: MetadataStore,
        from: String,
        to: String,
    },
    /// Primary checkout switched away from `original` (a branch or commit)
    SwitchedBranch {
        repo: String,
        repo_dir: PathBuf,
        original: String,
    },
}

impl Action {
    fn undo(&self) -> Result<()> {
        match self {
            Action::CreatedDir(path) => {
                if path.exists() {
                    fs::remove_dir_all(path)
                        .with_context(|| format!("Failed to remove {}", path.display()))?;
                }
            }
            Action::CreatedWorktree { repo_dir, path, .. } => {
                remove_worktree(repo_dir, path)?;
            }
            Action::CreatedBranch {
                repo_dir, branch, ..
            } => {
                delete_branch_if_exists(branch, repo_dir)?;
            }
            Action::AllocatedPorts { allocator, feature } => {
                allocator.release(feature)?;
            }
            Action::MovedWorktree {
                repo_dir, from, to, ..
            } => {
                move_worktree(repo_dir, to, from)?;
            }
            Action::RenamedBranch {
                repo_dir, from, to, ..
            } => {
                rename_branch(to, from, repo_dir)?;
            }
            Action::MovedPorts {
                allocator,
                from,
                to,
            } => {
                allocator.rename_feature(to, from)?;
            }
            Action::MovedMetadata { store, from, to } => {
                store.rename(to, from)?;
            }
            Action::SwitchedBranch {
                repo_dir, original, ..
            } => {
                checkout_branch(original, repo_dir)?;
            }
        }
        Ok(())
    }

    fn describe(&self) -> String {
        match self {
            Action::CreatedDir(path) => format!("remove directory {}", path.display()),
            Action::CreatedWorktree { repo, path, .. } => {
                format!("remove worktree {} ({repo})", path.display())
            }
            Action::CreatedBranch { repo, branch, .. } => {
                format!("delete branch {branch} ({repo})")
            }
            Action::AllocatedPorts { feature, .. } => format!("release ports of {feature}"),
            Action::MovedWorktree { repo, to, .. } => {
                format!("move worktree {} back ({repo})", to.display())
            }
            Action::RenamedBranch { repo, from, to, .. } => {
                format!("rename branch {to} back to {from} ({repo})")
            }
            Action::MovedPorts { from, to, .. } => format!("move ports from {to} back to {from}"),
            Action::MovedMetadata { from, to, .. } => {
                format!("move metadata from {to} back to {from}")
            }
            Action::SwitchedBranch { repo, original, .. } => {
                format!("check out {original} ({repo})")
            }
        }
    }
}

/// Ordered record of applied actions
#[derive(Debug, Default)]
pub struct Journal {
    actions: Vec<Action>,
}

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: Action) {
        tracing::debug!("journal: {}", action.describe());
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Undo every action, newest first. Returns the undo failures.
    pub fn rollback(self) -> Vec<String> {
        let mut failures = Vec::new();
        for action in self.actions.into_iter().rev() {
            tracing::info!("rollback: {}", action.describe());
            if let Err(e) = action.undo() {
                let msg = format!("Failed to {}: {e:#}", action.describe());
                tracing::warn!("{msg}");
                failures.push(msg);
            }
        }
        failures
    }
}
