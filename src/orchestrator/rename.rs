//! `rename`: move a feature to a new name

use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::journal::{Action, Journal};
use super::{roll_back, Orchestrator, RepoState};
use crate::error::RampError;
use crate::git::branch::{branch_exists, branch_name, current_branch, rename_branch};
use crate::git::worktree::move_worktree;
use crate::validation::validate_feature_name;

#[derive(Debug, Clone)]
pub struct RenameReport {
    pub from: String,
    pub to: String,
    pub repos: BTreeMap<String, RepoState>,
    pub ports_moved: bool,
    pub metadata_moved: bool,
    pub warnings: Vec<String>,
}

impl Orchestrator {
    /// Rename feature `from` to `to`, rolling everything back on failure
    pub fn rename(&self, from: &str, to: &str) -> Result<RenameReport> {
        validate_feature_name(from)?;
        validate_feature_name(to)?;
        if from == to {
            bail!("Feature is already named '{to}'");
        }
        let _lock = self.lock()?;

        let project = &self.project;
        let old_dir = project.feature_dir(from);
        let new_dir = project.feature_dir(to);
        if !old_dir.is_dir() {
            return Err(RampError::FeatureNotFound(from.to_string()).into());
        }
        if new_dir.exists() {
            bail!("Feature '{to}' already exists at {}", new_dir.display());
        }

        let prefix = project.branch_prefix(None);
        let old_branch = branch_name(prefix, from);
        let new_branch = branch_name(prefix, to);

        let mut states = BTreeMap::new();
        for repo in project.repos() {
            let path = project.worktree_dir(from, repo);
            if !path.is_dir() {
                continue;
            }
            let branch = current_branch(&path)?.unwrap_or_default();
            if branch == old_branch && branch_exists(&new_branch, &repo.source_dir) {
                return Err(RampError::BranchExists {
                    repo: repo.name.clone(),
                    branch: new_branch.clone(),
                }
                .into());
            }
            states.insert(repo.name.clone(), RepoState::new(&repo.name, &branch));
        }

        let mut report = RenameReport {
            from: from.to_string(),
            to: to.to_string(),
            repos: BTreeMap::new(),
            ports_moved: false,
            metadata_moved: false,
            warnings: Vec::new(),
        };

        let mut journal = Journal::new();
        let applied =
            self.apply_rename(from, to, &new_branch, &mut states, &mut report, &mut journal);
        if let Err(e) = applied {
            return Err(roll_back("rename", journal, e));
        }
        report.repos = states;

        // Only files not owned by any worktree remain; carry them over
        if let Err(e) = move_leftovers(&old_dir, &new_dir) {
            let msg = format!("Failed to clean up {}: {e:#}", old_dir.display());
            tracing::warn!("{msg}");
            report.warnings.push(msg);
        }

        tracing::info!(from, to, "feature renamed");
        Ok(report)
    }

    fn apply_rename(
        &self,
        from: &str,
        to: &str,
        new_branch: &str,
        states: &mut BTreeMap<String, RepoState>,
        report: &mut RenameReport,
        journal: &mut Journal,
    ) -> Result<()> {
        let project = &self.project;
        let prefix = project.branch_prefix(None);
        let old_branch = branch_name(prefix, from);

        let new_dir = project.feature_dir(to);
        fs::create_dir_all(&new_dir)
            .with_context(|| format!("Failed to create {}", new_dir.display()))?;
        journal.record(Action::CreatedDir(new_dir));

        for repo in project.repos() {
            let Some(state) = states.get_mut(&repo.name) else {
                report
                    .warnings
                    .push(format!("No worktree for '{}', skipped", repo.name));
                continue;
            };
            let old_path = project.worktree_dir(from, repo);
            let new_path = project.worktree_dir(to, repo);

            move_worktree(&repo.source_dir, &old_path, &new_path)
                .with_context(|| format!("Repository '{}'", repo.name))?;
            journal.record(Action::MovedWorktree {
                repo: repo.name.clone(),
                repo_dir: repo.source_dir.clone(),
                from: old_path,
                to: new_path,
            });

            if state.branch == old_branch {
                rename_branch(&old_branch, new_branch, &repo.source_dir)
                    .with_context(|| format!("Repository '{}'", repo.name))?;
                journal.record(Action::RenamedBranch {
                    repo: repo.name.clone(),
                    repo_dir: repo.source_dir.clone(),
                    from: old_branch.clone(),
                    to: new_branch.to_string(),
                });
                state.branch = new_branch.to_string();
            }
            tracing::info!(repo = %repo.name, branch = %state.branch, "worktree moved");
        }

        if let Some(allocator) = self.ports() {
            if allocator.rename_feature(from, to)? {
                journal.record(Action::MovedPorts {
                    allocator,
                    from: from.to_string(),
                    to: to.to_string(),
                });
                report.ports_moved = true;
            }
        }

        let store = self.metadata();
        if store.rename(from, to)? {
            journal.record(Action::MovedMetadata {
                store,
                from: from.to_string(),
                to: to.to_string(),
            });
            report.metadata_moved = true;
        }

        Ok(())
    }
}

/// Move whatever is left in the old trees directory, then delete it
fn move_leftovers(old_dir: &Path, new_dir: &Path) -> Result<()> {
    for entry in fs::read_dir(old_dir)? {
        let entry = entry?;
        let target = new_dir.join(entry.file_name());
        if target.exists() {
            bail!("{} already exists", target.display());
        }
        fs::rename(entry.path(), &target)?;
    }
    fs::remove_dir(old_dir)?;
    Ok(())
}
