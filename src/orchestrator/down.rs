//! `down`: tear a feature down across every repository
//!
//! Teardown is best-effort per repository: a worktree that was deleted by
//! hand, a branch that no longer exists or a failing cleanup script become
//! warnings, and the remaining steps still run.

use anyhow::Result;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use super::Orchestrator;
use crate::config::Repository;
use crate::error::{is_cancelled, RampError};
use crate::git::branch::{
    branch_exists, branch_name, current_branch, delete_branch, working_tree_changes,
};
use crate::git::worktree::{find_worktree_by_path, remove_worktree};
use crate::scripts::{ScriptContext, ScriptKind};
use crate::validation::validate_feature_name;

#[derive(Debug, Clone, Default)]
pub struct DownOptions {
    /// Prefix used when the branch has to be reconstructed from the name
    pub prefix: Option<String>,
}

/// What happened to one repository during teardown
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoTeardown {
    pub branch: Option<String>,
    pub worktree_removed: bool,
    pub branch_deleted: bool,
}

#[derive(Debug, Clone, Default)]
pub struct DownReport {
    pub feature: String,
    pub repos: BTreeMap<String, RepoTeardown>,
    pub released_ports: Option<Vec<u16>>,
    pub cleanup_ran: bool,
    pub warnings: Vec<String>,
}

/// A repository's view of the feature before anything is removed
struct Detected {
    path: PathBuf,
    registered: bool,
    branch: Option<String>,
}

impl Orchestrator {
    /// Remove `feature`: cleanup script, worktrees, branches, ports,
    /// metadata and the trees directory.
    pub fn down(&self, feature: &str, options: &DownOptions) -> Result<DownReport> {
        validate_feature_name(feature)?;
        let _lock = self.lock()?;
        self.down_locked(feature, options)
    }

    /// Teardown body; the caller holds the project lock
    pub(super) fn down_locked(&self, feature: &str, options: &DownOptions) -> Result<DownReport> {
        let project = &self.project;
        let feature_dir = project.feature_dir(feature);
        let prefix = project.branch_prefix(options.prefix.as_deref());
        let mut report = DownReport {
            feature: feature.to_string(),
            ..Default::default()
        };

        let detected: Vec<(&Repository, Detected)> = project
            .repos()
            .iter()
            .map(|repo| {
                let path = project.worktree_dir(feature, repo);
                (repo, detect(repo, path, prefix, feature))
            })
            .collect();

        let nothing_left = detected
            .iter()
            .all(|(_, d)| !d.registered && d.branch.is_none());
        if !feature_dir.exists() && nothing_left {
            return Err(RampError::FeatureNotFound(feature.to_string()).into());
        }

        let dirty: Vec<String> = detected
            .iter()
            .filter(|(_, d)| d.path.join(".git").exists())
            .filter_map(|(repo, d)| match working_tree_changes(&d.path) {
                Ok(changes) if changes.is_dirty() => Some(repo.name.clone()),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!(repo = %repo.name, "could not check for changes: {e:#}");
                    None
                }
            })
            .collect();
        if !dirty.is_empty() {
            let prompt = format!(
                "Feature '{feature}' has uncommitted changes in {}. Remove anyway?",
                dirty.join(", ")
            );
            if !self.confirm.confirm(&prompt)? {
                return Err(RampError::Aborted.into());
            }
        }

        if let Some(cleanup) = &project.config().cleanup {
            if feature_dir.is_dir() {
                let ports = self.feature_ports(feature)?;
                let display_name = self.metadata().display_name(feature)?;
                let ctx =
                    ScriptContext::for_feature(project, feature, &ports, display_name.as_deref());
                match self
                    .scripts
                    .run(&ScriptKind::Cleanup, &project.script_path(cleanup), &ctx)
                {
                    Ok(()) => report.cleanup_ran = true,
                    Err(e) if is_cancelled(&e) => return Err(e),
                    Err(e) => warn(&mut report, format!("Cleanup script failed: {e:#}")),
                }
            }
        }

        for (repo, d) in detected {
            let mut teardown = RepoTeardown {
                branch: d.branch.clone(),
                ..Default::default()
            };

            if d.registered || d.path.exists() {
                match remove_worktree(&repo.source_dir, &d.path) {
                    Ok(removed) => teardown.worktree_removed = removed,
                    Err(e) => warn(
                        &mut report,
                        format!("Failed to remove worktree for '{}': {e:#}", repo.name),
                    ),
                }
            }

            if let Some(branch) = &d.branch {
                if branch_exists(branch, &repo.source_dir) {
                    match delete_branch(branch, true, &repo.source_dir) {
                        Ok(()) => teardown.branch_deleted = true,
                        Err(e) => warn(
                            &mut report,
                            format!("Failed to delete branch {branch} in '{}': {e:#}", repo.name),
                        ),
                    }
                }
            }

            tracing::info!(feature, repo = %repo.name, ?teardown, "repository torn down");
            report.repos.insert(repo.name.clone(), teardown);
        }

        if let Some(allocator) = self.ports() {
            match allocator.release(feature) {
                Ok(released) => report.released_ports = released,
                Err(e) => warn(&mut report, format!("Failed to release ports: {e:#}")),
            }
        }

        if let Err(e) = self.metadata().remove(feature) {
            warn(&mut report, format!("Failed to remove metadata: {e:#}"));
        }

        if feature_dir.exists() {
            if let Err(e) = fs::remove_dir_all(&feature_dir) {
                warn(
                    &mut report,
                    format!("Failed to remove {}: {e}", feature_dir.display()),
                );
            }
        }

        Ok(report)
    }
}

fn warn(report: &mut DownReport, msg: String) {
    tracing::warn!(feature = %report.feature, "{msg}");
    report.warnings.push(msg);
}

/// Branch lookup order: the worktree's checked-out branch, the branch git
/// has registered for the worktree path, then `prefix + feature`.
fn detect(repo: &Repository, path: PathBuf, prefix: &str, feature: &str) -> Detected {
    let registered = match find_worktree_by_path(&repo.source_dir, &path) {
        Ok(info) => info,
        Err(e) => {
            tracing::warn!(repo = %repo.name, "could not list worktrees: {e:#}");
            None
        }
    };

    // A bare leftover directory would report an enclosing repository's branch
    let checked_out = if path.join(".git").exists() {
        current_branch(&path).ok().flatten()
    } else {
        None
    };
    let constructed = Some(branch_name(prefix, feature))
        .filter(|branch| branch_exists(branch, &repo.source_dir));

    let branch = checked_out
        .or_else(|| registered.as_ref().and_then(|wt| wt.branch.clone()))
        .or(constructed);

    Detected {
        path,
        registered: registered.is_some(),
        branch,
    }
}
