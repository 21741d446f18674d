//! `rebase`: switch every source checkout to another branch

use anyhow::{Context, Result};
use std::collections::BTreeMap;

use super::journal::{Action, Journal};
use super::{roll_back, Orchestrator, RepoState};
use crate::error::RampError;
use crate::git::branch::{
    branch_exists, checkout_branch, checkout_tracking_branch, current_branch, get_branch_head,
    has_uncommitted_changes, remote_branch_exists,
};

#[derive(Debug, Clone)]
pub struct RebaseReport {
    pub branch: String,
    /// Repositories that were switched (or already on the branch)
    pub repos: BTreeMap<String, RepoState>,
    /// Repositories where the branch does not exist
    pub skipped: Vec<String>,
}

enum Switch {
    Local,
    Track(String),
    Skip,
}

impl Orchestrator {
    /// Check out `branch` in every source repository that has it.
    ///
    /// Refuses to start when any source checkout is dirty. A failure part way
    /// through restores every switched repository to its original branch.
    pub fn rebase(&self, branch: &str) -> Result<RebaseReport> {
        let _lock = self.lock()?;
        let project = &self.project;

        let mut plan = Vec::new();
        for repo in project.repos() {
            if has_uncommitted_changes(&repo.source_dir)
                .with_context(|| format!("Repository '{}'", repo.name))?
            {
                return Err(RampError::UncommittedChanges {
                    repo: repo.name.clone(),
                }
                .into());
            }
            let remote = format!("origin/{branch}");
            let switch = if branch_exists(branch, &repo.source_dir) {
                Switch::Local
            } else if remote_branch_exists(&remote, &repo.source_dir) {
                Switch::Track(remote)
            } else {
                Switch::Skip
            };
            plan.push((repo, switch));
        }
        if plan.iter().all(|(_, s)| matches!(s, Switch::Skip)) {
            return Err(RampError::TargetNotFound(branch.to_string()).into());
        }

        let mut report = RebaseReport {
            branch: branch.to_string(),
            repos: BTreeMap::new(),
            skipped: Vec::new(),
        };
        let mut journal = Journal::new();

        for (repo, switch) in plan {
            if matches!(switch, Switch::Skip) {
                tracing::info!(repo = %repo.name, branch, "branch not present, skipping");
                report.skipped.push(repo.name.clone());
                continue;
            }

            let dir = &repo.source_dir;
            let mut state = RepoState::new(&repo.name, branch);
            let original = match current_branch(dir) {
                Ok(Some(name)) => name,
                Ok(None) => match get_branch_head("HEAD", dir) {
                    Ok(sha) => sha,
                    Err(e) => return abort(journal, e),
                },
                Err(e) => return abort(journal, e),
            };
            state.original_branch = Some(original.clone());

            if original == branch {
                report.repos.insert(repo.name.clone(), state);
                continue;
            }

            let switched = match &switch {
                Switch::Track(remote) => checkout_tracking_branch(branch, remote, dir).map(|()| {
                    journal.record(Action::CreatedBranch {
                        repo: repo.name.clone(),
                        repo_dir: dir.clone(),
                        branch: branch.to_string(),
                    });
                    state.branch_created = true;
                }),
                _ => checkout_branch(branch, dir),
            };
            if let Err(e) = switched {
                let e = e.context(format!("Repository '{}'", repo.name));
                return abort(journal, e);
            }
            journal.record(Action::SwitchedBranch {
                repo: repo.name.clone(),
                repo_dir: dir.clone(),
                original,
            });
            tracing::info!(repo = %repo.name, branch, "switched");
            report.repos.insert(repo.name.clone(), state);
        }

        Ok(report)
    }
}

fn abort(journal: Journal, error: anyhow::Error) -> Result<RebaseReport> {
    Err(roll_back("rebase", journal, error))
}
