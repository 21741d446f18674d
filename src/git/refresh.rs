//! Concurrent refresh of every source repository
//!
//! One thread per repository runs `git fetch --prune` and, for repositories
//! with `auto_refresh`, a fast-forward-only pull of the checked-out branch.
//! Results land in a shared, mutex-guarded vector; the scope joins every
//! thread before the report is built. A failing repository never affects
//! its siblings.

use anyhow::Result;
use std::sync::Mutex;
use std::thread;

use crate::config::Repository;
use crate::git::branch::{current_branch, has_uncommitted_changes, list_remotes, upstream_branch};
use crate::git::runner::run_git_checked;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Fetched and fast-forwarded the checked-out branch
    Pulled,
    /// Fetched only; the reason the pull was skipped
    Fetched(String),
    /// Repository has no remotes configured
    NoRemote,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshResult {
    pub repo: String,
    pub outcome: RefreshOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct RefreshReport {
    pub results: Vec<RefreshResult>,
}

impl RefreshReport {
    pub fn failures(&self) -> impl Iterator<Item = &RefreshResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, RefreshOutcome::Failed(_)))
    }

    pub fn success_count(&self) -> usize {
        self.results.len() - self.failures().count()
    }
}

/// Refresh all repositories concurrently
pub fn refresh_repositories(repos: &[Repository]) -> RefreshReport {
    let results: Mutex<Vec<RefreshResult>> = Mutex::new(Vec::with_capacity(repos.len()));

    thread::scope(|scope| {
        for repo in repos {
            let results = &results;
            scope.spawn(move || {
                let outcome = match refresh_one(repo) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::warn!(repo = %repo.name, "refresh failed: {e:#}");
                        RefreshOutcome::Failed(format!("{e:#}"))
                    }
                };
                let result = RefreshResult {
                    repo: repo.name.clone(),
                    outcome,
                };
                match results.lock() {
                    Ok(mut guard) => guard.push(result),
                    Err(poisoned) => poisoned.into_inner().push(result),
                }
            });
        }
    });

    let mut results = results
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    // Report in configuration order, not completion order
    results.sort_by_key(|r| repos.iter().position(|repo| repo.name == r.repo));
    RefreshReport { results }
}

fn refresh_one(repo: &Repository) -> Result<RefreshOutcome> {
    let dir = &repo.source_dir;
    if list_remotes(dir)?.is_empty() {
        return Ok(RefreshOutcome::NoRemote);
    }

    run_git_checked(&["fetch", "--prune", "--quiet"], dir)?;
    tracing::info!(repo = %repo.name, "fetched");

    if !repo.auto_refresh {
        return Ok(RefreshOutcome::Fetched("auto_refresh disabled".to_string()));
    }
    let Some(branch) = current_branch(dir)? else {
        return Ok(RefreshOutcome::Fetched("detached HEAD".to_string()));
    };
    if upstream_branch(dir).is_none() {
        return Ok(RefreshOutcome::Fetched(format!("{branch} has no upstream")));
    }
    if has_uncommitted_changes(dir)? {
        return Ok(RefreshOutcome::Fetched("uncommitted changes".to_string()));
    }

    run_git_checked(&["pull", "--ff-only", "--quiet"], dir)?;
    tracing::info!(repo = %repo.name, %branch, "pulled");
    Ok(RefreshOutcome::Pulled)
}
