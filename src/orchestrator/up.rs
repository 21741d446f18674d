//! `up`: create a feature across every repository

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

use super::journal::{Action, Journal};
use super::{roll_back, Orchestrator, RepoState};
use crate::config::Repository;
use crate::error::RampError;
use crate::features::resolve_target;
use crate::git::branch::{
    branch_exists, branch_name, default_base_ref, default_branch, remote_branch_exists,
};
use crate::git::runner::is_git_repo;
use crate::git::worktree::{add_worktree, find_worktree_by_path, WorktreeBranch};
use crate::git::{refresh_repositories, RefreshReport};
use crate::scripts::{ScriptContext, ScriptKind};
use crate::validation::validate_feature_name;

#[derive(Debug, Clone, Default)]
pub struct UpOptions {
    /// Branch prefix for this invocation, overriding the project default
    pub prefix: Option<String>,
    /// Feature, local branch or remote ref to branch from
    pub target: Option<String>,
    /// Fetch/pull source repositories first
    pub refresh: bool,
}

/// Where a feature branch came from in one repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchSource {
    /// The branch already existed locally
    Existing,
    /// Created tracking a remote branch of the same name
    Remote(String),
    /// Created from the default branch
    Default(String),
    /// Created from a resolved `--target`
    Target(String),
}

impl BranchSource {
    fn worktree_branch(&self) -> WorktreeBranch<'_> {
        match self {
            BranchSource::Existing => WorktreeBranch::Existing,
            BranchSource::Remote(remote) => WorktreeBranch::TrackRemote(remote),
            BranchSource::Default(start) | BranchSource::Target(start) => {
                WorktreeBranch::NewFrom(start)
            }
        }
    }
}

impl fmt::Display for BranchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BranchSource::Existing => write!(f, "existing branch"),
            BranchSource::Remote(r) => write!(f, "tracking {r}"),
            BranchSource::Default(r) => write!(f, "from {r}"),
            BranchSource::Target(r) => write!(f, "from target {r}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct UpReport {
    pub feature: String,
    pub trees_dir: PathBuf,
    pub repos: BTreeMap<String, RepoState>,
    pub ports: Vec<u16>,
    pub refresh: Option<RefreshReport>,
    pub setup_ran: bool,
}

impl Orchestrator {
    /// Create worktrees, branches, ports and run setup for `feature`.
    ///
    /// Either everything is created or, on failure, every side effect of
    /// this call is rolled back before the error is returned.
    pub fn up(&self, feature: &str, options: &UpOptions) -> Result<UpReport> {
        validate_feature_name(feature)?;
        let _lock = self.lock()?;

        let project = &self.project;
        for repo in project.repos() {
            if !is_git_repo(&repo.source_dir) {
                return Err(RampError::RepoMissing {
                    name: repo.name.clone(),
                    path: repo.source_dir.display().to_string(),
                }
                .into());
            }
            let path = project.worktree_dir(feature, repo);
            if path.exists() {
                return Err(RampError::FeatureExists {
                    feature: feature.to_string(),
                    repo: repo.name.clone(),
                    path: path.display().to_string(),
                }
                .into());
            }
            // A registration whose directory is gone still makes
            // `git worktree add` fail, after it has created the branch
            if let Some(registered) = find_worktree_by_path(&repo.source_dir, &path)? {
                tracing::warn!(
                    feature,
                    repo = %repo.name,
                    prunable = registered.is_prunable,
                    "worktree path is still registered"
                );
                let err = RampError::FeatureExists {
                    feature: feature.to_string(),
                    repo: repo.name.clone(),
                    path: path.display().to_string(),
                };
                return Err(anyhow::Error::from(err).context(format!(
                    "git still has a worktree registered at this path; \
                     run `ramp down {feature}` or `git worktree prune` in '{}'",
                    repo.name
                )));
            }
        }

        let refresh = options.refresh.then(|| {
            let repos: Vec<Repository> = project
                .repos()
                .iter()
                .filter(|r| r.auto_refresh)
                .cloned()
                .collect();
            let report = refresh_repositories(&repos);
            for failure in report.failures() {
                tracing::warn!(
                    repo = %failure.repo,
                    "refresh failed, continuing: {:?}",
                    failure.outcome
                );
            }
            report
        });

        let prefix = project.branch_prefix(options.prefix.as_deref());
        let branch = branch_name(prefix, feature);
        let targets = match &options.target {
            Some(target) => Some(resolve_target(project, target, prefix)?),
            None => None,
        };

        // Decide every source before touching anything
        let mut states = BTreeMap::new();
        for repo in project.repos() {
            let resolved = targets
                .as_ref()
                .and_then(|t| t.get(&repo.name).cloned().flatten());
            let source = self.plan_branch(repo, &branch, resolved)?;
            let mut state = RepoState::new(&repo.name, &branch);
            state.source = Some(source);
            states.insert(repo.name.clone(), state);
        }

        let mut journal = Journal::new();
        match self.apply_up(feature, &mut states, &mut journal) {
            Ok((ports, setup_ran)) => {
                tracing::info!(feature, "feature created");
                Ok(UpReport {
                    feature: feature.to_string(),
                    trees_dir: project.feature_dir(feature),
                    repos: states,
                    ports,
                    refresh,
                    setup_ran,
                })
            }
            Err(e) => Err(roll_back("up", journal, e)),
        }
    }

    fn plan_branch(
        &self,
        repo: &Repository,
        branch: &str,
        resolved_target: Option<String>,
    ) -> Result<BranchSource> {
        let dir = &repo.source_dir;
        if let Some(target) = resolved_target {
            if branch_exists(branch, dir) {
                return Err(RampError::BranchExists {
                    repo: repo.name.clone(),
                    branch: branch.to_string(),
                }
                .into());
            }
            return Ok(BranchSource::Target(target));
        }

        if branch_exists(branch, dir) {
            return Ok(BranchSource::Existing);
        }
        let remote = format!("origin/{branch}");
        if remote_branch_exists(&remote, dir) {
            return Ok(BranchSource::Remote(remote));
        }

        let default = match &self.project.config().default_branch {
            Some(name) => name.clone(),
            None => default_branch(dir)
                .with_context(|| format!("Repository '{}'", repo.name))?,
        };
        let base = default_base_ref(&default, dir).with_context(|| {
            format!(
                "Default branch '{default}' not found in repository '{}'",
                repo.name
            )
        })?;
        Ok(BranchSource::Default(base))
    }

    fn apply_up(
        &self,
        feature: &str,
        states: &mut BTreeMap<String, RepoState>,
        journal: &mut Journal,
    ) -> Result<(Vec<u16>, bool)> {
        let project = &self.project;

        let feature_dir = project.feature_dir(feature);
        if !feature_dir.exists() {
            fs::create_dir_all(&feature_dir)
                .with_context(|| format!("Failed to create {}", feature_dir.display()))?;
            journal.record(Action::CreatedDir(feature_dir.clone()));
        }

        for repo in project.repos() {
            let Some(state) = states.get_mut(&repo.name) else {
                continue;
            };
            let Some(source) = state.source.clone() else {
                continue;
            };
            self.scripts.check_cancelled()?;
            let path = project.worktree_dir(feature, repo);
            let branch_existed = branch_exists(&state.branch, &repo.source_dir);

            let added = add_worktree(
                &repo.source_dir,
                &path,
                &state.branch,
                &source.worktree_branch(),
            );
            // `worktree add -b` can create the branch and still fail on the path
            if !branch_existed
                && (added.is_ok() || branch_exists(&state.branch, &repo.source_dir))
            {
                journal.record(Action::CreatedBranch {
                    repo: repo.name.clone(),
                    repo_dir: repo.source_dir.clone(),
                    branch: state.branch.clone(),
                });
                state.branch_created = true;
            }
            added.with_context(|| format!("Repository '{}'", repo.name))?;

            journal.record(Action::CreatedWorktree {
                repo: repo.name.clone(),
                repo_dir: repo.source_dir.clone(),
                path,
            });
            state.worktree_created = true;
            tracing::info!(
                feature,
                repo = %repo.name,
                branch = %state.branch,
                %source,
                "worktree created"
            );
        }

        self.scripts.check_cancelled()?;
        let mut ports = Vec::new();
        if let (Some(allocator), Some(settings)) = (self.ports(), project.port_settings()) {
            let allocation = allocator.allocate_n(feature, settings.per_feature)?;
            if !allocation.newly_allocated {
                tracing::info!(
                    feature,
                    ports = ?allocation.ports,
                    "reusing ports left over from an earlier teardown"
                );
            }
            // No worktree of this feature existed before this call, so a
            // failed up releases the entry whether or not it was fresh
            journal.record(Action::AllocatedPorts {
                allocator,
                feature: feature.to_string(),
            });
            ports = allocation.ports;
        }

        let mut setup_ran = false;
        if let Some(setup) = &project.config().setup {
            let script = project.script_path(setup);
            let display_name = self.metadata().display_name(feature)?;
            let ctx = ScriptContext::for_feature(project, feature, &ports, display_name.as_deref());
            self.scripts.run(&ScriptKind::Setup, &script, &ctx)?;
            setup_ran = true;
        }

        Ok((ports, setup_ran))
    }
}
