//! Per-repository worktree facts and feature status reports
//!
//! Facts are computed fresh on every call against the repository's default
//! branch, preferring the remote-tracking `origin/<default>` when it exists.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::classify::{classify, FeatureCategory};
use crate::config::{PortSettings, Project, Repository};
use crate::fs::MetadataStore;
use crate::git::branch::{
    ahead_behind, current_branch, default_base_ref, default_branch, diff_stats,
    has_uncommitted_changes, is_ancestor_of, is_on_first_parent_line, DiffStats,
};
use crate::ports::PortAllocator;

/// What git says about one feature worktree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeFacts {
    /// `None` on a detached HEAD
    pub branch: Option<String>,
    /// Ref the counts were computed against
    pub base_ref: String,
    pub has_uncommitted: bool,
    pub ahead: u32,
    pub behind: u32,
    /// HEAD is reachable from the base ref and was brought in by a merge,
    /// not left behind on the base ref's own history
    pub is_merged: bool,
    pub diff: DiffStats,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorktreeState {
    Present(WorktreeFacts),
    NotFound,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    pub repo: String,
    pub path: PathBuf,
    pub state: WorktreeState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureStatus {
    pub name: String,
    pub display_name: Option<String>,
    pub ports: Vec<u16>,
    pub repos: Vec<RepoStatus>,
    pub category: FeatureCategory,
}

impl FeatureStatus {
    pub fn states(&self) -> Vec<WorktreeState> {
        self.repos.iter().map(|r| r.state.clone()).collect()
    }
}

/// Compute facts for the worktree at `worktree`
pub fn worktree_facts(
    worktree: &Path,
    source_dir: &Path,
    default_override: Option<&str>,
) -> Result<WorktreeFacts> {
    let default = match default_override {
        Some(name) => name.to_string(),
        None => default_branch(source_dir)?,
    };
    let base_ref = default_base_ref(&default, source_dir)
        .with_context(|| format!("Default branch '{default}' not found"))?;

    let branch = current_branch(worktree)?;
    let has_uncommitted = has_uncommitted_changes(worktree)?;
    let (ahead, behind) = ahead_behind(&base_ref, "HEAD", worktree)?;
    let is_merged = is_ancestor_of("HEAD", &base_ref, worktree)?
        && !is_on_first_parent_line("HEAD", &base_ref, worktree)?;
    let diff = diff_stats(&base_ref, "HEAD", worktree)?;

    Ok(WorktreeFacts {
        branch,
        base_ref,
        has_uncommitted,
        ahead,
        behind,
        is_merged,
        diff,
    })
}

/// State of one repository's worktree for `feature`; never fails
pub fn repo_status(project: &Project, feature: &str, repo: &Repository) -> RepoStatus {
    let path = project.worktree_dir(feature, repo);
    let state = if !path.is_dir() {
        WorktreeState::NotFound
    } else {
        match worktree_facts(
            &path,
            &repo.source_dir,
            project.config().default_branch.as_deref(),
        ) {
            Ok(facts) => WorktreeState::Present(facts),
            Err(e) => {
                tracing::warn!(feature, repo = %repo.name, "status failed: {e:#}");
                WorktreeState::Error(format!("{e:#}"))
            }
        }
    };
    RepoStatus {
        repo: repo.name.clone(),
        path,
        state,
    }
}

/// Full status of one feature across every repository
pub fn feature_status(project: &Project, feature: &str) -> Result<FeatureStatus> {
    let repos: Vec<RepoStatus> = project
        .repos()
        .iter()
        .map(|repo| repo_status(project, feature, repo))
        .collect();
    let states: Vec<WorktreeState> = repos.iter().map(|r| r.state.clone()).collect();

    let display_name = MetadataStore::new(&project.ramp_dir()).display_name(feature)?;
    let ports = match project.port_settings() {
        Some(settings) => feature_ports(project, settings, feature)?,
        None => Vec::new(),
    };

    Ok(FeatureStatus {
        name: feature.to_string(),
        display_name,
        ports,
        category: classify(&states),
        repos,
    })
}

fn feature_ports(project: &Project, settings: PortSettings, feature: &str) -> Result<Vec<u16>> {
    Ok(PortAllocator::new(&project.ramp_dir(), settings)
        .get_ports(feature)?
        .unwrap_or_default())
}

/// Status of every feature under `trees/`, sorted by name
pub fn scan_features(project: &Project) -> Result<Vec<FeatureStatus>> {
    project
        .list_features()?
        .iter()
        .map(|feature| feature_status(project, feature))
        .collect()
}
