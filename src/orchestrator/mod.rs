//! Feature lifecycle orchestration
//!
//! The [`Orchestrator`] drives every operation that touches more than one
//! repository:
//! - `up`: create worktrees, allocate ports, run setup
//! - `down`: run cleanup, remove worktrees and branches, release ports
//! - `rename`: move worktrees, branches, ports and metadata to a new name
//! - `rebase`: switch every source checkout to another branch
//! - `prune`: tear down every merged feature
//!
//! Mutating operations hold the project lock for their whole duration and
//! journal their side effects so a failure can be rolled back.

mod confirm;
mod down;
mod journal;
mod prune;
mod rebase;
mod rename;
mod run;
mod up;

use anyhow::Result;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::Project;
use crate::error::RampError;
use crate::features::{scan_features, FeatureStatus};
use crate::fs::{FeatureMetadata, MetadataStore, ProjectLock};
use crate::git::{refresh_repositories, RefreshReport};
use crate::ports::PortAllocator;
use crate::scripts::{CancelToken, ScriptRunner};
use crate::validation::validate_feature_name;

pub use confirm::{AutoConfirm, Confirm, StdinConfirm};
pub use down::{DownOptions, DownReport, RepoTeardown};
pub use journal::{Action, Journal};
pub use prune::PruneReport;
pub use rebase::RebaseReport;
pub use rename::RenameReport;
pub use up::{BranchSource, UpOptions, UpReport};

/// Per-repository record of one operation, used for rollback and reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoState {
    pub repo: String,
    pub branch: String,
    /// Where the branch came from, when this call decided it
    pub source: Option<BranchSource>,
    pub worktree_created: bool,
    pub branch_created: bool,
    /// Branch (or commit) checked out before a rebase
    pub original_branch: Option<String>,
}

impl RepoState {
    pub fn new(repo: &str, branch: &str) -> Self {
        Self {
            repo: repo.to_string(),
            branch: branch.to_string(),
            source: None,
            worktree_created: false,
            branch_created: false,
            original_branch: None,
        }
    }
}

pub struct Orchestrator {
    project: Project,
    confirm: Box<dyn Confirm>,
    scripts: ScriptRunner,
}

impl Orchestrator {
    /// Orchestrator with interactive confirmation
    pub fn new(project: Project) -> Self {
        let timeout = project
            .config()
            .script_timeout_secs
            .map(Duration::from_secs);
        Self {
            project,
            confirm: Box::new(StdinConfirm),
            scripts: ScriptRunner::new(timeout),
        }
    }

    pub fn with_confirm(mut self, confirm: impl Confirm + 'static) -> Self {
        self.confirm = Box::new(confirm);
        self
    }

    /// Let Ctrl-C cancel running scripts
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.scripts = self.scripts.with_cancel(token);
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    fn lock(&self) -> Result<ProjectLock> {
        ProjectLock::acquire(&self.project.ramp_dir())
    }

    fn ports(&self) -> Option<PortAllocator> {
        self.project
            .port_settings()
            .map(|settings| PortAllocator::new(&self.project.ramp_dir(), settings))
    }

    fn feature_ports(&self, feature: &str) -> Result<Vec<u16>> {
        match self.ports() {
            Some(allocator) => Ok(allocator.get_ports(feature)?.unwrap_or_default()),
            None => Ok(Vec::new()),
        }
    }

    fn metadata(&self) -> MetadataStore {
        MetadataStore::new(&self.project.ramp_dir())
    }

    fn require_feature(&self, feature: &str) -> Result<()> {
        validate_feature_name(feature)?;
        if !self.project.feature_dir(feature).is_dir() {
            return Err(RampError::FeatureNotFound(feature.to_string()).into());
        }
        Ok(())
    }

    /// Status of every feature
    pub fn status(&self) -> Result<Vec<FeatureStatus>> {
        scan_features(&self.project)
    }

    /// Fetch (and fast-forward where allowed) every source repository
    pub fn refresh(&self) -> RefreshReport {
        refresh_repositories(self.project.repos())
    }

    /// Port allocations of every feature; empty when ports are not configured
    pub fn port_allocations(&self) -> Result<BTreeMap<String, Vec<u16>>> {
        match self.ports() {
            Some(ports) => ports.all(),
            None => Ok(BTreeMap::new()),
        }
    }

    /// Set or clear (with `None`) a feature's display name
    pub fn set_display_name(
        &self,
        feature: &str,
        display_name: Option<&str>,
    ) -> Result<Option<FeatureMetadata>> {
        self.require_feature(feature)?;
        self.metadata().set_display_name(feature, display_name)
    }

    pub fn display_name(&self, feature: &str) -> Result<Option<String>> {
        self.metadata().display_name(feature)
    }
}

/// Undo `journal` after `error`; rollback failures are attached to the error
fn roll_back(operation: &str, journal: Journal, error: anyhow::Error) -> anyhow::Error {
    tracing::warn!("{operation} failed, rolling back: {error:#}");
    let failures = journal.rollback();
    if failures.is_empty() {
        error
    } else {
        error.context(format!(
            "{operation} failed and rollback was incomplete: {}",
            failures.join("; ")
        ))
    }
}
