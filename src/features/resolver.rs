//! Branch resolution for `up --target`
//!
//! A target names where a new feature branch starts. It may be a
//! remote-tracking ref (`origin/release`), a local branch, or the name of
//! another feature. Each repository resolves it independently; a repository
//! where the target does not exist simply falls back to its default branch.

use anyhow::Result;
use std::collections::BTreeMap;

use crate::config::{Project, Repository};
use crate::error::RampError;
use crate::git::branch::{
    branch_exists, branch_name, current_branch, list_remotes, remote_branch_exists,
    split_remote_ref,
};

/// Resolve `target` in one repository.
///
/// Order:
/// 1. an existing remote-tracking ref `<remote>/<branch>`
/// 2. an existing local branch
/// 3. a feature name: the branch checked out in `trees/<target>/<repo>`,
///    then local `prefix+target`, then `origin/prefix+target`
///
/// Returns `None` when nothing matches.
pub fn resolve_source_ref(
    project: &Project,
    repo: &Repository,
    target: &str,
    prefix: &str,
) -> Result<Option<String>> {
    let dir = &repo.source_dir;

    if let Some((remote, _)) = split_remote_ref(target) {
        if list_remotes(dir)?.iter().any(|r| r == remote) && remote_branch_exists(target, dir) {
            return Ok(Some(target.to_string()));
        }
    }

    if branch_exists(target, dir) {
        return Ok(Some(target.to_string()));
    }

    let feature_worktree = project.worktree_dir(target, repo);
    if feature_worktree.is_dir() {
        if let Some(branch) = current_branch(&feature_worktree)? {
            return Ok(Some(branch));
        }
    }

    let feature_branch = branch_name(prefix, target);
    if branch_exists(&feature_branch, dir) {
        return Ok(Some(feature_branch));
    }
    let remote_feature = format!("origin/{feature_branch}");
    if remote_branch_exists(&remote_feature, dir) {
        return Ok(Some(remote_feature));
    }

    Ok(None)
}

/// Resolve `target` in every repository.
///
/// Fails with [`RampError::TargetNotFound`] when no repository knows it.
pub fn resolve_target(
    project: &Project,
    target: &str,
    prefix: &str,
) -> Result<BTreeMap<String, Option<String>>> {
    let mut resolved = BTreeMap::new();
    for repo in project.repos() {
        let source = resolve_source_ref(project, repo, target, prefix)?;
        match &source {
            Some(source) => {
                tracing::info!(repo = %repo.name, target, %source, "target resolved")
            }
            None => {
                tracing::info!(repo = %repo.name, target, "target not found, using default branch")
            }
        }
        resolved.insert(repo.name.clone(), source);
    }

    if resolved.values().all(Option::is_none) {
        return Err(RampError::TargetNotFound(target.to_string()).into());
    }
    Ok(resolved)
}
