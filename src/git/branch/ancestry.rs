//! Branch ancestry: merge detection, ahead/behind counts, diff statistics

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::git::runner::{run_git, run_git_checked};

/// Line-level change totals between two refs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiffStats {
    pub files_changed: u32,
    pub insertions: u32,
    pub deletions: u32,
}

/// Check if `commit` is an ancestor of (or equal to) `target`.
///
/// Uses `git merge-base --is-ancestor`, which exits 0 for yes, 1 for no and
/// anything else for an error such as an unknown ref.
pub fn is_ancestor_of(commit: &str, target: &str, dir: &Path) -> Result<bool> {
    let output = run_git(&["merge-base", "--is-ancestor", commit, target], dir)?;
    match output.status.code() {
        Some(0) => Ok(true),
        Some(1) => Ok(false),
        _ => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "git merge-base --is-ancestor {commit} {target} failed in {}: {}",
                dir.display(),
                stderr.trim()
            )
        }
    }
}

/// Check if `commit` sits on the first-parent line of `target`.
///
/// True when walking `target` through first parents reaches `commit`. A branch
/// that never moved past the point it forked from stays on that line as the
/// default branch advances, while commits merged in with a merge commit
/// hang off a second parent. Only meaningful when `commit` is an ancestor
/// of `target`.
pub fn is_on_first_parent_line(commit: &str, target: &str, dir: &Path) -> Result<bool> {
    let commit_sha = get_branch_head(commit, dir)?;
    if commit_sha == get_branch_head(target, dir)? {
        return Ok(true);
    }
    // The walk stops at the first commit whose parent is reachable from
    // `commit`; that parent is `commit` itself only when it is on the line.
    let range = format!("{commit}..{target}");
    let stdout = run_git_checked(&["rev-list", "--first-parent", "--parents", &range], dir)?;
    Ok(stdout
        .lines()
        .any(|line| line.split_whitespace().nth(1) == Some(commit_sha.as_str())))
}

/// Get the commit SHA a ref points to
pub fn get_branch_head(branch: &str, dir: &Path) -> Result<String> {
    run_git_checked(&["rev-parse", "--verify", branch], dir)
        .with_context(|| format!("Failed to resolve {branch}"))
}

/// Count commits `head` has that `base` lacks (ahead) and vice versa (behind)
pub fn ahead_behind(base: &str, head: &str, dir: &Path) -> Result<(u32, u32)> {
    let range = format!("{base}...{head}");
    let stdout = run_git_checked(&["rev-list", "--left-right", "--count", &range], dir)?;
    parse_left_right(&stdout)
        .with_context(|| format!("Unexpected rev-list output for {range}: '{stdout}'"))
}

/// `rev-list --left-right --count base...head` prints "<behind>\t<ahead>"
fn parse_left_right(output: &str) -> Option<(u32, u32)> {
    let mut parts = output.split_whitespace();
    let behind = parts.next()?.parse().ok()?;
    let ahead = parts.next()?.parse().ok()?;
    Some((ahead, behind))
}

/// Diff statistics of `head` against its merge base with `base`
pub fn diff_stats(base: &str, head: &str, dir: &Path) -> Result<DiffStats> {
    let range = format!("{base}...{head}");
    let stdout = run_git_checked(&["diff", "--shortstat", &range], dir)?;
    Ok(parse_shortstat(&stdout))
}

/// Parse " 3 files changed, 10 insertions(+), 2 deletions(-)"
fn parse_shortstat(output: &str) -> DiffStats {
    let mut stats = DiffStats::default();
    for part in output.split(',') {
        let mut words = part.split_whitespace();
        let Some(count) = words.next().and_then(|n| n.parse::<u32>().ok()) else {
            continue;
        };
        match words.next() {
            Some(w) if w.starts_with("file") => stats.files_changed = count,
            Some(w) if w.starts_with("insertion") => stats.insertions = count,
            Some(w) if w.starts_with("deletion") => stats.deletions = count,
            _ => {}
        }
    }
    stats
}
