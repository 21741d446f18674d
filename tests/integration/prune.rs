//! Prune: merged features go, everything else stays

use serial_test::serial;
use std::fs;

use ramp::error::{find_ramp_error, RampError};
use ramp::features::FeatureCategory;
use ramp::orchestrator::UpOptions;

use super::helpers::*;

/// Commit on the feature branch in `repo`, then merge it into `main` with a
/// merge commit so `main` moves ahead of the feature
fn commit_and_merge(project: &TestProject, feature: &str, repo: &str) {
    commit_file(
        &project.worktree(feature, repo),
        &format!("{feature}-{repo}.txt"),
        "done",
    );
    git(
        &[
            "merge",
            "--no-ff",
            "-m",
            &format!("Merge {feature}"),
            &format!("feature/{feature}"),
        ],
        &project.repo(repo),
    );
}

#[test]
#[serial]
fn test_prune_removes_merged_feature_and_releases_port() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("alpha", &UpOptions::default()).unwrap();
    orchestrator.up("beta", &UpOptions::default()).unwrap();
    for repo in ["api", "web"] {
        commit_and_merge(&project, "alpha", repo);
    }
    commit_file(&project.worktree("beta", "api"), "beta.txt", "unmerged");

    let statuses = orchestrator.status().unwrap();
    assert_eq!(statuses[0].category, FeatureCategory::Merged);
    assert_eq!(statuses[1].category, FeatureCategory::NeedsAttention);

    let report = orchestrator.prune().expect("prune should succeed");

    assert_eq!(report.candidates, vec!["alpha".to_string()]);
    assert_eq!(report.pruned, vec!["alpha".to_string()]);
    assert!(report.failed.is_empty());
    assert!(!project.feature_dir("alpha").exists());
    for repo in ["api", "web"] {
        assert!(!local_branch_exists(&project.repo(repo), "feature/alpha"));
    }

    let ports = orchestrator.port_allocations().unwrap();
    assert!(!ports.contains_key("alpha"));
    assert_eq!(ports.get("beta"), Some(&vec![3001]));
    assert!(project.worktree("beta", "api").join("beta.txt").exists());
}

#[test]
#[serial]
fn test_prune_never_selects_feature_without_commits() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("fresh", &UpOptions::default()).unwrap();

    let statuses = orchestrator.status().unwrap();
    assert_eq!(statuses[0].category, FeatureCategory::Clean);

    let report = orchestrator.prune().unwrap();

    assert!(report.candidates.is_empty());
    assert!(report.pruned.is_empty());
    assert!(project.worktree("fresh", "api").exists());
}

#[test]
#[serial]
fn test_prune_requires_every_repository_merged() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("half", &UpOptions::default()).unwrap();
    commit_and_merge(&project, "half", "api");
    commit_file(&project.worktree("half", "web"), "web.txt", "pending");

    let report = orchestrator.prune().unwrap();

    assert!(report.candidates.is_empty());
    assert!(project.feature_dir("half").exists());
}

#[test]
#[serial]
fn test_prune_skips_merged_feature_with_uncommitted_changes() {
    let project = TestProject::new(&["api"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("alpha", &UpOptions::default()).unwrap();
    commit_and_merge(&project, "alpha", "api");
    fs::write(project.worktree("alpha", "api").join("late.txt"), "oops").unwrap();

    let report = orchestrator.prune().unwrap();

    assert!(report.candidates.is_empty());
    assert!(project.feature_dir("alpha").exists());
}

#[test]
#[serial]
fn test_prune_declined_keeps_everything() {
    let project = TestProject::new(&["api"], "");
    project
        .orchestrator()
        .up("alpha", &UpOptions::default())
        .unwrap();
    commit_and_merge(&project, "alpha", "api");

    let err = project.orchestrator_answering(false).prune().unwrap_err();

    assert!(matches!(find_ramp_error(&err), Some(RampError::Aborted)));
    assert!(project.feature_dir("alpha").exists());
    assert!(local_branch_exists(&project.repo("api"), "feature/alpha"));
}

#[test]
#[serial]
fn test_prune_keeps_feature_without_commits_after_main_advances() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("fresh", &UpOptions::default()).unwrap();
    commit_file(&project.repo("api"), "main.txt", "main moved on");
    commit_file(&project.repo("web"), "main.txt", "main moved on");

    let statuses = orchestrator.status().unwrap();
    assert_eq!(statuses[0].category, FeatureCategory::Clean);

    let report = orchestrator.prune().unwrap();

    assert!(report.candidates.is_empty());
    assert!(report.pruned.is_empty());
    for repo in ["api", "web"] {
        assert!(project.worktree("fresh", repo).exists());
        assert!(local_branch_exists(&project.repo(repo), "feature/fresh"));
    }
}
