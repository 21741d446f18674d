//! Rename and bulk branch switching

use serial_test::serial;
use std::fs;

use ramp::error::{find_ramp_error, RampError};
use ramp::orchestrator::UpOptions;

use super::helpers::*;

#[test]
#[serial]
fn test_rename_moves_everything() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("alpha", &UpOptions::default()).unwrap();
    commit_file(&project.worktree("alpha", "api"), "work.txt", "work");
    orchestrator
        .set_display_name("alpha", Some("Login revamp"))
        .unwrap();

    let report = orchestrator.rename("alpha", "beta").expect("rename should succeed");

    assert!(report.ports_moved);
    assert!(report.metadata_moved);
    assert!(!project.feature_dir("alpha").exists());
    for repo in ["api", "web"] {
        assert_eq!(report.repos[repo].branch, "feature/beta");
        let worktree = project.worktree("beta", repo);
        assert_eq!(
            git_output(&["rev-parse", "--abbrev-ref", "HEAD"], &worktree),
            "feature/beta"
        );
        assert!(!local_branch_exists(&project.repo(repo), "feature/alpha"));
    }
    assert!(project.worktree("beta", "api").join("work.txt").exists());

    let ports = orchestrator.port_allocations().unwrap();
    assert_eq!(ports.get("beta"), Some(&vec![3000]));
    assert!(!ports.contains_key("alpha"));
    assert_eq!(
        orchestrator.display_name("beta").unwrap().as_deref(),
        Some("Login revamp")
    );
    assert_eq!(orchestrator.display_name("alpha").unwrap(), None);
}

#[test]
#[serial]
fn test_rename_keeps_foreign_branch_name() {
    let project = TestProject::new(&["api"], "");
    let orchestrator = project.orchestrator();
    orchestrator
        .up(
            "alpha",
            &UpOptions {
                prefix: Some("bugfix/".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    let report = orchestrator.rename("alpha", "beta").unwrap();

    assert_eq!(report.repos["api"].branch, "bugfix/alpha");
    assert!(local_branch_exists(&project.repo("api"), "bugfix/alpha"));
    assert!(project.worktree("beta", "api").exists());
}

#[test]
#[serial]
fn test_rename_conflicting_branch_changes_nothing() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("alpha", &UpOptions::default()).unwrap();
    git(&["branch", "feature/beta"], &project.repo("web"));

    let err = orchestrator.rename("alpha", "beta").unwrap_err();

    assert!(matches!(
        find_ramp_error(&err),
        Some(RampError::BranchExists { repo, .. }) if repo == "web"
    ));
    assert!(project.worktree("alpha", "api").exists());
    assert!(!project.feature_dir("beta").exists());
    assert!(local_branch_exists(&project.repo("api"), "feature/alpha"));
    assert_eq!(
        orchestrator.port_allocations().unwrap().get("alpha"),
        Some(&vec![3000])
    );
}

#[test]
#[serial]
fn test_rename_failure_midway_rolls_back() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("alpha", &UpOptions::default()).unwrap();
    // Lock the web worktree so `git worktree move` refuses it
    git(
        &["worktree", "lock", &project.worktree("alpha", "web").to_string_lossy()],
        &project.repo("web"),
    );

    let err = orchestrator.rename("alpha", "beta").unwrap_err();

    assert!(format!("{err:#}").contains("web"), "{err:#}");
    assert!(project.worktree("alpha", "api").exists());
    assert!(project.worktree("alpha", "web").exists());
    assert!(!project.feature_dir("beta").exists());
    assert!(local_branch_exists(&project.repo("api"), "feature/alpha"));
    assert!(!local_branch_exists(&project.repo("api"), "feature/beta"));
    assert_eq!(
        git_output(
            &["rev-parse", "--abbrev-ref", "HEAD"],
            &project.worktree("alpha", "api")
        ),
        "feature/alpha"
    );
}

#[test]
#[serial]
fn test_rename_unknown_feature() {
    let project = TestProject::new(&["api"], "");

    let err = project.orchestrator().rename("ghost", "beta").unwrap_err();

    assert!(matches!(
        find_ramp_error(&err),
        Some(RampError::FeatureNotFound(_))
    ));
}

#[test]
#[serial]
fn test_rebase_switches_repositories_that_have_the_branch() {
    let project = TestProject::new(&["api", "web"], "");
    git(&["branch", "release"], &project.repo("api"));

    let report = project
        .orchestrator()
        .rebase("release")
        .expect("rebase should succeed");

    assert_eq!(report.skipped, vec!["web".to_string()]);
    assert_eq!(
        report.repos["api"].original_branch.as_deref(),
        Some("main")
    );
    assert_eq!(
        git_output(&["rev-parse", "--abbrev-ref", "HEAD"], &project.repo("api")),
        "release"
    );
    assert_eq!(
        git_output(&["rev-parse", "--abbrev-ref", "HEAD"], &project.repo("web")),
        "main"
    );
}

#[test]
#[serial]
fn test_rebase_unknown_branch() {
    let project = TestProject::new(&["api", "web"], "");

    let err = project.orchestrator().rebase("nowhere").unwrap_err();

    assert!(matches!(
        find_ramp_error(&err),
        Some(RampError::TargetNotFound(_))
    ));
}

#[test]
#[serial]
fn test_rebase_refuses_dirty_checkout() {
    let project = TestProject::new(&["api", "web"], "");
    git(&["branch", "release"], &project.repo("api"));
    git(&["branch", "release"], &project.repo("web"));
    fs::write(project.repo("web").join("wip.txt"), "wip").unwrap();

    let err = project.orchestrator().rebase("release").unwrap_err();

    assert!(matches!(
        find_ramp_error(&err),
        Some(RampError::UncommittedChanges { repo }) if repo == "web"
    ));
    assert_eq!(
        git_output(&["rev-parse", "--abbrev-ref", "HEAD"], &project.repo("api")),
        "main"
    );
}

#[test]
#[serial]
fn test_rebase_failure_restores_switched_repositories() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    git(&["branch", "release"], &project.repo("api"));
    git(&["branch", "release"], &project.repo("web"));
    // `release` checked out in a web worktree makes the web checkout fail
    let elsewhere = project.root.join("elsewhere");
    git(
        &["worktree", "add", &elsewhere.to_string_lossy(), "release"],
        &project.repo("web"),
    );

    let err = orchestrator.rebase("release").unwrap_err();

    assert!(format!("{err:#}").contains("web"), "{err:#}");
    assert_eq!(
        git_output(&["rev-parse", "--abbrev-ref", "HEAD"], &project.repo("api")),
        "main"
    );
}
