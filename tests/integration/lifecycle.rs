//! Up, down, status and scripts on healthy projects

use serial_test::serial;
use std::fs;
use std::thread;
use std::time::Duration;

use ramp::error::{find_ramp_error, is_cancelled, RampError};
use ramp::features::{FeatureCategory, WorktreeState};
use ramp::orchestrator::{BranchSource, DownOptions, UpOptions};
use ramp::scripts::CancelToken;

use super::helpers::*;

/// Two repositories, prefix `feature/`: one branch and worktree each, one port
#[test]
#[serial]
fn test_up_creates_worktrees_branches_and_port() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();

    let report = orchestrator
        .up("alpha", &UpOptions::default())
        .expect("up should succeed");

    assert_eq!(report.ports, vec![3000]);
    assert_eq!(report.trees_dir, project.feature_dir("alpha"));
    for repo in ["api", "web"] {
        let state = &report.repos[repo];
        assert_eq!(state.branch, "feature/alpha");
        assert!(state.worktree_created);
        assert!(state.branch_created);
        assert_eq!(state.source, Some(BranchSource::Default("main".to_string())));

        let worktree = project.worktree("alpha", repo);
        assert!(worktree.join("README.md").exists());
        assert_eq!(
            git_output(&["rev-parse", "--abbrev-ref", "HEAD"], &worktree),
            "feature/alpha"
        );
        assert!(local_branch_exists(&project.repo(repo), "feature/alpha"));
    }

    let allocations = orchestrator.port_allocations().unwrap();
    assert_eq!(allocations.get("alpha"), Some(&vec![3000]));

    let second = orchestrator.up("beta", &UpOptions::default()).unwrap();
    assert_eq!(second.ports, vec![3001]);
}

#[test]
#[serial]
fn test_up_then_down_leaves_nothing() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();

    orchestrator.up("alpha", &UpOptions::default()).unwrap();
    let report = orchestrator
        .down("alpha", &DownOptions::default())
        .expect("down should succeed");

    assert_eq!(report.released_ports, Some(vec![3000]));
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    assert!(!project.feature_dir("alpha").exists());
    for repo in ["api", "web"] {
        let teardown = &report.repos[repo];
        assert!(teardown.worktree_removed);
        assert!(teardown.branch_deleted);
        assert!(!local_branch_exists(&project.repo(repo), "feature/alpha"));
        assert_eq!(worktree_count(&project.repo(repo)), 1);
    }
    assert!(orchestrator.port_allocations().unwrap().is_empty());
}

#[test]
#[serial]
fn test_up_reuses_existing_local_branch() {
    let project = TestProject::new(&["api"], "");
    let api = project.repo("api");
    git(&["branch", "feature/alpha"], &api);
    git(&["checkout", "feature/alpha"], &api);
    commit_file(&api, "work.txt", "in progress");
    git(&["checkout", "main"], &api);

    let report = project
        .orchestrator()
        .up("alpha", &UpOptions::default())
        .unwrap();

    let state = &report.repos["api"];
    assert_eq!(state.source, Some(BranchSource::Existing));
    assert!(!state.branch_created);
    assert!(project.worktree("alpha", "api").join("work.txt").exists());
}

#[test]
#[serial]
fn test_up_with_prefix_override() {
    let project = TestProject::new(&["api"], "");

    project
        .orchestrator()
        .up(
            "x",
            &UpOptions {
                prefix: Some("bugfix/".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert!(local_branch_exists(&project.repo("api"), "bugfix/x"));
    assert!(!local_branch_exists(&project.repo("api"), "feature/x"));
}

#[test]
#[serial]
fn test_up_rejects_invalid_name_before_side_effects() {
    let project = TestProject::new(&["api"], "");

    let err = project
        .orchestrator()
        .up("../escape", &UpOptions::default())
        .unwrap_err();

    assert!(matches!(
        find_ramp_error(&err),
        Some(RampError::InvalidName { .. })
    ));
    assert!(!project.root.join("trees").exists());
}

#[test]
#[serial]
fn test_up_fails_when_repository_missing() {
    let project = TestProject::new(&["api"], "");
    fs::remove_dir_all(project.repo("api")).unwrap();

    let err = project
        .orchestrator()
        .up("alpha", &UpOptions::default())
        .unwrap_err();

    assert!(matches!(
        find_ramp_error(&err),
        Some(RampError::RepoMissing { name, .. }) if name == "api"
    ));
    assert!(!project.feature_dir("alpha").exists());
}

/// `--target` found in one repository only: that one branches from it, the
/// other falls back to its default branch
#[test]
#[serial]
fn test_partial_target_falls_back_to_default() {
    let project = TestProject::new(&["api", "web"], "");
    let api = project.repo("api");
    git(&["checkout", "-b", "other-feature"], &api);
    commit_file(&api, "other.txt", "from other");
    git(&["checkout", "main"], &api);

    let report = project
        .orchestrator()
        .up(
            "beta",
            &UpOptions {
                target: Some("other-feature".to_string()),
                ..Default::default()
            },
        )
        .expect("partial target should succeed");

    assert_eq!(
        report.repos["api"].source,
        Some(BranchSource::Target("other-feature".to_string()))
    );
    assert_eq!(
        report.repos["web"].source,
        Some(BranchSource::Default("main".to_string()))
    );
    assert!(project.worktree("beta", "api").join("other.txt").exists());
    assert!(!project.worktree("beta", "web").join("other.txt").exists());
}

#[test]
#[serial]
fn test_target_names_another_feature() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("base", &UpOptions::default()).unwrap();
    commit_file(&project.worktree("base", "web"), "base.txt", "base work");

    let report = orchestrator
        .up(
            "child",
            &UpOptions {
                target: Some("base".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    assert_eq!(
        report.repos["web"].source,
        Some(BranchSource::Target("feature/base".to_string()))
    );
    assert!(project.worktree("child", "web").join("base.txt").exists());
    assert!(!project.worktree("child", "api").join("base.txt").exists());
}

#[test]
#[serial]
fn test_target_missing_everywhere_is_rejected() {
    let project = TestProject::new(&["api", "web"], "");

    let err = project
        .orchestrator()
        .up(
            "beta",
            &UpOptions {
                target: Some("nowhere".to_string()),
                ..Default::default()
            },
        )
        .unwrap_err();

    assert!(matches!(
        find_ramp_error(&err),
        Some(RampError::TargetNotFound(t)) if t == "nowhere"
    ));
    assert!(!project.feature_dir("beta").exists());
    assert!(!local_branch_exists(&project.repo("api"), "feature/beta"));
}

/// Trees directory deleted by hand, branch still present: down cleans up
#[test]
#[serial]
fn test_down_orphaned_feature_with_prefix() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    let options = UpOptions {
        prefix: Some("bugfix/".to_string()),
        ..Default::default()
    };
    orchestrator.up("x", &options).unwrap();
    fs::remove_dir_all(project.feature_dir("x")).unwrap();

    let report = orchestrator
        .down(
            "x",
            &DownOptions {
                prefix: Some("bugfix/".to_string()),
            },
        )
        .expect("orphaned down should succeed");

    for repo in ["api", "web"] {
        assert_eq!(report.repos[repo].branch.as_deref(), Some("bugfix/x"));
        assert!(report.repos[repo].branch_deleted);
        assert!(!local_branch_exists(&project.repo(repo), "bugfix/x"));
        assert_eq!(worktree_count(&project.repo(repo)), 1);
    }
    assert_eq!(report.released_ports, Some(vec![3000]));
}

#[test]
#[serial]
fn test_down_branch_only_orphan() {
    let project = TestProject::new(&["api"], "");
    let api = project.repo("api");
    git(&["branch", "feature/ghost"], &api);

    let report = project
        .orchestrator()
        .down("ghost", &DownOptions::default())
        .unwrap();

    assert!(report.repos["api"].branch_deleted);
    assert!(!local_branch_exists(&api, "feature/ghost"));
}

#[test]
#[serial]
fn test_down_unknown_feature() {
    let project = TestProject::new(&["api"], "");

    let err = project
        .orchestrator()
        .down("missing", &DownOptions::default())
        .unwrap_err();

    assert!(matches!(
        find_ramp_error(&err),
        Some(RampError::FeatureNotFound(f)) if f == "missing"
    ));
}

#[test]
#[serial]
fn test_down_declined_with_uncommitted_changes() {
    let project = TestProject::new(&["api"], "");
    project
        .orchestrator()
        .up("alpha", &UpOptions::default())
        .unwrap();
    fs::write(project.worktree("alpha", "api").join("scratch.txt"), "wip").unwrap();

    let err = project
        .orchestrator_answering(false)
        .down("alpha", &DownOptions::default())
        .unwrap_err();

    assert!(matches!(find_ramp_error(&err), Some(RampError::Aborted)));
    assert!(project.worktree("alpha", "api").join("scratch.txt").exists());
    assert!(local_branch_exists(&project.repo("api"), "feature/alpha"));

    project
        .orchestrator()
        .down("alpha", &DownOptions::default())
        .expect("confirmed down should succeed");
    assert!(!project.feature_dir("alpha").exists());
}

#[test]
#[serial]
fn test_scripts_receive_feature_environment() {
    let project = TestProject::new(
        &["api", "web"],
        "ports_per_feature: 2\nsetup: setup.sh\ncleanup: cleanup.sh\n",
    );
    project.write_script(
        "setup.sh",
        r#"echo "$RAMP_WORKTREE_NAME $RAMP_PORT $RAMP_PORT_2 $PWD" > "$RAMP_TREES_DIR/setup.out"
test -d "$RAMP_REPO_PATH_API" && test -d "$RAMP_REPO_PATH_WEB""#,
    );
    project.write_script(
        "cleanup.sh",
        r#"echo "$RAMP_WORKTREE_NAME" > "$RAMP_PROJECT_DIR/cleanup.out""#,
    );
    let orchestrator = project.orchestrator();

    let report = orchestrator.up("alpha", &UpOptions::default()).unwrap();
    assert!(report.setup_ran);
    assert_eq!(report.ports, vec![3000, 3001]);

    let out = fs::read_to_string(project.feature_dir("alpha").join("setup.out")).unwrap();
    let expected = format!("alpha 3000 3001 {}", project.feature_dir("alpha").display());
    assert_eq!(out.trim(), expected);

    let down = orchestrator
        .down("alpha", &DownOptions::default())
        .unwrap();
    assert!(down.cleanup_ran);
    let out = fs::read_to_string(project.root.join("cleanup.out")).unwrap();
    assert_eq!(out.trim(), "alpha");
}

#[test]
#[serial]
fn test_failing_cleanup_only_warns() {
    let project = TestProject::new(&["api"], "cleanup: cleanup.sh\n");
    project.write_script("cleanup.sh", "exit 2");
    let orchestrator = project.orchestrator();
    orchestrator.up("alpha", &UpOptions::default()).unwrap();

    let report = orchestrator
        .down("alpha", &DownOptions::default())
        .expect("cleanup failure must not abort down");

    assert!(!report.cleanup_ran);
    assert_eq!(report.warnings.len(), 1);
    assert!(!project.feature_dir("alpha").exists());
}

#[test]
#[serial]
fn test_cancelled_cleanup_keeps_feature() {
    let project = TestProject::new(&["api"], "cleanup: cleanup.sh\n");
    project.write_script("cleanup.sh", "sleep 30");
    project
        .orchestrator()
        .up("alpha", &UpOptions::default())
        .unwrap();

    let token = CancelToken::new();
    let trigger = token.clone();
    let handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(300));
        trigger.cancel();
    });
    let err = project
        .orchestrator()
        .with_cancel(token)
        .down("alpha", &DownOptions::default())
        .unwrap_err();
    handle.join().unwrap();

    assert!(is_cancelled(&err), "{err:#}");
    assert!(project.worktree("alpha", "api").exists());
    assert!(local_branch_exists(&project.repo("api"), "feature/alpha"));
    assert_eq!(
        project.orchestrator().port_allocations().unwrap().get("alpha"),
        Some(&vec![3000])
    );
}

#[test]
#[serial]
fn test_status_categories() {
    let project = TestProject::new(&["api", "web"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("clean", &UpOptions::default()).unwrap();
    orchestrator.up("dirty", &UpOptions::default()).unwrap();
    fs::write(project.worktree("dirty", "web").join("wip.txt"), "wip").unwrap();

    let statuses = orchestrator.status().unwrap();
    let names: Vec<&str> = statuses.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["clean", "dirty"]);
    assert_eq!(statuses[0].category, FeatureCategory::Clean);
    assert_eq!(statuses[0].ports, vec![3000]);
    assert_eq!(statuses[1].category, FeatureCategory::NeedsAttention);

    fs::remove_dir_all(project.worktree("clean", "api")).unwrap();
    let statuses = orchestrator.status().unwrap();
    assert!(matches!(statuses[0].repos[0].state, WorktreeState::NotFound));
}

#[test]
#[serial]
fn test_display_name_follows_feature() {
    let project = TestProject::new(&["api"], "");
    let orchestrator = project.orchestrator();
    orchestrator.up("alpha", &UpOptions::default()).unwrap();

    orchestrator
        .set_display_name("alpha", Some("Login revamp"))
        .unwrap();
    assert_eq!(
        orchestrator.display_name("alpha").unwrap().as_deref(),
        Some("Login revamp")
    );
    assert!(orchestrator.set_display_name("nope", Some("x")).is_err());

    orchestrator
        .down("alpha", &DownOptions::default())
        .unwrap();
    assert_eq!(orchestrator.display_name("alpha").unwrap(), None);
}

#[test]
#[serial]
fn test_run_custom_command() {
    let project = TestProject::new(
        &["api"],
        "commands:\n  - name: where\n    command: where.sh\n",
    );
    project.write_script(
        "where.sh",
        r#"echo "${RAMP_WORKTREE_NAME:-source}" >> "$RAMP_PROJECT_DIR/where.out""#,
    );
    let orchestrator = project.orchestrator();
    orchestrator.up("alpha", &UpOptions::default()).unwrap();

    orchestrator.run_command("where", Some("alpha")).unwrap();
    orchestrator.run_command("where", None).unwrap();

    let out = fs::read_to_string(project.root.join("where.out")).unwrap();
    assert_eq!(out.lines().collect::<Vec<_>>(), vec!["alpha", "source"]);

    let err = orchestrator.run_command("missing", None).unwrap_err();
    assert!(matches!(
        find_ramp_error(&err),
        Some(RampError::UnknownCommand(_))
    ));
}

#[test]
#[serial]
fn test_commands_discover_project_from_subdirectory() {
    let project = TestProject::new(&["api"], "");
    project
        .orchestrator()
        .up("alpha", &UpOptions::default())
        .unwrap();

    let original = std::env::current_dir().unwrap();
    std::env::set_current_dir(project.worktree("alpha", "api")).unwrap();
    let loaded = ramp::commands::common::load_orchestrator(true);
    std::env::set_current_dir(original).unwrap();

    let orchestrator = loaded.expect("project should be discovered");
    assert_eq!(orchestrator.project().root(), project.root.as_path());
    assert_eq!(orchestrator.project().name(), "test-project");
}
