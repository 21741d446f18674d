//! Shared test helpers: throwaway projects made of real git repositories

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use ramp::config::Project;
use ramp::orchestrator::{AutoConfirm, Orchestrator};

/// Run git in `dir`, panicking with stderr on failure
pub fn git(args: &[&str], dir: &Path) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {} failed: {}",
        args.join(" "),
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Run git in `dir` and return trimmed stdout
pub fn git_output(args: &[&str], dir: &Path) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create a repository on `main` with one commit
pub fn init_repo_at(dir: &Path) {
    fs::create_dir_all(dir).expect("Failed to create repo dir");
    git(&["init"], dir);
    git(&["config", "user.email", "test@test.com"], dir);
    git(&["config", "user.name", "Test User"], dir);
    fs::write(dir.join("README.md"), "# Test Repository\n").expect("Failed to write README.md");
    git(&["add", "."], dir);
    git(&["commit", "-m", "Initial commit"], dir);
    git(&["branch", "-M", "main"], dir);
}

/// Write a file and commit it on whatever is checked out in `dir`
pub fn commit_file(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).expect("Failed to write file");
    git(&["add", name], dir);
    git(&["commit", "-m", &format!("Add {name}")], dir);
}

pub fn local_branch_exists(dir: &Path, branch: &str) -> bool {
    Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Number of worktrees git has registered, the primary checkout included
pub fn worktree_count(dir: &Path) -> usize {
    git_output(&["worktree", "list", "--porcelain"], dir)
        .lines()
        .filter(|line| line.starts_with("worktree "))
        .count()
}

/// A project root with `repos/<name>` checkouts and `.ramp/ramp.yaml`
pub struct TestProject {
    _temp: TempDir,
    pub root: PathBuf,
}

impl TestProject {
    /// Project with the given repositories, prefix `feature/` and ports from 3000.
    ///
    /// `extra` is appended to the generated YAML verbatim.
    pub fn new(repos: &[&str], extra: &str) -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp dir");

        let mut yaml = String::from("name: test-project\nrepos:\n");
        for name in repos {
            init_repo_at(&root.join("repos").join(name));
            yaml.push_str(&format!("  - path: repos/{name}\n"));
        }
        yaml.push_str("default-branch-prefix: feature/\n");
        yaml.push_str("default_branch: main\n");
        yaml.push_str("base_port: 3000\n");
        yaml.push_str("max_ports: 10\n");
        yaml.push_str(extra);

        let ramp_dir = root.join(".ramp");
        fs::create_dir_all(&ramp_dir).expect("Failed to create .ramp");
        fs::write(ramp_dir.join("ramp.yaml"), yaml).expect("Failed to write ramp.yaml");

        Self { _temp: temp, root }
    }

    pub fn repo(&self, name: &str) -> PathBuf {
        self.root.join("repos").join(name)
    }

    pub fn feature_dir(&self, feature: &str) -> PathBuf {
        self.root.join("trees").join(feature)
    }

    pub fn worktree(&self, feature: &str, repo: &str) -> PathBuf {
        self.feature_dir(feature).join(repo)
    }

    /// Write a script under `.ramp/`
    pub fn write_script(&self, name: &str, body: &str) {
        let path = self.root.join(".ramp").join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create script dir");
        }
        fs::write(path, format!("#!/bin/bash\n{body}\n")).expect("Failed to write script");
    }

    pub fn project(&self) -> Project {
        Project::load(&self.root).expect("Failed to load project")
    }

    /// Orchestrator that answers every prompt with `answer`
    pub fn orchestrator_answering(&self, answer: bool) -> Orchestrator {
        Orchestrator::new(self.project()).with_confirm(AutoConfirm(answer))
    }

    pub fn orchestrator(&self) -> Orchestrator {
        self.orchestrator_answering(true)
    }
}
