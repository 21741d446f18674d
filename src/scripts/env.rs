//! Environment contract for lifecycle scripts
//!
//! Scripts run either for one feature (setup, cleanup, `ramp run <cmd>
//! <feature>`) or against the source checkouts (`ramp run <cmd>`). Both modes
//! export `RAMP_PROJECT_DIR` and one `RAMP_REPO_PATH_<NAME>` per repository;
//! feature mode adds the trees directory, worktree name, ports and display
//! name.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::config::Project;

/// Everything a script needs to know about where it runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptContext {
    project_dir: PathBuf,
    feature: Option<FeatureScope>,
    repo_paths: Vec<(String, PathBuf)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct FeatureScope {
    name: String,
    trees_dir: PathBuf,
    ports: Vec<u16>,
    display_name: Option<String>,
}

impl ScriptContext {
    /// Context for a script operating on one feature's worktrees
    pub fn for_feature(
        project: &Project,
        feature: &str,
        ports: &[u16],
        display_name: Option<&str>,
    ) -> Self {
        let repo_paths = project
            .repos()
            .iter()
            .map(|repo| (repo.name.clone(), project.worktree_dir(feature, repo)))
            .collect();
        Self {
            project_dir: project.root().to_path_buf(),
            feature: Some(FeatureScope {
                name: feature.to_string(),
                trees_dir: project.feature_dir(feature),
                ports: ports.to_vec(),
                display_name: display_name.map(String::from),
            }),
            repo_paths,
        }
    }

    /// Context for a script operating on the source checkouts
    pub fn for_source(project: &Project) -> Self {
        let repo_paths = project
            .repos()
            .iter()
            .map(|repo| (repo.name.clone(), repo.source_dir.clone()))
            .collect();
        Self {
            project_dir: project.root().to_path_buf(),
            feature: None,
            repo_paths,
        }
    }

    /// The feature trees directory, or the project root in source mode
    pub fn working_dir(&self) -> &Path {
        match &self.feature {
            Some(scope) => &scope.trees_dir,
            None => &self.project_dir,
        }
    }

    pub fn feature(&self) -> Option<&str> {
        self.feature.as_ref().map(|s| s.name.as_str())
    }

    /// Variables exported to the script, in a stable order
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![(
            "RAMP_PROJECT_DIR".to_string(),
            self.project_dir.display().to_string(),
        )];

        if let Some(scope) = &self.feature {
            vars.push((
                "RAMP_TREES_DIR".to_string(),
                scope.trees_dir.display().to_string(),
            ));
            vars.push(("RAMP_WORKTREE_NAME".to_string(), scope.name.clone()));
            if let Some(first) = scope.ports.first() {
                vars.push(("RAMP_PORT".to_string(), first.to_string()));
            }
            for (i, port) in scope.ports.iter().enumerate() {
                vars.push((format!("RAMP_PORT_{}", i + 1), port.to_string()));
            }
            if let Some(display_name) = &scope.display_name {
                vars.push(("RAMP_DISPLAY_NAME".to_string(), display_name.clone()));
            }
        }

        for (name, path) in &self.repo_paths {
            vars.push((repo_env_key(name), path.display().to_string()));
        }
        vars
    }
}

/// `RAMP_REPO_PATH_<NAME>`: uppercased, every non-alphanumeric character as `_`
pub fn repo_env_key(repo_name: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let re = NON_ALNUM
        .get_or_init(|| Regex::new(r"[^A-Za-z0-9]").expect("static regex pattern is valid"));
    format!(
        "RAMP_REPO_PATH_{}",
        re.replace_all(repo_name, "_").to_uppercase()
    )
}
