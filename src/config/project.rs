//! Resolved project: configuration plus the paths derived from it

use anyhow::{bail, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::types::{CommandConfig, ProjectConfig, DEFAULT_MAX_PORTS};
use crate::validation::validate_feature_name;

/// Directory holding ramp's configuration and state inside a project
pub const RAMP_DIR: &str = ".ramp";

/// Configuration file name inside [`RAMP_DIR`]
pub const CONFIG_FILE: &str = "ramp.yaml";

/// Directory holding feature worktrees, relative to the project root
pub const TREES_DIR: &str = "trees";

/// A repository descriptor with its source checkout resolved to an absolute path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub name: String,
    /// Primary checkout of the repository
    pub source_dir: PathBuf,
    pub url: Option<String>,
    pub auto_refresh: bool,
}

/// Port range settings; present only when `base_port` is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSettings {
    pub base: u16,
    pub max: u16,
    pub per_feature: usize,
}

/// A loaded project. Immutable for the duration of one operation.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
    config: ProjectConfig,
    repos: Vec<Repository>,
}

impl Project {
    /// Load `.ramp/ramp.yaml` from a project root
    pub fn load(root: &Path) -> Result<Self> {
        let config_path = root.join(RAMP_DIR).join(CONFIG_FILE);
        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
        let config: ProjectConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", config_path.display()))?;
        Self::from_config(root, config)
    }

    /// Walk up from `start` to the first directory containing `.ramp/ramp.yaml`
    pub fn discover(start: &Path) -> Result<Self> {
        let mut current = Some(start);
        while let Some(dir) = current {
            if dir.join(RAMP_DIR).join(CONFIG_FILE).is_file() {
                return Self::load(dir);
            }
            current = dir.parent();
        }
        bail!(
            "No ramp project found in {} or any parent directory (missing {RAMP_DIR}/{CONFIG_FILE})",
            start.display()
        )
    }

    /// Build a project from an already-parsed configuration
    pub fn from_config(root: &Path, config: ProjectConfig) -> Result<Self> {
        let root = if root.is_absolute() {
            root.to_path_buf()
        } else {
            std::env::current_dir()?.join(root)
        };

        if config.repos.is_empty() {
            bail!("Project config must list at least one repository");
        }

        let mut seen = HashSet::new();
        let mut repos = Vec::with_capacity(config.repos.len());
        for repo in &config.repos {
            let name = match &repo.name {
                Some(name) => name.clone(),
                None => Path::new(&repo.path)
                    .file_name()
                    .map(|s| s.to_string_lossy().to_string())
                    .with_context(|| {
                        format!("Cannot derive a name from repo path '{}'", repo.path)
                    })?,
            };
            // Names become directories under `trees/<feature>/`
            validate_feature_name(&name).with_context(|| {
                format!("Invalid repository name '{name}' for path '{}'", repo.path)
            })?;
            if !seen.insert(name.clone()) {
                bail!("Duplicate repository name '{name}' in project config");
            }
            repos.push(Repository {
                name,
                source_dir: root.join(&repo.path),
                url: repo.git.clone(),
                auto_refresh: repo.auto_refresh,
            });
        }

        let mut command_names = HashSet::new();
        for command in &config.commands {
            if !command_names.insert(command.name.as_str()) {
                bail!("Duplicate command name '{}' in project config", command.name);
            }
        }

        if let Some(base) = config.base_port {
            let max = config.max_ports.unwrap_or(DEFAULT_MAX_PORTS);
            if u32::from(base) + u32::from(max) > u32::from(u16::MAX) + 1 {
                bail!("Port range {base}+{max} exceeds 65535");
            }
        }

        Ok(Self {
            root,
            config,
            repos,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn repos(&self) -> &[Repository] {
        &self.repos
    }

    pub fn ramp_dir(&self) -> PathBuf {
        self.root.join(RAMP_DIR)
    }

    pub fn trees_dir(&self) -> PathBuf {
        self.root.join(TREES_DIR)
    }

    pub fn feature_dir(&self, feature: &str) -> PathBuf {
        self.trees_dir().join(feature)
    }

    pub fn worktree_dir(&self, feature: &str, repo: &Repository) -> PathBuf {
        self.feature_dir(feature).join(&repo.name)
    }

    /// Branch prefix, with a per-invocation override taking precedence
    pub fn branch_prefix<'a>(&'a self, override_prefix: Option<&'a str>) -> &'a str {
        override_prefix
            .or(self.config.default_branch_prefix.as_deref())
            .unwrap_or("")
    }

    pub fn port_settings(&self) -> Option<PortSettings> {
        self.config.base_port.map(|base| PortSettings {
            base,
            max: self.config.max_ports.unwrap_or(DEFAULT_MAX_PORTS),
            per_feature: self.config.ports_per_feature.unwrap_or(1).max(1),
        })
    }

    /// Resolve a script path from the config; relative paths are under `.ramp/`
    pub fn script_path(&self, script: &str) -> PathBuf {
        let path = Path::new(script);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.ramp_dir().join(path)
        }
    }

    pub fn command(&self, name: &str) -> Option<&CommandConfig> {
        self.config.commands.iter().find(|c| c.name == name)
    }

    /// Feature names derived from directories under `trees/`, sorted
    pub fn list_features(&self) -> Result<Vec<String>> {
        let trees = self.trees_dir();
        if !trees.exists() {
            return Ok(Vec::new());
        }
        let mut features = Vec::new();
        let entries = fs::read_dir(&trees)
            .with_context(|| format!("Failed to read trees directory: {}", trees.display()))?;
        for entry in entries {
            let entry = entry?;
            if entry.path().is_dir() {
                let name = entry.file_name().to_string_lossy().to_string();
                if !name.starts_with('.') {
                    features.push(name);
                }
            }
        }
        features.sort();
        Ok(features)
    }
}
