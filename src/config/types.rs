//! Serde types for `.ramp/ramp.yaml`

use serde::{Deserialize, Serialize};

/// Default size of the port range when only `base_port` is configured
pub const DEFAULT_MAX_PORTS: u16 = 100;

/// Raw project configuration as written in `.ramp/ramp.yaml`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectConfig {
    /// Project name, used in status output
    #[serde(default)]
    pub name: String,

    /// Repositories that make up the project
    #[serde(default)]
    pub repos: Vec<RepoConfig>,

    /// Prefix prepended to every feature branch (e.g. "feature/")
    #[serde(
        default,
        rename = "default-branch-prefix",
        alias = "default_branch_prefix"
    )]
    pub default_branch_prefix: Option<String>,

    /// Default branch override; detected per repository when absent
    #[serde(default)]
    pub default_branch: Option<String>,

    /// First port of the allocation range. Port allocation is enabled when set.
    #[serde(default)]
    pub base_port: Option<u16>,

    /// Size of the allocation range
    #[serde(default)]
    pub max_ports: Option<u16>,

    /// Number of ports reserved for each feature
    #[serde(default)]
    pub ports_per_feature: Option<usize>,

    /// Script run after a feature's worktrees are created
    #[serde(default)]
    pub setup: Option<String>,

    /// Script run before a feature's worktrees are removed
    #[serde(default)]
    pub cleanup: Option<String>,

    /// Upper bound on setup/cleanup/command script runtime
    #[serde(default)]
    pub script_timeout_secs: Option<u64>,

    /// Named custom commands runnable with `ramp run`
    #[serde(default)]
    pub commands: Vec<CommandConfig>,
}

/// One repository entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoConfig {
    /// Path of the source checkout, relative to the project root
    pub path: String,

    /// Remote URL
    #[serde(default)]
    pub git: Option<String>,

    /// Explicit name; defaults to the last component of `path`
    #[serde(default)]
    pub name: Option<String>,

    /// Whether `ramp refresh` pulls this repository after fetching
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
}

/// A named custom command
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommandConfig {
    pub name: String,
    pub command: String,
}

fn default_true() -> bool {
    true
}
