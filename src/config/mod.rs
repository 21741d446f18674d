//! Project configuration (`.ramp/ramp.yaml`) and derived paths

mod project;
mod types;

pub use project::{
    PortSettings, Project, Repository, CONFIG_FILE, RAMP_DIR, TREES_DIR,
};
pub use types::{CommandConfig, ProjectConfig, RepoConfig, DEFAULT_MAX_PORTS};
