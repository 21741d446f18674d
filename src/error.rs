//! Typed error conditions for ramp operations
//!
//! Most functions return `anyhow::Result` with context attached at the call
//! site. The variants here are the conditions callers need to tell apart
//! (the CLI picks exit codes from them, tests assert on them), so they are
//! raised as `RampError` and recovered with `downcast_ref`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RampError {
    #[error("invalid feature name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("feature '{feature}' already exists for repository '{repo}' at {path}")]
    FeatureExists {
        feature: String,
        repo: String,
        path: String,
    },

    #[error("feature '{0}' not found")]
    FeatureNotFound(String),

    #[error("target '{0}' was not found in any repository")]
    TargetNotFound(String),

    #[error("branch '{branch}' already exists in repository '{repo}'; remove --target or pick another name")]
    BranchExists { repo: String, branch: String },

    #[error("repository '{name}' not found at {path}")]
    RepoMissing { name: String, path: String },

    #[error("no free ports left in range {base}..{end} (needed {needed})")]
    PortsExhausted { base: u16, end: u32, needed: usize },

    #[error("{kind} script failed with exit code {code:?}: {script}")]
    ScriptFailed {
        kind: String,
        script: String,
        code: Option<i32>,
    },

    #[error("{kind} script timed out after {secs}s: {script}")]
    ScriptTimedOut {
        kind: String,
        script: String,
        secs: u64,
    },

    #[error("unknown command '{0}'")]
    UnknownCommand(String),

    #[error("repository '{repo}' has uncommitted changes")]
    UncommittedChanges { repo: String },

    #[error("operation cancelled")]
    Cancelled,

    #[error("operation aborted by user")]
    Aborted,
}

impl RampError {
    pub fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        RampError::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Find a `RampError` anywhere in an anyhow error chain
pub fn find_ramp_error(err: &anyhow::Error) -> Option<&RampError> {
    err.chain().find_map(|cause| cause.downcast_ref::<RampError>())
}

/// True when the error chain carries [`RampError::Cancelled`]
pub fn is_cancelled(err: &anyhow::Error) -> bool {
    matches!(find_ramp_error(err), Some(RampError::Cancelled))
}
