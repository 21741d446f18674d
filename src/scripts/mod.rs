//! Lifecycle scripts: setup, cleanup and named custom commands

mod cancel;
mod env;
mod runner;

pub use cancel::CancelToken;
pub use env::{repo_env_key, ScriptContext};
pub use runner::{ScriptKind, ScriptRunner};
