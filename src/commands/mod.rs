//! CLI command implementations
//!
//! Each module turns one subcommand into an [`Orchestrator`] call and prints
//! the result. Nothing here mutates state directly.
//!
//! [`Orchestrator`]: crate::orchestrator::Orchestrator

pub mod common;
pub mod display_name;
pub mod down;
pub mod ports;
pub mod prune;
pub mod rebase;
pub mod refresh;
pub mod rename;
pub mod run;
pub mod status;
pub mod up;
