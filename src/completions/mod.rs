//! Shell completions: static scripts via `clap_complete` plus a hidden
//! `complete` helper that suggests feature and command names.

pub mod dynamic;
pub mod generator;

pub use dynamic::{complete_dynamic, CompletionContext};
pub use generator::{generate_completions, write_completions, Shell};
