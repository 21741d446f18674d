pub mod commands;
pub mod completions;
pub mod config;
pub mod error;
pub mod features;
pub mod fs;
pub mod git;
pub mod orchestrator;
pub mod ports;
pub mod scripts;
pub mod validation;
