//! Integration tests for ramp feature lifecycles
//!
//! Every test builds a throwaway project with real git repositories and
//! drives the orchestrator end to end.

pub mod helpers;
pub mod lifecycle;
pub mod prune;
pub mod rename_rebase;
