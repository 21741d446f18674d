//! Feature-level queries: target resolution and status classification
//!
//! - `resolver`: where a new feature branch starts in each repository
//! - `status`: per-repository worktree facts and feature reports
//! - `classify`: needs-attention / merged / clean reduction

pub mod classify;
pub mod resolver;
pub mod status;

pub use classify::{classify, is_merged, needs_attention, FeatureCategory};
pub use resolver::{resolve_source_ref, resolve_target};
pub use status::{
    feature_status, repo_status, scan_features, worktree_facts, FeatureStatus, RepoStatus,
    WorktreeFacts, WorktreeState,
};
