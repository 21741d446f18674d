//! Git branch operations
//!
//! - `operations`: existence checks, delete, rename, checkout, default branch
//! - `status`: uncommitted change detection
//! - `ancestry`: merge detection, ahead/behind, diff statistics
//! - `naming`: feature branch naming conventions

mod ancestry;
mod naming;
mod operations;
mod status;

pub use ancestry::{
    ahead_behind, diff_stats, get_branch_head, is_ancestor_of, is_on_first_parent_line, DiffStats,
};
pub use naming::{branch_name, split_remote_ref};
pub use operations::{
    branch_exists, checkout_branch, checkout_tracking_branch, current_branch, default_base_ref,
    default_branch, delete_branch, delete_branch_if_exists, list_remotes, remote_branch_exists,
    rename_branch, upstream_branch,
};
pub use status::{has_uncommitted_changes, working_tree_changes, WorkingTreeChanges};
