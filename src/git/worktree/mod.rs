//! Git worktree management
//!
//! Each feature gets one worktree per repository under
//! `trees/<feature>/<repo>`.
//!
//! - `operations`: add, remove, move, list, prune
//! - `parser`: `git worktree list --porcelain` parsing

mod operations;
mod parser;

pub use operations::{
    add_worktree, find_worktree_by_path, list_worktrees, move_worktree, prune_worktrees,
    remove_worktree, WorktreeBranch,
};
pub use parser::{parse_worktree_list, WorktreeInfo};
