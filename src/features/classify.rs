//! Reduction of per-repository facts into one feature category

use std::fmt;

use super::status::WorktreeState;

/// Feature-level category. Exactly one holds for every feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FeatureCategory {
    /// Uncommitted changes, or commits that have not been merged
    NeedsAttention,
    /// Every repository's branch is fully incorporated into the default branch
    Merged,
    Clean,
}

impl fmt::Display for FeatureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureCategory::NeedsAttention => write!(f, "needs attention"),
            FeatureCategory::Merged => write!(f, "merged"),
            FeatureCategory::Clean => write!(f, "clean"),
        }
    }
}

/// Any repository has uncommitted changes or unmerged commits
pub fn needs_attention(states: &[WorktreeState]) -> bool {
    states.iter().any(|state| match state {
        WorktreeState::Present(facts) => {
            facts.has_uncommitted || (facts.ahead > 0 && !facts.is_merged)
        }
        _ => false,
    })
}

/// Every repository is known, clean, merged, not ahead and strictly behind.
///
/// An empty set or any repository without facts is never merged.
pub fn is_merged(states: &[WorktreeState]) -> bool {
    !states.is_empty()
        && states.iter().all(|state| match state {
            WorktreeState::Present(facts) => {
                facts.ahead == 0 && facts.behind > 0 && facts.is_merged && !facts.has_uncommitted
            }
            _ => false,
        })
}

pub fn classify(states: &[WorktreeState]) -> FeatureCategory {
    if needs_attention(states) {
        FeatureCategory::NeedsAttention
    } else if is_merged(states) {
        FeatureCategory::Merged
    } else {
        FeatureCategory::Clean
    }
}
