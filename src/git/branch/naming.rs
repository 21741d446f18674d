//! Branch naming conventions for features

/// Branch name for a feature: the prefix followed by the feature name
pub fn branch_name(prefix: &str, feature: &str) -> String {
    format!("{prefix}{feature}")
}

/// Split a remote-tracking ref like `origin/feature/x` into `("origin", "feature/x")`
pub fn split_remote_ref(reference: &str) -> Option<(&str, &str)> {
    reference
        .split_once('/')
        .filter(|(remote, branch)| !remote.is_empty() && !branch.is_empty())
}
