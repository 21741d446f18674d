//! Feature name validation.
//!
//! Feature names become directory names under `trees/` and the suffix of
//! git branch names, so they are checked before any path is constructed.

use crate::error::RampError;

/// Maximum allowed length for feature names.
pub const MAX_FEATURE_NAME_LENGTH: usize = 128;

/// Names that cannot be used as features (case-insensitive).
const RESERVED_NAMES: &[&str] = &[".", ".."];

/// Validates that a feature name is safe for use as a directory and branch suffix.
///
/// A name is valid if:
/// - It is not empty and not longer than [`MAX_FEATURE_NAME_LENGTH`]
/// - It contains no path separator
/// - It contains no whitespace or control characters
/// - It does not start with `-` (git would read it as an option)
/// - It is not `.` or `..`
///
/// # Examples
///
/// ```
/// use ramp::validation::validate_feature_name;
///
/// assert!(validate_feature_name("alpha").is_ok());
/// assert!(validate_feature_name("fix-login_2").is_ok());
/// assert!(validate_feature_name("").is_err());
/// assert!(validate_feature_name("feature/alpha").is_err());
/// ```
pub fn validate_feature_name(name: &str) -> Result<(), RampError> {
    if name.is_empty() {
        return Err(RampError::invalid_name(name, "cannot be empty"));
    }

    if name.len() > MAX_FEATURE_NAME_LENGTH {
        return Err(RampError::invalid_name(
            name,
            format!(
                "too long: {} characters (max {MAX_FEATURE_NAME_LENGTH})",
                name.len()
            ),
        ));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(RampError::invalid_name(name, "cannot contain slashes"));
    }

    if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(RampError::invalid_name(
            name,
            "cannot contain whitespace or control characters",
        ));
    }

    if name.starts_with('-') {
        return Err(RampError::invalid_name(name, "cannot start with '-'"));
    }

    if RESERVED_NAMES.contains(&name) {
        return Err(RampError::invalid_name(name, "is a reserved name"));
    }

    Ok(())
}

/// clap value parser wrapper around [`validate_feature_name`]
pub fn clap_feature_name_validator(s: &str) -> Result<String, String> {
    validate_feature_name(s)
        .map(|()| s.to_string())
        .map_err(|e| e.to_string())
}
