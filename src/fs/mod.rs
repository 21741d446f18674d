//! Persisted project state under `.ramp/`

pub mod locking;
pub mod metadata;

pub use locking::{atomic_write, locked_read, locked_update, ProjectLock};
pub use metadata::{FeatureMetadata, MetadataStore};
