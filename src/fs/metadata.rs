//! Feature display-name metadata.
//!
//! Display names are mutable labels that live independently of the
//! worktrees. The store is persisted in `.ramp/feature_metadata.json`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::locking::{locked_read, locked_update};

/// Metadata file name inside `.ramp/`
pub const METADATA_FILE: &str = "feature_metadata.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureMetadata {
    pub display_name: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MetadataFile {
    #[serde(default)]
    features: BTreeMap<String, FeatureMetadata>,
}

impl MetadataFile {
    fn parse(content: Option<&str>, path: &Path) -> Result<Self> {
        match content {
            Some(c) if !c.trim().is_empty() => serde_json::from_str(c)
                .with_context(|| format!("Failed to parse metadata file: {}", path.display())),
            _ => Ok(Self::default()),
        }
    }

    fn render(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize feature metadata")
    }
}

/// Handle on the metadata file; every call re-reads it under a lock
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(ramp_dir: &Path) -> Self {
        Self {
            path: ramp_dir.join(METADATA_FILE),
        }
    }

    pub fn get(&self, feature: &str) -> Result<Option<FeatureMetadata>> {
        let content = locked_read(&self.path)?;
        let file = MetadataFile::parse(content.as_deref(), &self.path)?;
        Ok(file.features.get(feature).cloned())
    }

    pub fn display_name(&self, feature: &str) -> Result<Option<String>> {
        Ok(self.get(feature)?.map(|m| m.display_name))
    }

    pub fn all(&self) -> Result<BTreeMap<String, FeatureMetadata>> {
        let content = locked_read(&self.path)?;
        Ok(MetadataFile::parse(content.as_deref(), &self.path)?.features)
    }

    /// Set or clear a display name. Returns the previous metadata.
    pub fn set_display_name(
        &self,
        feature: &str,
        display_name: Option<&str>,
    ) -> Result<Option<FeatureMetadata>> {
        self.modify(|features| match display_name {
            Some(name) if !name.trim().is_empty() => features.insert(
                feature.to_string(),
                FeatureMetadata {
                    display_name: name.trim().to_string(),
                    updated_at: Utc::now(),
                },
            ),
            _ => features.remove(feature),
        })
    }

    /// Remove a feature's metadata. Returns what was removed.
    pub fn remove(&self, feature: &str) -> Result<Option<FeatureMetadata>> {
        self.modify(|features| features.remove(feature))
    }

    /// Move an entry to a new key. Returns true when there was one to move.
    pub fn rename(&self, from: &str, to: &str) -> Result<bool> {
        self.modify(|features| match features.remove(from) {
            Some(meta) => {
                features.insert(to.to_string(), meta);
                true
            }
            None => false,
        })
    }

    fn modify<T>(&self, f: impl FnOnce(&mut BTreeMap<String, FeatureMetadata>) -> T) -> Result<T> {
        let path = self.path.clone();
        locked_update(&self.path, move |content| {
            let mut file = MetadataFile::parse(content, &path)?;
            let value = f(&mut file.features);
            Ok((file.render()?, value))
        })
    }
}
