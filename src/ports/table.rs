//! On-disk format of `.ramp/port_allocations.json`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// One feature's entry. Older files stored a single port per feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum StoredPorts {
    Many(Vec<u16>),
    Legacy(u16),
}

impl StoredPorts {
    fn into_vec(self) -> Vec<u16> {
        match self {
            StoredPorts::Many(ports) => ports,
            StoredPorts::Legacy(port) => vec![port],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawTable {
    #[serde(default)]
    base_port: Option<u16>,
    #[serde(default)]
    max_ports: Option<u16>,
    #[serde(default)]
    allocations: BTreeMap<String, StoredPorts>,
}

/// In-memory view of the port file, valid only inside one locked update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PortTable {
    pub base_port: u16,
    pub max_ports: u16,
    pub allocations: BTreeMap<String, Vec<u16>>,
}

impl PortTable {
    /// Parse the file content, normalizing legacy single-port entries
    pub fn parse(content: Option<&str>, path: &Path) -> Result<Self> {
        let raw: RawTable = match content {
            Some(c) if !c.trim().is_empty() => serde_json::from_str(c)
                .with_context(|| format!("Failed to parse port file: {}", path.display()))?,
            _ => RawTable::default(),
        };
        Ok(Self {
            base_port: raw.base_port.unwrap_or_default(),
            max_ports: raw.max_ports.unwrap_or_default(),
            allocations: raw
                .allocations
                .into_iter()
                .map(|(name, ports)| (name, ports.into_vec()))
                .collect(),
        })
    }

    pub fn render(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize port allocations")
    }

    pub fn used(&self) -> BTreeSet<u16> {
        self.allocations.values().flatten().copied().collect()
    }
}
