//! Port allocation for features
//!
//! Each feature may reserve one or more ports from the project's range
//! `[base, base + max)`. The table lives in `.ramp/port_allocations.json`
//! and every call re-reads and rewrites it under an exclusive file lock, so
//! concurrent ramp processes never hand out the same port twice.

mod table;

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::PortSettings;
use crate::error::RampError;
use crate::fs::{locked_read, locked_update};

pub use table::PortTable;

/// Port file name inside `.ramp/`
pub const PORTS_FILE: &str = "port_allocations.json";

/// Result of an allocation request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    pub ports: Vec<u16>,
    /// False when the feature already held these ports before the call
    pub newly_allocated: bool,
}

#[derive(Debug, Clone)]
pub struct PortAllocator {
    path: PathBuf,
    settings: PortSettings,
}

impl PortAllocator {
    pub fn new(ramp_dir: &Path, settings: PortSettings) -> Self {
        Self {
            path: ramp_dir.join(PORTS_FILE),
            settings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Allocate a single port, returning the feature's first port
    pub fn allocate(&self, feature: &str) -> Result<u16> {
        let allocation = self.allocate_n(feature, 1)?;
        allocation
            .ports
            .first()
            .copied()
            .with_context(|| format!("No port allocated for '{feature}'"))
    }

    /// Reserve the `n` lowest free ports for `feature`.
    ///
    /// A feature that already holds ports gets them back unchanged. An empty
    /// stored entry holds nothing and is replaced.
    pub fn allocate_n(&self, feature: &str, n: usize) -> Result<Allocation> {
        let settings = self.settings;
        locked_update(&self.path, |content| {
            let mut table = PortTable::parse(content, &self.path)?;
            table.base_port = settings.base;
            table.max_ports = settings.max;

            if let Some(existing) = table.allocations.get(feature).filter(|p| !p.is_empty()) {
                let allocation = Allocation {
                    ports: existing.clone(),
                    newly_allocated: false,
                };
                return Ok((table.render()?, allocation));
            }

            let used = table.used();
            let end = u32::from(settings.base) + u32::from(settings.max);
            let ports: Vec<u16> = (u32::from(settings.base)..end)
                .filter_map(|p| u16::try_from(p).ok())
                .filter(|p| !used.contains(p))
                .take(n.max(1))
                .collect();
            if ports.len() < n.max(1) {
                return Err(RampError::PortsExhausted {
                    base: settings.base,
                    end,
                    needed: n.max(1),
                }
                .into());
            }

            tracing::info!(feature, ?ports, "allocated ports");
            table.allocations.insert(feature.to_string(), ports.clone());
            let allocation = Allocation {
                ports,
                newly_allocated: true,
            };
            Ok((table.render()?, allocation))
        })
    }

    /// Release a feature's ports. Releasing an unknown feature is a no-op.
    pub fn release(&self, feature: &str) -> Result<Option<Vec<u16>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        locked_update(&self.path, |content| {
            let mut table = PortTable::parse(content, &self.path)?;
            let released = table.allocations.remove(feature);
            if let Some(ports) = &released {
                tracing::info!(feature, ?ports, "released ports");
            }
            Ok((table.render()?, released))
        })
    }

    pub fn get_ports(&self, feature: &str) -> Result<Option<Vec<u16>>> {
        Ok(self.all()?.remove(feature))
    }

    /// All allocations, keyed by feature name
    pub fn all(&self) -> Result<BTreeMap<String, Vec<u16>>> {
        let content = locked_read(&self.path)?;
        Ok(PortTable::parse(content.as_deref(), &self.path)?.allocations)
    }

    /// Move an allocation to a new key. Returns `false` when `from` held none.
    pub fn rename_feature(&self, from: &str, to: &str) -> Result<bool> {
        if !self.path.exists() {
            return Ok(false);
        }
        locked_update(&self.path, |content| {
            let mut table = PortTable::parse(content, &self.path)?;
            if table.allocations.contains_key(to) {
                anyhow::bail!("Port allocation for '{to}' already exists");
            }
            let moved = match table.allocations.remove(from) {
                Some(ports) => {
                    table.allocations.insert(to.to_string(), ports);
                    true
                }
                None => false,
            };
            Ok((table.render()?, moved))
        })
    }
}
