//! `prune`: tear down every merged feature

use anyhow::Result;

use super::down::DownOptions;
use super::Orchestrator;
use crate::error::{is_cancelled, RampError};
use crate::features::{scan_features, FeatureCategory};

#[derive(Debug, Clone, Default)]
pub struct PruneReport {
    /// Features classified as merged
    pub candidates: Vec<String>,
    pub pruned: Vec<String>,
    /// Features whose teardown failed, with the error
    pub failed: Vec<(String, String)>,
    pub warnings: Vec<String>,
}

impl Orchestrator {
    /// Remove every merged feature after one batch confirmation.
    ///
    /// Failures are collected per feature and the batch runs to the end,
    /// unless it is cancelled.
    pub fn prune(&self) -> Result<PruneReport> {
        let _lock = self.lock()?;

        let candidates: Vec<String> = scan_features(&self.project)?
            .into_iter()
            .filter(|status| status.category == FeatureCategory::Merged)
            .map(|status| status.name)
            .collect();
        let mut report = PruneReport {
            candidates: candidates.clone(),
            ..Default::default()
        };
        if candidates.is_empty() {
            return Ok(report);
        }

        let prompt = format!(
            "Remove {} merged feature(s): {}?",
            candidates.len(),
            candidates.join(", ")
        );
        if !self.confirm.confirm(&prompt)? {
            return Err(RampError::Aborted.into());
        }

        for feature in candidates {
            match self.down_locked(&feature, &DownOptions::default()) {
                Ok(down) => {
                    report.warnings.extend(
                        down.warnings
                            .into_iter()
                            .map(|w| format!("{feature}: {w}")),
                    );
                    report.pruned.push(feature);
                }
                Err(e) if is_cancelled(&e) => return Err(e),
                Err(e) => {
                    tracing::warn!(feature = %feature, "prune failed: {e:#}");
                    report.failed.push((feature, format!("{e:#}")));
                }
            }
        }

        Ok(report)
    }
}
