//! Merge-debt service: run the matcher pipeline between two refs.
//!
//! Loads both histories through a [`CommitSource`], applies the configured
//! ignore lists and pipeline, and returns the report for presentation.

use anyhow::{Context, Result};
use graft_core::{CommitSource, Config, Divergence, MergeDebt, MergeDebtReport, head_base_histories};
use serde::Serialize;

/// Report plus the fork information it was computed from.
#[derive(Debug, Clone, Serialize)]
pub struct DebtOutcome {
    pub head: String,
    pub base: String,
    pub divergence: Divergence,
    #[serde(flatten)]
    pub report: MergeDebtReport,
}

/// Service for merge-debt analysis.
pub struct DebtService<'a, S: CommitSource> {
    source: &'a S,
    config: &'a Config,
}

impl<'a, S: CommitSource> DebtService<'a, S> {
    /// Create a new debt service.
    pub const fn new(source: &'a S, config: &'a Config) -> Self {
        Self { source, config }
    }

    /// Compare `head_ref` against `base_ref`.
    ///
    /// With `prune` off, every matcher sees the full forests and matches
    /// are only recorded.
    pub fn analyze(&self, head_ref: &str, base_ref: &str, prune: bool) -> Result<DebtOutcome> {
        let pipeline = self.config.pipeline().context("Invalid matcher configuration")?;
        let histories = head_base_histories(self.source, head_ref, base_ref)
            .with_context(|| format!("Failed to load history for {head_ref}..{base_ref}"))?;

        let mut debt = MergeDebt::new(&histories.head, &histories.base)?
            .with_prune_confidences(self.config.prune_set());
        debt.ignore_shas(
            &self.config.analysis.ignore_head,
            &self.config.analysis.ignore_base,
        );
        debt.execute_matchers(&pipeline, prune);

        Ok(DebtOutcome {
            head: head_ref.to_string(),
            base: base_ref.to_string(),
            divergence: histories.divergence,
            report: debt.report(),
        })
    }
}
