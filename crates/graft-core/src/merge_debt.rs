//! Merge-debt analysis: which head commits still have no equivalent on base.
//!
//! Head and base are turned into bucket forests. Matchers run in order;
//! every match whose confidence is eligible is pruned from both forests
//! before the next matcher sees them. Whatever remains is the debt.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::Result;
use crate::bucket::{Bucket, BucketForest};
use crate::hierarchy::{Boundary, HierarchyHistory, decompose_with};
use crate::matcher::{MatchConfidence, MatchResult, Matcher};
use crate::traits::CommitSource;
use crate::tree::{BranchTree, Divergence};

/// A match together with the matcher that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    /// Name of the producing matcher.
    pub matcher: String,
    /// The pairing.
    pub result: MatchResult,
}

/// Orchestrates matchers over a head and a base forest.
#[derive(Debug, Clone)]
pub struct MergeDebt {
    head: BucketForest,
    base: BucketForest,
    matches: Vec<MatchRecord>,
    prune_confidences: BTreeSet<MatchConfidence>,
}

impl MergeDebt {
    /// Build both forests.
    ///
    /// # Errors
    /// Returns an error if either hierarchy cannot be bucketed.
    pub fn new(head: &HierarchyHistory, base: &HierarchyHistory) -> Result<Self> {
        Ok(Self::from_forests(
            BucketForest::build(head)?,
            BucketForest::build(base)?,
        ))
    }

    /// Start from already built forests.
    #[must_use]
    pub fn from_forests(head: BucketForest, base: BucketForest) -> Self {
        Self {
            head,
            base,
            matches: Vec::new(),
            prune_confidences: MatchConfidence::ALL.into_iter().collect(),
        }
    }

    /// Restrict immediate pruning to the given confidences.
    #[must_use]
    pub fn with_prune_confidences(
        mut self,
        confidences: impl IntoIterator<Item = MatchConfidence>,
    ) -> Self {
        self.prune_confidences = confidences.into_iter().collect();
        self
    }

    /// Prune commits known to be irrelevant before matching.
    pub fn ignore_shas<H, B>(&mut self, head: H, base: B)
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        for sha in head {
            self.prune_head_sha(sha.as_ref());
        }
        for sha in base {
            self.prune_base_sha(sha.as_ref());
        }
    }

    /// Remove a sha from the head forest.
    pub fn prune_head_sha(&mut self, sha: &str) -> bool {
        self.head.prune(sha)
    }

    /// Remove a sha from the base forest.
    pub fn prune_base_sha(&mut self, sha: &str) -> bool {
        self.base.prune(sha)
    }

    /// Run one matcher against the current forests.
    ///
    /// Returns the number of matches found.
    pub fn execute_matcher(&mut self, matcher: &Matcher, prune: bool) -> usize {
        let found = matcher.find_matches(&self.head, &self.base);
        let count = found.len();

        let mut pruned = 0;
        for result in found {
            if prune && self.prune_confidences.contains(&result.confidence) {
                self.head.prune(&result.head.sha);
                self.base.prune(&result.base.sha);
                pruned += 1;
            }
            self.matches.push(MatchRecord {
                matcher: matcher.to_string(),
                result,
            });
        }

        tracing::info!(
            matcher = %matcher,
            matches = count,
            pruned,
            head_remaining = self.head.commit_count(),
            base_remaining = self.base.commit_count(),
            "matcher finished"
        );
        count
    }

    /// Run matchers strictly in order.
    pub fn execute_matchers(&mut self, matchers: &[Matcher], prune: bool) {
        for matcher in matchers {
            self.execute_matcher(matcher, prune);
        }
    }

    /// Accumulated matches in discovery order.
    pub fn matches(&self) -> impl Iterator<Item = &MatchResult> {
        self.matches.iter().map(|r| &r.result)
    }

    /// Accumulated matches with their matcher names.
    #[must_use]
    pub fn records(&self) -> &[MatchRecord] {
        &self.matches
    }

    /// The head forest in its current state.
    #[must_use]
    pub const fn head(&self) -> &BucketForest {
        &self.head
    }

    /// The base forest in its current state.
    #[must_use]
    pub const fn base(&self) -> &BucketForest {
        &self.base
    }

    /// Matches plus the residual buckets of both sides.
    #[must_use]
    pub fn report(&self) -> MergeDebtReport {
        MergeDebtReport {
            matches: self.matches.iter().map(MatchSummary::from).collect(),
            head_debt: summarize(&self.head),
            base_debt: summarize(&self.base),
            head_remaining: self.head.commit_count(),
            base_remaining: self.base.commit_count(),
        }
    }
}

/// Serializable outcome of an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeDebtReport {
    /// Matches in discovery order.
    pub matches: Vec<MatchSummary>,
    /// Unmatched head buckets, linearized.
    pub head_debt: Vec<BucketSummary>,
    /// Unmatched base buckets, linearized.
    pub base_debt: Vec<BucketSummary>,
    /// Unmatched head commits.
    pub head_remaining: usize,
    /// Unmatched base commits.
    pub base_remaining: usize,
}

/// One match, flattened for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    /// Producing matcher.
    pub matcher: String,
    /// Head sha.
    pub head: String,
    /// Base sha.
    pub base: String,
    /// Head subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Certainty.
    pub confidence: MatchConfidence,
}

impl From<&MatchRecord> for MatchSummary {
    fn from(record: &MatchRecord) -> Self {
        Self {
            matcher: record.matcher.clone(),
            head: record.result.head.sha.clone(),
            base: record.result.base.sha.clone(),
            subject: record.result.head.subject.clone(),
            confidence: record.result.confidence,
        }
    }
}

/// One residual bucket, flattened for output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BucketSummary {
    /// Sha of the bucket's merge commit.
    pub merge: String,
    /// Subject of the merge commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Nesting depth.
    pub depth: usize,
    /// Merge sha of the enclosing bucket.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Unmatched plain commits in the bucket.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commits: Vec<String>,
}

impl From<Bucket<'_>> for BucketSummary {
    fn from(bucket: Bucket<'_>) -> Self {
        Self {
            merge: bucket.merge_sha().to_owned(),
            subject: bucket.merge_commit().and_then(|c| c.subject.clone()),
            depth: bucket.depth(),
            parent: bucket.parent().map(|p| p.merge_sha().to_owned()),
            commits: bucket.branch_shas().into_iter().map(str::to_owned).collect(),
        }
    }
}

fn summarize(forest: &BucketForest) -> Vec<BucketSummary> {
    forest
        .linearize()
        .into_iter()
        .map(BucketSummary::from)
        .collect()
}

/// Hierarchies of the commits unique to each of two refs.
#[derive(Debug, Clone)]
pub struct HeadBaseHistories {
    /// Commits on head since the fork point.
    pub head: HierarchyHistory,
    /// Commits on base since the fork point.
    pub base: HierarchyHistory,
    /// Where the two first-parent lines part.
    pub divergence: Divergence,
}

/// Fetch both refs, find their fork point through a branch tree, and
/// decompose the change logs since that point.
///
/// # Errors
/// Propagates commit source, decomposition and tree errors.
pub fn head_base_histories<S: CommitSource>(
    source: &S,
    head_ref: &str,
    base_ref: &str,
) -> Result<HeadBaseHistories> {
    let head_spine = decompose_with(&source.parent_log(head_ref, None)?, Boundary::Truncated)?;
    let base_spine = decompose_with(&source.parent_log(base_ref, None)?, Boundary::Truncated)?;

    let mut tree = BranchTree::new();
    tree.insert(&base_spine, base_ref)?;
    tree.insert(&head_spine, head_ref)?;
    let divergence = tree.divergence(head_ref, base_ref)?;

    tracing::debug!(
        head = head_ref,
        base = base_ref,
        fork = divergence.fork_point.as_deref().unwrap_or("-"),
        head_only = divergence.head_only.len(),
        base_only = divergence.base_only.len(),
        "located fork point"
    );

    let fork = divergence.fork_point.as_deref();
    let head = decompose_with(&source.change_log(head_ref, fork)?, Boundary::Truncated)?;
    let base = decompose_with(&source.change_log(base_ref, fork)?, Boundary::Truncated)?;

    Ok(HeadBaseHistories {
        head,
        base,
        divergence,
    })
}
