//! Heuristics that pair head commits with equivalent base commits.
//!
//! Every matcher reads two bucket forests and returns pairs in head-side
//! linearized order. Matchers never mutate the forests; the orchestrator
//! decides what to prune.

mod cherry_pick;
mod files_changed;
mod identical;
mod text;
mod whitelist;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bucket::BucketForest;
use crate::commit::Commit;

pub use files_changed::numstat_digest;
pub use text::{DEFAULT_ISSUE_PATTERN, IssueKeyMatcher};
pub use whitelist::{ShaPair, WhitelistMatcher};

/// How sure a matcher is that two commits carry the same change.
///
/// Ordered from most to least certain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    /// Same commit, or an explicit cherry-pick record.
    Absolute,
    /// Identical file-level change statistics.
    Strong,
    /// Same touched files, or a textual hint.
    Good,
    /// A textual hint with differing change sizes.
    Low,
}

impl MatchConfidence {
    /// All levels, most certain first.
    pub const ALL: [Self; 4] = [Self::Absolute, Self::Strong, Self::Good, Self::Low];

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absolute => "absolute",
            Self::Strong => "strong",
            Self::Good => "good",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A head commit paired with its base equivalent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    /// Commit on the head side.
    pub head: Commit,
    /// Commit on the base side.
    pub base: Commit,
    /// Certainty of the pairing.
    pub confidence: MatchConfidence,
}

impl MatchResult {
    pub(crate) fn new(head: &Commit, base: &Commit, confidence: MatchConfidence) -> Self {
        Self {
            head: head.clone(),
            base: base.clone(),
            confidence,
        }
    }
}

/// The closed set of matching heuristics.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Commits present on both sides.
    IdenticalSha,
    /// Cherry-pick records pointing at a commit on the other side.
    DirectCherryPick {
        /// Head commits recording a base commit.
        head_to_base: bool,
        /// Base commits recording a head commit.
        base_to_head: bool,
    },
    /// Commits on both sides recording the same third commit.
    ThirdPartyCherryPick,
    /// Unique per-side fingerprints of the touched files.
    FilesChanged {
        /// Include line counts in the fingerprint.
        with_additions_deletions: bool,
    },
    /// Externally supplied pairs.
    Whitelist(WhitelistMatcher),
    /// Shared issue-tracker keys in the message.
    IssueKey(IssueKeyMatcher),
    /// One subject contained in the other.
    Subject {
        /// Minimum trimmed subject length considered.
        min_length: usize,
    },
}

impl Matcher {
    /// Cherry-pick matching in both directions.
    #[must_use]
    pub const fn direct_cherry_pick() -> Self {
        Self::DirectCherryPick {
            head_to_base: true,
            base_to_head: true,
        }
    }

    /// File-fingerprint matching.
    #[must_use]
    pub const fn files_changed(with_additions_deletions: bool) -> Self {
        Self::FilesChanged {
            with_additions_deletions,
        }
    }

    /// The pipeline used when nothing is configured.
    #[must_use]
    pub fn default_pipeline() -> Vec<Self> {
        vec![
            Self::IdenticalSha,
            Self::direct_cherry_pick(),
            Self::ThirdPartyCherryPick,
            Self::files_changed(true),
            Self::files_changed(false),
        ]
    }

    /// Short name for logs and reports.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::IdenticalSha => "identical-sha",
            Self::DirectCherryPick { .. } => "direct-cherry-pick",
            Self::ThirdPartyCherryPick => "third-party-cherry-pick",
            Self::FilesChanged { .. } => "files-changed",
            Self::Whitelist(_) => "whitelist",
            Self::IssueKey(_) => "issue-key",
            Self::Subject { .. } => "subject",
        }
    }

    /// Pair head commits with base commits.
    #[must_use]
    pub fn find_matches(&self, head: &BucketForest, base: &BucketForest) -> Vec<MatchResult> {
        match self {
            Self::IdenticalSha => identical::find_matches(head, base),
            Self::DirectCherryPick {
                head_to_base,
                base_to_head,
            } => cherry_pick::find_direct(head, base, *head_to_base, *base_to_head),
            Self::ThirdPartyCherryPick => cherry_pick::find_third_party(head, base),
            Self::FilesChanged {
                with_additions_deletions,
            } => files_changed::find_matches(head, base, *with_additions_deletions),
            Self::Whitelist(matcher) => matcher.find_matches(head, base),
            Self::IssueKey(matcher) => matcher.find_matches(head, base),
            Self::Subject { min_length } => text::find_subject_matches(head, base, *min_length),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectCherryPick {
                head_to_base: true,
                base_to_head: false,
            } => f.write_str("direct-cherry-pick (head to base)"),
            Self::DirectCherryPick {
                head_to_base: false,
                base_to_head: true,
            } => f.write_str("direct-cherry-pick (base to head)"),
            Self::FilesChanged {
                with_additions_deletions: true,
            } => f.write_str("files-changed (with line counts)"),
            other => f.write_str(other.name()),
        }
    }
}

/// `Good` when both commits change the same number of lines, else `Low`.
pub(crate) fn size_confidence(head: &Commit, base: &Commit) -> MatchConfidence {
    if head.change_size() == base.change_size() {
        MatchConfidence::Good
    } else {
        MatchConfidence::Low
    }
}
