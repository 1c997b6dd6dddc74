//! # graft-core
//!
//! Core library for Graft, a merge-debt auditor. Decomposes commit
//! histories into a first-parent spine with nested side lines, records
//! branch topology as a tree of shared segments, and pairs commits between
//! two refs through an ordered matcher pipeline. Whatever stays unpaired is
//! the merge debt.
//!
//! The crate does no version-control I/O; histories arrive through the
//! [`CommitSource`] trait.

pub mod bucket;
pub mod commit;
pub mod config;
pub mod error;
pub mod hierarchy;
pub mod matcher;
pub mod merge_debt;
pub mod sparse;
pub mod traits;
pub mod tree;

#[cfg(test)]
mod test_support;

pub use bucket::{Bucket, BucketForest};
pub use commit::{Commit, FileChange, LinearHistory};
pub use config::{AnalysisConfig, Config, MatcherConfig};
pub use error::{Error, Result};
pub use hierarchy::{
    Boundary, Entry, HierarchyHistory, HierarchyRow, Line, decompose, decompose_with, flatten,
};
pub use matcher::{MatchConfidence, MatchResult, Matcher};
pub use merge_debt::{
    BucketSummary, HeadBaseHistories, MatchRecord, MatchSummary, MergeDebt, MergeDebtReport,
    head_base_histories,
};
pub use traits::CommitSource;
pub use tree::{BranchTree, Divergence, Segment, SegmentSnapshot};
