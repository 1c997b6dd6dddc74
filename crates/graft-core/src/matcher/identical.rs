//! Commits present on both sides.

use crate::bucket::BucketForest;

use super::{MatchConfidence, MatchResult};

pub fn find_matches(head: &BucketForest, base: &BucketForest) -> Vec<MatchResult> {
    head.commits_in_order()
        .into_iter()
        .filter_map(|commit| {
            base.get(&commit.sha)
                .map(|other| MatchResult::new(commit, other, MatchConfidence::Absolute))
        })
        .collect()
}
