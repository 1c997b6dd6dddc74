//! Matching on fingerprints of the files a commit touches.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::bucket::BucketForest;
use crate::commit::Commit;

use super::{MatchConfidence, MatchResult};

/// Hex SHA-256 over the commit's paths in sorted order, one per line,
/// optionally followed by tab-separated additions and deletions.
#[must_use]
pub fn numstat_digest(commit: &Commit, with_additions_deletions: bool) -> String {
    let mut hasher = Sha256::new();
    for change in commit.sorted_numstat() {
        hasher.update(change.path.as_bytes());
        if with_additions_deletions {
            hasher.update(format!("\t{}\t{}", change.additions, change.deletions).as_bytes());
        }
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

/// Digests carried by exactly one commit on this side.
fn unique_digests<'a>(
    commits: &[&'a Commit],
    with_additions_deletions: bool,
) -> HashMap<String, &'a Commit> {
    let mut seen: HashMap<String, Option<&Commit>> = HashMap::new();
    for &commit in commits {
        if commit.numstat.is_empty() {
            continue;
        }
        seen.entry(numstat_digest(commit, with_additions_deletions))
            .and_modify(|slot| *slot = None)
            .or_insert(Some(commit));
    }
    seen.into_iter()
        .filter_map(|(digest, commit)| commit.map(|c| (digest, c)))
        .collect()
}

pub fn find_matches(
    head: &BucketForest,
    base: &BucketForest,
    with_additions_deletions: bool,
) -> Vec<MatchResult> {
    let head_commits = head.commits_in_order();
    let head_unique = unique_digests(&head_commits, with_additions_deletions);
    let base_unique = unique_digests(&base.commits_in_order(), with_additions_deletions);

    let confidence = if with_additions_deletions {
        MatchConfidence::Strong
    } else {
        MatchConfidence::Good
    };

    let matches: Vec<MatchResult> = head_commits
        .into_iter()
        .filter(|commit| !commit.numstat.is_empty())
        .filter_map(|commit| {
            let digest = numstat_digest(commit, with_additions_deletions);
            head_unique.get(&digest)?;
            base_unique
                .get(&digest)
                .map(|other| MatchResult::new(commit, other, confidence))
        })
        .collect();

    tracing::debug!(
        with_additions_deletions,
        head_fingerprints = head_unique.len(),
        base_fingerprints = base_unique.len(),
        matches = matches.len(),
        "compared file fingerprints"
    );
    matches
}
