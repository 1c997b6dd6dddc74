//! Matching through `cherry picked from commit <sha>` records.

use std::collections::{HashMap, HashSet};

use crate::bucket::BucketForest;
use crate::commit::Commit;

use super::{MatchConfidence, MatchResult};

/// The recorded cherry-pick source, ignoring malformed or self-referencing
/// annotations.
fn recorded_source(commit: &Commit) -> Option<&str> {
    let source = commit.cherry_pick_sha.as_deref()?.trim();
    if source.is_empty() || !source.bytes().all(|b| b.is_ascii_hexdigit()) {
        tracing::debug!(
            sha = %commit.sha,
            annotation = %source,
            "skipping malformed cherry-pick annotation"
        );
        return None;
    }
    (source != commit.sha).then_some(source)
}

pub fn find_direct(
    head: &BucketForest,
    base: &BucketForest,
    head_to_base: bool,
    base_to_head: bool,
) -> Vec<MatchResult> {
    let mut picked_from_head: HashMap<&str, Vec<&Commit>> = HashMap::new();
    if base_to_head {
        for commit in base.commits_in_order() {
            if let Some(source) = recorded_source(commit) {
                picked_from_head.entry(source).or_default().push(commit);
            }
        }
    }

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let mut matches = Vec::new();
    for commit in head.commits_in_order() {
        if head_to_base {
            if let Some(other) = recorded_source(commit).and_then(|source| base.get(source)) {
                if seen.insert((commit.sha.as_str(), other.sha.as_str())) {
                    matches.push(MatchResult::new(commit, other, MatchConfidence::Absolute));
                }
            }
        }
        for other in picked_from_head.get(commit.sha.as_str()).into_iter().flatten() {
            if seen.insert((commit.sha.as_str(), other.sha.as_str())) {
                matches.push(MatchResult::new(commit, other, MatchConfidence::Absolute));
            }
        }
    }
    matches
}

pub fn find_third_party(head: &BucketForest, base: &BucketForest) -> Vec<MatchResult> {
    let head_commits = head.commits_in_order();
    let head_by_source = group_by_outside_source(&head_commits, head, base);
    let base_by_source = group_by_outside_source(&base.commits_in_order(), head, base);

    head_commits
        .into_iter()
        .filter_map(|commit| {
            let source = recorded_source(commit)?;
            let [only_head] = head_by_source.get(source)?.as_slice() else {
                return None;
            };
            let [other] = base_by_source.get(source)?.as_slice() else {
                return None;
            };
            (only_head.sha == commit.sha)
                .then(|| MatchResult::new(commit, other, MatchConfidence::Absolute))
        })
        .collect()
}

/// Group commits by a recorded source that lives on neither side.
fn group_by_outside_source<'a>(
    commits: &[&'a Commit],
    head: &BucketForest,
    base: &BucketForest,
) -> HashMap<&'a str, Vec<&'a Commit>> {
    let mut groups: HashMap<&str, Vec<&Commit>> = HashMap::new();
    for &commit in commits {
        let Some(source) = recorded_source(commit) else {
            continue;
        };
        if !head.contains(source) && !base.contains(source) {
            groups.entry(source).or_default().push(commit);
        }
    }
    groups
}
