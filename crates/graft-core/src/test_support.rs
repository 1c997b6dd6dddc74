//! Fixtures shared by the unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use crate::Result;
use crate::commit::{Commit, LinearHistory};
use crate::error::Error;
use crate::traits::CommitSource;

/// Parse `"sha[p1 p2]"` (commas allowed) into a commit.
pub fn commit(spec: &str) -> Commit {
    let (sha, rest) = spec.split_once('[').expect("missing '['");
    let parents = rest.trim_end_matches(']');
    Commit::new(
        sha.trim(),
        parents
            .split([' ', ','])
            .map(str::trim)
            .filter(|p| !p.is_empty()),
    )
}

/// Build a validated history from `"sha[parents]"` lines, tip first.
pub fn history(specs: &[&str]) -> LinearHistory {
    LinearHistory::new(specs.iter().map(|s| commit(s)).collect()).expect("invalid fixture")
}

/// Random connected DAG, tip first, every commit reachable from the tip.
pub fn arb_history() -> impl Strategy<Value = LinearHistory> {
    (1usize..40)
        .prop_flat_map(|n| {
            let parents = (0..n)
                .map(|i| {
                    if i == 0 {
                        Just(Vec::new()).boxed()
                    } else {
                        prop::collection::vec(0..i, 1..=3).boxed()
                    }
                })
                .collect::<Vec<_>>();
            parents
        })
        .prop_map(|parents| {
            let n = parents.len();
            let tip = n - 1;
            let mut reachable = HashSet::new();
            let mut stack = vec![tip];
            while let Some(i) = stack.pop() {
                if reachable.insert(i) {
                    stack.extend(parents[i].iter().copied());
                }
            }

            let commits = (0..n)
                .rev()
                .filter(|i| reachable.contains(i))
                .map(|i| {
                    let mut seen = HashSet::new();
                    let ps: Vec<String> = parents[i]
                        .iter()
                        .filter(|p| seen.insert(**p))
                        .map(|p| format!("c{p}"))
                        .collect();
                    Commit::new(format!("c{i}"), ps)
                })
                .collect();
            LinearHistory::new(commits).expect("generated history is ordered")
        })
}

/// In-memory commit source over one globally ordered commit list.
pub struct MemorySource {
    commits: Vec<Commit>,
    refs: HashMap<String, String>,
}

impl MemorySource {
    /// `specs` must be ordered tip first across all refs.
    pub fn new(specs: &[&str], refs: &[(&str, &str)]) -> Self {
        Self {
            commits: history(specs).into_commits(),
            refs: refs
                .iter()
                .map(|(name, sha)| ((*name).to_owned(), (*sha).to_owned()))
                .collect(),
        }
    }

    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.refs.get(name).map_or(name, String::as_str)
    }

    fn reachable(&self, tip: &str) -> HashSet<&str> {
        let by_sha: HashMap<&str, &Commit> =
            self.commits.iter().map(|c| (c.sha.as_str(), c)).collect();
        let mut seen = HashSet::new();
        let mut stack = vec![tip];
        while let Some(sha) = stack.pop() {
            if let Some(commit) = by_sha.get(sha) {
                if seen.insert(commit.sha.as_str()) {
                    stack.extend(commit.parent_shas.iter().map(String::as_str));
                }
            }
        }
        seen
    }
}

impl CommitSource for MemorySource {
    fn parent_log(&self, end_ref: &str, start_ref: Option<&str>) -> Result<LinearHistory> {
        self.change_log(end_ref, start_ref)
    }

    fn change_log(&self, end_ref: &str, start_ref: Option<&str>) -> Result<LinearHistory> {
        let end = self.resolve(end_ref);
        if !self.commits.iter().any(|c| c.sha == end) {
            return Err(Error::UnknownRef(end_ref.to_owned()));
        }
        let include = self.reachable(end);
        let exclude = start_ref.map(|s| self.reachable(self.resolve(s))).unwrap_or_default();
        LinearHistory::new(
            self.commits
                .iter()
                .filter(|c| include.contains(c.sha.as_str()) && !exclude.contains(c.sha.as_str()))
                .cloned()
                .collect(),
        )
    }
}
