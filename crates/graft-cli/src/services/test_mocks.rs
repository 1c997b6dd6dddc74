//! Mock implementations for testing services.
//!
//! `MockSource` implements `CommitSource` over a fixed commit list so
//! service logic can be tested without real git repos.

use std::collections::{HashMap, HashSet};

use graft_core::{Commit, CommitSource, Error, LinearHistory, Result as CoreResult};

/// In-memory commit graph with named refs.
///
/// Commits are kept in the order given, which must list children before
/// their parents.
#[derive(Debug, Default)]
pub struct MockSource {
    commits: Vec<Commit>,
    refs: HashMap<String, String>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a commit written as `sha[parent parent]`.
    pub fn with_spec(self, spec: &str) -> Self {
        let (sha, parents) = spec.split_once('[').unwrap_or((spec, "]"));
        let parents = parents.trim_end_matches(']').split_whitespace();
        self.with_commit(Commit::new(sha, parents).with_subject(format!("Commit {sha}")))
    }

    pub fn with_commit(mut self, commit: Commit) -> Self {
        self.commits.push(commit);
        self
    }

    pub fn with_ref(mut self, name: &str, sha: &str) -> Self {
        self.refs.insert(name.to_string(), sha.to_string());
        self
    }

    fn resolve(&self, name: &str) -> CoreResult<&str> {
        if let Some(sha) = self.refs.get(name) {
            return Ok(sha);
        }
        self.commits
            .iter()
            .find(|c| c.sha == name)
            .map(|c| c.sha.as_str())
            .ok_or_else(|| Error::UnknownRef(name.to_string()))
    }

    fn ancestors(&self, tip: &str) -> HashSet<&str> {
        let by_sha: HashMap<&str, &Commit> =
            self.commits.iter().map(|c| (c.sha.as_str(), c)).collect();
        let mut seen = HashSet::new();
        let mut stack = vec![tip];
        while let Some(sha) = stack.pop() {
            let Some(commit) = by_sha.get(sha) else {
                continue;
            };
            if seen.insert(commit.sha.as_str()) {
                stack.extend(commit.parent_shas.iter().map(String::as_str));
            }
        }
        seen
    }

    fn range(&self, end_ref: &str, start_ref: Option<&str>) -> CoreResult<LinearHistory> {
        let reachable = self.ancestors(self.resolve(end_ref)?);
        let hidden = match start_ref {
            Some(start) => self.ancestors(self.resolve(start)?),
            None => HashSet::new(),
        };
        LinearHistory::new(
            self.commits
                .iter()
                .filter(|c| reachable.contains(c.sha.as_str()) && !hidden.contains(c.sha.as_str()))
                .cloned()
                .collect(),
        )
    }
}

impl CommitSource for MockSource {
    fn parent_log(&self, end_ref: &str, start_ref: Option<&str>) -> CoreResult<LinearHistory> {
        let history = self.range(end_ref, start_ref)?;
        LinearHistory::new(
            history
                .into_commits()
                .into_iter()
                .map(|c| Commit::new(c.sha, c.parent_shas))
                .collect(),
        )
    }

    fn change_log(&self, end_ref: &str, start_ref: Option<&str>) -> CoreResult<LinearHistory> {
        self.range(end_ref, start_ref)
    }
}
