//! Message-based heuristics: issue-tracker keys and subject containment.

use std::collections::{BTreeSet, HashMap, HashSet};

use regex::Regex;

use crate::bucket::BucketForest;
use crate::commit::Commit;
use crate::error::{Error, Result};

use super::{MatchResult, size_confidence};

/// Default issue key pattern, e.g. `PROJ-123`.
pub const DEFAULT_ISSUE_PATTERN: &str = r"[A-Z][A-Z0-9]+-\d+";

/// Pairs commits whose messages mention the same issue key.
#[derive(Debug, Clone)]
pub struct IssueKeyMatcher {
    pattern: Regex,
}

impl IssueKeyMatcher {
    /// Compile a matcher for `pattern`.
    ///
    /// # Errors
    /// Returns [`Error::InvalidPattern`] if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| Error::InvalidPattern {
            pattern: pattern.to_owned(),
            message: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    /// The configured pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Issue keys found in the subject and body.
    #[must_use]
    pub fn keys(&self, commit: &Commit) -> BTreeSet<String> {
        self.pattern
            .find_iter(&commit.message())
            .map(|m| m.as_str().to_owned())
            .collect()
    }

    /// Pair every head commit with every base commit sharing a key.
    #[must_use]
    pub fn find_matches(&self, head: &BucketForest, base: &BucketForest) -> Vec<MatchResult> {
        let mut by_key: HashMap<String, Vec<&Commit>> = HashMap::new();
        for commit in base.commits_in_order() {
            for key in self.keys(commit) {
                by_key.entry(key).or_default().push(commit);
            }
        }

        let mut matches = Vec::new();
        for commit in head.commits_in_order() {
            let mut paired = HashSet::new();
            for key in self.keys(commit) {
                for other in by_key.get(&key).into_iter().flatten() {
                    if paired.insert(other.sha.as_str()) {
                        let confidence = size_confidence(commit, other);
                        matches.push(MatchResult::new(commit, other, confidence));
                    }
                }
            }
        }
        matches
    }
}

fn trimmed_subject(commit: &Commit, min_length: usize) -> Option<&str> {
    let subject = commit.subject.as_deref()?.trim();
    (!subject.is_empty() && subject.chars().count() >= min_length).then_some(subject)
}

/// Pair commits where one subject contains the other.
pub fn find_subject_matches(
    head: &BucketForest,
    base: &BucketForest,
    min_length: usize,
) -> Vec<MatchResult> {
    let base_subjects: Vec<(&Commit, &str)> = base
        .commits_in_order()
        .into_iter()
        .filter_map(|c| trimmed_subject(c, min_length).map(|s| (c, s)))
        .collect();

    let mut matches = Vec::new();
    for commit in head.commits_in_order() {
        let Some(subject) = trimmed_subject(commit, min_length) else {
            continue;
        };
        for (other, other_subject) in &base_subjects {
            if other_subject.contains(subject) || subject.contains(other_subject) {
                matches.push(MatchResult::new(commit, other, size_confidence(commit, other)));
            }
        }
    }
    matches
}
