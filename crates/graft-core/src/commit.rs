//! Commit records and reverse-topological commit histories.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Lines added and removed in one file by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root.
    pub path: String,
    /// Number of added lines.
    pub additions: u64,
    /// Number of deleted lines.
    pub deletions: u64,
}

impl FileChange {
    /// Create a file change entry.
    #[must_use]
    pub fn new(path: impl Into<String>, additions: u64, deletions: u64) -> Self {
        Self {
            path: path.into(),
            additions,
            deletions,
        }
    }
}

/// One commit as supplied by a commit source.
///
/// Only `sha` and `parent_shas` are required. Matchers that look at
/// metadata simply skip commits that lack it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Full commit id.
    pub sha: String,

    /// Parent ids; index 0 is the first (mainline) parent.
    #[serde(default)]
    pub parent_shas: Vec<String>,

    /// First line of the commit message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,

    /// Remainder of the commit message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Author name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Author email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_mail: Option<String>,

    /// Committer timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_date: Option<DateTime<Utc>>,

    /// Sha recorded by `git cherry-pick -x` in the message body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cherry_pick_sha: Option<String>,

    /// Per-file additions and deletions against the first parent.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numstat: Vec<FileChange>,
}

impl Commit {
    /// Create a commit carrying only topology.
    #[must_use]
    pub fn new<I, S>(sha: impl Into<String>, parents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sha: sha.into(),
            parent_shas: parents.into_iter().map(Into::into).collect(),
            subject: None,
            body: None,
            author_name: None,
            author_mail: None,
            commit_date: None,
            cherry_pick_sha: None,
            numstat: Vec::new(),
        }
    }

    /// Set the subject line.
    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Set the message body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Set the cherry-pick source sha.
    #[must_use]
    pub fn with_cherry_pick(mut self, sha: impl Into<String>) -> Self {
        self.cherry_pick_sha = Some(sha.into());
        self
    }

    /// Set the per-file change statistics.
    #[must_use]
    pub fn with_numstat(mut self, numstat: Vec<FileChange>) -> Self {
        self.numstat = numstat;
        self
    }

    /// The first (mainline) parent, if any.
    #[must_use]
    pub fn first_parent(&self) -> Option<&str> {
        self.parent_shas.first().map(String::as_str)
    }

    /// Parents other than the first one.
    pub fn other_parents(&self) -> impl Iterator<Item = &str> {
        self.parent_shas.iter().skip(1).map(String::as_str)
    }

    /// Whether the commit has two or more parents.
    #[must_use]
    pub fn is_merge(&self) -> bool {
        self.parent_shas.len() > 1
    }

    /// File changes sorted by path.
    #[must_use]
    pub fn sorted_numstat(&self) -> Vec<&FileChange> {
        let mut sorted: Vec<&FileChange> = self.numstat.iter().collect();
        sorted.sort_by(|a, b| a.path.cmp(&b.path));
        sorted
    }

    /// Total `(additions, deletions)` across all files.
    #[must_use]
    pub fn change_size(&self) -> (u64, u64) {
        self.numstat.iter().fold((0, 0), |(add, del), change| {
            (add + change.additions, del + change.deletions)
        })
    }

    /// Subject and body joined, for text heuristics.
    #[must_use]
    pub fn message(&self) -> String {
        match (&self.subject, &self.body) {
            (Some(subject), Some(body)) => format!("{subject}\n\n{body}"),
            (Some(text), None) | (None, Some(text)) => text.clone(),
            (None, None) => String::new(),
        }
    }
}

/// Commits of one ref in reverse-topological order.
///
/// A commit never precedes any of its descendants, and shas are unique.
/// Parents outside the supplied range are allowed; they are simply absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct LinearHistory {
    commits: Vec<Commit>,
}

impl LinearHistory {
    /// Validate and wrap a list of commits.
    ///
    /// # Errors
    /// Returns [`Error::DuplicateCommit`] when a sha repeats and
    /// [`Error::NotTopological`] when a parent is listed before its child.
    pub fn new(commits: Vec<Commit>) -> Result<Self> {
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(commits.len());
        for (pos, commit) in commits.iter().enumerate() {
            if positions.insert(commit.sha.as_str(), pos).is_some() {
                return Err(Error::DuplicateCommit(commit.sha.clone()));
            }
        }

        for (pos, commit) in commits.iter().enumerate() {
            for parent in &commit.parent_shas {
                if let Some(&parent_pos) = positions.get(parent.as_str()) {
                    if parent_pos <= pos {
                        return Err(Error::NotTopological {
                            commit: commit.sha.clone(),
                            parent: parent.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self { commits })
    }

    /// Wrap commits already known to satisfy the ordering contract.
    pub(crate) const fn from_ordered(commits: Vec<Commit>) -> Self {
        Self { commits }
    }

    /// The commits, tip first.
    #[must_use]
    pub fn commits(&self) -> &[Commit] {
        &self.commits
    }

    /// The tip commit.
    #[must_use]
    pub fn head(&self) -> Option<&Commit> {
        self.commits.first()
    }

    /// Iterate commits, tip first.
    pub fn iter(&self) -> std::slice::Iter<'_, Commit> {
        self.commits.iter()
    }

    /// Shas in order.
    #[must_use]
    pub fn shas(&self) -> Vec<&str> {
        self.commits.iter().map(|c| c.sha.as_str()).collect()
    }

    /// Number of commits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commits.len()
    }

    /// Whether the history has no commits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }

    /// Unwrap into the commit list.
    #[must_use]
    pub fn into_commits(self) -> Vec<Commit> {
        self.commits
    }
}

impl<'de> Deserialize<'de> for LinearHistory {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let commits = Vec::<Commit>::deserialize(deserializer)?;
        Self::new(commits).map_err(serde::de::Error::custom)
    }
}

impl<'a> IntoIterator for &'a LinearHistory {
    type Item = &'a Commit;
    type IntoIter = std::slice::Iter<'a, Commit>;

    fn into_iter(self) -> Self::IntoIter {
        self.commits.iter()
    }
}
