//! Configuration management for Graft.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::matcher::{
    DEFAULT_ISSUE_PATTERN, IssueKeyMatcher, MatchConfidence, Matcher, ShaPair, WhitelistMatcher,
};

/// Graft configuration loaded from `.git/graft.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Pruning and ignore lists.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Matcher pipeline, run in order.
    #[serde(default = "default_matchers")]
    pub matchers: Vec<MatcherConfig>,
}

impl Config {
    /// Load config from a TOML file.
    ///
    /// # Errors
    /// Returns error if file can't be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save config to a TOML file.
    ///
    /// # Errors
    /// Returns error if serialization or write fails.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Build the configured matcher pipeline.
    ///
    /// # Errors
    /// Returns an error if an issue-key pattern does not compile.
    pub fn pipeline(&self) -> Result<Vec<Matcher>> {
        self.matchers.iter().map(MatcherConfig::build).collect()
    }

    /// Confidences whose matches are pruned immediately.
    #[must_use]
    pub fn prune_set(&self) -> BTreeSet<MatchConfidence> {
        self.analysis.prune.iter().copied().collect()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            analysis: AnalysisConfig::default(),
            matchers: default_matchers(),
        }
    }
}

/// Pruning and ignore settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Confidences eligible for immediate pruning.
    #[serde(default = "default_prune")]
    pub prune: Vec<MatchConfidence>,

    /// Head shas removed before any matcher runs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_head: Vec<String>,

    /// Base shas removed before any matcher runs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ignore_base: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            prune: default_prune(),
            ignore_head: Vec::new(),
            ignore_base: Vec::new(),
        }
    }
}

fn default_prune() -> Vec<MatchConfidence> {
    MatchConfidence::ALL.to_vec()
}

fn default_matchers() -> Vec<MatcherConfig> {
    Matcher::default_pipeline()
        .iter()
        .map(MatcherConfig::from)
        .collect()
}

const fn default_true() -> bool {
    true
}

fn default_issue_pattern() -> String {
    DEFAULT_ISSUE_PATTERN.into()
}

const fn default_min_length() -> usize {
    10
}

/// One `[[matchers]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum MatcherConfig {
    /// Commits present on both sides.
    IdenticalSha,

    /// Explicit cherry-pick records.
    DirectCherryPick {
        /// Match head commits recording a base sha.
        #[serde(default = "default_true")]
        head_to_base: bool,
        /// Match base commits recording a head sha.
        #[serde(default = "default_true")]
        base_to_head: bool,
    },

    /// Shared cherry-pick source outside both sides.
    ThirdPartyCherryPick,

    /// File fingerprints.
    FilesChanged {
        /// Include line counts.
        #[serde(default = "default_true")]
        with_additions_deletions: bool,
    },

    /// Operator-supplied pairs.
    Whitelist {
        /// Head/base pairs.
        #[serde(default)]
        pairs: Vec<ShaPair>,
        /// Fixed confidence for every pair.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        confidence: Option<MatchConfidence>,
    },

    /// Issue keys in commit messages.
    IssueKey {
        /// Regular expression for a key.
        #[serde(default = "default_issue_pattern")]
        pattern: String,
    },

    /// Subject containment.
    Subject {
        /// Shortest subject considered.
        #[serde(default = "default_min_length")]
        min_length: usize,
    },
}

impl MatcherConfig {
    /// Turn the table into a runnable matcher.
    ///
    /// # Errors
    /// Returns [`crate::Error::InvalidPattern`] for a bad issue-key pattern.
    pub fn build(&self) -> Result<Matcher> {
        Ok(match self {
            Self::IdenticalSha => Matcher::IdenticalSha,
            Self::DirectCherryPick {
                head_to_base,
                base_to_head,
            } => Matcher::DirectCherryPick {
                head_to_base: *head_to_base,
                base_to_head: *base_to_head,
            },
            Self::ThirdPartyCherryPick => Matcher::ThirdPartyCherryPick,
            Self::FilesChanged {
                with_additions_deletions,
            } => Matcher::files_changed(*with_additions_deletions),
            Self::Whitelist { pairs, confidence } => {
                Matcher::Whitelist(WhitelistMatcher::new(pairs.clone(), *confidence))
            }
            Self::IssueKey { pattern } => Matcher::IssueKey(IssueKeyMatcher::new(pattern)?),
            Self::Subject { min_length } => Matcher::Subject {
                min_length: *min_length,
            },
        })
    }
}

impl From<&Matcher> for MatcherConfig {
    fn from(matcher: &Matcher) -> Self {
        match matcher {
            Matcher::IdenticalSha => Self::IdenticalSha,
            Matcher::DirectCherryPick {
                head_to_base,
                base_to_head,
            } => Self::DirectCherryPick {
                head_to_base: *head_to_base,
                base_to_head: *base_to_head,
            },
            Matcher::ThirdPartyCherryPick => Self::ThirdPartyCherryPick,
            Matcher::FilesChanged {
                with_additions_deletions,
            } => Self::FilesChanged {
                with_additions_deletions: *with_additions_deletions,
            },
            Matcher::Whitelist(whitelist) => Self::Whitelist {
                pairs: whitelist.pairs().to_vec(),
                confidence: whitelist.confidence(),
            },
            Matcher::IssueKey(issue_key) => Self::IssueKey {
                pattern: issue_key.pattern().to_owned(),
            },
            Matcher::Subject { min_length } => Self::Subject {
                min_length: *min_length,
            },
        }
    }
}
