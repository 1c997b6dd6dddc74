//! Operator-supplied head/base pairs.

use serde::{Deserialize, Serialize};

use crate::bucket::BucketForest;

use super::{MatchConfidence, MatchResult, size_confidence};

/// One head sha declared equivalent to one base sha.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaPair {
    /// Sha on the head side.
    pub head: String,
    /// Sha on the base side.
    pub base: String,
}

/// Matches pairs listed by the operator.
///
/// Without an explicit confidence, a pair is `Good` when the change sizes
/// agree and `Low` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WhitelistMatcher {
    pairs: Vec<ShaPair>,
    confidence: Option<MatchConfidence>,
}

impl WhitelistMatcher {
    /// Create a whitelist.
    #[must_use]
    pub const fn new(pairs: Vec<ShaPair>, confidence: Option<MatchConfidence>) -> Self {
        Self { pairs, confidence }
    }

    /// The listed pairs.
    #[must_use]
    pub fn pairs(&self) -> &[ShaPair] {
        &self.pairs
    }

    /// The fixed confidence, if any.
    #[must_use]
    pub const fn confidence(&self) -> Option<MatchConfidence> {
        self.confidence
    }

    /// Pairs whose commits are both still present.
    #[must_use]
    pub fn find_matches(&self, head: &BucketForest, base: &BucketForest) -> Vec<MatchResult> {
        self.pairs
            .iter()
            .filter_map(|pair| {
                let ours = head.get(&pair.head)?;
                let theirs = base.get(&pair.base)?;
                let confidence = self
                    .confidence
                    .unwrap_or_else(|| size_confidence(ours, theirs));
                Some(MatchResult::new(ours, theirs, confidence))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    fn pair(head: &str, base: &str) -> ShaPair {
        ShaPair {
            head: head.to_owned(),
            base: base.to_owned(),
        }
    }

    #[test]
    fn test_pairs_present_on_both_sides() {
        let matcher = WhitelistMatcher::new(
            vec![pair("6b6", "f07"), pair("nope", "f07"), pair("562", "gone")],
            None,
        );
        let matches = matcher.find_matches(&fixtures::head(), &fixtures::base());
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].head.sha, "6b6");
        // 6b6 carries line counts, f07 does not.
        assert_eq!(matches[0].confidence, MatchConfidence::Low);
    }

    #[test]
    fn test_confidence_override() {
        let matcher =
            WhitelistMatcher::new(vec![pair("6b6", "f07")], Some(MatchConfidence::Absolute));
        let matches = matcher.find_matches(&fixtures::head(), &fixtures::base());
        assert_eq!(matches[0].confidence, MatchConfidence::Absolute);
    }
}
