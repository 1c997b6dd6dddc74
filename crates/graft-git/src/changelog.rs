//! Commit message parsing.

use regex::Regex;

use crate::error::Result;

const CHERRY_PICK_PATTERN: &str = r"\(cherry picked from commit ([a-f0-9]+)\)";

/// Subject, body and cherry-pick source taken from one message.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedMessage {
    /// First line, trimmed.
    pub subject: Option<String>,
    /// Everything after the first line, trimmed.
    pub body: Option<String>,
    /// Sha named by a single `(cherry picked from commit <sha>)` line.
    pub cherry_pick_sha: Option<String>,
}

/// Splits commit messages and finds `git cherry-pick -x` annotations.
#[derive(Debug, Clone)]
pub struct MessageParser {
    cherry_pick: Regex,
}

impl MessageParser {
    /// Compile the annotation pattern.
    ///
    /// # Errors
    /// Returns [`crate::Error::Pattern`] if the pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            cherry_pick: Regex::new(CHERRY_PICK_PATTERN)?,
        })
    }

    /// Parse a full commit message.
    #[must_use]
    pub fn parse(&self, message: &str) -> ParsedMessage {
        let (subject, body) = message.split_once('\n').unwrap_or((message, ""));
        ParsedMessage {
            subject: non_empty(subject),
            body: non_empty(body),
            cherry_pick_sha: self.cherry_pick_source(body),
        }
    }

    /// The recorded source sha, if exactly one annotation is present.
    #[must_use]
    pub fn cherry_pick_source(&self, text: &str) -> Option<String> {
        let mut captures = self.cherry_pick.captures_iter(text);
        let first = captures.next()?;
        if captures.next().is_some() {
            tracing::debug!("ignoring message with several cherry-pick annotations");
            return None;
        }
        first.get(1).map(|m| m.as_str().to_owned())
    }
}

fn non_empty(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_subject_and_body() {
        let parsed = MessageParser::new()
            .unwrap()
            .parse("Fix parser\n\nLonger explanation.\nSecond line.\n");
        assert_eq!(parsed.subject.as_deref(), Some("Fix parser"));
        assert_eq!(parsed.body.as_deref(), Some("Longer explanation.\nSecond line."));
        assert_eq!(parsed.cherry_pick_sha, None);
    }

    #[test]
    fn test_subject_only() {
        let parsed = MessageParser::new().unwrap().parse("Initial commit");
        assert_eq!(parsed.subject.as_deref(), Some("Initial commit"));
        assert_eq!(parsed.body, None);
    }

    #[test]
    fn test_single_cherry_pick_annotation() {
        let parsed = MessageParser::new()
            .unwrap()
            .parse("Fix\n\n(cherry picked from commit 0123abcd)\n");
        assert_eq!(parsed.cherry_pick_sha.as_deref(), Some("0123abcd"));
    }

    #[test]
    fn test_several_annotations_are_ignored() {
        let parser = MessageParser::new().unwrap();
        let text = "(cherry picked from commit aaaa)\n(cherry picked from commit bbbb)";
        assert_eq!(parser.cherry_pick_source(text), None);
    }

    #[test]
    fn test_annotation_in_subject_is_ignored() {
        let parsed = MessageParser::new()
            .unwrap()
            .parse("(cherry picked from commit aaaa)");
        assert_eq!(parsed.cherry_pick_sha, None);
    }
}
