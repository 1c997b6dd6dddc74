//! Error types for graft-core.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in graft-core operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The same sha appears twice in one history.
    #[error("duplicate commit in history: {0}")]
    DuplicateCommit(String),

    /// A parent appears before one of its children.
    #[error("commit {parent} is listed before its child {commit}")]
    NotTopological {
        /// The child commit.
        commit: String,
        /// The parent that was listed too early.
        parent: String,
    },

    /// A declared parent is absent from a history that claims to be complete.
    #[error("parent {parent} of commit {commit} is missing from the history")]
    MissingParent {
        /// The commit declaring the parent.
        commit: String,
        /// The absent parent sha.
        parent: String,
    },

    /// A commit cannot be reached from the history's tip.
    #[error("commit {0} is not reachable from the tip of the history")]
    UnreachableCommit(String),

    /// The continuation passed to a nested bucket does not start at the
    /// merge commit's first parent.
    #[error("first parent line of merge {merge} starts at {found}, expected {expected}")]
    BrokenFirstParentLine {
        /// The merge commit owning the line.
        merge: String,
        /// The merge commit's recorded first parent.
        expected: String,
        /// The first commit of the passed-in line.
        found: String,
    },

    /// A ref was inserted or requested with no commits.
    #[error("history for '{0}' is empty")]
    EmptyHistory(String),

    /// A ref shares no root commit with the histories already recorded.
    #[error("history for '{0}' shares no commits with the recorded branches")]
    DisjointHistory(String),

    /// A ref name is not known to the branch tree.
    #[error("unknown ref: {0}")]
    UnknownRef(String),

    /// A sha is not part of the history.
    #[error("unknown commit: {0}")]
    UnknownCommit(String),

    /// A start commit is not on the first-parent line of the history's tip.
    #[error("commit {0} is not on the first-parent line of the tip")]
    NotOnSpine(String),

    /// A configured regular expression does not compile.
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Compiler diagnostic.
        message: String,
    },

    /// The commit source failed to produce a history.
    #[error("commit source error: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("toml error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Error {
    /// Wrap a collaborator error as [`Error::Source`].
    pub fn from_source(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Source(Box::new(err))
    }
}
