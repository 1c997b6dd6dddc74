//! Error types for graft-git.

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading history.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not inside a git repository.
    #[error("not a git repository")]
    NotARepository,

    /// Reference or revision did not resolve to a commit.
    #[error("reference not found: {0}")]
    RefNotFound(String),

    /// Message pattern failed to compile.
    #[error("invalid message pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Underlying git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),
}

impl From<Error> for graft_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::RefNotFound(name) => Self::UnknownRef(name),
            other => Self::from_source(other),
        }
    }
}
