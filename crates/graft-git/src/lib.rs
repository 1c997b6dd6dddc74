//! # graft-git
//!
//! Git commit source for Graft, built on git2-rs.
//! Resolves refs, walks history in reverse-topological order and turns
//! git commits into [`graft_core::Commit`] records.

mod changelog;
mod error;
mod repository;
mod source;

pub use changelog::{MessageParser, ParsedMessage};
pub use error::{Error, Result};
pub use git2::Oid;
pub use repository::Repository;
