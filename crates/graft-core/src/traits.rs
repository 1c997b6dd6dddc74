//! Trait abstractions for commit sources.
//!
//! The core never talks to a version-control backend directly. A
//! `CommitSource` supplies reverse-topological histories, which lets the
//! orchestration code run against git or an in-memory fixture.

use crate::Result;
use crate::commit::LinearHistory;

/// Supplier of commit histories for refs.
///
/// Both operations return commits reachable from `end_ref` but not from
/// `start_ref` (when given), tip first, with every parent listed after its
/// children or absent from the range.
#[allow(clippy::missing_errors_doc)]
pub trait CommitSource {
    /// Topology only: shas and ordered parent shas.
    fn parent_log(&self, end_ref: &str, start_ref: Option<&str>) -> Result<LinearHistory>;

    /// Topology plus metadata: subject, body, author, date, cherry-pick
    /// source and per-file change counts.
    fn change_log(&self, end_ref: &str, start_ref: Option<&str>) -> Result<LinearHistory>;
}
