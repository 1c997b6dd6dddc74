//! [`CommitSource`] implementation backed by git.

use graft_core::{CommitSource, LinearHistory};

use crate::Repository;

impl CommitSource for Repository {
    fn parent_log(
        &self,
        end_ref: &str,
        start_ref: Option<&str>,
    ) -> graft_core::Result<LinearHistory> {
        LinearHistory::new(self.parent_records(end_ref, start_ref)?)
    }

    fn change_log(
        &self,
        end_ref: &str,
        start_ref: Option<&str>,
    ) -> graft_core::Result<LinearHistory> {
        LinearHistory::new(self.change_records(end_ref, start_ref)?)
    }
}
