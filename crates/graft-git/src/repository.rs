//! Repository wrapper that reads commit history.

use std::path::Path;

use chrono::{DateTime, Utc};
use git2::{Oid, Patch, Sort};
use graft_core::{Commit, FileChange};

use crate::changelog::MessageParser;
use crate::error::{Error, Result};

/// Read-only wrapper around a git repository.
pub struct Repository {
    inner: git2::Repository,
    parser: MessageParser,
}

impl Repository {
    /// Open a repository at the given path.
    ///
    /// # Errors
    /// Returns error if no repository found at path or any parent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let inner = git2::Repository::discover(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                Error::NotARepository
            } else {
                Error::Git2(e)
            }
        })?;
        Self::wrap(inner)
    }

    /// Open the repository containing the current directory.
    ///
    /// # Errors
    /// Returns error if not inside a git repository.
    pub fn open_current() -> Result<Self> {
        Self::open(".")
    }

    fn wrap(inner: git2::Repository) -> Result<Self> {
        Ok(Self {
            inner,
            parser: MessageParser::new()?,
        })
    }

    /// Get the path to the .git directory.
    #[must_use]
    pub fn git_dir(&self) -> &Path {
        self.inner.path()
    }

    /// Resolve a ref name or revision to a commit id.
    ///
    /// # Errors
    /// Returns `RefNotFound` if the revision does not name a commit.
    pub fn resolve(&self, revision: &str) -> Result<Oid> {
        let object = self
            .inner
            .revparse_single(revision)
            .map_err(|_| Error::RefNotFound(revision.into()))?;
        let commit = object
            .peel_to_commit()
            .map_err(|_| Error::RefNotFound(revision.into()))?;
        Ok(commit.id())
    }

    /// Commits reachable from `end` but not from `start`, children first.
    ///
    /// # Errors
    /// Returns error if either revision fails to resolve or the walk fails.
    pub fn walk(&self, end: &str, start: Option<&str>) -> Result<Vec<Oid>> {
        let mut revwalk = self.inner.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(self.resolve(end)?)?;
        if let Some(start) = start {
            revwalk.hide(self.resolve(start)?)?;
        }

        let oids = revwalk.collect::<std::result::Result<Vec<_>, _>>()?;
        tracing::debug!(end, ?start, commits = oids.len(), "walked history");
        Ok(oids)
    }

    /// Shas and parents only.
    ///
    /// # Errors
    /// Returns error if the walk fails.
    pub fn parent_records(&self, end: &str, start: Option<&str>) -> Result<Vec<Commit>> {
        self.walk(end, start)?
            .into_iter()
            .map(|oid| {
                let commit = self.inner.find_commit(oid)?;
                Ok(Commit::new(
                    oid.to_string(),
                    commit.parent_ids().map(|p| p.to_string()),
                ))
            })
            .collect()
    }

    /// Full records with message, author, date and change counts.
    ///
    /// # Errors
    /// Returns error if the walk or a diff fails.
    pub fn change_records(&self, end: &str, start: Option<&str>) -> Result<Vec<Commit>> {
        self.walk(end, start)?
            .into_iter()
            .map(|oid| self.change_record(oid))
            .collect()
    }

    /// Build the full record for one commit.
    ///
    /// # Errors
    /// Returns error if the commit is missing or its diff fails.
    pub fn change_record(&self, oid: Oid) -> Result<Commit> {
        let commit = self.inner.find_commit(oid)?;
        let message = self.parser.parse(&String::from_utf8_lossy(commit.message_bytes()));
        let author = commit.author();

        let parents = commit.parent_ids().map(|p| p.to_string());
        let mut record = Commit::new(oid.to_string(), parents);
        record.subject = message.subject;
        record.body = message.body;
        record.cherry_pick_sha = message.cherry_pick_sha;
        record.author_name = author.name().map(String::from);
        record.author_mail = author.email().map(String::from);
        record.commit_date = DateTime::<Utc>::from_timestamp(commit.time().seconds(), 0);
        record.numstat = self.numstat(&commit)?;
        Ok(record)
    }

    /// Per-file line counts against the first parent.
    ///
    /// Merge commits report no changes, matching `git log --numstat`.
    fn numstat(&self, commit: &git2::Commit<'_>) -> Result<Vec<FileChange>> {
        if commit.parent_count() > 1 {
            return Ok(Vec::new());
        }

        let new_tree = commit.tree()?;
        let old_tree = match commit.parents().next() {
            Some(parent) => Some(parent.tree()?),
            None => None,
        };
        let diff = self
            .inner
            .diff_tree_to_tree(old_tree.as_ref(), Some(&new_tree), None)?;

        let mut changes = Vec::new();
        for idx in 0..diff.deltas().len() {
            let Some(patch) = Patch::from_diff(&diff, idx)? else {
                continue;
            };
            let delta = patch.delta();
            let Some(path) = delta.new_file().path().or_else(|| delta.old_file().path()) else {
                continue;
            };
            let (_, additions, deletions) = patch.line_stats()?;
            changes.push(FileChange::new(
                path.to_string_lossy(),
                additions as u64,
                deletions as u64,
            ));
        }
        Ok(changes)
    }

    // === Low-level access ===

    /// Get a reference to the underlying git2 repository.
    ///
    /// Use sparingly - prefer high-level methods.
    #[must_use]
    pub fn inner(&self) -> &git2::Repository {
        &self.inner
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.git_dir())
            .finish()
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::test_repo::TestRepo;
    use super::*;

    #[test]
    fn test_open_outside_repository() {
        let temp = tempfile::TempDir::new().unwrap();
        let err = Repository::open(temp.path()).unwrap_err();
        assert!(matches!(err, Error::NotARepository));
    }

    #[test]
    fn test_resolve_unknown_ref() {
        let test = TestRepo::new();
        let err = test.repo.resolve("no-such-branch").unwrap_err();
        assert!(matches!(err, Error::RefNotFound(name) if name == "no-such-branch"));
    }

    #[test]
    fn test_walk_is_children_first() {
        let mut test = TestRepo::new();
        let root = test.commit(&[("a.txt", "one\n")], "Initial commit", &[]);
        let main = test.commit(&[("a.txt", "two\n")], "Main work", &[root]);
        let side = test.commit(&[("b.txt", "side\n")], "Side work", &[root]);
        let merge = test.commit(
            &[("a.txt", "two\n"), ("b.txt", "side\n")],
            "Merge side",
            &[main, side],
        );
        test.branch("main", merge);

        let oids = test.repo.walk("main", None).unwrap();
        assert_eq!(oids.len(), 4);
        assert_eq!(oids[0], merge);
        assert_eq!(oids[3], root);
    }

    #[test]
    fn test_walk_hides_start() {
        let mut test = TestRepo::new();
        let root = test.commit(&[("a.txt", "one\n")], "Initial commit", &[]);
        let next = test.commit(&[("a.txt", "two\n")], "Second", &[root]);
        test.branch("main", next);
        test.branch("base", root);

        let oids = test.repo.walk("main", Some("base")).unwrap();
        assert_eq!(oids, vec![next]);
    }

    #[test]
    fn test_change_record_metadata() {
        let mut test = TestRepo::new();
        let root = test.commit(&[("a.txt", "one\n")], "Initial commit", &[]);
        let next = test.commit(
            &[("a.txt", "one\ntwo\nthree\n"), ("b.txt", "x\n")],
            "Grow files\n\nAdds lines.\n\n(cherry picked from commit 0123abcd)\n",
            &[root],
        );

        let record = test.repo.change_record(next).unwrap();
        assert_eq!(record.sha, next.to_string());
        assert_eq!(record.parent_shas, vec![root.to_string()]);
        assert_eq!(record.subject.as_deref(), Some("Grow files"));
        assert_eq!(record.cherry_pick_sha.as_deref(), Some("0123abcd"));
        assert_eq!(record.author_name.as_deref(), Some("Test User"));
        assert_eq!(record.author_mail.as_deref(), Some("test@example.com"));
        assert!(record.commit_date.is_some());
        assert_eq!(
            record.numstat,
            vec![FileChange::new("a.txt", 2, 0), FileChange::new("b.txt", 1, 0)]
        );
    }

    #[test]
    fn test_root_commit_diffs_against_empty_tree() {
        let mut test = TestRepo::new();
        let root = test.commit(&[("a.txt", "one\ntwo\n")], "Initial commit", &[]);
        let record = test.repo.change_record(root).unwrap();
        assert_eq!(record.numstat, vec![FileChange::new("a.txt", 2, 0)]);
    }

    #[test]
    fn test_merge_commit_has_no_numstat() {
        let mut test = TestRepo::new();
        let root = test.commit(&[("a.txt", "one\n")], "Initial commit", &[]);
        let side = test.commit(&[("a.txt", "one\n"), ("b.txt", "b\n")], "Side", &[root]);
        let merge = test.commit(&[("a.txt", "one\n"), ("b.txt", "b\n")], "Merge", &[root, side]);
        let record = test.repo.change_record(merge).unwrap();
        assert!(record.numstat.is_empty());
        assert_eq!(record.parent_shas.len(), 2);
    }
}
