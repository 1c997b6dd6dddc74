//! Prunable forest of merge buckets built from a hierarchy.
//!
//! Each spine entry becomes a root bucket. A bucket owns its merge commit
//! and the plain commits of the lines it brings in; a commit that itself
//! brings in side lines starts a nested bucket. Pruning removes commits
//! and drops buckets that become empty.

use std::collections::HashMap;

use crate::commit::Commit;
use crate::error::{Error, Result};
use crate::hierarchy::{Entry, HierarchyHistory, Line};

#[derive(Debug, Clone, PartialEq, Eq)]
struct BucketNode {
    merge: String,
    branch: Vec<String>,
    children: Vec<usize>,
    parent: Option<usize>,
}

impl BucketNode {
    fn is_empty(&self) -> bool {
        self.branch.is_empty() && self.children.is_empty()
    }
}

/// Ordered forest of buckets with a sha index for pruning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketForest {
    buckets: Vec<Option<BucketNode>>,
    roots: Vec<usize>,
    owner: HashMap<String, usize>,
    commits: HashMap<String, Commit>,
}

impl BucketForest {
    /// Build the forest for a hierarchy.
    ///
    /// # Errors
    /// Returns [`Error::BrokenFirstParentLine`] if a nested bucket's
    /// continuation does not start at its merge commit's first parent.
    pub fn build(history: &HierarchyHistory) -> Result<Self> {
        let mut forest = Self::default();
        let mut pending: Vec<(usize, Entry<'_>, Option<Line<'_>>)> = Vec::new();

        for entry in history.spine().iter() {
            let id = forest.alloc(entry.commit(), None);
            forest.roots.push(id);
            pending.push((id, entry, None));

            while let Some((id, entry, first_parent_line)) = pending.pop() {
                if let Some(first) = first_parent_line.and_then(Line::first) {
                    let expected = entry.commit().first_parent().unwrap_or_default();
                    if expected != first.sha() {
                        return Err(Error::BrokenFirstParentLine {
                            merge: entry.sha().to_owned(),
                            expected: expected.to_owned(),
                            found: first.sha().to_owned(),
                        });
                    }
                }

                for line in first_parent_line.into_iter().chain(entry.side_lines()) {
                    for (offset, item) in line.iter().enumerate() {
                        if item.has_side_lines() {
                            let child = forest.alloc(item.commit(), Some(id));
                            if let Some(node) = forest.node_mut(id) {
                                node.children.push(child);
                            }
                            pending.push((child, item, Some(line.tail(offset + 1))));
                            break;
                        }
                        forest.add_branch_commit(id, item.commit());
                    }
                }
            }
        }

        Ok(forest)
    }

    /// Remove `sha` from the forest.
    ///
    /// Removing a merge commit drops its bucket and everything nested in
    /// it. Removing a branch commit drops just that commit. Any bucket left
    /// with no commits and no children is dropped, up the ancestor chain.
    /// Returns `false` if the sha was not present.
    pub fn prune(&mut self, sha: &str) -> bool {
        let Some(&id) = self.owner.get(sha) else {
            return false;
        };
        let Some(node) = self.buckets[id].as_mut() else {
            return false;
        };

        if node.merge == sha {
            self.remove_bucket(id);
        } else {
            node.branch.retain(|s| s != sha);
            let empty = node.is_empty();
            self.owner.remove(sha);
            self.commits.remove(sha);
            if empty {
                self.remove_bucket(id);
            }
        }
        true
    }

    /// Buckets in depth-first pre-order.
    #[must_use]
    pub fn linearize(&self) -> Vec<Bucket<'_>> {
        let mut out = Vec::new();
        let mut stack: Vec<usize> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let Some(node) = self.buckets[id].as_ref() else {
                continue;
            };
            out.push(Bucket { forest: self, id });
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Every remaining commit in linearized order: each bucket's merge
    /// commit, then its branch commits.
    #[must_use]
    pub fn commits_in_order(&self) -> Vec<&Commit> {
        self.linearize()
            .into_iter()
            .flat_map(|bucket| {
                std::iter::once(bucket.merge_commit()).chain(bucket.branch_commits())
            })
            .flatten()
            .collect()
    }

    /// Top-level buckets, oldest last.
    pub fn roots(&self) -> impl Iterator<Item = Bucket<'_>> {
        self.roots.iter().map(move |&id| Bucket { forest: self, id })
    }

    /// Look up a remaining commit.
    #[must_use]
    pub fn get(&self, sha: &str) -> Option<&Commit> {
        self.commits.get(sha)
    }

    /// Whether `sha` is still in the forest.
    #[must_use]
    pub fn contains(&self, sha: &str) -> bool {
        self.owner.contains_key(sha)
    }

    /// The bucket holding `sha`.
    #[must_use]
    pub fn bucket_of(&self, sha: &str) -> Option<Bucket<'_>> {
        self.owner.get(sha).map(|&id| Bucket { forest: self, id })
    }

    /// Number of remaining commits.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.owner.len()
    }

    /// Number of remaining buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.iter().flatten().count()
    }

    /// Whether every bucket has been pruned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    fn alloc(&mut self, commit: &Commit, parent: Option<usize>) -> usize {
        let id = self.buckets.len();
        self.buckets.push(Some(BucketNode {
            merge: commit.sha.clone(),
            branch: Vec::new(),
            children: Vec::new(),
            parent,
        }));
        self.owner.insert(commit.sha.clone(), id);
        self.commits.insert(commit.sha.clone(), commit.clone());
        id
    }

    fn add_branch_commit(&mut self, id: usize, commit: &Commit) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        node.branch.push(commit.sha.clone());
        self.owner.insert(commit.sha.clone(), id);
        self.commits.insert(commit.sha.clone(), commit.clone());
    }

    fn node(&self, id: usize) -> Option<&BucketNode> {
        self.buckets.get(id).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: usize) -> Option<&mut BucketNode> {
        self.buckets.get_mut(id).and_then(Option::as_mut)
    }

    fn remove_bucket(&mut self, id: usize) {
        let mut target = Some(id);
        while let Some(id) = target.take() {
            let parent = self.detach(id);
            if let Some(parent) = parent {
                if self.node(parent).is_some_and(BucketNode::is_empty) {
                    target = Some(parent);
                }
            }
        }
    }

    /// Unlink `id` from its parent and drop its whole subtree.
    fn detach(&mut self, id: usize) -> Option<usize> {
        let parent = self.node(id)?.parent;
        match parent.and_then(|p| self.buckets[p].as_mut()) {
            Some(node) => node.children.retain(|&c| c != id),
            None => self.roots.retain(|&r| r != id),
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.buckets[current].take() else {
                continue;
            };
            for sha in std::iter::once(&node.merge).chain(&node.branch) {
                self.owner.remove(sha);
                self.commits.remove(sha);
            }
            stack.extend(node.children);
        }
        parent
    }
}

/// Borrowed view of one bucket.
#[derive(Debug, Clone, Copy)]
pub struct Bucket<'a> {
    forest: &'a BucketForest,
    id: usize,
}

impl<'a> Bucket<'a> {
    fn node(self) -> Option<&'a BucketNode> {
        self.forest.node(self.id)
    }

    /// Sha of the commit that starts the bucket.
    #[must_use]
    pub fn merge_sha(self) -> &'a str {
        self.node().map_or("", |n| n.merge.as_str())
    }

    /// The commit that starts the bucket.
    #[must_use]
    pub fn merge_commit(self) -> Option<&'a Commit> {
        self.forest.commits.get(self.merge_sha())
    }

    /// Shas of the plain commits brought in by this bucket.
    #[must_use]
    pub fn branch_shas(self) -> Vec<&'a str> {
        self.node()
            .map(|n| n.branch.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Plain commits brought in by this bucket.
    pub fn branch_commits(self) -> impl Iterator<Item = Option<&'a Commit>> {
        let forest = self.forest;
        self.node()
            .into_iter()
            .flat_map(|n| n.branch.iter())
            .map(move |sha| forest.commits.get(sha))
    }

    /// Nested buckets, in line order.
    pub fn children(self) -> impl Iterator<Item = Bucket<'a>> {
        let forest = self.forest;
        self.node()
            .into_iter()
            .flat_map(|n| n.children.iter())
            .map(move |&id| Bucket { forest, id })
    }

    /// Merge shas of the nested buckets.
    #[must_use]
    pub fn children_shas(self) -> Vec<&'a str> {
        self.children().map(Bucket::merge_sha).collect()
    }

    /// Enclosing bucket.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        let forest = self.forest;
        self.node()?.parent.map(|id| Bucket { forest, id })
    }

    /// Nesting depth; 0 for a root bucket.
    #[must_use]
    pub fn depth(self) -> usize {
        std::iter::successors(self.parent(), |b| b.parent()).count()
    }

    /// Whether the bucket has no branch commits and no children.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.node().is_none_or(BucketNode::is_empty)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::hierarchy::{Boundary, decompose, decompose_with};
    use crate::test_support::{arb_history, history};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn nested_forest() -> BucketForest {
        let linear = history(&[
            "a[b f]", "f[2 4]", "2[3]", "4[5]", "5[3]", "3[1]", "b[d c]", "c[d]", "d[e]", "e[1]",
            "1[]",
        ]);
        BucketForest::build(&decompose(&linear).unwrap()).unwrap()
    }

    fn shape(forest: &BucketForest) -> Vec<(String, Vec<&str>, Vec<&str>)> {
        forest
            .linearize()
            .into_iter()
            .map(|b| (b.merge_sha().to_owned(), b.branch_shas(), b.children_shas()))
            .collect()
    }

    #[test]
    fn test_build_nested() {
        let forest = nested_forest();
        let roots: Vec<&str> = forest.roots().map(Bucket::merge_sha).collect();
        assert_eq!(roots, vec!["a", "b", "d", "e", "1"]);

        assert_eq!(
            shape(&forest),
            vec![
                ("a".to_owned(), vec![], vec!["f"]),
                ("f".to_owned(), vec!["2", "3", "4", "5"], vec![]),
                ("b".to_owned(), vec!["c"], vec![]),
                ("d".to_owned(), vec![], vec![]),
                ("e".to_owned(), vec![], vec![]),
                ("1".to_owned(), vec![], vec![]),
            ]
        );
        assert_eq!(forest.commit_count(), 11);
    }

    #[test]
    fn test_prune_branch_commit() {
        let mut forest = nested_forest();
        assert!(forest.prune("c"));
        assert!(!forest.contains("c"));
        // b had nothing else to carry.
        assert!(!forest.contains("b"));
        assert!(forest.bucket_of("b").is_none());
        let roots: Vec<&str> = forest.roots().map(Bucket::merge_sha).collect();
        assert_eq!(roots, vec!["a", "d", "e", "1"]);
        assert_eq!(forest.commit_count(), 9);
    }

    #[test]
    fn test_prune_merge_removes_subtree() {
        let mut forest = nested_forest();
        assert!(forest.prune("f"));
        for sha in ["f", "2", "3", "4", "5"] {
            assert!(!forest.contains(sha));
        }
        // a lost its only child and goes with it.
        assert!(!forest.contains("a"));
        let roots: Vec<&str> = forest.roots().map(Bucket::merge_sha).collect();
        assert_eq!(roots, vec!["b", "d", "e", "1"]);
    }

    #[test]
    fn test_prune_last_branch_commit_cascades() {
        let mut forest = nested_forest();
        for sha in ["2", "3", "4"] {
            forest.prune(sha);
        }
        assert!(forest.contains("f"));
        forest.prune("5");
        assert!(!forest.contains("f"));
        assert!(!forest.contains("a"));
    }

    #[test]
    fn test_last_bucket_empties_forest() {
        let linear = history(&["a[z c]", "c[d]", "d[]"]);
        let hierarchy = decompose_with(&linear, Boundary::Truncated).unwrap();
        let mut forest = BucketForest::build(&hierarchy).unwrap();
        assert_eq!(forest.bucket_of("a").unwrap().branch_shas(), vec!["c", "d"]);

        forest.prune("c");
        assert_eq!(forest.bucket_of("a").unwrap().branch_shas(), vec!["d"]);
        forest.prune("d");
        assert!(forest.is_empty());
        assert_eq!(forest.commit_count(), 0);
        assert_eq!(forest.bucket_count(), 0);
    }

    #[test]
    fn test_prune_absent_is_noop() {
        let mut forest = nested_forest();
        let before = forest.clone();
        assert!(!forest.prune("zzz"));
        assert_eq!(forest, before);
    }

    #[test]
    fn test_prune_is_idempotent() {
        let mut once = nested_forest();
        once.prune("4");
        let mut twice = once.clone();
        assert!(!twice.prune("4"));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_commits_in_order() {
        let forest = nested_forest();
        let shas: Vec<&str> = forest.commits_in_order().iter().map(|c| c.sha.as_str()).collect();
        assert_eq!(shas, vec!["a", "f", "2", "3", "4", "5", "b", "c", "d", "e", "1"]);
    }

    #[test]
    fn test_depth() {
        let forest = nested_forest();
        assert_eq!(forest.bucket_of("f").unwrap().depth(), 1);
        assert_eq!(forest.bucket_of("a").unwrap().depth(), 0);
        assert_eq!(forest.bucket_of("3").unwrap().merge_sha(), "f");
    }

    proptest! {
        #[test]
        fn prop_forest_holds_every_commit(linear in arb_history()) {
            let forest = BucketForest::build(&decompose(&linear).unwrap()).unwrap();
            prop_assert_eq!(forest.commit_count(), linear.len());
            prop_assert_eq!(forest.commits_in_order().len(), linear.len());
        }

        #[test]
        fn prop_no_empty_bucket_survives_prune(
            linear in arb_history(),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 0..10),
        ) {
            let mut forest = BucketForest::build(&decompose(&linear).unwrap()).unwrap();
            // Pass-through roots start empty; every other bucket starts with content.
            let loaded_roots: HashSet<String> = forest
                .roots()
                .filter(|b| !b.is_empty())
                .map(|b| b.merge_sha().to_owned())
                .collect();
            let shas = linear.shas();
            for pick in picks {
                forest.prune(shas[pick.index(shas.len())]);
            }
            for bucket in forest.linearize() {
                if bucket.depth() > 0 || loaded_roots.contains(bucket.merge_sha()) {
                    prop_assert!(!bucket.is_empty());
                }
            }
            let listed = forest.commits_in_order().len();
            prop_assert_eq!(listed, forest.commit_count());
        }

        #[test]
        fn prop_prune_twice_equals_once(
            linear in arb_history(),
            pick in any::<prop::sample::Index>(),
        ) {
            let mut once = BucketForest::build(&decompose(&linear).unwrap()).unwrap();
            let shas = linear.shas();
            let sha = shas[pick.index(shas.len())];
            once.prune(sha);
            prop_assert!(!once.contains(sha));
            let mut twice = once.clone();
            prop_assert!(!twice.prune(sha));
            prop_assert_eq!(once, twice);
        }
    }
}
