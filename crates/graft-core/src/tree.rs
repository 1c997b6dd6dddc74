//! Branch topology as a tree of shared first-parent segments.
//!
//! Every inserted ref contributes its first-parent line. Lines that share
//! a root share segments; a segment is split where two refs diverge.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::error::{Error, Result};
use crate::hierarchy::HierarchyHistory;

#[derive(Debug, Clone, PartialEq, Eq)]
struct SegmentData {
    /// Tip first, root-most last.
    shas: Vec<String>,
    branch_name: Option<String>,
    /// Keyed by the child's root-most sha.
    children: BTreeMap<String, usize>,
    parent: Option<usize>,
}

/// Tree of first-parent segments shared between refs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchTree {
    segments: Vec<SegmentData>,
    root: Option<usize>,
    index: HashMap<String, usize>,
    tips: BTreeMap<String, String>,
}

/// Where two refs part ways.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Divergence {
    /// Commits only on the head ref's line, tip first.
    pub head_only: Vec<String>,
    /// Commits only on the base ref's line, tip first.
    pub base_only: Vec<String>,
    /// Newest commit shared by both lines.
    pub fork_point: Option<String>,
}

/// Flat, serializable form of one segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentSnapshot {
    /// Position in the pre-order listing.
    pub id: usize,
    /// Parent position, `None` for the root.
    pub parent: Option<usize>,
    /// Ref whose tip ends this segment, if any.
    pub branch_name: Option<String>,
    /// Shas, tip first.
    pub shas: Vec<String>,
}

impl BranchTree {
    /// Create an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert the spine of `history` under `ref_name`.
    ///
    /// # Errors
    /// See [`BranchTree::insert_shas`].
    pub fn insert(&mut self, history: &HierarchyHistory, ref_name: &str) -> Result<()> {
        let shas: Vec<String> = history
            .spine_shas()
            .into_iter()
            .map(str::to_owned)
            .collect();
        self.insert_shas(&shas, ref_name)
    }

    /// Insert a first-parent line, given tip first.
    ///
    /// Inserting a line already covered by the tree only records the ref.
    /// A longer line for the same ref extends its segment in place.
    ///
    /// # Errors
    /// Returns [`Error::EmptyHistory`] for an empty line and
    /// [`Error::DisjointHistory`] when the line does not share the tree's
    /// root commit.
    pub fn insert_shas(&mut self, shas: &[String], ref_name: &str) -> Result<()> {
        let Some(tip) = shas.first() else {
            return Err(Error::EmptyHistory(ref_name.to_owned()));
        };
        let path: Vec<&str> = shas.iter().rev().map(String::as_str).collect();

        let Some(mut current) = self.root else {
            let id = self.push_segment(&path, Some(ref_name), None);
            self.root = Some(id);
            self.tips.insert(ref_name.to_owned(), tip.clone());
            return Ok(());
        };

        let mut pos = 0;
        let terminal = loop {
            let segment = &self.segments[current];
            let matched = segment
                .shas
                .iter()
                .rev()
                .zip(&path[pos..])
                .take_while(|(have, want)| have.as_str() == **want)
                .count();

            if matched == 0 {
                return Err(Error::DisjointHistory(ref_name.to_owned()));
            }

            if matched < segment.shas.len() {
                if pos + matched == path.len() {
                    break None;
                }
                self.split(current, matched);
                break self.add_child(current, &path[pos + matched..], ref_name);
            }

            pos += matched;
            let Some(&next) = path.get(pos) else {
                let segment = &mut self.segments[current];
                if segment.branch_name.is_none() && segment.children.is_empty() {
                    segment.branch_name = Some(ref_name.to_owned());
                }
                break None;
            };

            if let Some(&child) = segment.children.get(next) {
                current = child;
                continue;
            }

            let owned_elsewhere = segment
                .branch_name
                .as_deref()
                .is_some_and(|name| name != ref_name);
            if segment.children.is_empty() && !owned_elsewhere {
                self.extend(current, &path[pos..], ref_name);
                break Some(current);
            }
            break self.add_child(current, &path[pos..], ref_name);
        };

        if let Some(terminal) = terminal {
            self.release_name(ref_name, terminal);
        }
        if terminal.is_some() || !self.tips.contains_key(ref_name) {
            self.tips.insert(ref_name.to_owned(), tip.clone());
        }
        Ok(())
    }

    /// The root segment.
    #[must_use]
    pub fn root(&self) -> Option<Segment<'_>> {
        self.root.map(|id| self.segment(id))
    }

    /// Names of all recorded refs.
    pub fn refs(&self) -> impl Iterator<Item = &str> {
        self.tips.keys().map(String::as_str)
    }

    /// Recorded tip of `ref_name`.
    #[must_use]
    pub fn tip_of(&self, ref_name: &str) -> Option<&str> {
        self.tips.get(ref_name).map(String::as_str)
    }

    /// The segment holding `sha`.
    #[must_use]
    pub fn segment_of(&self, sha: &str) -> Option<Segment<'_>> {
        self.index.get(sha).map(|&id| self.segment(id))
    }

    /// First-parent line of `ref_name`, tip first, down to the root.
    ///
    /// # Errors
    /// Returns [`Error::UnknownRef`] if the ref was never inserted.
    pub fn history_of(&self, ref_name: &str) -> Result<Vec<&str>> {
        let tip = self
            .tips
            .get(ref_name)
            .ok_or_else(|| Error::UnknownRef(ref_name.to_owned()))?;
        let Some(&start) = self.index.get(tip) else {
            return Err(Error::UnknownRef(ref_name.to_owned()));
        };

        let shas = &self.segments[start].shas;
        let offset = shas.iter().position(|s| s == tip).unwrap_or(0);
        let mut line: Vec<&str> = shas[offset..].iter().map(String::as_str).collect();

        let mut cursor = self.segments[start].parent;
        while let Some(id) = cursor {
            line.extend(self.segments[id].shas.iter().map(String::as_str));
            cursor = self.segments[id].parent;
        }
        Ok(line)
    }

    /// Compare the lines of `head` and `base`.
    ///
    /// # Errors
    /// Returns [`Error::UnknownRef`] if either ref is unknown.
    pub fn divergence(&self, head: &str, base: &str) -> Result<Divergence> {
        let head_line = self.history_of(head)?;
        let base_line = self.history_of(base)?;

        let head_set: std::collections::HashSet<&str> = head_line.iter().copied().collect();
        let base_set: std::collections::HashSet<&str> = base_line.iter().copied().collect();

        let head_only: Vec<String> = head_line
            .iter()
            .take_while(|sha| !base_set.contains(*sha))
            .map(|s| (*s).to_owned())
            .collect();
        let base_only = base_line
            .iter()
            .take_while(|sha| !head_set.contains(*sha))
            .map(|s| (*s).to_owned())
            .collect();
        let fork_point = head_line.get(head_only.len()).map(|s| (*s).to_owned());

        Ok(Divergence {
            head_only,
            base_only,
            fork_point,
        })
    }

    /// Segments in pre-order, children ordered by key.
    #[must_use]
    pub fn iter_segments(&self) -> Vec<Segment<'_>> {
        let mut out = Vec::with_capacity(self.segments.len());
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(id) = stack.pop() {
            out.push(self.segment(id));
            stack.extend(self.segments[id].children.values().rev());
        }
        out
    }

    /// Flat listing suitable for JSON output.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SegmentSnapshot> {
        let order = self.iter_segments();
        let position: HashMap<usize, usize> =
            order.iter().enumerate().map(|(pos, s)| (s.id, pos)).collect();

        order
            .iter()
            .enumerate()
            .map(|(pos, segment)| SegmentSnapshot {
                id: pos,
                parent: segment.parent().and_then(|p| position.get(&p.id).copied()),
                branch_name: segment.branch_name().map(str::to_owned),
                shas: segment.shas().to_vec(),
            })
            .collect()
    }

    const fn segment(&self, id: usize) -> Segment<'_> {
        Segment { tree: self, id }
    }

    fn push_segment(
        &mut self,
        root_first: &[&str],
        name: Option<&str>,
        parent: Option<usize>,
    ) -> usize {
        let id = self.segments.len();
        for sha in root_first {
            self.index.insert((*sha).to_owned(), id);
        }
        self.segments.push(SegmentData {
            shas: root_first.iter().rev().map(|s| (*s).to_owned()).collect(),
            branch_name: name.map(str::to_owned),
            children: BTreeMap::new(),
            parent,
        });
        id
    }

    fn add_child(&mut self, parent: usize, root_first: &[&str], name: &str) -> Option<usize> {
        let key = root_first.first()?;
        let id = self.push_segment(root_first, Some(name), Some(parent));
        self.segments[parent].children.insert((*key).to_owned(), id);
        Some(id)
    }

    /// Drop `name` from every segment but `keep`.
    fn release_name(&mut self, name: &str, keep: usize) {
        for (id, segment) in self.segments.iter_mut().enumerate() {
            if id != keep && segment.branch_name.as_deref() == Some(name) {
                segment.branch_name = None;
            }
        }
    }

    fn extend(&mut self, id: usize, root_first: &[&str], name: &str) {
        for sha in root_first {
            self.index.insert((*sha).to_owned(), id);
        }
        let segment = &mut self.segments[id];
        let mut shas: Vec<String> = root_first.iter().rev().map(|s| (*s).to_owned()).collect();
        shas.append(&mut segment.shas);
        segment.shas = shas;
        segment.branch_name = Some(name.to_owned());
    }

    /// Keep the `keep` root-most shas in `id`; move the rest, with the
    /// segment's name and children, into a new child.
    fn split(&mut self, id: usize, keep: usize) {
        let new_id = self.segments.len();
        let segment = &mut self.segments[id];
        let cut = segment.shas.len() - keep;
        let moved: Vec<String> = segment.shas.drain(..cut).collect();
        let children = std::mem::take(&mut segment.children);
        let branch_name = segment.branch_name.take();

        let Some(key) = moved.last().cloned() else {
            return;
        };
        for child in children.values() {
            self.segments[*child].parent = Some(new_id);
        }
        for sha in &moved {
            self.index.insert(sha.clone(), new_id);
        }
        self.segments.push(SegmentData {
            shas: moved,
            branch_name,
            children,
            parent: Some(id),
        });
        self.segments[id].children.insert(key, new_id);
    }
}

/// Borrowed view of one segment.
#[derive(Debug, Clone, Copy)]
pub struct Segment<'a> {
    tree: &'a BranchTree,
    id: usize,
}

impl<'a> Segment<'a> {
    fn data(self) -> &'a SegmentData {
        &self.tree.segments[self.id]
    }

    /// Shas, tip first.
    #[must_use]
    pub fn shas(self) -> &'a [String] {
        &self.data().shas
    }

    /// Newest sha of the segment.
    #[must_use]
    pub fn tip(self) -> Option<&'a str> {
        self.data().shas.first().map(String::as_str)
    }

    /// Root-most sha; also the key under which the parent stores it.
    #[must_use]
    pub fn end_sha(self) -> Option<&'a str> {
        self.data().shas.last().map(String::as_str)
    }

    /// Number of commits in the segment.
    #[must_use]
    pub fn len(self) -> usize {
        self.data().shas.len()
    }

    /// Whether the segment holds no commits.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.data().shas.is_empty()
    }

    /// Ref whose tip ends this segment.
    #[must_use]
    pub fn branch_name(self) -> Option<&'a str> {
        self.data().branch_name.as_deref()
    }

    /// Child stored under `key`.
    #[must_use]
    pub fn child(self, key: &str) -> Option<Self> {
        let id = *self.data().children.get(key)?;
        Some(self.tree.segment(id))
    }

    /// Children with their keys, ordered by key.
    pub fn children(self) -> impl Iterator<Item = (&'a str, Segment<'a>)> {
        let tree = self.tree;
        self.data()
            .children
            .iter()
            .map(move |(key, &id)| (key.as_str(), tree.segment(id)))
    }

    /// Parent segment.
    #[must_use]
    pub fn parent(self) -> Option<Self> {
        self.data().parent.map(|id| self.tree.segment(id))
    }

    /// Distance from the root segment.
    #[must_use]
    pub fn depth(self) -> usize {
        std::iter::successors(self.parent(), |s| s.parent()).count()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commit::Commit;
    use crate::hierarchy::decompose;
    use crate::test_support::{arb_history, history};
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn line(shas: &[&str]) -> Vec<String> {
        shas.iter().map(|s| (*s).to_owned()).collect()
    }

    fn tree_with(lines: &[(&[&str], &str)]) -> BranchTree {
        let mut tree = BranchTree::new();
        for (shas, name) in lines {
            tree.insert_shas(&line(shas), name).unwrap();
        }
        tree
    }

    #[test]
    fn test_single_branch() {
        let tree = tree_with(&[(&["d", "c", "b", "a"], "main")]);
        let root = tree.root().unwrap();
        assert_eq!(root.shas(), line(&["d", "c", "b", "a"]).as_slice());
        assert_eq!(root.branch_name(), Some("main"));
        assert_eq!(root.children().count(), 0);
    }

    #[test]
    fn test_split_at_branch_point() {
        let tree = tree_with(&[
            (&["d", "c", "b", "a"], "main"),
            (&["f", "e", "b", "a"], "branch"),
        ]);
        let root = tree.root().unwrap();
        assert_eq!(root.shas(), line(&["b", "a"]).as_slice());
        assert_eq!(root.branch_name(), None);

        let main = root.child("c").unwrap();
        assert_eq!(main.shas(), line(&["d", "c"]).as_slice());
        assert_eq!(main.branch_name(), Some("main"));

        let branch = root.child("e").unwrap();
        assert_eq!(branch.shas(), line(&["f", "e"]).as_slice());
        assert_eq!(branch.branch_name(), Some("branch"));
        assert_eq!(branch.parent().unwrap().shas(), root.shas());
    }

    #[test]
    fn test_branch_off_a_branch() {
        let tree = tree_with(&[
            (&["d", "c", "b", "a"], "main"),
            (&["f", "e", "b", "a"], "branch"),
            (&["4", "e", "b", "a"], "hotfix"),
        ]);
        let e = tree.root().unwrap().child("e").unwrap();
        assert_eq!(e.shas(), line(&["e"]).as_slice());
        assert_eq!(e.branch_name(), None);
        assert_eq!(e.child("f").unwrap().shas(), line(&["f"]).as_slice());
        assert_eq!(e.child("f").unwrap().branch_name(), Some("branch"));
        assert_eq!(e.child("4").unwrap().shas(), line(&["4"]).as_slice());
        assert_eq!(e.child("4").unwrap().branch_name(), Some("hotfix"));
        assert_eq!(e.child("4").unwrap().depth(), 2);
    }

    #[test]
    fn test_new_branch_at_existing_branch_point() {
        let tree = tree_with(&[
            (&["d", "c", "b", "a"], "main"),
            (&["f", "e", "b", "a"], "branch"),
            (&["4", "3", "b", "a"], "third"),
        ]);
        let keys: Vec<&str> = tree.root().unwrap().children().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["3", "c", "e"]);
    }

    #[test]
    fn test_extend_terminal_segment() {
        let mut tree = tree_with(&[
            (&["d", "c", "b", "a"], "main"),
            (&["f", "e", "b", "a"], "branch"),
        ]);
        tree.insert_shas(&line(&["3", "4", "f", "e", "b", "a"]), "branch").unwrap();
        let branch = tree.root().unwrap().child("e").unwrap();
        assert_eq!(branch.shas(), line(&["3", "4", "f", "e"]).as_slice());
        assert_eq!(tree.tip_of("branch"), Some("3"));
        assert_eq!(tree.segment_of("4").unwrap().tip(), Some("3"));
    }

    #[test]
    fn test_insert_shorter_longer_and_same() {
        let mut shorter_first = tree_with(&[(&["b", "a"], "main")]);
        shorter_first.insert_shas(&line(&["d", "c", "b", "a"]), "main").unwrap();

        let mut longer_first = tree_with(&[(&["d", "c", "b", "a"], "main")]);
        longer_first.insert_shas(&line(&["b", "a"]), "main").unwrap();

        let mut same = tree_with(&[(&["d", "c", "b", "a"], "main")]);
        same.insert_shas(&line(&["d", "c", "b", "a"]), "main").unwrap();

        for tree in [&shorter_first, &longer_first, &same] {
            let root = tree.root().unwrap();
            assert_eq!(root.shas(), line(&["d", "c", "b", "a"]).as_slice());
            assert_eq!(root.children().count(), 0);
            assert_eq!(tree.tip_of("main"), Some("d"));
        }
    }

    #[test]
    fn test_other_ref_at_tip_gets_own_child() {
        let mut tree = tree_with(&[(&["b", "a"], "release")]);
        tree.insert_shas(&line(&["c", "b", "a"]), "feature").unwrap();
        let root = tree.root().unwrap();
        assert_eq!(root.branch_name(), Some("release"));
        assert_eq!(root.child("c").unwrap().branch_name(), Some("feature"));
        assert_eq!(tree.history_of("release").unwrap(), vec!["b", "a"]);
        assert_eq!(tree.history_of("feature").unwrap(), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_grown_ref_moves_to_new_child() {
        let mut tree = tree_with(&[(&["b", "a"], "release"), (&["c", "b", "a"], "feature")]);
        tree.insert_shas(&line(&["d", "b", "a"]), "release").unwrap();

        let root = tree.root().unwrap();
        assert_eq!(root.branch_name(), None);
        assert_eq!(root.child("d").unwrap().branch_name(), Some("release"));
        assert_eq!(root.child("c").unwrap().branch_name(), Some("feature"));
        let owners = tree
            .iter_segments()
            .into_iter()
            .filter(|s| s.branch_name() == Some("release"))
            .count();
        assert_eq!(owners, 1);
        assert_eq!(tree.history_of("release").unwrap(), vec!["d", "b", "a"]);
    }

    #[test]
    fn test_subset_ref_resolves_mid_segment() {
        let mut tree = tree_with(&[(&["d", "c", "b", "a"], "main")]);
        tree.insert_shas(&line(&["b", "a"]), "old").unwrap();
        assert_eq!(tree.history_of("old").unwrap(), vec!["b", "a"]);
        assert_eq!(tree.iter_segments().len(), 1);
    }

    #[test]
    fn test_errors() {
        let mut tree = tree_with(&[(&["b", "a"], "main")]);
        assert!(matches!(tree.insert_shas(&[], "empty"), Err(Error::EmptyHistory(_))));
        assert!(matches!(
            tree.insert_shas(&line(&["y", "x"]), "other"),
            Err(Error::DisjointHistory(name)) if name == "other"
        ));
        assert!(matches!(tree.history_of("nope"), Err(Error::UnknownRef(_))));
    }

    #[test]
    fn test_divergence() {
        let tree = tree_with(&[(&["d", "c", "b", "a"], "main"), (&["f", "e", "b", "a"], "branch")]);
        let div = tree.divergence("branch", "main").unwrap();
        assert_eq!(div.head_only, vec!["f", "e"]);
        assert_eq!(div.base_only, vec!["d", "c"]);
        assert_eq!(div.fork_point.as_deref(), Some("b"));
    }

    #[test]
    fn test_snapshot_is_preorder() {
        let tree = tree_with(&[
            (&["d", "c", "b", "a"], "main"),
            (&["f", "e", "b", "a"], "branch"),
            (&["4", "e", "b", "a"], "hotfix"),
        ]);
        let snapshot = tree.snapshot();
        let order: Vec<(&str, Option<usize>)> = snapshot
            .iter()
            .map(|s| (s.shas[0].as_str(), s.parent))
            .collect();
        assert_eq!(
            order,
            vec![("b", None), ("d", Some(0)), ("e", Some(0)), ("4", Some(2)), ("f", Some(2))]
        );
    }

    #[test]
    fn test_insert_from_hierarchy() {
        let mut tree = BranchTree::new();
        let main = decompose(&history(&["d[c]", "c[b x]", "x[b]", "b[a]", "a[]"])).unwrap();
        tree.insert(&main, "main").unwrap();
        assert_eq!(tree.history_of("main").unwrap(), vec!["d", "c", "b", "a"]);
        assert!(tree.segment_of("x").is_none());
        assert_eq!(tree.refs().collect::<Vec<_>>(), vec!["main"]);
    }

    proptest! {
        #[test]
        fn prop_segments_partition_inserted_shas(
            linear in arb_history(),
            picks in prop::collection::vec(any::<prop::sample::Index>(), 1..6),
        ) {
            let by_sha: HashMap<&str, &Commit> =
                linear.iter().map(|c| (c.sha.as_str(), c)).collect();
            let mut tree = BranchTree::new();
            let mut expected = Vec::new();

            for (i, pick) in picks.iter().enumerate() {
                let mut cursor = &linear.commits()[pick.index(linear.len())];
                let mut chain = vec![cursor.sha.clone()];
                while let Some(parent) = cursor.first_parent() {
                    cursor = by_sha[parent];
                    chain.push(cursor.sha.clone());
                }
                let name = format!("r{i}");
                tree.insert_shas(&chain, &name).unwrap();
                expected.push((name, chain));
            }

            let mut seen = HashSet::new();
            for segment in tree.iter_segments() {
                for sha in segment.shas() {
                    prop_assert!(seen.insert(sha.clone()));
                }
            }
            let inserted: HashSet<String> =
                expected.iter().flat_map(|(_, chain)| chain.iter().cloned()).collect();
            prop_assert_eq!(seen, inserted);

            for (name, chain) in &expected {
                let got: Vec<String> = tree
                    .history_of(name)
                    .unwrap()
                    .into_iter()
                    .map(str::to_owned)
                    .collect();
                prop_assert_eq!(&got, chain);
            }
        }
    }
}
