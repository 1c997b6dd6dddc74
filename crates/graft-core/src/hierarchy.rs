//! Hierarchical decomposition of a linear history.
//!
//! The first-parent chain from the tip is the spine. Each non-first parent
//! of a commit opens a side line (its own first-parent chain) that is
//! nested under that commit, recursively. A side line stops where it
//! reaches a commit already placed elsewhere; that commit is recorded as
//! a branch-off of the line's last entry.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;

use crate::commit::{Commit, LinearHistory};
use crate::error::{Error, Result};

/// How to treat parents that are not part of the input history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Boundary {
    /// The history is complete: an absent parent is an error.
    #[default]
    Complete,
    /// The history is a range: absent parents mark the cutoff.
    Truncated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Node {
    commit: Commit,
    side_lines: Vec<Vec<usize>>,
    branch_offs: Vec<String>,
}

impl Node {
    const fn new(commit: Commit) -> Self {
        Self {
            commit,
            side_lines: Vec::new(),
            branch_offs: Vec::new(),
        }
    }
}

/// A commit history arranged as a spine with nested side lines.
///
/// Every commit of the source history appears in exactly one line.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HierarchyHistory {
    nodes: Vec<Node>,
    spine: Vec<usize>,
    index: HashMap<String, usize>,
}

impl HierarchyHistory {
    /// The first-parent chain from the tip.
    #[must_use]
    pub fn spine(&self) -> Line<'_> {
        Line {
            history: self,
            ids: &self.spine,
        }
    }

    /// Number of spine entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.spine.len()
    }

    /// Whether the hierarchy holds no commits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spine.is_empty()
    }

    /// Total number of commits across all lines.
    #[must_use]
    pub fn commit_count(&self) -> usize {
        self.nodes.len()
    }

    /// Look up the entry holding `sha`.
    #[must_use]
    pub fn entry(&self, sha: &str) -> Option<Entry<'_>> {
        self.index.get(sha).map(|&id| Entry { history: self, id })
    }

    /// Shas along the spine, tip first.
    #[must_use]
    pub fn spine_shas(&self) -> Vec<&str> {
        self.spine().shas()
    }

    /// Every entry in flattened order, paired with its nesting depth.
    ///
    /// The spine has depth 0; a side line sits one level below the entry
    /// that owns it.
    #[must_use]
    pub fn walk(&self) -> Vec<(Entry<'_>, usize)> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<(&[usize], usize)> = vec![(self.spine.as_slice(), 0)];

        while let Some((ids, depth)) = stack.pop() {
            let Some((&first, rest)) = ids.split_first() else {
                continue;
            };
            out.push((Entry { history: self, id: first }, depth));
            stack.push((rest, depth));
            for line in self.nodes[first].side_lines.iter().rev() {
                stack.push((line.as_slice(), depth + 1));
            }
        }

        out
    }

    /// Flat rows for rendering and JSON output.
    #[must_use]
    pub fn rows(&self) -> Vec<HierarchyRow> {
        self.walk()
            .into_iter()
            .map(|(entry, depth)| HierarchyRow {
                sha: entry.sha().to_owned(),
                subject: entry.commit().subject.clone(),
                depth,
                side_lines: entry.side_line_count(),
                branch_offs: entry.branch_offs().to_vec(),
            })
            .collect()
    }
}

/// One row of a flattened hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyRow {
    /// Commit sha.
    pub sha: String,
    /// Commit subject, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    /// Nesting depth; 0 for the spine.
    pub depth: usize,
    /// Number of side lines opened by this commit.
    pub side_lines: usize,
    /// Commits outside this line that the entry joins.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub branch_offs: Vec<String>,
}

/// A commit placed in a hierarchy.
#[derive(Debug, Clone, Copy)]
pub struct Entry<'a> {
    history: &'a HierarchyHistory,
    id: usize,
}

impl<'a> Entry<'a> {
    fn node(self) -> &'a Node {
        &self.history.nodes[self.id]
    }

    /// The underlying commit.
    #[must_use]
    pub fn commit(self) -> &'a Commit {
        &self.node().commit
    }

    /// The commit's sha.
    #[must_use]
    pub fn sha(self) -> &'a str {
        &self.node().commit.sha
    }

    /// Lines opened by this commit's non-first parents, in parent order.
    pub fn side_lines(self) -> impl Iterator<Item = Line<'a>> {
        let history = self.history;
        self.node()
            .side_lines
            .iter()
            .map(move |ids| Line { history, ids })
    }

    /// Number of side lines.
    #[must_use]
    pub fn side_line_count(self) -> usize {
        self.node().side_lines.len()
    }

    /// Whether the commit owns at least one side line.
    #[must_use]
    pub fn has_side_lines(self) -> bool {
        !self.node().side_lines.is_empty()
    }

    /// Parents of this commit that were already placed in another line.
    #[must_use]
    pub fn branch_offs(self) -> &'a [String] {
        &self.node().branch_offs
    }
}

impl PartialEq for Entry<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.history, other.history) && self.id == other.id
    }
}

impl Eq for Entry<'_> {}

/// An ordered run of entries, each the first parent of the previous one.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    history: &'a HierarchyHistory,
    ids: &'a [usize],
}

impl<'a> Line<'a> {
    /// Number of entries.
    #[must_use]
    pub const fn len(self) -> usize {
        self.ids.len()
    }

    /// Whether the line is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.ids.is_empty()
    }

    /// Entry at `index`.
    #[must_use]
    pub fn get(self, index: usize) -> Option<Entry<'a>> {
        self.ids.get(index).map(|&id| Entry {
            history: self.history,
            id,
        })
    }

    /// First entry.
    #[must_use]
    pub fn first(self) -> Option<Entry<'a>> {
        self.get(0)
    }

    /// Last entry.
    #[must_use]
    pub fn last(self) -> Option<Entry<'a>> {
        self.ids.len().checked_sub(1).and_then(|i| self.get(i))
    }

    /// The entries from `start` on.
    #[must_use]
    pub fn tail(self, start: usize) -> Self {
        Self {
            history: self.history,
            ids: self.ids.get(start..).unwrap_or(&[]),
        }
    }

    /// Iterate the entries in order.
    pub fn iter(self) -> impl Iterator<Item = Entry<'a>> {
        let history = self.history;
        self.ids.iter().map(move |&id| Entry { history, id })
    }

    /// Shas in order.
    #[must_use]
    pub fn shas(self) -> Vec<&'a str> {
        self.iter().map(Entry::sha).collect()
    }
}

/// Decompose a complete history.
///
/// # Errors
/// See [`decompose_with`].
pub fn decompose(linear: &LinearHistory) -> Result<HierarchyHistory> {
    decompose_with(linear, Boundary::Complete)
}

/// Decompose a history into its spine and nested side lines.
///
/// A merge parent absent from the input is the range cutoff under either
/// boundary and opens no side line.
///
/// # Errors
/// With [`Boundary::Complete`], returns [`Error::MissingParent`] for a
/// first parent absent from the input and [`Error::UnreachableCommit`]
/// for a commit the tip cannot reach. With [`Boundary::Truncated`],
/// absent first parents end their line and unreachable commits are
/// dropped.
pub fn decompose_with(linear: &LinearHistory, boundary: Boundary) -> Result<HierarchyHistory> {
    if linear.is_empty() {
        return Ok(HierarchyHistory::default());
    }

    let mut builder = Decomposer::new(linear.commits(), boundary);
    let spine = builder.take_line(0)?;

    // Lines are processed bottom-up, and a freshly taken side line is
    // processed before the rest of the line that opened it.
    let mut stack = vec![Frame::new(spine.clone())];
    while let Some(top) = stack.len().checked_sub(1) {
        let frame = &mut stack[top];
        if frame.remaining == 0 {
            stack.pop();
            continue;
        }

        let node_id = frame.ids[frame.remaining - 1];
        let parent_index = frame.next_parent;
        let Some(parent) = builder.nodes[node_id]
            .commit
            .parent_shas
            .get(parent_index)
            .cloned()
        else {
            frame.remaining -= 1;
            frame.next_parent = 1;
            continue;
        };
        frame.next_parent += 1;

        match builder.positions.get(parent.as_str()).copied() {
            None => {}
            Some(pos) if builder.taken[pos] => builder.nodes[node_id].branch_offs.push(parent),
            Some(pos) => {
                let line = builder.take_line(pos)?;
                builder.nodes[node_id].side_lines.push(line.clone());
                stack.push(Frame::new(line));
            }
        }
    }

    builder.finish(spine)
}

/// Flatten a hierarchy back into a linear history.
///
/// Each entry is followed by its side lines, fully and recursively,
/// before the next entry of the same line. Where a later side line runs
/// into an earlier one, the order is repaired so that no commit precedes
/// one of its children; otherwise the depth-first order is kept.
#[must_use]
pub fn flatten(history: &HierarchyHistory) -> LinearHistory {
    let order: Vec<&Commit> = history
        .walk()
        .into_iter()
        .map(|(entry, _)| entry.commit())
        .collect();
    let rank: HashMap<&str, usize> = order
        .iter()
        .enumerate()
        .map(|(rank, c)| (c.sha.as_str(), rank))
        .collect();

    let mut pending_children = vec![0usize; order.len()];
    for commit in &order {
        for parent in &commit.parent_shas {
            if let Some(&pos) = rank.get(parent.as_str()) {
                pending_children[pos] += 1;
            }
        }
    }

    let mut ready: BinaryHeap<Reverse<usize>> = pending_children
        .iter()
        .enumerate()
        .filter(|(_, count)| **count == 0)
        .map(|(pos, _)| Reverse(pos))
        .collect();
    let mut commits = Vec::with_capacity(order.len());
    while let Some(Reverse(pos)) = ready.pop() {
        let commit = order[pos];
        for parent in &commit.parent_shas {
            if let Some(&parent_pos) = rank.get(parent.as_str()) {
                pending_children[parent_pos] -= 1;
                if pending_children[parent_pos] == 0 {
                    ready.push(Reverse(parent_pos));
                }
            }
        }
        commits.push(commit.clone());
    }

    LinearHistory::from_ordered(commits)
}

struct Frame {
    ids: Vec<usize>,
    remaining: usize,
    next_parent: usize,
}

impl Frame {
    const fn new(ids: Vec<usize>) -> Self {
        let remaining = ids.len();
        Self {
            ids,
            remaining,
            next_parent: 1,
        }
    }
}

struct Decomposer<'a> {
    commits: &'a [Commit],
    positions: HashMap<&'a str, usize>,
    boundary: Boundary,
    taken: Vec<bool>,
    nodes: Vec<Node>,
}

impl<'a> Decomposer<'a> {
    fn new(commits: &'a [Commit], boundary: Boundary) -> Self {
        Self {
            commits,
            positions: commits
                .iter()
                .enumerate()
                .map(|(pos, c)| (c.sha.as_str(), pos))
                .collect(),
            boundary,
            taken: vec![false; commits.len()],
            nodes: Vec::with_capacity(commits.len()),
        }
    }

    fn locate_first_parent(&self, commit: &str, parent: &str) -> Result<Option<usize>> {
        match self.positions.get(parent) {
            Some(&pos) => Ok(Some(pos)),
            None if self.boundary == Boundary::Complete => Err(Error::MissingParent {
                commit: commit.to_owned(),
                parent: parent.to_owned(),
            }),
            None => Ok(None),
        }
    }

    /// Take the first-parent chain starting at `start`, stopping before
    /// an already-taken commit or the history boundary.
    fn take_line(&mut self, start: usize) -> Result<Vec<usize>> {
        let commits = self.commits;
        let mut line = Vec::new();
        let mut cursor = Some(start);

        while let Some(pos) = cursor.take() {
            let commit = &commits[pos];
            let id = self.nodes.len();
            self.taken[pos] = true;
            self.nodes.push(Node::new(commit.clone()));
            line.push(id);

            let Some(parent) = commit.first_parent() else {
                continue;
            };
            match self.locate_first_parent(&commit.sha, parent)? {
                Some(next) if self.taken[next] => {
                    self.nodes[id].branch_offs.push(parent.to_owned());
                }
                Some(next) => cursor = Some(next),
                None => {}
            }
        }

        Ok(line)
    }

    fn finish(self, spine: Vec<usize>) -> Result<HierarchyHistory> {
        if let Some(pos) = self.taken.iter().position(|taken| !taken) {
            let sha = &self.commits[pos].sha;
            if self.boundary == Boundary::Complete {
                return Err(Error::UnreachableCommit(sha.clone()));
            }
            let dropped = self.taken.iter().filter(|taken| !**taken).count();
            tracing::warn!(
                first = %sha,
                dropped,
                "dropping commits not reachable from the tip"
            );
        }

        tracing::debug!(
            commits = self.nodes.len(),
            spine = spine.len(),
            side_lines = self.nodes.iter().map(|n| n.side_lines.len()).sum::<usize>(),
            "decomposed history"
        );

        let index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(id, node)| (node.commit.sha.clone(), id))
            .collect();

        Ok(HierarchyHistory {
            nodes: self.nodes,
            spine,
            index,
        })
    }
}
