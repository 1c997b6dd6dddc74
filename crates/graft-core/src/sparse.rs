//! Sparse views of a history around one spine commit.
//!
//! [`extract`] keeps the commits that a spine commit brings in through its
//! side lines, plus the stretch of spine they hang off. [`collapse`] then
//! hides runs of plain commits so only branch and merge points remain.

use std::collections::{HashMap, VecDeque};

use crate::commit::{Commit, LinearHistory};
use crate::error::{Error, Result};
use crate::hierarchy::{HierarchyHistory, decompose};

/// Keep the commits reachable from `start_sha` without crossing the tip's
/// first-parent line, together with the spine range from `start_sha` down
/// to the deepest spine commit those side commits join.
///
/// Parents outside the kept set are dropped from each commit.
///
/// # Errors
/// Returns [`Error::UnknownCommit`] if `start_sha` is not in the history,
/// and [`Error::NotOnSpine`] if it is not on the tip's first-parent line.
pub fn extract(linear: &LinearHistory, start_sha: &str) -> Result<LinearHistory> {
    let commits = linear.commits();
    let positions: HashMap<&str, usize> = commits
        .iter()
        .enumerate()
        .map(|(pos, c)| (c.sha.as_str(), pos))
        .collect();

    let Some(&start) = positions.get(start_sha) else {
        return Err(Error::UnknownCommit(start_sha.to_owned()));
    };

    let spine = first_parent_chain(commits, &positions);
    let rank: HashMap<usize, usize> = spine.iter().enumerate().map(|(r, &pos)| (pos, r)).collect();
    let Some(&start_rank) = rank.get(&start) else {
        return Err(Error::NotOnSpine(start_sha.to_owned()));
    };

    let mut kept = vec![false; commits.len()];
    kept[start] = true;
    let mut deepest = start_rank;
    let mut queue = VecDeque::from([start]);

    while let Some(pos) = queue.pop_front() {
        for parent in &commits[pos].parent_shas {
            let Some(&parent_pos) = positions.get(parent.as_str()) else {
                continue;
            };
            if let Some(&r) = rank.get(&parent_pos) {
                deepest = deepest.max(r);
            } else if !kept[parent_pos] {
                kept[parent_pos] = true;
                queue.push_back(parent_pos);
            }
        }
    }

    for &pos in &spine[start_rank..=deepest] {
        kept[pos] = true;
    }

    Ok(restrict(commits, &kept))
}

/// Repeatedly rewrite parent links past commits that have exactly one
/// parent and exactly one child, then re-extract from the tip, until
/// nothing changes.
///
/// # Errors
/// Propagates errors from [`extract`].
pub fn collapse(linear: &LinearHistory) -> Result<LinearHistory> {
    let mut current = linear.clone();
    loop {
        let Some(tip) = current.head().map(|c| c.sha.clone()) else {
            return Ok(current);
        };
        let before = current.len();
        let next = extract(&skip_plain_commits(&current), &tip)?;
        if next.len() == before {
            return Ok(next);
        }
        current = next;
    }
}

/// Decompose the collapsed sparse view around `start_sha`.
///
/// # Errors
/// Propagates errors from [`extract`], [`collapse`] and [`decompose`].
pub fn extract_hierarchy(linear: &LinearHistory, start_sha: &str) -> Result<HierarchyHistory> {
    decompose(&collapse(&extract(linear, start_sha)?)?)
}

fn first_parent_chain(commits: &[Commit], positions: &HashMap<&str, usize>) -> Vec<usize> {
    let mut chain = Vec::new();
    let mut cursor = (!commits.is_empty()).then_some(0);
    while let Some(pos) = cursor {
        chain.push(pos);
        cursor = commits[pos]
            .first_parent()
            .and_then(|p| positions.get(p).copied());
    }
    chain
}

fn restrict(commits: &[Commit], kept: &[bool]) -> LinearHistory {
    let members: std::collections::HashSet<&str> = commits
        .iter()
        .zip(kept)
        .filter(|(_, keep)| **keep)
        .map(|(c, _)| c.sha.as_str())
        .collect();

    LinearHistory::from_ordered(
        commits
            .iter()
            .zip(kept)
            .filter(|(_, keep)| **keep)
            .map(|(commit, _)| {
                let mut commit = commit.clone();
                commit.parent_shas.retain(|p| members.contains(p.as_str()));
                commit
            })
            .collect(),
    )
}

fn skip_plain_commits(linear: &LinearHistory) -> LinearHistory {
    let by_sha: HashMap<&str, &Commit> = linear.iter().map(|c| (c.sha.as_str(), c)).collect();
    let mut children: HashMap<&str, usize> = HashMap::new();
    for commit in linear {
        for parent in &commit.parent_shas {
            *children.entry(parent.as_str()).or_default() += 1;
        }
    }

    LinearHistory::from_ordered(
        linear
            .iter()
            .map(|commit| {
                let mut commit = commit.clone();
                for parent in &mut commit.parent_shas {
                    let mut target = parent.as_str();
                    while let Some(next) = plain_parent(target, &by_sha, &children) {
                        target = next;
                    }
                    *parent = target.to_owned();
                }
                commit
            })
            .collect(),
    )
}

/// The single parent of `sha`, when `sha` is a plain commit with exactly
/// one child and that parent is present.
fn plain_parent<'a>(
    sha: &str,
    by_sha: &HashMap<&str, &'a Commit>,
    children: &HashMap<&str, usize>,
) -> Option<&'a str> {
    let commit = by_sha.get(sha)?;
    let [parent] = commit.parent_shas.as_slice() else {
        return None;
    };
    (children.get(sha) == Some(&1) && by_sha.contains_key(parent.as_str()))
        .then_some(parent.as_str())
}
