//! Topology service: one branch tree for a set of refs.

use anyhow::{Context, Result, bail};
use graft_core::{Boundary, BranchTree, CommitSource, SegmentSnapshot, decompose_with};
use serde::Serialize;

/// Branch tree output for a set of refs.
#[derive(Debug, Clone, Serialize)]
pub struct TopologyResult {
    pub refs: Vec<String>,
    pub segments: Vec<SegmentSnapshot>,
}

/// Service for building branch trees.
pub struct TopologyService<'a, S: CommitSource> {
    source: &'a S,
}

impl<'a, S: CommitSource> TopologyService<'a, S> {
    /// Create a new topology service.
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Insert each ref's first-parent line, in the order given.
    pub fn build_tree(&self, refs: &[String]) -> Result<BranchTree> {
        if refs.is_empty() {
            bail!("No refs given");
        }

        let mut tree = BranchTree::new();
        for name in refs {
            let linear = self
                .source
                .parent_log(name, None)
                .with_context(|| format!("Failed to read history of '{name}'"))?;
            let hierarchy = decompose_with(&linear, Boundary::Truncated)?;
            tree.insert(&hierarchy, name)
                .with_context(|| format!("Failed to add '{name}' to the branch tree"))?;
        }
        Ok(tree)
    }

    /// Build the tree and flatten it for display.
    pub fn topology(&self, refs: &[String]) -> Result<TopologyResult> {
        let tree = self.build_tree(refs)?;
        Ok(TopologyResult {
            refs: tree.refs().map(String::from).collect(),
            segments: tree.snapshot(),
        })
    }
}
