//! Hierarchy service: spine and side lines of one ref.

use anyhow::{Context, Result};
use graft_core::sparse;
use graft_core::{Boundary, CommitSource, HierarchyRow, decompose_with};
use serde::Serialize;

/// Decomposed history of a ref, one row per commit in walk order.
#[derive(Debug, Clone, Serialize)]
pub struct HierarchyResult {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    pub rows: Vec<HierarchyRow>,
}

/// Service for decomposing a ref's history.
pub struct HierarchyService<'a, S: CommitSource> {
    source: &'a S,
}

impl<'a, S: CommitSource> HierarchyService<'a, S> {
    /// Create a new hierarchy service.
    pub const fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Decompose `reference`, or only the sparse view around `start`.
    pub fn hierarchy(&self, reference: &str, start: Option<&str>) -> Result<HierarchyResult> {
        let linear = self
            .source
            .change_log(reference, None)
            .with_context(|| format!("Failed to read history of '{reference}'"))?;

        let history = match start {
            Some(sha) => sparse::extract_hierarchy(&linear, sha)
                .with_context(|| format!("Cannot build a sparse hierarchy at {sha}"))?,
            None => decompose_with(&linear, Boundary::Truncated)?,
        };

        Ok(HierarchyResult {
            reference: reference.to_string(),
            start: start.map(String::from),
            rows: history.rows(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::test_mocks::MockSource;

    fn source() -> MockSource {
        MockSource::new()
            .with_spec("m[c x]")
            .with_spec("x[b]")
            .with_spec("c[b]")
            .with_spec("b[a]")
            .with_spec("a[]")
            .with_ref("main", "m")
    }

    #[test]
    fn test_rows_in_walk_order() {
        let source = source();
        let result = HierarchyService::new(&source).hierarchy("main", None).unwrap();

        let rows: Vec<(&str, usize)> = result
            .rows
            .iter()
            .map(|r| (r.sha.as_str(), r.depth))
            .collect();
        assert_eq!(rows, vec![("m", 0), ("x", 1), ("c", 0), ("b", 0), ("a", 0)]);
        assert_eq!(result.rows[0].side_lines, 1);
        assert_eq!(result.rows[1].branch_offs, vec!["b"]);
        assert_eq!(result.rows[0].subject.as_deref(), Some("Commit m"));
    }

    #[test]
    fn test_sparse_view() {
        let source = source();
        let result = HierarchyService::new(&source)
            .hierarchy("main", Some("m"))
            .unwrap();
        let shas: Vec<&str> = result.rows.iter().map(|r| r.sha.as_str()).collect();
        assert_eq!(shas, vec!["m", "b"]);
        assert_eq!(result.start.as_deref(), Some("m"));
    }

    #[test]
    fn test_sparse_view_off_spine() {
        let source = source();
        let err = HierarchyService::new(&source)
            .hierarchy("main", Some("x"))
            .unwrap_err();
        assert!(err.to_string().contains("x"));
    }

    #[test]
    fn test_result_serializes_ref_key() {
        let source = source();
        let result = HierarchyService::new(&source).hierarchy("main", None).unwrap();
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["ref"], "main");
        assert!(json.get("start").is_none());
        assert_eq!(json["rows"].as_array().unwrap().len(), 5);
    }
}
