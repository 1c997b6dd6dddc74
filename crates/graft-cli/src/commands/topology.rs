//! `graft topology` command - show the branch tree for a set of refs.

use anyhow::Result;
use colored::Colorize;
use graft_core::SegmentSnapshot;

use super::utils::open_repo;
use crate::output;
use crate::services::{TopologyResult, TopologyService};

/// Run the topology command.
pub fn run(refs: &[String], json: bool) -> Result<()> {
    let repo = open_repo()?;
    let result = TopologyService::new(&repo).topology(refs)?;

    if json {
        output::essential(&serde_json::to_string_pretty(&result)?);
    } else {
        print_tree(&result);
    }
    Ok(())
}

fn print_tree(result: &TopologyResult) {
    let mut depths: Vec<usize> = Vec::with_capacity(result.segments.len());
    for segment in &result.segments {
        let depth = segment.parent.and_then(|p| depths.get(p)).map_or(0, |d| d + 1);
        depths.push(depth);
        output::detail(&format!("{}{}", output::indent(depth), describe(segment)));
    }
    output::hr();
    output::info(&format!(
        "{} refs, {} segments",
        result.refs.len(),
        result.segments.len()
    ));
}

fn describe(segment: &SegmentSnapshot) -> String {
    let name = segment.branch_name.as_deref().map_or_else(
        || "(shared)".dimmed().to_string(),
        |n| n.cyan().bold().to_string(),
    );
    let range = match (segment.shas.first(), segment.shas.last()) {
        (Some(tip), Some(end)) if tip != end => {
            format!("{}..{}", output::short_sha(end), output::short_sha(tip))
        }
        (Some(tip), _) => output::short_sha(tip).to_string(),
        _ => String::new(),
    };
    let count = segment.shas.len();
    let noun = if count == 1 { "commit" } else { "commits" };
    format!("{name} {range} ({count} {noun})")
}
