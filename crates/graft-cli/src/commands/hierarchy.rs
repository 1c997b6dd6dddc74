//! `graft hierarchy` command - show a ref's spine and side lines.

use anyhow::Result;
use colored::Colorize;
use graft_core::HierarchyRow;

use super::utils::open_repo;
use crate::output;
use crate::services::HierarchyService;

/// Run the hierarchy command.
pub fn run(reference: &str, start: Option<&str>, json: bool) -> Result<()> {
    let repo = open_repo()?;
    let start = match start {
        Some(sha) => Some(repo.resolve(sha)?.to_string()),
        None => None,
    };
    let result = HierarchyService::new(&repo).hierarchy(reference, start.as_deref())?;

    if json {
        output::essential(&serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    if result.rows.is_empty() {
        output::warn(&format!("{reference} has no commits"));
        return Ok(());
    }
    for row in &result.rows {
        output::detail(&format_row(row));
    }
    Ok(())
}

fn format_row(row: &HierarchyRow) -> String {
    let mut line = format!(
        "{}{} {}",
        output::indent(row.depth),
        output::short_sha(&row.sha).yellow(),
        row.subject.as_deref().unwrap_or("")
    );
    if row.side_lines > 0 {
        line.push_str(&format!(" [+{}]", row.side_lines).cyan().to_string());
    }
    for sha in &row.branch_offs {
        line.push_str(&format!(" ↳ {}", output::short_sha(sha)).dimmed().to_string());
    }
    line
}
