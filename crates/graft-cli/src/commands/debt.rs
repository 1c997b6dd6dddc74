//! `graft debt` command - report head commits with no equivalent on base.

use anyhow::{Context, Result};
use colored::Colorize;
use graft_core::{BucketSummary, Config};

use super::DebtArgs;
use super::utils::{config_path, open_repo, resolve_shas};
use crate::output;
use crate::services::{DebtOutcome, DebtService};

/// Run the debt command.
pub fn run(args: &DebtArgs) -> Result<()> {
    let repo = open_repo()?;

    let path = config_path(&repo, args.config.as_deref());
    let mut config =
        Config::load(&path).with_context(|| format!("Failed to load {}", path.display()))?;
    tracing::debug!(path = %path.display(), matchers = config.matchers.len(), "loaded config");
    config.analysis.ignore_head.extend(args.ignore_head.iter().cloned());
    config.analysis.ignore_base.extend(args.ignore_base.iter().cloned());
    config.analysis.ignore_head = resolve_shas(&repo, &config.analysis.ignore_head);
    config.analysis.ignore_base = resolve_shas(&repo, &config.analysis.ignore_base);

    let spinner = if args.json {
        None
    } else {
        output::spinner(&format!("Comparing {} with {}", args.head, args.base))
    };
    let outcome =
        DebtService::new(&repo, &config).analyze(&args.head, &args.base, !args.no_prune);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let outcome = outcome?;

    if args.json {
        output::essential(&serde_json::to_string_pretty(&outcome)?);
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

fn print_outcome(outcome: &DebtOutcome) {
    let report = &outcome.report;
    if let Some(fork) = &outcome.divergence.fork_point {
        output::info(&format!("Fork point: {}", output::short_sha(fork)));
    }

    if !report.matches.is_empty() {
        output::hr();
        output::info(&format!("{} matches", report.matches.len()));
        for found in &report.matches {
            output::detail(&format!(
                "  {} {} → {} {} {}",
                output::confidence_label(found.confidence),
                output::short_sha(&found.head),
                output::short_sha(&found.base),
                found.subject.as_deref().unwrap_or(""),
                format!("[{}]", found.matcher).dimmed()
            ));
        }
    }

    print_buckets(&outcome.head, &report.head_debt);
    print_buckets(&outcome.base, &report.base_debt);

    output::hr();
    if report.head_remaining == 0 {
        output::success(&format!(
            "Everything on {} has an equivalent on {}",
            outcome.head, outcome.base
        ));
    }
    output::essential(&format!(
        "{}: {} commits without equivalent, {}: {} commits without equivalent",
        outcome.head, report.head_remaining, outcome.base, report.base_remaining
    ));
}

fn print_buckets(name: &str, buckets: &[BucketSummary]) {
    if buckets.is_empty() {
        return;
    }
    output::hr();
    output::info(&format!("Only on {}", name.cyan().bold()));
    for bucket in buckets {
        let indent = output::indent(bucket.depth + 1);
        output::detail(&format!(
            "{indent}{} {}",
            output::short_sha(&bucket.merge).yellow(),
            bucket.subject.as_deref().unwrap_or("")
        ));
        for sha in &bucket.commits {
            output::detail(&format!("{indent}  {}", output::short_sha(sha)));
        }
    }
}
