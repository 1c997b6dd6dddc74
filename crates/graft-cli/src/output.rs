//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use graft_core::MatchConfidence;
use indicatif::ProgressBar;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print a success message (suppressed in quiet mode).
pub fn success(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "✓".green(), msg);
    }
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
///
/// Use for indented detail lines that accompany info or warn messages.
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential machine-readable output (always prints).
///
/// Use for results that should be available for piping, like JSON reports.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}

/// Start a spinner on stderr, or nothing in quiet mode.
pub fn spinner(msg: &str) -> Option<ProgressBar> {
    if is_quiet() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_message(msg.to_owned());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

/// Abbreviated commit id.
#[must_use]
pub fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// Colored label for a match confidence.
#[must_use]
pub fn confidence_label(confidence: MatchConfidence) -> String {
    let text = format!("{:<8}", confidence.as_str());
    match confidence {
        MatchConfidence::Absolute => text.green().bold().to_string(),
        MatchConfidence::Strong => text.green().to_string(),
        MatchConfidence::Good => text.yellow().to_string(),
        MatchConfidence::Low => text.red().to_string(),
    }
}

/// Indentation for a nesting depth.
#[must_use]
pub fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}
