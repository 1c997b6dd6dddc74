//! Command-line definitions and command implementations.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

pub mod completions;
pub mod debt;
pub mod hierarchy;
pub mod init;
pub mod topology;
pub mod utils;

/// Graft - branch topology and merge-debt reports for git repositories.
#[derive(Debug, Parser)]
#[command(name = "graft", version, about, long_about = None)]
pub struct Cli {
    /// Only print essential output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write a default graft.toml into the git directory.
    Init {
        /// Overwrite an existing config file.
        #[arg(long)]
        force: bool,
    },

    /// Show how the first-parent lines of several refs share history.
    Topology {
        /// Refs to insert, in order.
        #[arg(required = true)]
        refs: Vec<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show a ref's history as a spine with nested side lines.
    Hierarchy {
        /// Ref to decompose.
        reference: String,

        /// Only show the sparse view around this spine commit.
        #[arg(long)]
        start: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Find head commits with no equivalent on base.
    Debt(DebtArgs),

    /// Generate shell completions.
    Completions {
        /// Target shell.
        shell: Shell,
    },
}

#[derive(Debug, Args)]
pub struct DebtArgs {
    /// Ref whose changes should reach base.
    pub head: String,

    /// Ref the changes should reach.
    pub base: String,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,

    /// Config file (defaults to graft.toml in the git directory).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Record matches without removing them between matchers.
    #[arg(long)]
    pub no_prune: bool,

    /// Head commit to leave out of the analysis.
    #[arg(long = "ignore-head", value_name = "SHA")]
    pub ignore_head: Vec<String>,

    /// Base commit to leave out of the analysis.
    #[arg(long = "ignore-base", value_name = "SHA")]
    pub ignore_base: Vec<String>,
}
