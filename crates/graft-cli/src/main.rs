//! Graft CLI - branch topology and merge-debt reports.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod services;

use commands::{Cli, Commands};

fn main() {
    let cli = Cli::parse();
    output::set_quiet(cli.quiet);
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Init { force } => commands::init::run(force),
        Commands::Topology { refs, json } => commands::topology::run(&refs, json),
        Commands::Hierarchy {
            reference,
            start,
            json,
        } => commands::hierarchy::run(&reference, start.as_deref(), json),
        Commands::Debt(args) => commands::debt::run(&args),
        Commands::Completions { shell } => commands::completions::run(shell),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `RUST_LOG` when set.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}
