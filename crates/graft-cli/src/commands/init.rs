//! `graft init` command - write a default config file.

use anyhow::{Context, Result};
use graft_core::Config;

use super::utils::{config_path, open_repo};
use crate::output;

/// Run the init command.
pub fn run(force: bool) -> Result<()> {
    let repo = open_repo()?;
    let path = config_path(&repo, None);

    if path.exists() && !force {
        output::warn(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ));
        return Ok(());
    }

    Config::default()
        .save(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    output::success("Initialized graft in this repository");
    output::info(&format!("Config written to: {}", path.display()));

    Ok(())
}
