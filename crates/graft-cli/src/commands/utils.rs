use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use graft_git::Repository;

use crate::output;

/// Config file name inside the git directory.
pub const CONFIG_FILE: &str = "graft.toml";

/// Helper to open the repository containing the current directory.
pub fn open_repo() -> Result<Repository> {
    Repository::open_current().context("Not inside a git repository")
}

/// The explicit config path, or `graft.toml` in the git directory.
pub fn config_path(repo: &Repository, explicit: Option<&Path>) -> PathBuf {
    explicit.map_or_else(|| repo.git_dir().join(CONFIG_FILE), Path::to_path_buf)
}

/// Expand abbreviated shas to full commit ids.
///
/// Entries that do not resolve are kept as given, with a warning.
pub fn resolve_shas(repo: &Repository, shas: &[String]) -> Vec<String> {
    shas.iter()
        .map(|sha| match repo.resolve(sha) {
            Ok(oid) => oid.to_string(),
            Err(_) => {
                output::warn(&format!("Cannot resolve {sha}, using it as given"));
                sha.clone()
            }
        })
        .collect()
}
