//! Command implementations
//!
//! This module contains implementations for all CLI subcommands.

pub mod list;
pub mod run;

use anyhow::{Context, Result};
use envrun_core::config::{ConfigLoader, EnvRunConfig};
use std::path::Path;

/// Load the configuration from `--config`, or discover it in the workspace
/// folder (current directory by default).
pub(crate) fn load_config(
    workspace_folder: Option<&Path>,
    config_path: Option<&Path>,
) -> Result<EnvRunConfig> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => {
            let workspace = match workspace_folder {
                Some(folder) => folder.to_path_buf(),
                None => std::env::current_dir().context("Failed to determine current directory")?,
            };
            ConfigLoader::discover(&workspace)?
        }
    };

    let config = ConfigLoader::load_from_path(&path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    Ok(config)
}
