//! List command implementation

use crate::cli::OutputFormat;
use crate::commands::load_config;
use anyhow::Result;
use console::style;
use envrun_core::config::EnvRunConfig;
use envrun_core::PhaseKind;
use serde::Serialize;
use std::path::PathBuf;
use tracing::instrument;

/// Arguments for the list command
#[derive(Debug, Clone)]
pub struct ListArgs {
    pub output_format: OutputFormat,
    pub workspace_folder: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// One configured environment as shown by `envrun list`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct EnvListing {
    pub name: String,
    /// Part of the default selection
    pub default: bool,
    pub change_dir: PathBuf,
    pub setup_commands: usize,
    pub commands_pre: usize,
    pub commands: usize,
    pub commands_post: usize,
    /// Commands across all phases
    pub command_count: usize,
}

pub(crate) fn listings(config: &EnvRunConfig) -> Vec<EnvListing> {
    config
        .envs
        .values()
        .map(|env| EnvListing {
            name: env.name.clone(),
            default: config.env_list.is_empty() || config.env_list.contains(&env.name),
            change_dir: env.change_dir.clone(),
            setup_commands: env.setup_commands.len(),
            commands_pre: env.phase(PhaseKind::Pre).len(),
            commands: env.phase(PhaseKind::Main).len(),
            commands_post: env.phase(PhaseKind::Post).len(),
            command_count: env.command_count(),
        })
        .collect()
}

/// Execute the list command
#[instrument(skip(args))]
pub fn execute_list(args: ListArgs) -> Result<()> {
    let config = load_config(args.workspace_folder.as_deref(), args.config_path.as_deref())?;
    let entries = listings(&config);

    match args.output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for entry in &entries {
                let marker = if entry.default {
                    style("*").green().to_string()
                } else {
                    " ".to_string()
                };
                if entry.command_count == 0 {
                    println!("{} {} (no commands)", marker, style(&entry.name).bold());
                    continue;
                }
                println!(
                    "{} {} ({} pre, {} main, {} post)",
                    marker,
                    style(&entry.name).bold(),
                    entry.commands_pre,
                    entry.commands,
                    entry.commands_post
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use envrun_core::config::ConfigLoader;
    use std::path::Path;

    #[test]
    fn test_listings_follow_declaration_order() {
        let config = ConfigLoader::parse_str(
            r#"
[envrun]
env_list = ["lint"]

[env.test]
commands = ["pytest", "coverage report"]

[env.lint]
setup_commands = ["pip install ruff"]
commands_pre = ["ruff --version"]
commands = ["ruff check ."]

[env.build]
setup_commands = ["pip wheel ."]
"#,
            Path::new("/project"),
        )
        .unwrap();

        let entries = listings(&config);

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].name, "test");
        assert!(!entries[0].default);
        assert_eq!(entries[0].commands, 2);
        assert_eq!(entries[0].command_count, 2);
        assert_eq!(entries[1].name, "lint");
        assert!(entries[1].default);
        assert_eq!(entries[1].setup_commands, 1);
        assert_eq!(entries[1].commands_pre, 1);
        assert_eq!(entries[1].command_count, 2);
        assert_eq!(entries[1].change_dir, Path::new("/project"));
        assert_eq!(entries[2].name, "build");
        assert_eq!(entries[2].command_count, 0);
    }
}
