//! Configuration loading
//!
//! Environments are declared in an `envrun.toml` file:
//!
//! ```toml
//! [envrun]
//! work_dir = ".envrun"
//! env_list = ["test"]
//!
//! [env.test]
//! change_dir = "."
//! setup_commands = ["python -m venv .venv"]
//! set_env = { PYTHONHASHSEED = "0" }
//! commands_pre = ["python --version"]
//! commands = ["pytest", "- flake8"]
//! commands_post = [{ args = ["echo", "done"], ignore_exit_code = true }]
//! ```
//!
//! Relative paths resolve against the directory containing the file. Environment
//! tables keep their declaration order.

use crate::command::Command;
use crate::errors::{ConfigError, EnvRunError, Result};
use crate::phase::{Phase, PhaseKind};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument};

/// File name looked up by [`ConfigLoader::discover`].
pub const CONFIG_FILE_NAME: &str = "envrun.toml";

/// Default working directory for environments, relative to the config file.
pub const DEFAULT_WORK_DIR: &str = ".envrun";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    envrun: RawSettings,
    #[serde(default)]
    env: IndexMap<String, RawEnv>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSettings {
    work_dir: Option<PathBuf>,
    #[serde(default)]
    env_list: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawEnv {
    change_dir: Option<PathBuf>,
    #[serde(default)]
    setup_commands: Vec<CommandValue>,
    #[serde(default)]
    set_env: IndexMap<String, String>,
    #[serde(default)]
    commands_pre: Vec<CommandValue>,
    #[serde(default)]
    commands: Vec<CommandValue>,
    #[serde(default)]
    commands_post: Vec<CommandValue>,
}

/// A command as written in the file: a command line or an explicit argv.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CommandValue {
    Line(String),
    Args {
        args: Vec<String>,
        #[serde(default)]
        ignore_exit_code: bool,
    },
}

impl CommandValue {
    fn into_command(self) -> Result<Command> {
        match self {
            CommandValue::Line(line) => Command::parse(&line),
            CommandValue::Args {
                args,
                ignore_exit_code,
            } => Command::from_args(args, ignore_exit_code),
        }
    }
}

/// Resolved configuration of a single environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    pub name: String,
    /// Absolute working directory for commands
    pub change_dir: PathBuf,
    /// Commands run once while provisioning
    pub setup_commands: Vec<Command>,
    pub set_env: IndexMap<String, String>,
    /// Command phases in execution order
    pub phases: Vec<Phase>,
}

impl EnvConfig {
    pub fn phase(&self, kind: PhaseKind) -> &[Command] {
        self.phases
            .iter()
            .find(|p| p.kind == kind)
            .map(|p| p.commands.as_slice())
            .unwrap_or(&[])
    }

    pub fn command_count(&self) -> usize {
        self.phases.iter().map(|p| p.commands.len()).sum()
    }
}

/// Resolved configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvRunConfig {
    /// File the configuration was read from, if any
    pub path: Option<PathBuf>,
    /// Directory relative paths resolve against
    pub base_dir: PathBuf,
    /// Root directory holding environment directories and the package directory
    pub work_dir: PathBuf,
    /// Default selection when no environment is requested explicitly
    pub env_list: Vec<String>,
    pub envs: IndexMap<String, EnvConfig>,
}

impl EnvRunConfig {
    pub fn env_names(&self) -> Vec<String> {
        self.envs.keys().cloned().collect()
    }

    /// Pick environments to run.
    ///
    /// Names may be comma separated. An empty request selects `env_list`, or
    /// every environment in declaration order when `env_list` is empty.
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn select(&self, requested: &[String]) -> Result<Vec<&EnvConfig>> {
        let names: Vec<&str> = requested
            .iter()
            .flat_map(|r| r.split(','))
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .collect();

        let names: Vec<&str> = if !names.is_empty() {
            names
        } else if !self.env_list.is_empty() {
            self.env_list.iter().map(String::as_str).collect()
        } else {
            self.envs.keys().map(String::as_str).collect()
        };

        let mut selected: Vec<&EnvConfig> = Vec::new();
        for name in names {
            let env = self.envs.get(name).ok_or_else(|| ConfigError::UnknownEnv {
                name: name.to_string(),
                available: self.env_names(),
            })?;
            if !selected.iter().any(|e| e.name == env.name) {
                selected.push(env);
            }
        }
        Ok(selected)
    }
}

/// Configuration loader for `envrun.toml` files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Locate the configuration file in `workspace`.
    #[instrument(skip_all, fields(workspace = %workspace.display()))]
    pub fn discover(workspace: &Path) -> Result<PathBuf> {
        let path = workspace.join(CONFIG_FILE_NAME);
        debug!("Looking for configuration at {}", path.display());
        if path.is_file() {
            Ok(path)
        } else {
            Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into())
        }
    }

    /// Read and resolve a configuration file.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn load_from_path(path: &Path) -> Result<EnvRunConfig> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let base_dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let base_dir = base_dir.canonicalize().map_err(ConfigError::Io)?;

        let mut config = Self::parse_str(&content, &base_dir)?;
        config.path = Some(path.to_path_buf());
        debug!("Loaded {} environment(s)", config.envs.len());
        Ok(config)
    }

    /// Parse configuration text, resolving relative paths against `base_dir`.
    pub fn parse_str(content: &str, base_dir: &Path) -> Result<EnvRunConfig> {
        let raw: RawConfig = toml::from_str(content).map_err(|e| ConfigError::Parsing {
            message: e.to_string(),
        })?;

        let work_dir = base_dir.join(
            raw.envrun
                .work_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WORK_DIR)),
        );

        let mut envs = IndexMap::new();
        for (name, raw_env) in raw.env {
            validate_env_name(&name)?;
            let env = resolve_env(&name, raw_env, base_dir)?;
            envs.insert(name, env);
        }

        if envs.is_empty() {
            return Err(validation("No environments declared; add an [env.<name>] table"));
        }

        for name in &raw.envrun.env_list {
            if !envs.contains_key(name) {
                return Err(validation(format!(
                    "env_list references undeclared environment '{}'",
                    name
                )));
            }
        }

        Ok(EnvRunConfig {
            path: None,
            base_dir: base_dir.to_path_buf(),
            work_dir,
            env_list: raw.envrun.env_list,
            envs,
        })
    }
}

fn resolve_env(name: &str, raw: RawEnv, base_dir: &Path) -> Result<EnvConfig> {
    let convert = |values: Vec<CommandValue>, key: &str| -> Result<Vec<Command>> {
        values
            .into_iter()
            .enumerate()
            .map(|(i, v)| {
                v.into_command().map_err(|e| {
                    validation(format!("env.{}.{}[{}]: {}", name, key, i, strip_prefix(&e)))
                })
            })
            .collect()
    };

    let phases = vec![
        Phase::new(PhaseKind::Pre, convert(raw.commands_pre, PhaseKind::Pre.as_str())?),
        Phase::new(PhaseKind::Main, convert(raw.commands, PhaseKind::Main.as_str())?),
        Phase::new(PhaseKind::Post, convert(raw.commands_post, PhaseKind::Post.as_str())?),
    ];

    Ok(EnvConfig {
        name: name.to_string(),
        change_dir: raw
            .change_dir
            .map(|dir| base_dir.join(dir))
            .unwrap_or_else(|| base_dir.to_path_buf()),
        setup_commands: convert(raw.setup_commands, "setup_commands")?,
        set_env: raw.set_env,
        phases,
    })
}

fn validate_env_name(name: &str) -> Result<()> {
    let invalid = name.is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\', ','])
        || name.chars().any(char::is_whitespace);
    if invalid {
        return Err(validation(format!("Invalid environment name '{}'", name)));
    }
    Ok(())
}

fn validation(message: impl Into<String>) -> EnvRunError {
    ConfigError::Validation {
        message: message.into(),
    }
    .into()
}

/// Inner message of a nested validation error.
fn strip_prefix(err: &EnvRunError) -> String {
    match err {
        EnvRunError::Config(ConfigError::Validation { message }) => message.clone(),
        other => other.to_string(),
    }
}
