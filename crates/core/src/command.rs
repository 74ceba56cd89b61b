//! Command descriptors
//!
//! A [`Command`] is an argument vector plus the policy flag deciding whether a
//! non-zero exit halts the run. Commands are declared in configuration either as
//! a shell-like string or as an explicit argument list.

use crate::errors::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An immutable command descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Program followed by its arguments; never empty.
    pub args: Vec<String>,
    /// When set, a failing exit status is recorded but never halts the run.
    #[serde(default)]
    pub ignore_exit_code: bool,
}

impl Command {
    /// Parse a command line.
    ///
    /// A leading `-` marks the command as ignoring its exit code; the rest is
    /// split using POSIX shell word rules (quotes and escapes, no expansion).
    ///
    /// ```rust
    /// use envrun_core::command::Command;
    ///
    /// let cmd = Command::parse("- flake8 'src dir'").unwrap();
    /// assert!(cmd.ignore_exit_code);
    /// assert_eq!(cmd.args, vec!["flake8", "src dir"]);
    /// ```
    pub fn parse(line: &str) -> Result<Self> {
        let trimmed = line.trim();
        let (ignore_exit_code, rest) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest.trim_start()),
            None => (false, trimmed),
        };

        let args = shell_words::split(rest).map_err(|e| ConfigError::Validation {
            message: format!("Invalid command `{}`: {}", line, e),
        })?;

        Self::from_args(args, ignore_exit_code).map_err(|_| {
            ConfigError::Validation {
                message: format!("Command `{}` has no program to run", line),
            }
            .into()
        })
    }

    /// Build a command from an explicit argument vector.
    pub fn from_args(args: Vec<String>, ignore_exit_code: bool) -> Result<Self> {
        if args.first().map_or(true, |program| program.is_empty()) {
            return Err(ConfigError::Validation {
                message: "Command argument list must start with a program".to_string(),
            }
            .into());
        }
        Ok(Self {
            args,
            ignore_exit_code,
        })
    }

    /// Shell-quoted rendering of the argument vector, without the ignore marker.
    pub fn command_line(&self) -> String {
        shell_words::join(&self.args)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ignore_exit_code {
            write!(f, "- ")?;
        }
        write!(f, "{}", self.command_line())
    }
}
