use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log format options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogFormat {
    /// Human-readable text format
    Text,
    /// JSON structured format
    Json,
}

/// Log level options
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    /// Error messages only
    Error,
    /// Warning and error messages
    Warn,
    /// Informational messages and above
    Info,
    /// Debug messages and above
    Debug,
    /// All messages including trace
    Trace,
}

impl LogLevel {
    fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// envrun subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Provision environments and run their command phases
    #[command(long_about = "Provision environments and run their command phases\n\n\
        Each selected environment is set up (recreated once automatically when its \
        configuration changed), then its commands_pre, commands and commands_post \
        phases run in order. The first failing command that is not prefixed with '-' \
        stops the environment and its exit code becomes the exit code of envrun.")]
    Run {
        /// Environment(s) to run (repeatable or comma separated; defaults to env_list or all)
        #[arg(short = 'e', long = "env", value_name = "ENV")]
        envs: Vec<String>,
        /// Remove the environment and the shared package directory before setup
        #[arg(short = 'r', long)]
        recreate: bool,
        /// Set environments up without running any commands
        #[arg(short = 'n', long)]
        notest: bool,
        /// Run environments concurrently
        #[arg(long)]
        parallel: bool,
        /// Output format for the run summary
        #[arg(long, value_enum, default_value = "text")]
        output_format: OutputFormat,
    },

    /// List configured environments
    List {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        output_format: OutputFormat,
    },
}

#[derive(Parser, Debug)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version,
    about = "Per-environment command runner",
    long_about = "Per-environment command runner\n\nProvisions isolated environments declared in envrun.toml and runs their command phases.",
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    /// Log format (text or json, defaults to text, can be set via ENVRUN_LOG_FORMAT env var)
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log level
    #[arg(long, global = true, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Workspace folder holding envrun.toml
    #[arg(long, global = true, value_name = "PATH")]
    pub workspace_folder: Option<PathBuf>,

    /// Configuration file path
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Initialize logging and run the selected subcommand.
    ///
    /// Returns the process exit code.
    pub async fn dispatch(self) -> Result<i32> {
        let log_format = match self.log_format {
            Some(LogFormat::Text) => Some("text"),
            Some(LogFormat::Json) => Some("json"),
            None => None, // Let logging module check environment variable
        };

        let log_level = self.log_level.as_str();
        if std::env::var_os("ENVRUN_LOG").is_none() && std::env::var_os("RUST_LOG").is_none() {
            std::env::set_var(
                "RUST_LOG",
                format!("envrun={},envrun_core={}", log_level, log_level),
            );
        }
        envrun_core::logging::init(log_format)?;
        tracing::debug!("CLI initialized with log level: {}", log_level);

        match self.command {
            Some(Commands::Run {
                envs,
                recreate,
                notest,
                parallel,
                output_format,
            }) => {
                use crate::commands::run::{execute_run, RunArgs};

                let args = RunArgs {
                    envs,
                    recreate,
                    notest,
                    parallel,
                    output_format,
                    workspace_folder: self.workspace_folder,
                    config_path: self.config,
                };

                execute_run(args).await
            }
            Some(Commands::List { output_format }) => {
                use crate::commands::list::{execute_list, ListArgs};

                let args = ListArgs {
                    output_format,
                    workspace_folder: self.workspace_folder,
                    config_path: self.config,
                };

                execute_list(args)?;
                Ok(0)
            }
            None => {
                println!("Per-environment command runner");
                println!("Run 'envrun --help' to see available commands.");
                Ok(0)
            }
        }
    }
}
