//! Run command implementation
//!
//! Provisions each selected environment and runs its command phases, either one
//! after another or concurrently with `--parallel`. Reports are always produced
//! in selection order so the summary and the exit code do not depend on
//! scheduling.
//!
//! All environments of a configuration share one package directory. Under
//! `--parallel --recreate` every environment is cleaned, package included,
//! before any of them is scheduled; the scheduled runs then never remove
//! shared state.

use crate::cli::OutputFormat;
use crate::commands::load_config;
use crate::ui::summary::{render_json, render_text, EnvReport};
use anyhow::{Context, Result};
use envrun_core::local_env::LocalEnvironment;
use envrun_core::{run_one, Environment, ProcessExecutor, RunOptions};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument};

/// Arguments for the run command
#[derive(Debug, Clone)]
pub struct RunArgs {
    pub envs: Vec<String>,
    pub recreate: bool,
    pub notest: bool,
    pub parallel: bool,
    pub output_format: OutputFormat,
    pub workspace_folder: Option<PathBuf>,
    pub config_path: Option<PathBuf>,
}

/// Execute the run command and return the process exit code.
#[instrument(skip(args))]
pub async fn execute_run(args: RunArgs) -> Result<i32> {
    let config = load_config(args.workspace_folder.as_deref(), args.config_path.as_deref())?;
    let selected = config.select(&args.envs)?;
    info!(
        "Running {} environment(s): {}",
        selected.len(),
        selected
            .iter()
            .map(|env| env.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let environments: Vec<LocalEnvironment> = selected
        .into_iter()
        .map(|env| LocalEnvironment::new(env.clone(), &config.work_dir))
        .collect();

    let options = RunOptions {
        recreate: args.recreate,
        skip_commands: args.notest,
    };
    let executor =
        ProcessExecutor::new().with_stdout_to_stderr(args.output_format == OutputFormat::Json);

    let reports = if args.parallel {
        run_parallel(environments, executor, options).await?
    } else {
        environments
            .into_iter()
            .map(|env| run_environment(env, &executor, options))
            .collect()
    };

    match args.output_format {
        OutputFormat::Json => println!("{}", render_json(&reports)?),
        OutputFormat::Text => print!("{}", render_text(&reports)),
    }

    Ok(exit_code(&reports))
}

async fn run_parallel(
    mut environments: Vec<LocalEnvironment>,
    executor: ProcessExecutor,
    options: RunOptions,
) -> Result<Vec<EnvReport>> {
    debug!("Scheduling {} environment(s) concurrently", environments.len());

    let prepared: Vec<_> = environments
        .iter_mut()
        .map(|env| {
            if options.recreate {
                info!("Recreating environment {}", env.name());
                env.clean(true).map_err(|e| e.to_string())
            } else {
                Ok(())
            }
        })
        .collect();
    let scheduled = RunOptions {
        recreate: false,
        ..options
    };

    let handles: Vec<_> = environments
        .into_iter()
        .zip(prepared)
        .map(|(env, prepared)| {
            tokio::task::spawn_blocking(move || match prepared {
                Ok(()) => run_environment(env, &executor, scheduled),
                Err(message) => {
                    let name = env.config().name.clone();
                    error!("{} could not be cleaned: {}", name, message);
                    EnvReport::failed(name, message, Duration::ZERO)
                }
            })
        })
        .collect();

    let mut reports = Vec::with_capacity(handles.len());
    for handle in handles {
        reports.push(handle.await.context("Environment task panicked")?);
    }
    Ok(reports)
}

fn run_environment(
    mut env: LocalEnvironment,
    executor: &ProcessExecutor,
    options: RunOptions,
) -> EnvReport {
    let name = env.config().name.clone();
    let start = Instant::now();

    match run_one(&mut env, executor, options) {
        Ok(result) => {
            info!("{} finished with status {}", name, result.status);
            EnvReport::finished(name, result, options.skip_commands, start.elapsed())
        }
        Err(e) => {
            error!("{} failed: {}", name, e);
            EnvReport::failed(name, e.to_string(), start.elapsed())
        }
    }
}

/// Status of the first unsuccessful environment in selection order, `1` when
/// that environment could not be set up, `0` when everything succeeded.
pub(crate) fn exit_code(reports: &[EnvReport]) -> i32 {
    reports
        .iter()
        .find(|report| !report.is_success())
        .map(|report| report.status().unwrap_or(1))
        .unwrap_or(0)
}
