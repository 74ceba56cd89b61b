//! Process execution engine
//!
//! The [`Executor`] trait is the seam between run orchestration and process
//! management. [`ProcessExecutor`] is the host implementation used by the CLI;
//! tests substitute scripted executors.

use crate::outcome::Outcome;
use crate::phase::RunId;
use indexmap::IndexMap;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, error, instrument};

/// Everything an executor needs to run one command.
#[derive(Debug, Clone, Copy)]
pub struct ExecRequest<'a> {
    pub args: &'a [String],
    pub cwd: &'a Path,
    /// Variables added to the inherited process environment
    pub env: &'a IndexMap<String, String>,
    /// Pass the terminal's stdin through to the process
    pub allow_stdin: bool,
    /// Stream stdout/stderr live instead of capturing them
    pub show_output: bool,
    pub run_id: RunId,
}

/// Runs commands and reports their outcome.
///
/// Implementations must return an [`Outcome`] for every request, including
/// non-zero exits, abnormal termination and programs that cannot be started.
pub trait Executor: Send + Sync {
    fn execute(&self, request: &ExecRequest<'_>) -> Outcome;
}

impl<T: Executor + ?Sized> Executor for &T {
    fn execute(&self, request: &ExecRequest<'_>) -> Outcome {
        (**self).execute(request)
    }
}

/// Exit status and optional captured output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStatus {
    pub exit_code: i32,
    pub output: Option<String>,
}

/// Executes commands as child processes of the current process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor {
    stdout_to_stderr: bool,
}

impl ProcessExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Send the stdout of shown commands to our stderr, keeping stdout free
    /// for machine-readable output.
    pub fn with_stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }

    /// Spawn `args` and wait for it to exit.
    ///
    /// With `show_output` the child inherits stdout/stderr; otherwise both
    /// streams are captured, logged at debug level and returned combined.
    pub fn run(
        &self,
        args: &[String],
        cwd: &Path,
        env: &IndexMap<String, String>,
        allow_stdin: bool,
        show_output: bool,
    ) -> std::io::Result<ProcessStatus> {
        let (program, rest) = args.split_first().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argument list")
        })?;

        let mut command = Command::new(program);
        command.args(rest).current_dir(cwd).envs(env);
        command.stdin(if allow_stdin {
            Stdio::inherit()
        } else {
            Stdio::null()
        });

        if show_output {
            let stdout = if self.stdout_to_stderr {
                Stdio::from(std::io::stderr())
            } else {
                Stdio::inherit()
            };
            let status = command.stdout(stdout).stderr(Stdio::inherit()).status()?;
            return Ok(ProcessStatus {
                exit_code: status.code().unwrap_or(Outcome::ABNORMAL),
                output: None,
            });
        }

        let output = command.output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines() {
            debug!("[{}] stdout: {}", program, line);
        }
        for line in stderr.lines() {
            debug!("[{}] stderr: {}", program, line);
        }

        let mut combined = stdout.into_owned();
        if !stderr.is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
        }

        Ok(ProcessStatus {
            exit_code: output.status.code().unwrap_or(Outcome::ABNORMAL),
            output: Some(combined),
        })
    }
}

impl Executor for ProcessExecutor {
    #[instrument(skip_all, fields(run_id = %request.run_id, cwd = %request.cwd.display()))]
    fn execute(&self, request: &ExecRequest<'_>) -> Outcome {
        let started_at = chrono::Utc::now();
        let start = Instant::now();
        debug!("Executing: {}", shell_words::join(request.args));

        let (exit_code, output) = match self.run(
            request.args,
            request.cwd,
            request.env,
            request.allow_stdin,
            request.show_output,
        ) {
            Ok(status) => (status.exit_code, status.output),
            Err(e) => {
                error!(
                    "Failed to start {} for {}: {}",
                    request.args.first().map(String::as_str).unwrap_or("<none>"),
                    request.run_id,
                    e
                );
                (Outcome::SPAWN_FAILED, Some(e.to_string()))
            }
        };

        let elapsed = start.elapsed();
        debug!("{} exited with code {} in {:?}", request.run_id, exit_code, elapsed);

        Outcome {
            run_id: request.run_id,
            args: request.args.to_vec(),
            cwd: request.cwd.to_path_buf(),
            exit_code,
            started_at,
            elapsed,
            output,
        }
    }
}
