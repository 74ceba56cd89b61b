//! Command outcomes
//!
//! An [`Outcome`] records one command invocation. It is produced by an
//! [`Executor`](crate::execute::Executor); the run orchestration only collects
//! and inspects it.

use crate::phase::RunId;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;

/// Result of one command invocation.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    /// Phase and index this invocation belongs to
    pub run_id: RunId,
    /// Argument vector that was executed
    pub args: Vec<String>,
    /// Working directory of the process
    pub cwd: PathBuf,
    /// Exit code; `-1` for abnormal termination, `127` when the process could not start
    pub exit_code: i32,
    /// Wall clock start of the invocation
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// Time until the process exited
    #[serde(serialize_with = "serialize_millis", rename = "elapsed_ms")]
    pub elapsed: Duration,
    /// Captured output when it was not shown live
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

/// Decision taken after inspecting an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    /// Proceed with the next command
    Continue,
    /// Stop the run, propagating this status
    Halt(i32),
}

impl Outcome {
    /// Status of a successful command and of a fully successful run.
    pub const OK: i32 = 0;
    /// Exit code used when the process terminated without one (e.g. a signal).
    pub const ABNORMAL: i32 = -1;
    /// Exit code used when the program could not be started.
    pub const SPAWN_FAILED: i32 = 127;

    pub fn is_success(&self) -> bool {
        self.exit_code == Self::OK
    }

    /// Map the exit code onto a continue/halt decision.
    pub fn check(&self) -> CommandOutcome {
        if self.is_success() {
            CommandOutcome::Continue
        } else {
            CommandOutcome::Halt(self.exit_code)
        }
    }

    /// Shell-quoted command line, for reporting.
    pub fn command_line(&self) -> String {
        shell_words::join(&self.args)
    }
}

/// Final status of a run plus every outcome it produced, in invocation order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunResult {
    /// `Outcome::OK`, or the exit code of the command that halted the run
    pub status: i32,
    pub outcomes: Vec<Outcome>,
}

impl RunResult {
    /// A successful run that produced no outcomes (commands skipped).
    pub fn skipped() -> Self {
        Self {
            status: Outcome::OK,
            outcomes: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Outcome::OK
    }

    /// The outcome that halted the run, if any.
    pub fn halting_outcome(&self) -> Option<&Outcome> {
        if self.is_success() {
            return None;
        }
        self.outcomes.last()
    }
}

fn serialize_millis<S: serde::Serializer>(
    elapsed: &Duration,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(elapsed.as_millis() as u64)
}
