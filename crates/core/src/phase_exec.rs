//! Phased command execution
//!
//! Runs the `commands_pre`, `commands` and `commands_post` phases of a ready
//! environment strictly in order. Every invocation's outcome is kept; the first
//! failing command that does not ignore its exit code halts the run and its exit
//! code becomes the run status.
//!
//! Phase order comes from [`PhaseKind::ORDER`], not from the order in which an
//! environment lists its phase descriptors.

use crate::environment::{Environment, SetupState};
use crate::errors::{LifecycleError, Result};
use crate::execute::{ExecRequest, Executor};
use crate::outcome::{CommandOutcome, Outcome, RunResult};
use crate::phase::{PhaseKind, RunId};
use tracing::{debug, info, instrument, warn};

/// Run all command phases of `env`.
///
/// With `skip_commands` nothing is invoked and `(OK, [])` is returned without
/// touching the environment. Otherwise the environment must be
/// [`SetupState::Ready`].
#[instrument(skip_all, fields(env = %env.name(), skip_commands))]
pub fn run_commands<E, X>(env: &E, executor: &X, skip_commands: bool) -> Result<RunResult>
where
    E: Environment + ?Sized,
    X: Executor + ?Sized,
{
    if skip_commands {
        debug!("Skipping commands for {}", env.name());
        return Ok(RunResult::skipped());
    }

    if env.state() != SetupState::Ready {
        return Err(LifecycleError::NotReady {
            env: env.name().to_string(),
        }
        .into());
    }

    let mut outcomes = Vec::new();

    for kind in PhaseKind::ORDER {
        let Some(phase) = env.phases().iter().find(|p| p.kind == kind) else {
            continue;
        };
        for (index, command) in phase.commands.iter().enumerate() {
            let run_id = RunId::new(phase.kind, index);
            info!("{} {}: {}", env.name(), run_id, command);

            let outcome = executor.execute(&ExecRequest {
                args: &command.args,
                cwd: env.change_dir(),
                env: env.set_env(),
                allow_stdin: true,
                show_output: true,
                run_id,
            });
            let decision = outcome.check();
            outcomes.push(outcome);

            if command.ignore_exit_code {
                if let CommandOutcome::Halt(code) = decision {
                    debug!("{} exited with {}, ignored by policy", run_id, code);
                }
                continue;
            }

            if let CommandOutcome::Halt(status) = decision {
                warn!(
                    "{} {} failed with exit code {}, halting",
                    env.name(),
                    run_id,
                    status
                );
                return Ok(RunResult { status, outcomes });
            }
        }
    }

    Ok(RunResult {
        status: Outcome::OK,
        outcomes,
    })
}
