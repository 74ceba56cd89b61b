//! Environment lifecycle control
//!
//! Drives one environment through provisioning and then hands it to the phased
//! executor:
//!
//! ```text
//! NotSetup -> setup -> Ready -> run_commands
//!               |
//!               +-> NeedsRecreate -> clean(package = false) -> setup -> Ready
//!                                                               |
//!                                                               +-> error (fatal)
//! ```
//!
//! A forced recreation cleans the environment together with the shared package
//! artifact before the first setup attempt. At most one recovery retry happens
//! per run; anything that goes wrong after it is returned to the caller.

use crate::environment::{Environment, SetupOutcome};
use crate::errors::{LifecycleError, Result};
use crate::execute::Executor;
use crate::outcome::RunResult;
use crate::phase_exec::run_commands;
use tracing::{info, instrument, warn};

/// Per-run switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Destroy the environment and the shared package artifact before setup
    pub recreate: bool,
    /// Provision only; do not run any command phase
    pub skip_commands: bool,
}

/// Provision `env` and run its command phases.
///
/// Returns the run status and the outcomes of every invoked command. A setup
/// failure that survives the single recovery retry is returned as an error and
/// no result is produced.
#[instrument(skip_all, fields(env = %env.name(), recreate = options.recreate, skip_commands = options.skip_commands))]
pub fn run_one<E, X>(env: &mut E, executor: &X, options: RunOptions) -> Result<RunResult>
where
    E: Environment + ?Sized,
    X: Executor + ?Sized,
{
    if options.recreate {
        info!("Recreating environment {}", env.name());
        env.clean(true)?;
    }

    provision(env)?;

    run_commands(env, executor, options.skip_commands)
}

/// Set the environment up, rebuilding it once if setup asks for recreation.
#[instrument(skip_all, fields(env = %env.name()))]
pub fn provision<E>(env: &mut E) -> Result<()>
where
    E: Environment + ?Sized,
{
    let reason = match env.setup()? {
        SetupOutcome::Ready => return Ok(()),
        SetupOutcome::NeedsRecreate { reason } => reason,
    };

    warn!(
        "Environment {} must be recreated ({}), retrying setup once",
        env.name(),
        reason
    );
    env.clean(false)?;

    match env.setup()? {
        SetupOutcome::Ready => {
            info!("Environment {} recreated", env.name());
            Ok(())
        }
        SetupOutcome::NeedsRecreate { reason } => Err(LifecycleError::RecreateExhausted {
            env: env.name().to_string(),
            reason,
        }
        .into()),
    }
}
