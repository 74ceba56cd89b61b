//! Execution environment abstraction
//!
//! An [`Environment`] owns its provisioning state and configuration for the
//! duration of a run. Provisioning reports an unusable existing environment as
//! [`SetupOutcome::NeedsRecreate`] instead of an error, so callers can recover
//! with a clean rebuild.

use crate::errors::Result;
use crate::phase::Phase;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Provisioning state of an environment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupState {
    #[default]
    NotSetup,
    Ready,
}

/// Result of a provisioning attempt that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupOutcome {
    /// The environment is provisioned and commands may run.
    Ready,
    /// Existing state is unusable; the environment must be rebuilt
    /// (without touching the shared package artifact) before retrying.
    NeedsRecreate { reason: String },
}

/// A provisioned execution context commands run against.
pub trait Environment {
    fn name(&self) -> &str;

    fn state(&self) -> SetupState;

    /// Phase descriptors. Execution order is [`PhaseKind::ORDER`](crate::phase::PhaseKind::ORDER)
    /// regardless of the order returned here.
    fn phases(&self) -> &[Phase];

    /// Working directory for commands.
    fn change_dir(&self) -> &Path;

    /// Extra environment variables for commands.
    fn set_env(&self) -> &IndexMap<String, String>;

    /// Tear the environment down. With `include_package` the shared package
    /// artifact is removed as well.
    fn clean(&mut self, include_package: bool) -> Result<()>;

    /// Provision the environment. Idempotent once [`SetupState::Ready`].
    fn setup(&mut self) -> Result<SetupOutcome>;
}

impl<E: Environment + ?Sized> Environment for &mut E {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn state(&self) -> SetupState {
        (**self).state()
    }

    fn phases(&self) -> &[Phase] {
        (**self).phases()
    }

    fn change_dir(&self) -> &Path {
        (**self).change_dir()
    }

    fn set_env(&self) -> &IndexMap<String, String> {
        (**self).set_env()
    }

    fn clean(&mut self, include_package: bool) -> Result<()> {
        (**self).clean(include_package)
    }

    fn setup(&mut self) -> Result<SetupOutcome> {
        (**self).setup()
    }
}
