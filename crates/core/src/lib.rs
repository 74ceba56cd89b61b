//! Core library for envrun
//!
//! Per-environment run orchestration: provisioning an environment (with
//! forced recreation and a single recovery retry), then running its
//! `commands_pre`, `commands` and `commands_post` phases with halt-on-failure
//! semantics. Also hosts the configuration loader, the process execution engine,
//! the directory-backed environment, logging and error types.

pub mod command;
pub mod config;
pub mod environment;
pub mod errors;
pub mod execute;
pub mod lifecycle;
pub mod local_env;
pub mod logging;
pub mod outcome;
pub mod phase;
pub mod phase_exec;

pub use command::Command;
pub use environment::{Environment, SetupOutcome, SetupState};
pub use execute::{ExecRequest, Executor, ProcessExecutor};
pub use lifecycle::{run_one, RunOptions};
pub use outcome::{CommandOutcome, Outcome, RunResult};
pub use phase::{Phase, PhaseKind, RunId};
pub use phase_exec::run_commands;

// Re-export IndexMap for dependent crates (ordered environment tables)
pub use indexmap::IndexMap;

/// Get the version of the core library
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
