//! Shared fakes for core integration tests.
#![allow(dead_code)]

use envrun_core::environment::{Environment, SetupOutcome, SetupState};
use envrun_core::errors::{Result, SetupError};
use envrun_core::execute::{ExecRequest, Executor};
use envrun_core::outcome::Outcome;
use envrun_core::phase::{Phase, PhaseKind};
use envrun_core::{Command, IndexMap};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// What the next `setup` call of a [`RecordingEnv`] does.
#[derive(Debug, Clone)]
pub enum SetupStep {
    Ready,
    Recreate(&'static str),
    Fail,
}

/// Calls observed on a [`RecordingEnv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Clean { include_package: bool },
    Setup,
}

/// Environment whose setup results are scripted and whose calls are recorded.
pub struct RecordingEnv {
    name: String,
    state: SetupState,
    phases: Vec<Phase>,
    dir: PathBuf,
    env: IndexMap<String, String>,
    steps: VecDeque<SetupStep>,
    pub calls: Vec<Call>,
}

impl RecordingEnv {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            state: SetupState::NotSetup,
            phases: PhaseKind::ORDER
                .iter()
                .map(|kind| Phase::new(*kind, Vec::new()))
                .collect(),
            dir: PathBuf::from("/tmp/envrun-fake"),
            env: IndexMap::new(),
            steps: VecDeque::new(),
            calls: Vec::new(),
        }
    }

    /// Script setup results; once exhausted every setup succeeds.
    pub fn with_setup(mut self, steps: &[SetupStep]) -> Self {
        self.steps = steps.iter().cloned().collect();
        self
    }

    pub fn with_phase(mut self, kind: PhaseKind, lines: &[&str]) -> Self {
        let commands = lines
            .iter()
            .map(|line| Command::parse(line).unwrap())
            .collect();
        for phase in &mut self.phases {
            if phase.kind == kind {
                phase.commands = commands;
                return self;
            }
        }
        unreachable!("all phases are present")
    }

    pub fn with_var(mut self, key: &str, value: &str) -> Self {
        self.env.insert(key.to_string(), value.to_string());
        self
    }

    /// Phases listed in reverse order.
    pub fn reversed(mut self) -> Self {
        self.phases.reverse();
        self
    }

    pub fn setup_calls(&self) -> usize {
        self.calls.iter().filter(|c| **c == Call::Setup).count()
    }
}

impl Environment for RecordingEnv {
    fn name(&self) -> &str {
        &self.name
    }

    fn state(&self) -> SetupState {
        self.state
    }

    fn phases(&self) -> &[Phase] {
        &self.phases
    }

    fn change_dir(&self) -> &Path {
        &self.dir
    }

    fn set_env(&self) -> &IndexMap<String, String> {
        &self.env
    }

    fn clean(&mut self, include_package: bool) -> Result<()> {
        self.calls.push(Call::Clean { include_package });
        self.state = SetupState::NotSetup;
        Ok(())
    }

    fn setup(&mut self) -> Result<SetupOutcome> {
        self.calls.push(Call::Setup);
        match self.steps.pop_front().unwrap_or(SetupStep::Ready) {
            SetupStep::Ready => {
                self.state = SetupState::Ready;
                Ok(SetupOutcome::Ready)
            }
            SetupStep::Recreate(reason) => Ok(SetupOutcome::NeedsRecreate {
                reason: reason.to_string(),
            }),
            SetupStep::Fail => Err(SetupError::CommandFailed {
                env: self.name.clone(),
                command: "provision".to_string(),
                exit_code: 9,
            }
            .into()),
        }
    }
}

/// A request as seen by [`ScriptedExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenRequest {
    pub run_id: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub allow_stdin: bool,
    pub show_output: bool,
}

/// Executor returning a scripted exit code per run id (0 when unscripted).
#[derive(Default)]
pub struct ScriptedExecutor {
    codes: HashMap<String, i32>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exit(mut self, run_id: &str, code: i32) -> Self {
        self.codes.insert(run_id.to_string(), code);
        self
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn seen_ids(&self) -> Vec<String> {
        self.seen().into_iter().map(|r| r.run_id).collect()
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, request: &ExecRequest<'_>) -> Outcome {
        let run_id = request.run_id.to_string();
        let exit_code = self.codes.get(&run_id).copied().unwrap_or(Outcome::OK);
        self.seen.lock().unwrap().push(SeenRequest {
            run_id,
            args: request.args.to_vec(),
            cwd: request.cwd.to_path_buf(),
            env: request
                .env
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            allow_stdin: request.allow_stdin,
            show_output: request.show_output,
        });
        Outcome {
            run_id: request.run_id,
            args: request.args.to_vec(),
            cwd: request.cwd.to_path_buf(),
            exit_code,
            started_at: chrono::Utc::now(),
            elapsed: Duration::from_millis(1),
            output: None,
        }
    }
}
