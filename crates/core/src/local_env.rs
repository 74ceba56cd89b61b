//! Directory-backed environments
//!
//! A [`LocalEnvironment`] lives in `<work_dir>/<name>` and shares the package
//! directory `<work_dir>/.pkg` with every other environment of the same
//! configuration. Provisioning runs the environment's setup commands once and
//! then records a marker holding a fingerprint of the provisioning inputs:
//!
//! - marker missing: provision from scratch
//! - marker matches the current configuration: reuse as is
//! - marker stale or unreadable: report [`SetupOutcome::NeedsRecreate`]
//!
//! A failed provisioning removes the environment directory again, so a later
//! attempt always starts from scratch.

use crate::config::EnvConfig;
use crate::environment::{Environment, SetupOutcome, SetupState};
use crate::errors::{Result, SetupError};
use crate::execute::ProcessExecutor;
use crate::outcome::Outcome;
use crate::phase::Phase;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, instrument, warn};

/// Name of the shared package directory inside the work directory.
pub const PACKAGE_DIR_NAME: &str = ".pkg";

/// Marker file written into a provisioned environment directory.
pub const MARKER_FILE_NAME: &str = ".envrun-env.json";

/// Contents of the environment marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvMarker {
    pub name: String,
    /// SHA-256 over the provisioning inputs, hex encoded
    pub fingerprint: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// What was found at the marker path.
#[derive(Debug)]
enum MarkerRead {
    Missing,
    Corrupt(String),
    Present(EnvMarker),
}

/// An environment provisioned in a directory on the host.
#[derive(Debug)]
pub struct LocalEnvironment {
    config: EnvConfig,
    env_dir: PathBuf,
    package_dir: PathBuf,
    set_env: IndexMap<String, String>,
    state: SetupState,
    executor: ProcessExecutor,
}

impl LocalEnvironment {
    pub fn new(config: EnvConfig, work_dir: &Path) -> Self {
        let env_dir = work_dir.join(&config.name);
        let package_dir = work_dir.join(PACKAGE_DIR_NAME);

        let mut set_env = IndexMap::new();
        set_env.insert("ENVRUN_ENV_NAME".to_string(), config.name.clone());
        set_env.insert(
            "ENVRUN_ENV_DIR".to_string(),
            env_dir.display().to_string(),
        );
        set_env.insert(
            "ENVRUN_PACKAGE_DIR".to_string(),
            package_dir.display().to_string(),
        );
        for (key, value) in &config.set_env {
            set_env.insert(key.clone(), value.clone());
        }

        Self {
            config,
            env_dir,
            package_dir,
            set_env,
            state: SetupState::NotSetup,
            executor: ProcessExecutor::new(),
        }
    }

    pub fn config(&self) -> &EnvConfig {
        &self.config
    }

    pub fn env_dir(&self) -> &Path {
        &self.env_dir
    }

    pub fn package_dir(&self) -> &Path {
        &self.package_dir
    }

    pub fn marker_path(&self) -> PathBuf {
        self.env_dir.join(MARKER_FILE_NAME)
    }

    /// Fingerprint of everything that affects provisioning.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.config.change_dir.display().to_string().as_bytes());
        hasher.update(b"\0");
        for command in &self.config.setup_commands {
            for arg in &command.args {
                hasher.update(arg.as_bytes());
                hasher.update(b"\0");
            }
            hasher.update([u8::from(command.ignore_exit_code), 1]);
        }
        for (key, value) in &self.config.set_env {
            hasher.update(key.as_bytes());
            hasher.update(b"=");
            hasher.update(value.as_bytes());
            hasher.update(b"\0");
        }
        format!("{:x}", hasher.finalize())
    }

    fn read_marker(&self) -> MarkerRead {
        let path = self.marker_path();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return MarkerRead::Missing,
            Err(e) => return MarkerRead::Corrupt(e.to_string()),
        };
        match serde_json::from_str::<EnvMarker>(&content) {
            Ok(marker) => MarkerRead::Present(marker),
            Err(e) => MarkerRead::Corrupt(e.to_string()),
        }
    }

    fn write_marker(&self, marker: &EnvMarker) -> Result<()> {
        let path = self.marker_path();
        let marker_error = |message: String| SetupError::Marker {
            path: path.display().to_string(),
            message,
        };

        let content =
            serde_json::to_string_pretty(marker).map_err(|e| marker_error(e.to_string()))?;

        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, content).map_err(|e| marker_error(e.to_string()))?;
        std::fs::rename(&temp_path, &path).map_err(|e| marker_error(e.to_string()))?;
        debug!("Wrote environment marker {}", path.display());
        Ok(())
    }

    fn run_setup_commands(&self) -> Result<()> {
        for command in &self.config.setup_commands {
            info!("{} setup: {}", self.config.name, command);
            let exit_code = match self.executor.run(
                &command.args,
                &self.config.change_dir,
                &self.set_env,
                false,
                false,
            ) {
                Ok(status) => status.exit_code,
                Err(e) => {
                    error!("Failed to start setup command `{}`: {}", command, e);
                    Outcome::SPAWN_FAILED
                }
            };

            if exit_code != Outcome::OK {
                if command.ignore_exit_code {
                    debug!("Setup command `{}` exited with {}, ignored", command, exit_code);
                    continue;
                }
                return Err(SetupError::CommandFailed {
                    env: self.config.name.clone(),
                    command: command.command_line(),
                    exit_code,
                }
                .into());
            }
        }
        Ok(())
    }
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|source| SetupError::Io {
        action: "create",
        path: path.display().to_string(),
        source,
    })?;
    Ok(())
}

fn remove_dir(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(SetupError::Io {
            action: "remove",
            path: path.display().to_string(),
            source,
        }
        .into()),
    }
}

impl Environment for LocalEnvironment {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn state(&self) -> SetupState {
        self.state
    }

    fn phases(&self) -> &[Phase] {
        &self.config.phases
    }

    fn change_dir(&self) -> &Path {
        &self.config.change_dir
    }

    fn set_env(&self) -> &IndexMap<String, String> {
        &self.set_env
    }

    #[instrument(skip(self), fields(env = %self.config.name))]
    fn clean(&mut self, include_package: bool) -> Result<()> {
        self.state = SetupState::NotSetup;
        remove_dir(&self.env_dir)?;
        if include_package {
            remove_dir(&self.package_dir)?;
        }
        Ok(())
    }

    #[instrument(skip(self), fields(env = %self.config.name))]
    fn setup(&mut self) -> Result<SetupOutcome> {
        if self.state == SetupState::Ready {
            return Ok(SetupOutcome::Ready);
        }

        let fingerprint = self.fingerprint();
        match self.read_marker() {
            MarkerRead::Missing => {}
            MarkerRead::Corrupt(reason) => {
                warn!("Unreadable marker for {}: {}", self.config.name, reason);
                return Ok(SetupOutcome::NeedsRecreate {
                    reason: format!("unreadable environment marker: {}", reason),
                });
            }
            MarkerRead::Present(marker) => {
                if marker.name != self.config.name || marker.fingerprint != fingerprint {
                    return Ok(SetupOutcome::NeedsRecreate {
                        reason: "configuration changed since the environment was created"
                            .to_string(),
                    });
                }
                debug!("Reusing environment {}", self.env_dir.display());
                create_dir(&self.package_dir)?;
                self.state = SetupState::Ready;
                return Ok(SetupOutcome::Ready);
            }
        }

        info!("Creating environment {} in {}", self.config.name, self.env_dir.display());
        create_dir(&self.env_dir)?;
        create_dir(&self.package_dir)?;
        let provisioned = self.run_setup_commands().and_then(|()| {
            self.write_marker(&EnvMarker {
                name: self.config.name.clone(),
                fingerprint,
                created_at: chrono::Utc::now(),
            })
        });
        if let Err(e) = provisioned {
            // a directory without a marker must not be mistaken for a fresh one
            if let Err(cleanup) = remove_dir(&self.env_dir) {
                warn!("Failed to remove partial environment: {}", cleanup);
            }
            return Err(e);
        }

        self.state = SetupState::Ready;
        Ok(SetupOutcome::Ready)
    }
}
