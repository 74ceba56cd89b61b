//! Error types and handling
//!
//! Domain-specific error enums (configuration, environment setup, lifecycle)
//! are wrapped in [`EnvRunError`] for unified handling by callers.
//!
//! Command failures are not errors: a failing command produces an
//! [`Outcome`](crate::outcome::Outcome) and, unless ignored, halts the run with
//! its exit status. Only provisioning that cannot be made to work surfaces here.

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file parsing error
    #[error("Failed to parse configuration file: {message}")]
    Parsing { message: String },

    /// Configuration validation error
    #[error("Configuration validation error: {message}")]
    Validation { message: String },

    /// Configuration file I/O error
    #[error("Failed to read configuration file")]
    Io(#[from] std::io::Error),

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: String },

    /// Requested environment is not declared in the configuration
    #[error("Unknown environment '{name}' (available: {})", available.join(", "))]
    UnknownEnv {
        name: String,
        available: Vec<String>,
    },
}

/// Environment provisioning errors
#[derive(Error, Debug)]
pub enum SetupError {
    /// Filesystem operation on the environment or package directory failed
    #[error("Failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Environment marker could not be written
    #[error("Failed to write environment marker {path}: {message}")]
    Marker { path: String, message: String },

    /// A setup command exited unsuccessfully
    #[error("Setup command `{command}` for environment {env} failed with exit code {exit_code}")]
    CommandFailed {
        env: String,
        command: String,
        exit_code: i32,
    },
}

/// Lifecycle orchestration errors
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Setup asked for recreation again after the single recovery retry
    #[error("Environment {env} still requires recreation after one retry: {reason}")]
    RecreateExhausted { env: String, reason: String },

    /// Commands were requested against an environment that is not set up
    #[error("Environment {env} is not set up")]
    NotReady { env: String },
}

/// Main error enum wrapping all domain-specific errors
#[derive(Error, Debug)]
pub enum EnvRunError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Environment provisioning errors
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// Lifecycle orchestration errors
    #[error("Lifecycle error: {0}")]
    Lifecycle(#[from] LifecycleError),
}

/// Convenience type alias for Results with EnvRunError
pub type Result<T> = std::result::Result<T, EnvRunError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::Parsing {
            message: "expected `=`".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Failed to parse configuration file: expected `=`"
        );

        let error = ConfigError::UnknownEnv {
            name: "docs".to_string(),
            available: vec!["test".to_string(), "lint".to_string()],
        };
        assert_eq!(
            format!("{}", error),
            "Unknown environment 'docs' (available: test, lint)"
        );
    }

    #[test]
    fn test_setup_error_display() {
        let error = SetupError::CommandFailed {
            env: "py".to_string(),
            command: "pip install -e .".to_string(),
            exit_code: 2,
        };
        assert_eq!(
            format!("{}", error),
            "Setup command `pip install -e .` for environment py failed with exit code 2"
        );
    }

    #[test]
    fn test_lifecycle_error_display() {
        let error = LifecycleError::RecreateExhausted {
            env: "py".to_string(),
            reason: "configuration changed".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Environment py still requires recreation after one retry: configuration changed"
        );
    }

    #[test]
    fn test_envrun_error_from_domain_errors() {
        let err: EnvRunError = ConfigError::NotFound {
            path: "envrun.toml".to_string(),
        }
        .into();
        assert!(matches!(err, EnvRunError::Config(_)));

        let err: EnvRunError = LifecycleError::NotReady {
            env: "py".to_string(),
        }
        .into();
        assert!(matches!(err, EnvRunError::Lifecycle(_)));
        assert!(err.to_string().starts_with("Lifecycle error:"));
    }

    #[test]
    fn test_error_source_chain() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = EnvRunError::Setup(SetupError::Io {
            action: "remove",
            path: "/tmp/env".to_string(),
            source: io_error,
        });

        let source = err.source().expect("setup error as source");
        assert!(source.source().is_some());
    }

    #[test]
    fn test_anyhow_conversion() {
        let err = EnvRunError::Lifecycle(LifecycleError::NotReady {
            env: "lint".to_string(),
        });
        let anyhow_error = anyhow::Error::from(err);
        assert!(anyhow_error.to_string().contains("not set up"));
    }
}
