//! Integration tests for the lifecycle controller
//!
//! Drive `run_one` against a recording environment and a scripted executor to
//! check recreation, the single recovery retry and delegation to the phased
//! executor.

mod common;

use common::{Call, RecordingEnv, ScriptedExecutor, SetupStep};
use envrun_core::errors::{EnvRunError, LifecycleError, SetupError};
use envrun_core::{run_one, Environment, PhaseKind, RunOptions, SetupState};

#[test]
fn test_recreate_cleans_with_package_before_setup() {
    let mut env = RecordingEnv::new("py").with_phase(PhaseKind::Main, &["pytest"]);
    let executor = ScriptedExecutor::new();
    let options = RunOptions {
        recreate: true,
        skip_commands: false,
    };

    let result = run_one(&mut env, &executor, options).unwrap();

    assert_eq!(result.status, 0);
    assert_eq!(
        env.calls,
        vec![
            Call::Clean {
                include_package: true
            },
            Call::Setup
        ]
    );
    assert_eq!(executor.seen_ids(), vec!["commands[0]"]);
}

#[test]
fn test_no_recreate_never_cleans() {
    let mut env = RecordingEnv::new("py");
    let executor = ScriptedExecutor::new();

    run_one(&mut env, &executor, RunOptions::default()).unwrap();

    assert_eq!(env.calls, vec![Call::Setup]);
}

#[test]
fn test_needs_recreate_once_then_runs() {
    let mut env = RecordingEnv::new("py")
        .with_setup(&[SetupStep::Recreate("stale marker"), SetupStep::Ready])
        .with_phase(PhaseKind::Main, &["pytest"]);
    let executor = ScriptedExecutor::new();

    let result = run_one(&mut env, &executor, RunOptions::default()).unwrap();

    assert_eq!(
        env.calls,
        vec![
            Call::Setup,
            Call::Clean {
                include_package: false
            },
            Call::Setup
        ]
    );
    assert_eq!(env.state(), SetupState::Ready);
    assert_eq!(result.status, 0);
    assert_eq!(result.outcomes.len(), 1);
}

#[test]
fn test_recreate_flag_and_recovery_retry_combined() {
    let mut env = RecordingEnv::new("py").with_setup(&[SetupStep::Recreate("stale")]);
    let executor = ScriptedExecutor::new();
    let options = RunOptions {
        recreate: true,
        skip_commands: false,
    };

    run_one(&mut env, &executor, options).unwrap();

    assert_eq!(
        env.calls,
        vec![
            Call::Clean {
                include_package: true
            },
            Call::Setup,
            Call::Clean {
                include_package: false
            },
            Call::Setup
        ]
    );
}

#[test]
fn test_second_needs_recreate_is_fatal() {
    let mut env = RecordingEnv::new("py")
        .with_setup(&[SetupStep::Recreate("first"), SetupStep::Recreate("second")])
        .with_phase(PhaseKind::Main, &["pytest"]);
    let executor = ScriptedExecutor::new();

    let err = run_one(&mut env, &executor, RunOptions::default()).unwrap_err();

    match err {
        EnvRunError::Lifecycle(LifecycleError::RecreateExhausted { env, reason }) => {
            assert_eq!(env, "py");
            assert_eq!(reason, "second");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(env.setup_calls(), 2);
    assert!(executor.seen().is_empty());
}

#[test]
fn test_second_setup_error_is_fatal_without_further_retry() {
    let mut env = RecordingEnv::new("py")
        .with_setup(&[SetupStep::Recreate("stale"), SetupStep::Fail])
        .with_phase(PhaseKind::Main, &["pytest"]);
    let executor = ScriptedExecutor::new();

    let err = run_one(&mut env, &executor, RunOptions::default()).unwrap_err();

    assert!(matches!(
        err,
        EnvRunError::Setup(SetupError::CommandFailed { exit_code: 9, .. })
    ));
    assert_eq!(env.setup_calls(), 2);
    assert!(executor.seen().is_empty());
}

#[test]
fn test_first_setup_error_is_not_retried() {
    let mut env = RecordingEnv::new("py").with_setup(&[SetupStep::Fail]);
    let executor = ScriptedExecutor::new();

    let err = run_one(&mut env, &executor, RunOptions::default()).unwrap_err();

    assert!(matches!(err, EnvRunError::Setup(_)));
    assert_eq!(env.calls, vec![Call::Setup]);
}

#[test]
fn test_skip_commands_still_provisions() {
    let mut env = RecordingEnv::new("py")
        .with_setup(&[SetupStep::Recreate("stale")])
        .with_phase(PhaseKind::Main, &["pytest"]);
    let executor = ScriptedExecutor::new();
    let options = RunOptions {
        recreate: false,
        skip_commands: true,
    };

    let result = run_one(&mut env, &executor, options).unwrap();

    assert_eq!(result.status, 0);
    assert!(result.outcomes.is_empty());
    assert_eq!(env.setup_calls(), 2);
    assert!(executor.seen().is_empty());
}

#[test]
fn test_result_is_returned_verbatim_from_executor() {
    let mut env = RecordingEnv::new("py")
        .with_phase(PhaseKind::Pre, &["setup-db"])
        .with_phase(PhaseKind::Main, &["pytest", "coverage"]);
    let executor = ScriptedExecutor::new().exit("commands[0]", 4);

    let result = run_one(&mut env, &executor, RunOptions::default()).unwrap();

    assert_eq!(result.status, 4);
    let ids: Vec<String> = result.outcomes.iter().map(|o| o.run_id.to_string()).collect();
    assert_eq!(ids, vec!["commands_pre[0]", "commands[0]"]);
}
