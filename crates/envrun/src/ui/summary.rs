//! Run summary rendering for the run command.
//!
//! Output contracts:
//! - JSON mode: one JSON document on stdout, logs and command output on stderr
//! - Text mode: human-readable results on stdout, logs on stderr

use console::style;
use envrun_core::RunResult;
use serde::Serialize;
use std::time::Duration;

/// Result of one environment as reported to the user.
#[derive(Debug, Clone, Serialize)]
pub struct EnvReport {
    pub name: String,
    /// Run status and outcomes; absent when the environment could not be set up
    #[serde(flatten)]
    pub result: Option<RunResult>,
    /// Commands were not run because of `--notest`
    pub commands_skipped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

impl EnvReport {
    pub fn finished(
        name: String,
        result: RunResult,
        commands_skipped: bool,
        elapsed: Duration,
    ) -> Self {
        Self {
            name,
            result: Some(result),
            commands_skipped,
            error: None,
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn failed(name: String, error: String, elapsed: Duration) -> Self {
        Self {
            name,
            result: None,
            commands_skipped: false,
            error: Some(error),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }

    pub fn status(&self) -> Option<i32> {
        self.result.as_ref().map(|result| result.status)
    }

    pub fn is_success(&self) -> bool {
        self.result.as_ref().is_some_and(RunResult::is_success)
    }
}

#[derive(Serialize)]
struct JsonSummary<'a> {
    success: bool,
    environments: &'a [EnvReport],
}

/// Render all reports as a single JSON document.
pub fn render_json(reports: &[EnvReport]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonSummary {
        success: reports.iter().all(EnvReport::is_success),
        environments: reports,
    })
}

/// Render all reports as human-readable text.
///
/// ```text
/// envrun summary
///   [OK] test: 3 command(s) succeeded (1.24s)
///   [X] lint: commands[0] `ruff check .` failed with exit code 1 (0.31s)
///   [X] docs: setup failed: ... (0.02s)
///   [--] build: set up, no commands run (0.40s)
/// ```
pub fn render_text(reports: &[EnvReport]) -> String {
    let mut output = String::new();
    output.push_str(&format!("{}\n", style("envrun summary").bold()));

    for report in reports {
        let seconds = report.elapsed_ms as f64 / 1000.0;
        let Some(result) = &report.result else {
            output.push_str(&format!(
                "  {} {}: {} {} ({:.2}s)\n",
                style("[X]").red(),
                report.name,
                style("setup failed:").red().bold(),
                report.error.as_deref().unwrap_or_default(),
                seconds
            ));
            continue;
        };

        let line = match result.halting_outcome() {
            Some(outcome) => format!(
                "  {} {}: {} `{}` {} {} ({:.2}s)",
                style("[X]").red(),
                report.name,
                outcome.run_id,
                outcome.command_line(),
                style("failed with exit code").red().bold(),
                outcome.exit_code,
                seconds
            ),
            None if report.commands_skipped => format!(
                "  {} {}: {} ({:.2}s)",
                style("[--]").yellow(),
                report.name,
                style("set up, no commands run").yellow(),
                seconds
            ),
            None if result.outcomes.is_empty() => format!(
                "  {} {}: {} ({:.2}s)",
                style("[OK]").green(),
                report.name,
                style("set up, no commands configured").green(),
                seconds
            ),
            None => format!(
                "  {} {}: {} ({:.2}s)",
                style("[OK]").green(),
                report.name,
                style(format!("{} command(s) succeeded", result.outcomes.len())).green(),
                seconds
            ),
        };
        output.push_str(&line);
        output.push('\n');
    }

    let failed = reports.iter().filter(|r| !r.is_success()).count();
    let message = if failed == 0 {
        style("all environments succeeded".to_string()).green()
    } else {
        style(format!(
            "{} of {} environment(s) failed",
            failed,
            reports.len()
        ))
        .red()
    };
    output.push_str(&format!("\n{}\n", message));
    output
}
