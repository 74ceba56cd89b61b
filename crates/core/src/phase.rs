//! Command phases
//!
//! Every run executes up to three phases in a fixed order: `commands_pre`,
//! `commands` and `commands_post`. The order is a constant of the type, never a
//! property of the configuration file.

use crate::command::Command;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The three command phases of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PhaseKind {
    /// Preparation commands (`commands_pre`)
    #[serde(rename = "commands_pre")]
    Pre,
    /// The environment's main commands (`commands`)
    #[serde(rename = "commands")]
    Main,
    /// Follow-up commands (`commands_post`)
    #[serde(rename = "commands_post")]
    Post,
}

impl PhaseKind {
    /// Execution order of the phases.
    pub const ORDER: [PhaseKind; 3] = [PhaseKind::Pre, PhaseKind::Main, PhaseKind::Post];

    /// The configuration key naming this phase; also used in run ids.
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseKind::Pre => "commands_pre",
            PhaseKind::Main => "commands",
            PhaseKind::Post => "commands_post",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A phase descriptor: the phase and its commands in declared order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    pub commands: Vec<Command>,
}

impl Phase {
    pub fn new(kind: PhaseKind, commands: Vec<Command>) -> Self {
        Self { kind, commands }
    }
}

/// Identifier of one command invocation: phase plus zero-based index.
///
/// Rendered as `"<phase>[<index>]"`, e.g. `commands_pre[0]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId {
    pub phase: PhaseKind,
    pub index: usize,
}

impl RunId {
    pub fn new(phase: PhaseKind, index: usize) -> Self {
        Self { phase, index }
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.phase.as_str(), self.index)
    }
}

impl Serialize for RunId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_order_is_pre_main_post() {
        assert_eq!(
            PhaseKind::ORDER,
            [PhaseKind::Pre, PhaseKind::Main, PhaseKind::Post]
        );
        assert!(PhaseKind::Pre < PhaseKind::Main && PhaseKind::Main < PhaseKind::Post);
    }

    #[test]
    fn test_phase_kind_as_str() {
        assert_eq!(PhaseKind::Pre.as_str(), "commands_pre");
        assert_eq!(PhaseKind::Main.as_str(), "commands");
        assert_eq!(PhaseKind::Post.as_str(), "commands_post");
    }

    #[test]
    fn test_run_id_display() {
        assert_eq!(RunId::new(PhaseKind::Pre, 0).to_string(), "commands_pre[0]");
        assert_eq!(RunId::new(PhaseKind::Main, 12).to_string(), "commands[12]");
        assert_eq!(
            serde_json::to_string(&RunId::new(PhaseKind::Post, 1)).unwrap(),
            "\"commands_post[1]\""
        );
    }
}
