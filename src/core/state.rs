//! Execution state models

use serde::{Deserialize, Serialize};

/// Lifecycle of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutorState {
    /// The cursor has not been created yet
    NotStarted,
    /// The cursor exists and has not run off the end of the action list
    Running,
    /// Every action has been executed
    Complete,
}

impl ExecutorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutorState::NotStarted => "NotStarted",
            ExecutorState::Running => "Running",
            ExecutorState::Complete => "Complete",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "NotStarted" => Some(ExecutorState::NotStarted),
            "Running" => Some(ExecutorState::Running),
            "Complete" => Some(ExecutorState::Complete),
            _ => None,
        }
    }
}

/// Recorded result of one action instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Position in the pipeline
    pub index: usize,

    pub action_name: String,

    pub completed: bool,

    /// Only ever true together with `completed`
    pub failed: bool,
}

impl ActionOutcome {
    /// Executed and reported success
    pub fn succeeded(&self) -> bool {
        self.completed && !self.failed
    }
}
