//! Stage, instance and run status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The execution status of a single stage within a run instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage was skipped (guard false, or an earlier fatal stage failed).
    Skip,
    /// Stage failed.
    Fail,
    /// Stage is pending execution.
    Pending,
    /// Stage is currently running.
    Running,
}

impl Default for StageStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Skip => write!(f, "skip"),
            Self::Fail => write!(f, "fail"),
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status represents a terminal state.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Ok | Self::Skip | Self::Fail)
    }

    /// Returns true if the status indicates success.
    ///
    /// A skipped stage counts as success: its guard was false or it was
    /// never reached, neither of which is a failure of the stage itself.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok | Self::Skip)
    }

    /// Returns true if the status indicates failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

/// The overall outcome of one run instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    /// All mandatory stages succeeded.
    Succeeded,
    /// A mandatory stage failed.
    Failed,
}

impl InstanceStatus {
    /// Returns true for a succeeded instance.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded)
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// The state machine of a whole pipeline run.
///
/// Transitions: `Pending → Running → Failed`, or
/// `Pending → Running → PostSuccess → Done`. `Failed` and `Done` are the
/// only terminal states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// The run has not started.
    Pending,
    /// Run instances are executing.
    Running,
    /// All instances succeeded; deployment fan-out is in progress.
    PostSuccess,
    /// The run completed (deployment attempted or skipped by the gate).
    Done,
    /// At least one run instance failed.
    Failed,
}

impl Default for RunState {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::PostSuccess => write!(f, "post_success"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl RunState {
    /// Returns true if the state is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}
