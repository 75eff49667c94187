//! Stage outcome type with factory methods.

use super::StageStatus;
use crate::command::CommandOutput;
use serde::{Deserialize, Serialize};

/// The outcome of executing one stage.
///
/// Immutable once created. Captured command output is always carried so
/// diagnostics are never discarded, including for the non-fatal
/// documentation stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageOutcome {
    /// The status of the stage execution.
    pub status: StageStatus,

    /// Captured output of the invoked command, when one was invoked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<CommandOutput>,

    /// Error message (for fatal failures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Warning message (for non-fatal failures that must be surfaced).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,

    /// Skip reason (for skipped stages).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl StageOutcome {
    /// Creates a successful outcome carrying the captured output.
    #[must_use]
    pub fn ok(output: CommandOutput) -> Self {
        Self {
            status: StageStatus::Ok,
            output: Some(output),
            error: None,
            warning: None,
            skip_reason: None,
        }
    }

    /// Creates a skip outcome with a reason.
    #[must_use]
    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            status: StageStatus::Skip,
            output: None,
            error: None,
            warning: None,
            skip_reason: Some(reason.into()),
        }
    }

    /// Creates a fatal failure outcome.
    #[must_use]
    pub fn fail(error: impl Into<String>, output: Option<CommandOutput>) -> Self {
        Self {
            status: StageStatus::Fail,
            output,
            error: Some(error.into()),
            warning: None,
            skip_reason: None,
        }
    }

    /// Creates a non-fatal warning outcome.
    ///
    /// The stage command failed but the stage is not a mandatory gate; the
    /// captured output is kept so the failure stays visible.
    #[must_use]
    pub fn warn(warning: impl Into<String>, output: CommandOutput) -> Self {
        Self {
            status: StageStatus::Ok,
            output: Some(output),
            error: None,
            warning: Some(warning.into()),
            skip_reason: None,
        }
    }

    /// Returns true if the outcome indicates success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns true if the outcome indicates a fatal failure.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        self.status.is_failure()
    }

    /// Returns true if the outcome carries a surfaced warning.
    #[must_use]
    pub fn has_warning(&self) -> bool {
        self.warning.is_some()
    }
}
