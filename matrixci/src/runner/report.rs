//! Stage and instance execution reports.

use crate::context::RunContext;
use crate::core::{InstanceStatus, StageOutcome, StageStatus};
use crate::matrix::MatrixCell;
use crate::stages::StageKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of one executed (or skipped) stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    /// The stage kind.
    pub kind: StageKind,
    /// When the stage started (skip records use the decision time).
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// The stage outcome.
    #[serde(flatten)]
    pub outcome: StageOutcome,
}

impl StageReport {
    /// Creates a report from an outcome and its timing.
    #[must_use]
    pub fn new(kind: StageKind, started_at: DateTime<Utc>, outcome: StageOutcome) -> Self {
        Self {
            kind,
            started_at,
            ended_at: Utc::now(),
            outcome,
        }
    }

    /// Creates a skip record with zero duration.
    #[must_use]
    pub fn skipped(kind: StageKind, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            kind,
            started_at: now,
            ended_at: now,
            outcome: StageOutcome::skip(reason),
        }
    }

    /// Returns the stage duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns the stage status.
    #[must_use]
    pub fn status(&self) -> StageStatus {
        self.outcome.status
    }
}

/// Record of one full run instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceReport {
    /// The matrix cell the instance was bound to.
    pub cell: MatrixCell,
    /// The resolved context the instance executed against.
    pub context: RunContext,
    /// Overall instance outcome.
    pub status: InstanceStatus,
    /// Per-stage records, in execution order.
    pub stages: Vec<StageReport>,
    /// When the instance started.
    pub started_at: DateTime<Utc>,
    /// When the instance ended.
    pub ended_at: DateTime<Utc>,
}

impl InstanceReport {
    /// Returns the instance duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns true if all mandatory stages succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Returns the report of the stage that failed the instance, if any.
    #[must_use]
    pub fn failed_stage(&self) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.status().is_failure())
    }

    /// Returns the surfaced warnings from non-fatal stage failures.
    #[must_use]
    pub fn warnings(&self) -> Vec<&StageReport> {
        self.stages.iter().filter(|s| s.outcome.has_warning()).collect()
    }

    /// Returns the report for a specific stage kind, if present.
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.kind == kind)
    }
}
