//! Run-instance executor.

use super::{InstanceReport, StageReport};
use crate::command::CommandRunner;
use crate::context::RunContext;
use crate::core::{InstanceStatus, StageOutcome};
use crate::events::EventSink;
use crate::matrix::MatrixCell;
use crate::stages::{StageKind, StagePlan};
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

/// Executes the fixed stage sequence for one matrix cell.
///
/// Stages run strictly in declaration order. A failing mandatory stage
/// aborts the remaining stages of this instance only; the docs stage is
/// guarded by the cell's flag and its failure is surfaced as a warning
/// without blocking the test stage.
pub struct InstanceRunner {
    runner: Arc<dyn CommandRunner>,
    sink: Arc<dyn EventSink>,
    run_id: Uuid,
}

impl InstanceRunner {
    /// Creates an instance runner emitting events correlated to `run_id`.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, sink: Arc<dyn EventSink>, run_id: Uuid) -> Self {
        Self {
            runner,
            sink,
            run_id,
        }
    }

    /// Runs all stages for one cell and returns the instance report.
    pub async fn run(&self, cell: &MatrixCell, ctx: &RunContext, plan: &StagePlan) -> InstanceReport {
        let started_at = Utc::now();
        let label = cell.label();

        self.sink.try_emit(
            "instance.started",
            Some(serde_json::json!({ "run_id": self.run_id, "cell": label })),
        );

        let mut stages = Vec::with_capacity(StageKind::ORDERED.len());
        let mut fatal_failure = false;

        for kind in StageKind::ORDERED {
            if fatal_failure {
                self.emit_stage(&label, kind, "stage.skipped", None);
                stages.push(StageReport::skipped(kind, "earlier stage failed"));
                continue;
            }

            if !kind.runs_for(ctx) {
                self.emit_stage(&label, kind, "stage.skipped", None);
                stages.push(StageReport::skipped(kind, "docs disabled for this cell"));
                continue;
            }

            let stage_started = Utc::now();
            self.emit_stage(&label, kind, "stage.started", None);

            let spec = plan.command(kind);
            let outcome = match self.runner.run(spec).await {
                Ok(output) if output.success => StageOutcome::ok(output),
                Ok(output) => {
                    let detail = kind.failure(output.diagnostic()).to_string();
                    if kind.is_fatal() {
                        StageOutcome::fail(detail, Some(output))
                    } else {
                        StageOutcome::warn(detail, output)
                    }
                }
                Err(err) => {
                    let detail = kind.failure(err.to_string()).to_string();
                    // A spawn failure in the optional docs stage is still
                    // only a warning for the instance.
                    if kind.is_fatal() {
                        StageOutcome::fail(detail, None)
                    } else {
                        StageOutcome::warn(detail, crate::command::CommandOutput::default())
                    }
                }
            };

            if outcome.is_failure() {
                fatal_failure = true;
                self.emit_stage(&label, kind, "stage.failed", outcome.error.clone());
            } else if outcome.has_warning() {
                self.emit_stage(&label, kind, "stage.warning", outcome.warning.clone());
            } else {
                self.emit_stage(&label, kind, "stage.completed", None);
            }

            stages.push(StageReport::new(kind, stage_started, outcome));
        }

        let status = if fatal_failure {
            InstanceStatus::Failed
        } else {
            InstanceStatus::Succeeded
        };

        self.sink.try_emit(
            if status.is_success() {
                "instance.completed"
            } else {
                "instance.failed"
            },
            Some(serde_json::json!({ "run_id": self.run_id, "cell": label })),
        );

        InstanceReport {
            cell: cell.clone(),
            context: ctx.clone(),
            status,
            stages,
            started_at,
            ended_at: Utc::now(),
        }
    }

    fn emit_stage(&self, cell: &str, kind: StageKind, event: &str, detail: Option<String>) {
        let mut data = serde_json::json!({
            "run_id": self.run_id,
            "cell": cell,
            "stage": kind.to_string(),
        });
        if let (Some(detail), serde_json::Value::Object(map)) = (detail, &mut data) {
            map.insert("detail".to_string(), serde_json::json!(detail));
        }
        self.sink.try_emit(event, Some(data));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TriggerFacts;
    use crate::core::StageStatus;
    use crate::deploy::TagPattern;
    use crate::events::{CollectingEventSink, NoOpEventSink};
    use crate::testing::{sample_stage_commands, ScriptedRunner};

    fn run_one(
        runner: ScriptedRunner,
        build_docs: bool,
    ) -> (InstanceReport, Arc<CollectingEventSink>) {
        let cell = MatrixCell::new("linux", "3.12", "1.26", build_docs);
        let ctx = RunContext::resolve(
            &TriggerFacts::new("", "main", "landlab/landlab"),
            &cell,
            &TagPattern::new("v*").unwrap(),
        );
        let plan = sample_stage_commands().plan_for(&ctx);
        let sink = Arc::new(CollectingEventSink::new());
        let instance = InstanceRunner::new(Arc::new(runner), sink.clone(), Uuid::new_v4());

        let report = tokio_test::block_on(instance.run(&cell, &ctx, &plan));
        (report, sink)
    }

    #[test]
    fn test_all_stages_succeed() {
        let (report, _) = run_one(ScriptedRunner::new(), true);
        assert!(report.is_success());
        assert_eq!(report.stages.len(), 5);
        assert!(report.stages.iter().all(|s| s.status() == StageStatus::Ok));
    }

    #[test]
    fn test_docs_skipped_when_cell_disables_it() {
        let (report, _) = run_one(ScriptedRunner::new(), false);
        assert!(report.is_success());
        let docs = report.stage(StageKind::Docs).unwrap();
        assert_eq!(docs.status(), StageStatus::Skip);
        // The test stage still ran.
        let test = report.stage(StageKind::Test).unwrap();
        assert_eq!(test.status(), StageStatus::Ok);
    }

    #[test]
    fn test_docs_failure_is_non_fatal_and_surfaced() {
        let runner = ScriptedRunner::new().fail_on("scripts/docs.sh", "sphinx: broken reference");
        let (report, sink) = run_one(runner, true);

        assert!(report.is_success());
        let docs = report.stage(StageKind::Docs).unwrap();
        assert_eq!(docs.status(), StageStatus::Ok);
        assert!(docs.outcome.has_warning());
        assert!(docs
            .outcome
            .output
            .as_ref()
            .is_some_and(|o| o.stderr.contains("broken reference")));

        // Test still ran after the docs warning.
        assert_eq!(report.stage(StageKind::Test).unwrap().status(), StageStatus::Ok);
        assert_eq!(report.warnings().len(), 1);
        assert!(sink.event_types().contains(&"stage.warning".to_string()));
    }

    #[test]
    fn test_build_failure_aborts_remaining_stages() {
        let runner = ScriptedRunner::new().fail_on("scripts/build.sh", "compiler exploded");
        let (report, calls_sink) = run_one(runner, true);

        assert!(!report.is_success());
        assert_eq!(report.failed_stage().unwrap().kind, StageKind::Build);
        assert_eq!(report.stage(StageKind::Install).unwrap().status(), StageStatus::Skip);
        assert_eq!(report.stage(StageKind::Docs).unwrap().status(), StageStatus::Skip);
        assert_eq!(report.stage(StageKind::Test).unwrap().status(), StageStatus::Skip);
        assert!(calls_sink.event_types().contains(&"instance.failed".to_string()));
    }

    #[test]
    fn test_build_failure_runs_no_later_command() {
        let runner = ScriptedRunner::new().fail_on("scripts/build.sh", "nope");
        let handle = runner.handle();
        let (_report, _) = run_one(runner, true);

        let programs = handle.programs();
        assert_eq!(programs, vec!["scripts/setup.sh", "scripts/build.sh"]);
    }

    #[test]
    fn test_test_failure_fails_instance() {
        let runner = ScriptedRunner::new().fail_on("scripts/test.sh", "2 failed");
        let (report, _) = run_one(runner, true);

        assert!(!report.is_success());
        assert_eq!(report.failed_stage().unwrap().kind, StageKind::Test);
        // Everything before test ran.
        assert_eq!(report.stage(StageKind::Install).unwrap().status(), StageStatus::Ok);
    }

    #[test]
    fn test_spawn_error_fails_fatal_stage() {
        let runner = ScriptedRunner::new().io_error_on("scripts/setup.sh");
        let (report, _) = run_one(runner, true);

        assert!(!report.is_success());
        assert_eq!(report.failed_stage().unwrap().kind, StageKind::Setup);
    }

    #[test]
    fn test_stage_commands_receive_cell_env() {
        let runner = ScriptedRunner::new();
        let handle = runner.handle();
        let cell = MatrixCell::new("linux", "3.11", "1.25", false);
        let ctx = RunContext::resolve(
            &TriggerFacts::new("v1.0.0", "release", "landlab/landlab"),
            &cell,
            &TagPattern::new("v*").unwrap(),
        );
        let plan = sample_stage_commands().plan_for(&ctx);
        let instance = InstanceRunner::new(Arc::new(runner), Arc::new(NoOpEventSink), Uuid::new_v4());

        tokio_test::block_on(instance.run(&cell, &ctx, &plan));

        for spec in handle.calls() {
            assert_eq!(spec.env.get("CI_NUMLIB_VERSION").map(String::as_str), Some("1.25"));
            assert_eq!(spec.env.get("CI_BUILD_STRING").map(String::as_str), Some(""));
        }
    }
}
