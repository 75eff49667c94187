//! The pipeline orchestrator.
//!
//! Expands the matrix, drives every run instance through the stage
//! sequence, evaluates the conjunctive success gate, and runs the
//! post-success fan-out. One call to [`Orchestrator::run`] is one full
//! pipeline run.

use crate::command::{CommandRunner, ProcessRunner};
use crate::config::{PipelineConfig, SchedulingMode};
use crate::context::{RunContext, TriggerFacts};
use crate::core::RunState;
use crate::deploy::{
    CommandTarget, NotificationEvent, Notifier, PostSuccessReport, PostSuccessRunner,
};
use crate::errors::ConfigError;
use crate::events::{EventSink, NoOpEventSink};
use crate::runner::{InstanceReport, InstanceRunner};
use crate::secrets::DeployCredentials;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Record of one full pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique identifier of this run.
    pub run_id: Uuid,
    /// Pipeline name.
    pub pipeline: String,
    /// Terminal state of the run.
    pub state: RunState,
    /// True when the matrix expanded to zero cells.
    pub vacuous: bool,
    /// Per-instance records, in expansion order.
    pub instances: Vec<InstanceReport>,
    /// Post-success record; `None` when any instance failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_success: Option<PostSuccessReport>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run ended.
    pub ended_at: DateTime<Utc>,
}

impl RunReport {
    /// Returns the run duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns true when the run reached `Done`.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == RunState::Done
    }

    /// Number of instances that succeeded.
    #[must_use]
    pub fn succeeded_count(&self) -> usize {
        self.instances.iter().filter(|i| i.is_success()).count()
    }
}

/// Drives a configured pipeline from trigger facts to a [`RunReport`].
pub struct Orchestrator {
    config: PipelineConfig,
    runner: Arc<dyn CommandRunner>,
    sink: Arc<dyn EventSink>,
    credentials: DeployCredentials,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Orchestrator {
    /// Creates an orchestrator for a validated configuration.
    ///
    /// Defaults: real process execution, no event sink, no credentials,
    /// no notifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            runner: Arc::new(ProcessRunner::new()),
            sink: Arc::new(NoOpEventSink),
            credentials: DeployCredentials::new(),
            notifier: None,
        })
    }

    /// Substitutes the command runner.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Provides the deployment credentials.
    ///
    /// Credentials are visible to the post-success phase only; stage
    /// commands never receive them.
    #[must_use]
    pub fn with_credentials(mut self, credentials: DeployCredentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Sets the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Executes one full pipeline run.
    pub async fn run(&self, facts: &TriggerFacts) -> RunReport {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();

        self.sink.try_emit(
            "run.started",
            Some(serde_json::json!({
                "pipeline": self.config.name,
                "run_id": run_id,
                "tag": facts.tag,
                "branch": facts.branch,
            })),
        );

        let cells = self.config.matrix.expand();
        let vacuous = cells.is_empty();
        if vacuous {
            warn!(pipeline = %self.config.name, "matrix expanded to zero cells");
            self.sink.try_emit(
                "matrix.empty",
                Some(serde_json::json!({
                    "pipeline": self.config.name,
                    "run_id": run_id,
                })),
            );
        }

        let instance_runner = InstanceRunner::new(self.runner.clone(), self.sink.clone(), run_id);
        let bound: Vec<(crate::matrix::MatrixCell, RunContext)> = cells
            .into_iter()
            .map(|cell| {
                let ctx = RunContext::resolve(facts, &cell, &self.config.gate.tag_pattern);
                (cell, ctx)
            })
            .collect();

        let instances: Vec<InstanceReport> = match self.config.scheduling {
            SchedulingMode::Concurrent => {
                let instance_futures = bound.iter().map(|(cell, ctx)| {
                    let plan = self.config.stages.plan_for(ctx);
                    let runner = &instance_runner;
                    async move { runner.run(cell, ctx, &plan).await }
                });
                futures::future::join_all(instance_futures).await
            }
            SchedulingMode::Sequential => {
                let mut reports = Vec::with_capacity(bound.len());
                for (cell, ctx) in &bound {
                    let plan = self.config.stages.plan_for(ctx);
                    reports.push(instance_runner.run(cell, ctx, &plan).await);
                }
                reports
            }
        };

        let all_succeeded = instances.iter().all(InstanceReport::is_success);
        if !all_succeeded {
            self.sink.try_emit(
                "run.failed",
                Some(serde_json::json!({
                    "pipeline": self.config.name,
                    "run_id": run_id,
                    "succeeded": instances.iter().filter(|i| i.is_success()).count(),
                    "total": instances.len(),
                })),
            );

            return RunReport {
                run_id,
                pipeline: self.config.name.clone(),
                state: RunState::Failed,
                vacuous,
                instances,
                post_success: None,
                started_at,
                ended_at: Utc::now(),
            };
        }

        let succeeded = instances.len();
        let event = NotificationEvent::new(
            &self.config.name,
            run_id,
            RunState::Done,
            instances.len(),
            succeeded,
        );

        let post_success = self.post_success_runner().run(facts, &event).await;

        info!(
            pipeline = %self.config.name,
            gate_held = post_success.gate.holds(),
            "pipeline run completed"
        );
        self.sink.try_emit(
            "run.completed",
            Some(serde_json::json!({
                "pipeline": self.config.name,
                "run_id": run_id,
                "gate": post_success.gate,
            })),
        );

        RunReport {
            run_id,
            pipeline: self.config.name.clone(),
            state: RunState::Done,
            vacuous,
            instances,
            post_success: Some(post_success),
            started_at,
            ended_at: Utc::now(),
        }
    }

    fn post_success_runner(&self) -> PostSuccessRunner {
        let mut runner = PostSuccessRunner::new(self.config.gate.clone(), self.sink.clone());

        if let Some(spec) = &self.config.deploy.index {
            let mut target = CommandTarget::new("package-index", spec.clone(), self.runner.clone());
            if let Some(credential) = &self.credentials.index {
                target = target.with_credential(credential.clone());
            }
            runner = runner.with_gated_target(Arc::new(target));
        }

        if let Some(spec) = &self.config.deploy.channel {
            let mut target =
                CommandTarget::new("artifact-channel", spec.clone(), self.runner.clone());
            if let Some(credential) = &self.credentials.channel {
                target = target.with_credential(credential.clone());
            }
            runner = runner.with_gated_target(Arc::new(target));
        }

        if let Some(spec) = &self.config.deploy.coverage {
            let target = CommandTarget::new("coverage", spec.clone(), self.runner.clone());
            runner = runner.with_ungated_target(Arc::new(target));
        }

        if let Some(notifier) = &self.notifier {
            runner = runner.with_notifier(notifier.clone());
        }

        runner
    }
}
