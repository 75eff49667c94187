//! Post-success deployment fan-out.

use super::{DeployReport, DeployTarget, DeploymentGate, GateDecision, NotificationEvent, Notifier};
use crate::context::TriggerFacts;
use crate::events::EventSink;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;

/// Record of the whole post-success phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSuccessReport {
    /// The single gate evaluation for this run.
    pub gate: GateDecision,
    /// Per-target publish records, in declaration order.
    pub targets: Vec<DeployReport>,
    /// Notification delivery result: `None` when no notifier is
    /// configured, `Some(false)` when delivery failed and was swallowed.
    pub notified: Option<bool>,
}

impl PostSuccessReport {
    /// Returns the record for a named target, if present.
    #[must_use]
    pub fn target(&self, name: &str) -> Option<&DeployReport> {
        self.targets.iter().find(|t| t.target == name)
    }
}

/// Executes the run-scoped post-success sequence.
///
/// Release-gated targets are attempted only when the gate holds; ungated
/// targets run for every fully-successful matrix. All sub-steps are
/// independent: each is attempted regardless of the others' outcomes and
/// each result is captured on its own. Notification failure is surfaced as
/// an event and swallowed.
pub struct PostSuccessRunner {
    gate: DeploymentGate,
    gated: Vec<Arc<dyn DeployTarget>>,
    ungated: Vec<Arc<dyn DeployTarget>>,
    notifier: Option<Arc<dyn Notifier>>,
    sink: Arc<dyn EventSink>,
}

impl PostSuccessRunner {
    /// Creates a new post-success runner.
    #[must_use]
    pub fn new(gate: DeploymentGate, sink: Arc<dyn EventSink>) -> Self {
        Self {
            gate,
            gated: Vec::new(),
            ungated: Vec::new(),
            notifier: None,
            sink,
        }
    }

    /// Adds a release-gated target.
    #[must_use]
    pub fn with_gated_target(mut self, target: Arc<dyn DeployTarget>) -> Self {
        self.gated.push(target);
        self
    }

    /// Adds a target that runs for every successful matrix.
    #[must_use]
    pub fn with_ungated_target(mut self, target: Arc<dyn DeployTarget>) -> Self {
        self.ungated.push(target);
        self
    }

    /// Sets the notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Runs the fan-out: one gate evaluation, every eligible target
    /// attempted, notification last.
    pub async fn run(&self, facts: &TriggerFacts, event: &NotificationEvent) -> PostSuccessReport {
        let decision = self.gate.evaluate(facts);

        let mut pending = Vec::new();
        let mut targets = Vec::new();

        for target in &self.gated {
            if decision.holds() {
                pending.push((target.clone(), true));
            } else {
                self.sink.try_emit(
                    "deploy.skipped",
                    Some(serde_json::json!({
                        "run_id": event.run_id,
                        "target": target.name(),
                        "gate": decision,
                    })),
                );
                targets.push(DeployReport::skipped(target.name()));
            }
        }
        for target in &self.ungated {
            pending.push((target.clone(), false));
        }

        let attempts = pending.iter().map(|(target, gated)| {
            let target = target.clone();
            let gated = *gated;
            async move {
                match target.publish().await {
                    Ok(()) => DeployReport::deployed(target.name(), gated),
                    Err(err) => DeployReport::failed(target.name(), gated, err.to_string()),
                }
            }
        });
        for report in futures::future::join_all(attempts).await {
            let event_type = match report.status {
                super::DeployStatus::Deployed => "deploy.completed",
                _ => "deploy.failed",
            };
            self.sink.try_emit(
                event_type,
                Some(serde_json::json!({
                    "run_id": event.run_id,
                    "target": report.target,
                    "error": report.error,
                })),
            );
            targets.push(report);
        }

        let notified = match &self.notifier {
            None => None,
            Some(notifier) => match notifier.notify(event).await {
                Ok(()) => {
                    self.sink.try_emit(
                        "notify.sent",
                        Some(serde_json::json!({ "run_id": event.run_id })),
                    );
                    Some(true)
                }
                Err(err) => {
                    warn!(error = %err, "notification delivery failed");
                    self.sink.try_emit(
                        "notify.failed",
                        Some(serde_json::json!({
                            "run_id": event.run_id,
                            "error": err.to_string(),
                        })),
                    );
                    Some(false)
                }
            },
        };

        PostSuccessReport {
            gate: decision,
            targets,
            notified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RunState;
    use crate::deploy::DeployStatus;
    use crate::events::CollectingEventSink;
    use crate::testing::{RecordingNotifier, RecordingTarget};
    use uuid::Uuid;

    fn gate() -> DeploymentGate {
        DeploymentGate::new("v*", "release", "landlab/landlab").unwrap()
    }

    fn event() -> NotificationEvent {
        NotificationEvent::new("landlab-ci", Uuid::new_v4(), RunState::Done, 6, 6)
    }

    fn release_facts() -> TriggerFacts {
        TriggerFacts::new("v1.2.3", "release", "landlab/landlab")
    }

    #[tokio::test]
    async fn test_gate_held_attempts_all_targets() {
        let index = Arc::new(RecordingTarget::new("package-index"));
        let channel = Arc::new(RecordingTarget::new("artifact-channel"));
        let coverage = Arc::new(RecordingTarget::new("coverage"));
        let notifier = Arc::new(RecordingNotifier::new());

        let runner = PostSuccessRunner::new(gate(), Arc::new(CollectingEventSink::new()))
            .with_gated_target(index.clone())
            .with_gated_target(channel.clone())
            .with_ungated_target(coverage.clone())
            .with_notifier(notifier.clone());

        let report = runner.run(&release_facts(), &event()).await;

        assert!(report.gate.holds());
        assert_eq!(index.publish_count(), 1);
        assert_eq!(channel.publish_count(), 1);
        assert_eq!(coverage.publish_count(), 1);
        assert_eq!(notifier.sent().len(), 1);
        assert_eq!(report.notified, Some(true));
        assert!(report
            .targets
            .iter()
            .all(|t| t.status == DeployStatus::Deployed));
    }

    #[tokio::test]
    async fn test_gate_miss_skips_only_gated_targets() {
        let index = Arc::new(RecordingTarget::new("package-index"));
        let coverage = Arc::new(RecordingTarget::new("coverage"));
        let notifier = Arc::new(RecordingNotifier::new());

        let runner = PostSuccessRunner::new(gate(), Arc::new(CollectingEventSink::new()))
            .with_gated_target(index.clone())
            .with_ungated_target(coverage.clone())
            .with_notifier(notifier.clone());

        // Branch mismatch: single failed predicate defeats the gate.
        let facts = TriggerFacts::new("v1.2.3", "main", "landlab/landlab");
        let report = runner.run(&facts, &event()).await;

        assert!(!report.gate.holds());
        assert_eq!(index.publish_count(), 0);
        assert_eq!(report.target("package-index").unwrap().status, DeployStatus::Skipped);
        // Coverage and notification still ran.
        assert_eq!(coverage.publish_count(), 1);
        assert_eq!(report.target("coverage").unwrap().status, DeployStatus::Deployed);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_target_failure_does_not_block_siblings() {
        let index = Arc::new(RecordingTarget::new("package-index").failing("401 unauthorized"));
        let channel = Arc::new(RecordingTarget::new("artifact-channel"));

        let sink = Arc::new(CollectingEventSink::new());
        let runner = PostSuccessRunner::new(gate(), sink.clone())
            .with_gated_target(index.clone())
            .with_gated_target(channel.clone());

        let report = runner.run(&release_facts(), &event()).await;

        let index_report = report.target("package-index").unwrap();
        assert_eq!(index_report.status, DeployStatus::Failed);
        assert!(index_report.error.as_deref().unwrap().contains("401"));

        // The sibling channel was still attempted and succeeded.
        assert_eq!(channel.publish_count(), 1);
        assert_eq!(
            report.target("artifact-channel").unwrap().status,
            DeployStatus::Deployed
        );
        assert!(sink.event_types().contains(&"deploy.failed".to_string()));
        assert!(sink.event_types().contains(&"deploy.completed".to_string()));
    }

    #[tokio::test]
    async fn test_notification_failure_is_swallowed() {
        let notifier = Arc::new(RecordingNotifier::new().failing());
        let sink = Arc::new(CollectingEventSink::new());
        let runner = PostSuccessRunner::new(gate(), sink.clone()).with_notifier(notifier);

        let report = runner.run(&release_facts(), &event()).await;

        assert_eq!(report.notified, Some(false));
        assert!(sink.event_types().contains(&"notify.failed".to_string()));
    }

    #[tokio::test]
    async fn test_no_notifier_configured() {
        let runner = PostSuccessRunner::new(gate(), Arc::new(CollectingEventSink::new()));
        let report = runner.run(&release_facts(), &event()).await;
        assert_eq!(report.notified, None);
    }
}
