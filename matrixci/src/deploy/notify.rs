//! Run-outcome notification.

use crate::core::RunState;
use crate::errors::PipelineError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fire-and-forget message describing the overall run outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Pipeline name.
    pub pipeline: String,
    /// Run identifier.
    pub run_id: Uuid,
    /// Terminal run state being reported.
    pub state: RunState,
    /// Number of run instances in the matrix.
    pub instance_count: usize,
    /// Number of instances that succeeded.
    pub succeeded: usize,
    /// Human-readable summary line.
    pub message: String,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl NotificationEvent {
    /// Builds the summary event for a run.
    #[must_use]
    pub fn new(
        pipeline: impl Into<String>,
        run_id: Uuid,
        state: RunState,
        instance_count: usize,
        succeeded: usize,
    ) -> Self {
        let pipeline = pipeline.into();
        let message = format!(
            "{pipeline}: {state} ({succeeded}/{instance_count} instances succeeded)"
        );
        Self {
            pipeline,
            run_id,
            state,
            instance_count,
            succeeded,
            message,
            finished_at: Utc::now(),
        }
    }
}

/// Transport for [`NotificationEvent`]s.
///
/// Delivery failure must never escalate; the dispatcher swallows errors
/// after surfacing them as an event.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers the notification.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError::Notification`] on delivery failure. The
    /// caller reports and swallows it.
    async fn notify(&self, event: &NotificationEvent) -> Result<(), PipelineError>;
}

/// Notifier posting the event as JSON to a webhook URL.
#[cfg(feature = "http-delivery")]
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    url: String,
    client: reqwest::Client,
}

#[cfg(feature = "http-delivery")]
impl WebhookNotifier {
    /// Creates a notifier for a webhook URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "http-delivery")]
#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify(&self, event: &NotificationEvent) -> Result<(), PipelineError> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| PipelineError::notification(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PipelineError::notification(format!(
                "webhook returned {}",
                response.status()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_message_summarizes_outcome() {
        let event = NotificationEvent::new("landlab-ci", Uuid::new_v4(), RunState::Done, 6, 6);
        assert!(event.message.contains("landlab-ci"));
        assert!(event.message.contains("done"));
        assert!(event.message.contains("6/6"));
    }

    #[test]
    fn test_event_serialization() {
        let event = NotificationEvent::new("p", Uuid::new_v4(), RunState::Done, 6, 6);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["state"], "done");
        assert_eq!(json["instance_count"], 6);
    }
}
