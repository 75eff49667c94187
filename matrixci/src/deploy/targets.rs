//! Deployment targets.

use crate::command::{CommandRunner, CommandSpec};
use crate::errors::PipelineError;
use crate::secrets::CredentialBlob;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The recorded outcome of one deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeployStatus {
    /// The publish operation succeeded.
    Deployed,
    /// The publish operation was attempted and failed.
    Failed,
    /// The gate did not hold; the target was never attempted.
    Skipped,
}

/// Per-target deployment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployReport {
    /// Target name.
    pub target: String,
    /// Whether the target was release-gated.
    pub gated: bool,
    /// Outcome for this target.
    pub status: DeployStatus,
    /// Error message for failed targets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeployReport {
    /// Records a successful publish.
    #[must_use]
    pub fn deployed(target: impl Into<String>, gated: bool) -> Self {
        Self {
            target: target.into(),
            gated,
            status: DeployStatus::Deployed,
            error: None,
        }
    }

    /// Records a failed publish.
    #[must_use]
    pub fn failed(target: impl Into<String>, gated: bool, error: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            gated,
            status: DeployStatus::Failed,
            error: Some(error.into()),
        }
    }

    /// Records a gate-skipped target.
    #[must_use]
    pub fn skipped(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            gated: true,
            status: DeployStatus::Skipped,
            error: None,
        }
    }
}

/// A publish operation against one distribution channel.
///
/// Targets are independent: the fan-out attempts every eligible target and
/// records each result, so one channel's failure never masks another's.
#[async_trait]
pub trait DeployTarget: Send + Sync {
    /// The target's name, used in reports and events.
    fn name(&self) -> &str;

    /// Performs the publish operation.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError::Deploy`] describing the failure.
    async fn publish(&self) -> Result<(), PipelineError>;
}

/// A deploy target backed by an opaque publish command.
///
/// An optional credential is injected into the command environment at
/// invocation time; it never appears in the stored spec.
pub struct CommandTarget {
    name: String,
    spec: CommandSpec,
    credential: Option<CredentialBlob>,
    runner: Arc<dyn CommandRunner>,
}

impl CommandTarget {
    /// Creates a new command-backed target.
    #[must_use]
    pub fn new(name: impl Into<String>, spec: CommandSpec, runner: Arc<dyn CommandRunner>) -> Self {
        Self {
            name: name.into(),
            spec,
            credential: None,
            runner,
        }
    }

    /// Attaches the credential injected at publish time.
    #[must_use]
    pub fn with_credential(mut self, credential: CredentialBlob) -> Self {
        self.credential = Some(credential);
        self
    }
}

impl std::fmt::Debug for CommandTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandTarget")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .field("has_credential", &self.credential.is_some())
            .finish()
    }
}

#[async_trait]
impl DeployTarget for CommandTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self) -> Result<(), PipelineError> {
        let mut spec = self.spec.clone();
        if let Some(ref credential) = self.credential {
            spec.env
                .insert(credential.env_name().to_string(), credential.value().to_string());
        }

        let output = self
            .runner
            .run(&spec)
            .await
            .map_err(|e| PipelineError::deploy(&self.name, e.to_string()))?;

        if output.success {
            Ok(())
        } else {
            Err(PipelineError::deploy(&self.name, output.diagnostic()))
        }
    }
}

/// A deploy target that posts a JSON payload to an HTTP endpoint.
///
/// Ready-made submitter for coverage/test-result reporting services that
/// accept a direct upload instead of a CLI tool.
#[cfg(feature = "http-delivery")]
#[derive(Debug, Clone)]
pub struct WebhookTarget {
    name: String,
    url: String,
    payload: serde_json::Value,
    client: reqwest::Client,
}

#[cfg(feature = "http-delivery")]
impl WebhookTarget {
    /// Creates a target posting `payload` to `url`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            payload,
            client: reqwest::Client::new(),
        }
    }
}

#[cfg(feature = "http-delivery")]
#[async_trait]
impl DeployTarget for WebhookTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self) -> Result<(), PipelineError> {
        let response = self
            .client
            .post(&self.url)
            .json(&self.payload)
            .send()
            .await
            .map_err(|e| PipelineError::deploy(&self.name, e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(PipelineError::deploy(
                &self.name,
                format!("endpoint returned {}", response.status()),
            ))
        }
    }
}
