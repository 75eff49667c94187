//! Pipeline configuration.

use crate::command::CommandSpec;
use crate::deploy::DeploymentGate;
use crate::errors::ConfigError;
use crate::matrix::MatrixSpec;
use crate::stages::StageCommands;
use serde::{Deserialize, Serialize};

/// How run instances are scheduled.
///
/// Instances are independent either way; the mode only controls whether
/// they execute at the same time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchedulingMode {
    /// All instances run concurrently and are joined before the
    /// post-success phase.
    #[default]
    Concurrent,
    /// Instances run one after another, in expansion order.
    Sequential,
}

/// Publish commands for the post-success fan-out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployCommands {
    /// Package-index publish command (release-gated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<CommandSpec>,
    /// Secondary artifact-channel publish command (release-gated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<CommandSpec>,
    /// Coverage submission command (runs for every successful matrix).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage: Option<CommandSpec>,
}

/// The full declaration of one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name, used in events and notifications.
    pub name: String,
    /// The build matrix.
    pub matrix: MatrixSpec,
    /// Commands implementing the five stages.
    pub stages: StageCommands,
    /// The deployment gate literals.
    pub gate: DeploymentGate,
    /// Publish commands for the post-success fan-out.
    #[serde(default)]
    pub deploy: DeployCommands,
    /// Instance scheduling mode.
    #[serde(default)]
    pub scheduling: SchedulingMode,
}

impl PipelineConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is blank or the matrix declaration is
    /// invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::new("pipeline name cannot be empty or whitespace-only")
                .with_field("name"));
        }
        self.matrix.validate()
    }
}
