//! Error types for the matrixci orchestrator.
//!
//! One variant per failure class the pipeline distinguishes. Fatal stage
//! failures terminate their run instance; docs failures are surfaced as
//! warnings; deploy failures are per-target; notification failures are
//! swallowed by the dispatcher.

use thiserror::Error;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Toolchain installation for a run instance failed.
    #[error("toolchain setup failed: {detail}")]
    Toolchain {
        /// Captured failure detail.
        detail: String,
    },

    /// Building the binary distribution failed.
    #[error("package build failed: {detail}")]
    Build {
        /// Captured failure detail.
        detail: String,
    },

    /// Installing the locally built artifact failed.
    #[error("local install failed: {detail}")]
    Install {
        /// Captured failure detail.
        detail: String,
    },

    /// Documentation build failed (non-fatal to the run instance).
    #[error("documentation build failed: {detail}")]
    Docs {
        /// Captured failure detail.
        detail: String,
    },

    /// The package test suite failed.
    #[error("test suite failed: {detail}")]
    Test {
        /// Captured failure detail.
        detail: String,
    },

    /// Publishing to a deployment target failed.
    #[error("deploy to '{target}' failed: {detail}")]
    Deploy {
        /// Name of the target that failed.
        target: String,
        /// Captured failure detail.
        detail: String,
    },

    /// Notification delivery failed.
    #[error("notification delivery failed: {detail}")]
    Notification {
        /// Captured failure detail.
        detail: String,
    },

    /// A configuration validation error occurred.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A credential could not be loaded or decoded.
    #[error("{0}")]
    Secret(#[from] SecretError),

    /// IO error while spawning or waiting on an external command.
    #[error("command IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Creates a deploy failure for a named target.
    #[must_use]
    pub fn deploy(target: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Deploy {
            target: target.into(),
            detail: detail.into(),
        }
    }

    /// Creates a notification failure.
    #[must_use]
    pub fn notification(detail: impl Into<String>) -> Self {
        Self::Notification {
            detail: detail.into(),
        }
    }
}

/// Error raised when pipeline configuration validation fails.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConfigError {
    /// The error message.
    pub message: String,
    /// The configuration field involved, if known.
    pub field: Option<String>,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    /// Attaches the offending field name.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Error raised when a credential blob cannot be loaded.
#[derive(Debug, Error)]
pub enum SecretError {
    /// The environment variable holding the blob is not set.
    #[error("credential variable '{0}' is not set")]
    Missing(String),

    /// The blob is not valid base64.
    #[error("credential variable '{0}' is not valid base64")]
    Decode(String),

    /// The decoded blob is not valid UTF-8.
    #[error("credential variable '{0}' did not decode to UTF-8")]
    Utf8(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_error_messages() {
        let err = PipelineError::Build {
            detail: "linker exited with code 1".to_string(),
        };
        assert!(err.to_string().contains("package build failed"));

        let err = PipelineError::Test {
            detail: "2 tests failed".to_string(),
        };
        assert!(err.to_string().contains("test suite failed"));
    }

    #[test]
    fn test_deploy_error_names_target() {
        let err = PipelineError::deploy("package-index", "401 unauthorized");
        assert!(err.to_string().contains("package-index"));
        assert!(err.to_string().contains("401"));
    }

    #[test]
    fn test_config_error_with_field() {
        let err = ConfigError::new("pipeline name cannot be empty").with_field("name");
        assert_eq!(err.field.as_deref(), Some("name"));
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn test_secret_error_display() {
        let err = SecretError::Missing("CI_INDEX_TOKEN".to_string());
        assert!(err.to_string().contains("CI_INDEX_TOKEN"));
    }
}
