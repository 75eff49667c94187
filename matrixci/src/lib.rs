//! # Matrixci
//!
//! A build-matrix CI pipeline orchestrator.
//!
//! Matrixci expands a declared build matrix into independent run instances,
//! drives each through a fixed stage sequence against opaque external
//! commands, and runs a gated deployment fan-out once the whole matrix has
//! succeeded:
//!
//! - **Matrix expansion**: explicit enumerated cross-list of operating
//!   systems and paired runtime/library versions, never an implicit
//!   cross-product
//! - **Stage execution**: ordered, fail-fast per instance, with a guarded
//!   non-fatal documentation stage whose diagnostics stay visible
//! - **Deployment gate**: tag/branch/repository conjunction evaluated once
//!   per run, only after full-matrix success
//! - **Best-effort fan-out**: independent publish targets with individually
//!   captured results, plus a fire-and-forget notification
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use matrixci::prelude::*;
//!
//! let orchestrator = Orchestrator::new(config)?
//!     .with_event_sink(Arc::new(LoggingEventSink::info()))
//!     .with_credentials(credentials)
//!     .with_notifier(Arc::new(WebhookNotifier::new(webhook_url)));
//!
//! let report = orchestrator.run(&TriggerFacts::from_env()).await;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod command;
pub mod config;
pub mod context;
pub mod core;
pub mod deploy;
pub mod errors;
pub mod events;
pub mod matrix;
pub mod orchestrator;
pub mod runner;
pub mod secrets;
pub mod stages;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::command::{CommandOutput, CommandRunner, CommandSpec, ProcessRunner};
    pub use crate::config::{DeployCommands, PipelineConfig, SchedulingMode};
    pub use crate::context::{RunContext, TriggerFacts, DEV_BUILD_STRING};
    pub use crate::core::{InstanceStatus, RunState, StageOutcome, StageStatus};
    pub use crate::deploy::{
        CommandTarget, DeployReport, DeployStatus, DeployTarget, DeploymentGate, GateDecision,
        NotificationEvent, Notifier, PostSuccessReport, PostSuccessRunner, TagPattern,
    };
    pub use crate::errors::{ConfigError, PipelineError, SecretError};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, RecordedEvent,
    };
    pub use crate::matrix::{MatrixCell, MatrixEntry, MatrixSpec};
    pub use crate::orchestrator::{Orchestrator, RunReport};
    pub use crate::runner::{InstanceReport, InstanceRunner, StageReport};
    pub use crate::secrets::{CredentialBlob, DeployCredentials};
    pub use crate::stages::{StageCommands, StageKind, StagePlan};

    #[cfg(feature = "http-delivery")]
    pub use crate::deploy::{WebhookNotifier, WebhookTarget};
}

#[cfg(test)]
mod tests {
    #[test]
    fn library_compiles() {
        assert!(true);
    }
}
