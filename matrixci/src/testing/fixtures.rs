//! Ready-made configurations and trigger facts for tests.

use crate::command::CommandSpec;
use crate::config::{DeployCommands, PipelineConfig, SchedulingMode};
use crate::context::TriggerFacts;
use crate::deploy::DeploymentGate;
use crate::matrix::{MatrixEntry, MatrixSpec};
use crate::stages::StageCommands;

/// Stage commands pointing at conventional repo scripts.
#[must_use]
pub fn sample_stage_commands() -> StageCommands {
    StageCommands {
        setup: CommandSpec::new("scripts/setup.sh"),
        build: CommandSpec::new("scripts/build.sh"),
        install: CommandSpec::new("scripts/install.sh"),
        docs: CommandSpec::new("scripts/docs.sh"),
        test: CommandSpec::new("scripts/test.sh"),
    }
}

/// A two-OS, three-entry pipeline mirroring a scientific package's CI:
/// six run instances, docs built on the newest runtime only, deployment
/// gated on `v*` tags from the `release` branch of the canonical repo.
#[must_use]
pub fn sample_config() -> PipelineConfig {
    #[allow(clippy::unwrap_used)]
    let gate = DeploymentGate::new("v*", "release", "landlab/landlab").unwrap();

    PipelineConfig {
        name: "landlab-ci".to_string(),
        matrix: MatrixSpec::new()
            .with_os("linux")
            .with_os("macos")
            .with_entry(MatrixEntry::new("3.10", "1.24"))
            .with_entry(MatrixEntry::new("3.11", "1.25"))
            .with_entry(MatrixEntry::new("3.12", "1.26").with_docs()),
        stages: sample_stage_commands(),
        gate,
        deploy: DeployCommands {
            index: Some(CommandSpec::new("scripts/publish-index.sh")),
            channel: Some(CommandSpec::new("scripts/publish-channel.sh")),
            coverage: Some(CommandSpec::new("scripts/report-coverage.sh")),
        },
        scheduling: SchedulingMode::Concurrent,
    }
}

/// Trigger facts for a qualifying release run.
#[must_use]
pub fn release_facts() -> TriggerFacts {
    TriggerFacts::new("v1.2.3", "release", "landlab/landlab")
}

/// Trigger facts for an ordinary development run.
#[must_use]
pub fn dev_facts() -> TriggerFacts {
    TriggerFacts::new("", "main", "landlab/landlab")
}
