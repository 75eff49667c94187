//! Test doubles and fixtures.
//!
//! Shipped with the crate so embedders can test their pipelines without
//! spawning processes or publishing anything.

mod fixtures;
mod mocks;

pub use fixtures::{dev_facts, release_facts, sample_config, sample_stage_commands};
pub use mocks::{RecordingNotifier, RecordingTarget, RunnerHandle, ScriptedRunner};
