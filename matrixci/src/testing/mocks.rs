//! Scripted runners and recording doubles.

use crate::command::{CommandOutput, CommandRunner, CommandSpec};
use crate::deploy::{DeployTarget, NotificationEvent, Notifier};
use crate::errors::PipelineError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug)]
struct ConditionalFailure {
    program: String,
    env: Vec<(String, String)>,
    stderr: String,
}

#[derive(Debug, Default)]
struct ScriptedInner {
    failures: Mutex<HashMap<String, String>>,
    conditional: Mutex<Vec<ConditionalFailure>>,
    io_errors: Mutex<HashSet<String>>,
    calls: Mutex<Vec<CommandSpec>>,
}

/// A command runner that never spawns a process.
///
/// Commands succeed by default; individual programs can be scripted to
/// fail with captured stderr or to error at spawn time. Every invocation
/// is recorded and observable through [`RunnerHandle`].
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    inner: Arc<ScriptedInner>,
}

impl ScriptedRunner {
    /// Creates a runner where every command succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts a program to exit non-zero with the given stderr.
    #[must_use]
    pub fn fail_on(self, program: impl Into<String>, stderr: impl Into<String>) -> Self {
        self.inner.failures.lock().insert(program.into(), stderr.into());
        self
    }

    /// Scripts a program to fail only for invocations whose environment
    /// contains every given pair.
    ///
    /// Lets a test fail a single matrix cell even though all cells invoke
    /// the same stage scripts.
    #[must_use]
    pub fn fail_when<K, V>(
        self,
        program: impl Into<String>,
        env: impl IntoIterator<Item = (K, V)>,
        stderr: impl Into<String>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.inner.conditional.lock().push(ConditionalFailure {
            program: program.into(),
            env: env.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            stderr: stderr.into(),
        });
        self
    }

    /// Scripts a program to fail at spawn time.
    #[must_use]
    pub fn io_error_on(self, program: impl Into<String>) -> Self {
        self.inner.io_errors.lock().insert(program.into());
        self
    }

    /// Returns a handle observing this runner's recorded calls.
    ///
    /// The handle stays valid after the runner has been moved into an
    /// `Arc<dyn CommandRunner>`.
    #[must_use]
    pub fn handle(&self) -> RunnerHandle {
        RunnerHandle {
            inner: self.inner.clone(),
        }
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        self.inner.calls.lock().push(spec.clone());

        if self.inner.io_errors.lock().contains(&spec.program) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("scripted spawn failure for {}", spec.program),
            ));
        }

        if let Some(stderr) = self.inner.failures.lock().get(&spec.program) {
            return Ok(CommandOutput::failed(1, stderr.clone()));
        }

        for failure in self.inner.conditional.lock().iter() {
            let env_matches = failure
                .env
                .iter()
                .all(|(k, v)| spec.env.get(k).is_some_and(|actual| actual == v));
            if failure.program == spec.program && env_matches {
                return Ok(CommandOutput::failed(1, failure.stderr.clone()));
            }
        }

        Ok(CommandOutput::ok())
    }
}

/// Observer for a [`ScriptedRunner`]'s recorded invocations.
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    inner: Arc<ScriptedInner>,
}

impl RunnerHandle {
    /// All recorded invocations, in call order.
    #[must_use]
    pub fn calls(&self) -> Vec<CommandSpec> {
        self.inner.calls.lock().clone()
    }

    /// The invoked program names, in call order.
    #[must_use]
    pub fn programs(&self) -> Vec<String> {
        self.inner.calls.lock().iter().map(|c| c.program.clone()).collect()
    }

    /// Total number of invocations.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.inner.calls.lock().len()
    }
}

/// A deploy target that records publish attempts.
#[derive(Debug)]
pub struct RecordingTarget {
    name: String,
    failure: Option<String>,
    publishes: Mutex<usize>,
}

impl RecordingTarget {
    /// Creates a target whose publishes succeed.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            failure: None,
            publishes: Mutex::new(0),
        }
    }

    /// Makes every publish fail with the given detail.
    #[must_use]
    pub fn failing(mut self, detail: impl Into<String>) -> Self {
        self.failure = Some(detail.into());
        self
    }

    /// Number of publish attempts observed.
    #[must_use]
    pub fn publish_count(&self) -> usize {
        *self.publishes.lock()
    }
}

#[async_trait]
impl DeployTarget for RecordingTarget {
    fn name(&self) -> &str {
        &self.name
    }

    async fn publish(&self) -> Result<(), PipelineError> {
        *self.publishes.lock() += 1;
        match &self.failure {
            Some(detail) => Err(PipelineError::deploy(&self.name, detail.clone())),
            None => Ok(()),
        }
    }
}

/// A notifier that records delivered events.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    fail: bool,
    sent: Mutex<Vec<NotificationEvent>>,
}

impl RecordingNotifier {
    /// Creates a notifier whose deliveries succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every delivery fail.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// The events handed to this notifier, in order.
    ///
    /// Failed deliveries are not recorded.
    #[must_use]
    pub fn sent(&self) -> Vec<NotificationEvent> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &NotificationEvent) -> Result<(), PipelineError> {
        if self.fail {
            return Err(PipelineError::notification("scripted delivery failure"));
        }
        self.sent.lock().push(event.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_runner_defaults_to_success() {
        let runner = ScriptedRunner::new();
        let out = runner.run(&CommandSpec::new("anything")).await.unwrap();
        assert!(out.success);
    }

    #[tokio::test]
    async fn test_scripted_runner_failure_and_recording() {
        let runner = ScriptedRunner::new().fail_on("bad", "boom");
        let handle = runner.handle();

        let out = runner.run(&CommandSpec::new("bad")).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.stderr, "boom");
        assert_eq!(handle.programs(), vec!["bad"]);
    }

    #[tokio::test]
    async fn test_scripted_runner_conditional_failure() {
        let runner = ScriptedRunner::new().fail_when("build", [("CI_OS", "macos")], "boom");

        let macos = CommandSpec::new("build").with_env("CI_OS", "macos");
        let linux = CommandSpec::new("build").with_env("CI_OS", "linux");

        assert!(!runner.run(&macos).await.unwrap().success);
        assert!(runner.run(&linux).await.unwrap().success);
    }

    #[tokio::test]
    async fn test_scripted_runner_io_error() {
        let runner = ScriptedRunner::new().io_error_on("gone");
        assert!(runner.run(&CommandSpec::new("gone")).await.is_err());
        // The attempt is still recorded.
        assert_eq!(runner.handle().call_count(), 1);
    }

    #[tokio::test]
    async fn test_recording_target_counts() {
        let target = RecordingTarget::new("t");
        target.publish().await.unwrap();
        target.publish().await.unwrap();
        assert_eq!(target.publish_count(), 2);

        let failing = RecordingTarget::new("t").failing("nope");
        assert!(failing.publish().await.is_err());
        assert_eq!(failing.publish_count(), 1);
    }
}
