//! Opaque external command invocation.
//!
//! Every unit of real work in the pipeline (toolchain install, package
//! build, publish, ...) is an external command whose only observable
//! contract is its exit status plus captured output. The [`CommandRunner`]
//! trait is the seam between the orchestrator and the operating system.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::process::Command;

/// Specification of an external command to invoke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    /// The program to execute.
    pub program: String,
    /// Arguments passed to the program.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables set for the invocation.
    ///
    /// A `BTreeMap` keeps injection order deterministic.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl CommandSpec {
    /// Creates a command spec with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
        }
    }

    /// Adds arguments.
    #[must_use]
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets a single environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Merges environment variables, later entries winning.
    #[must_use]
    pub fn with_env_map(mut self, env: BTreeMap<String, String>) -> Self {
        self.env.extend(env);
        self
    }
}

impl std::fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured result of an external command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Whether the command exited successfully.
    pub success: bool,
    /// The exit code, if the process exited normally.
    pub exit_code: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl CommandOutput {
    /// A successful output with no captured text.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            exit_code: Some(0),
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    /// A failed output with the given exit code and stderr.
    #[must_use]
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns stderr if non-empty, otherwise stdout.
    ///
    /// Used to build failure details without losing diagnostics from tools
    /// that report errors on stdout.
    #[must_use]
    pub fn diagnostic(&self) -> &str {
        if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }
}

/// Trait for executing external commands.
///
/// The production implementation spawns real processes; tests substitute
/// scripted runners so no process is ever spawned.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion, capturing output.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or awaited. A
    /// non-zero exit status is NOT an error at this level; it is reported
    /// through [`CommandOutput::success`].
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput>;
}

/// Command runner backed by `tokio::process`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates a new process runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        let output = Command::new(&spec.program)
            .args(&spec.args)
            .envs(&spec.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_spec_builder() {
        let spec = CommandSpec::new("scripts/build.sh")
            .with_args(["--wheel"])
            .with_env("NUMLIB_VERSION", "1.26");

        assert_eq!(spec.program, "scripts/build.sh");
        assert_eq!(spec.args, vec!["--wheel".to_string()]);
        assert_eq!(spec.env.get("NUMLIB_VERSION").map(String::as_str), Some("1.26"));
    }

    #[test]
    fn test_spec_env_merge_overrides() {
        let mut overlay = BTreeMap::new();
        overlay.insert("KEY".to_string(), "new".to_string());

        let spec = CommandSpec::new("run").with_env("KEY", "old").with_env_map(overlay);
        assert_eq!(spec.env.get("KEY").map(String::as_str), Some("new"));
    }

    #[test]
    fn test_spec_display() {
        let spec = CommandSpec::new("pip").with_args(["install", "."]);
        assert_eq!(spec.to_string(), "pip install .");
    }

    #[test]
    fn test_output_diagnostic_prefers_stderr() {
        let out = CommandOutput {
            success: false,
            exit_code: Some(1),
            stdout: "building...".to_string(),
            stderr: "error: missing header".to_string(),
        };
        assert_eq!(out.diagnostic(), "error: missing header");

        let out = CommandOutput {
            stderr: String::new(),
            ..out
        };
        assert_eq!(out.diagnostic(), "building...");
    }

    #[test]
    fn test_output_serialization() {
        let out = CommandOutput::failed(2, "boom");
        let json = serde_json::to_string(&out).unwrap();
        let back: CommandOutput = serde_json::from_str(&json).unwrap();
        assert!(!back.success);
        assert_eq!(back.exit_code, Some(2));
        assert_eq!(back.stderr, "boom");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_captures_exit_status() {
        let runner = ProcessRunner::new();

        let ok = runner
            .run(&CommandSpec::new("sh").with_args(["-c", "exit 0"]))
            .await
            .unwrap();
        assert!(ok.success);
        assert_eq!(ok.exit_code, Some(0));

        let failed = runner
            .run(&CommandSpec::new("sh").with_args(["-c", "echo oops >&2; exit 3"]))
            .await
            .unwrap();
        assert!(!failed.success);
        assert_eq!(failed.exit_code, Some(3));
        assert!(failed.stderr.contains("oops"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_runner_env_injection() {
        let runner = ProcessRunner::new();
        let out = runner
            .run(
                &CommandSpec::new("sh")
                    .with_args(["-c", "printf '%s' \"$CI_BUILD_STRING\""])
                    .with_env("CI_BUILD_STRING", "dev"),
            )
            .await
            .unwrap();

        assert!(out.success);
        assert_eq!(out.stdout, "dev");
    }

    #[tokio::test]
    async fn test_mocked_runner_honours_contract() {
        let mut mock = MockCommandRunner::new();
        mock.expect_run()
            .times(1)
            .returning(|_| Ok(CommandOutput::failed(1, "scripted")));

        let out = mock.run(&CommandSpec::new("anything")).await.unwrap();
        assert!(!out.success);
        assert_eq!(out.stderr, "scripted");
    }

    #[tokio::test]
    async fn test_spawn_failure_is_io_error() {
        let runner = ProcessRunner::new();
        let result = runner
            .run(&CommandSpec::new("definitely-not-a-real-program-5c1a"))
            .await;
        assert!(result.is_err());
    }
}
