//! The fixed five-stage plan executed by every run instance.

use crate::command::CommandSpec;
use crate::context::RunContext;
use crate::errors::PipelineError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of a pipeline stage, in execution order.
///
/// `Docs` is the only conditional, non-fatal stage; the other four are
/// mandatory gates for their run instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    /// Install the isolated runtime toolchain for the cell.
    Setup,
    /// Build the binary distribution artifact.
    Build,
    /// Install the just-built artifact from local build output.
    Install,
    /// Build human-readable documentation (conditional, non-fatal).
    Docs,
    /// Run the package's own test suite against the installed artifact.
    Test,
}

impl StageKind {
    /// All stages in their fixed execution order.
    pub const ORDERED: [Self; 5] = [Self::Setup, Self::Build, Self::Install, Self::Docs, Self::Test];

    /// Returns true if a failure in this stage fails its run instance.
    #[must_use]
    pub fn is_fatal(self) -> bool {
        !matches!(self, Self::Docs)
    }

    /// Evaluates the stage guard against the instance context.
    #[must_use]
    pub fn runs_for(self, ctx: &RunContext) -> bool {
        match self {
            Self::Docs => ctx.build_docs,
            _ => true,
        }
    }

    /// Maps a failed stage to its error class.
    #[must_use]
    pub fn failure(self, detail: impl Into<String>) -> PipelineError {
        let detail = detail.into();
        match self {
            Self::Setup => PipelineError::Toolchain { detail },
            Self::Build => PipelineError::Build { detail },
            Self::Install => PipelineError::Install { detail },
            Self::Docs => PipelineError::Docs { detail },
            Self::Test => PipelineError::Test { detail },
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Build => write!(f, "build"),
            Self::Install => write!(f, "install"),
            Self::Docs => write!(f, "docs"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// The commands implementing each stage for one pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageCommands {
    /// Toolchain installer invocation.
    pub setup: CommandSpec,
    /// Package builder invocation.
    pub build: CommandSpec,
    /// Local installer invocation.
    pub install: CommandSpec,
    /// Documentation builder invocation.
    pub docs: CommandSpec,
    /// Test-runner invocation.
    pub test: CommandSpec,
}

impl StageCommands {
    /// Returns the command for a stage kind.
    #[must_use]
    pub fn command(&self, kind: StageKind) -> &CommandSpec {
        match kind {
            StageKind::Setup => &self.setup,
            StageKind::Build => &self.build,
            StageKind::Install => &self.install,
            StageKind::Docs => &self.docs,
            StageKind::Test => &self.test,
        }
    }

    /// Binds the commands to one instance context.
    ///
    /// Cell facts are injected as environment variables; declared command
    /// env entries win over injected ones so a pipeline can pin a value.
    #[must_use]
    pub fn plan_for(&self, ctx: &RunContext) -> StagePlan {
        let base_env = ctx.env_map();
        let bind = |spec: &CommandSpec| {
            let mut bound = spec.clone();
            let mut env = base_env.clone();
            env.extend(std::mem::take(&mut bound.env));
            bound.env = env;
            bound
        };

        StagePlan {
            setup: bind(&self.setup),
            build: bind(&self.build),
            install: bind(&self.install),
            docs: bind(&self.docs),
            test: bind(&self.test),
        }
    }
}

/// Stage commands bound to a single run instance's context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    setup: CommandSpec,
    build: CommandSpec,
    install: CommandSpec,
    docs: CommandSpec,
    test: CommandSpec,
}

impl StagePlan {
    /// Returns the bound command for a stage kind.
    #[must_use]
    pub fn command(&self, kind: StageKind) -> &CommandSpec {
        match kind {
            StageKind::Setup => &self.setup,
            StageKind::Build => &self.build,
            StageKind::Install => &self.install,
            StageKind::Docs => &self.docs,
            StageKind::Test => &self.test,
        }
    }
}
