//! Per-instance run context resolution.

use super::TriggerFacts;
use crate::deploy::TagPattern;
use crate::matrix::MatrixCell;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Build-string sentinel marking a non-release build.
pub const DEV_BUILD_STRING: &str = "dev";

/// The read-only fact set one run instance executes against.
///
/// Derived exactly once when the instance starts; stages only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    /// The triggering tag, or empty.
    pub tag: String,
    /// The triggering branch.
    pub branch: String,
    /// Repository identity as `owner/name`.
    pub repo: String,
    /// Operating system of the bound cell.
    pub os: String,
    /// Runtime version of the bound cell.
    pub runtime_version: String,
    /// Numeric-library version of the bound cell.
    pub numlib_version: String,
    /// Whether this cell builds documentation.
    pub build_docs: bool,
    /// True iff the triggering tag matches the release pattern.
    pub is_release: bool,
    /// Empty for release builds, [`DEV_BUILD_STRING`] otherwise.
    pub build_string: String,
}

impl RunContext {
    /// Resolves the context for one cell.
    ///
    /// Has no side effects beyond a diagnostic log line with the resolved
    /// facts.
    #[must_use]
    pub fn resolve(facts: &TriggerFacts, cell: &MatrixCell, release_pattern: &TagPattern) -> Self {
        let is_release = release_pattern.matches(&facts.tag);
        let build_string = if is_release {
            String::new()
        } else {
            DEV_BUILD_STRING.to_string()
        };

        let ctx = Self {
            tag: facts.tag.clone(),
            branch: facts.branch.clone(),
            repo: facts.repo.clone(),
            os: cell.os.clone(),
            runtime_version: cell.runtime_version.clone(),
            numlib_version: cell.numlib_version.clone(),
            build_docs: cell.build_docs,
            is_release,
            build_string,
        };

        debug!(
            cell = %cell.label(),
            tag = %ctx.tag,
            branch = %ctx.branch,
            repo = %ctx.repo,
            is_release = ctx.is_release,
            build_string = %ctx.build_string,
            "resolved run context"
        );

        ctx
    }

    /// The environment variables injected into every stage command.
    ///
    /// `BTreeMap` keeps the injection deterministic.
    #[must_use]
    pub fn env_map(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("CI_TAG".to_string(), self.tag.clone());
        env.insert("CI_BRANCH".to_string(), self.branch.clone());
        env.insert("CI_REPO_SLUG".to_string(), self.repo.clone());
        env.insert("CI_OS".to_string(), self.os.clone());
        env.insert("CI_RUNTIME_VERSION".to_string(), self.runtime_version.clone());
        env.insert("CI_NUMLIB_VERSION".to_string(), self.numlib_version.clone());
        env.insert(
            "CI_BUILD_DOCS".to_string(),
            if self.build_docs { "1" } else { "0" }.to_string(),
        );
        env.insert("CI_BUILD_STRING".to_string(), self.build_string.clone());
        env
    }
}
