//! Deployment gate predicates.

use crate::context::TriggerFacts;
use crate::errors::ConfigError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A glob-style tag pattern (`*` matches any run of characters).
///
/// Compiled to an anchored regex at construction, so a malformed pattern is
/// a configuration error rather than a silent non-match at gate time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TagPattern {
    pattern: String,
    regex: Regex,
}

impl TagPattern {
    /// Compiles a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is empty.
    pub fn new(pattern: impl Into<String>) -> Result<Self, ConfigError> {
        let pattern = pattern.into();
        if pattern.trim().is_empty() {
            return Err(ConfigError::new("tag pattern cannot be empty").with_field("tag_pattern"));
        }

        let mut source = String::from("^");
        for (i, part) in pattern.split('*').enumerate() {
            if i > 0 {
                source.push_str(".*");
            }
            source.push_str(&regex::escape(part));
        }
        source.push('$');

        let regex = Regex::new(&source)
            .map_err(|e| ConfigError::new(format!("invalid tag pattern: {e}")).with_field("tag_pattern"))?;

        Ok(Self { pattern, regex })
    }

    /// Returns the original glob pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns true when a tag is present and matches the pattern.
    ///
    /// An empty tag never matches, so "tag present" is part of the
    /// predicate.
    #[must_use]
    pub fn matches(&self, tag: &str) -> bool {
        !tag.is_empty() && self.regex.is_match(tag)
    }
}

impl PartialEq for TagPattern {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for TagPattern {}

impl fmt::Display for TagPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.pattern)
    }
}

impl TryFrom<String> for TagPattern {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TagPattern> for String {
    fn from(value: TagPattern) -> Self {
        value.pattern
    }
}

/// The run-scoped deployment gate.
///
/// A conjunction over trigger facts: the tag must be present and match the
/// pattern, the branch and repository identity must equal their fixed
/// values exactly. Evaluated once per run, only after full-matrix success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentGate {
    /// Release tag pattern.
    pub tag_pattern: TagPattern,
    /// Branch the release must come from.
    pub release_branch: String,
    /// Canonical repository identity (`owner/name`).
    pub repo: String,
}

impl DeploymentGate {
    /// Creates a new gate.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag pattern is invalid.
    pub fn new(
        tag_pattern: impl Into<String>,
        release_branch: impl Into<String>,
        repo: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            tag_pattern: TagPattern::new(tag_pattern)?,
            release_branch: release_branch.into(),
            repo: repo.into(),
        })
    }

    /// Evaluates the gate against trigger facts.
    #[must_use]
    pub fn evaluate(&self, facts: &TriggerFacts) -> GateDecision {
        GateDecision {
            tag_matched: self.tag_pattern.matches(&facts.tag),
            branch_matched: facts.branch == self.release_branch,
            repo_matched: facts.repo == self.repo,
        }
    }
}

/// The recorded result of one gate evaluation.
///
/// Per-predicate results stay visible in the run report so a skipped
/// deployment explains itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateDecision {
    /// Whether the tag was present and matched the release pattern.
    pub tag_matched: bool,
    /// Whether the branch equalled the release branch.
    pub branch_matched: bool,
    /// Whether the repository identity equalled the canonical one.
    pub repo_matched: bool,
}

impl GateDecision {
    /// Returns true when every predicate held.
    #[must_use]
    pub fn holds(&self) -> bool {
        self.tag_matched && self.branch_matched && self.repo_matched
    }
}
