//! Environment-derived trigger facts.

use serde::{Deserialize, Serialize};

/// Environment variable holding the triggering tag, empty when untagged.
pub const TAG_VAR: &str = "CI_TAG";
/// Environment variable holding the triggering branch.
pub const BRANCH_VAR: &str = "CI_BRANCH";
/// Environment variable holding the repository identity (`owner/name`).
pub const REPO_VAR: &str = "CI_REPO_SLUG";

/// Facts about what triggered the run.
///
/// Resolved once per run from the executing environment and read-only
/// thereafter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerFacts {
    /// The triggering tag, or empty when the run was not tag-triggered.
    #[serde(default)]
    pub tag: String,
    /// The triggering branch.
    #[serde(default)]
    pub branch: String,
    /// Repository identity as `owner/name`.
    #[serde(default)]
    pub repo: String,
}

impl TriggerFacts {
    /// Creates trigger facts from explicit values.
    #[must_use]
    pub fn new(
        tag: impl Into<String>,
        branch: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self {
            tag: tag.into(),
            branch: branch.into(),
            repo: repo.into(),
        }
    }

    /// Reads trigger facts from the process environment.
    ///
    /// Unset variables resolve to empty strings, matching the contract
    /// "tag name or empty".
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            tag: std::env::var(TAG_VAR).unwrap_or_default(),
            branch: std::env::var(BRANCH_VAR).unwrap_or_default(),
            repo: std::env::var(REPO_VAR).unwrap_or_default(),
        }
    }

    /// Returns true when the run was triggered by a tag.
    #[must_use]
    pub fn has_tag(&self) -> bool {
        !self.tag.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_facts() {
        let facts = TriggerFacts::new("v1.2.3", "release", "landlab/landlab");
        assert_eq!(facts.tag, "v1.2.3");
        assert_eq!(facts.branch, "release");
        assert_eq!(facts.repo, "landlab/landlab");
        assert!(facts.has_tag());
    }

    #[test]
    fn test_untagged_facts() {
        let facts = TriggerFacts::new("", "main", "landlab/landlab");
        assert!(!facts.has_tag());
    }

    #[test]
    fn test_serialization_defaults() {
        let facts: TriggerFacts = serde_json::from_str("{}").unwrap();
        assert_eq!(facts, TriggerFacts::default());
    }
}
