//! A single expanded matrix cell.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One concrete combination of matrix axis values.
///
/// Identity is the tuple of axis values. Cells are created at expansion
/// time and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MatrixCell {
    /// Operating system value.
    pub os: String,
    /// Language runtime version.
    pub runtime_version: String,
    /// Numeric-library version paired with the runtime version.
    pub numlib_version: String,
    /// Whether this cell builds documentation.
    pub build_docs: bool,
}

impl MatrixCell {
    /// Creates a new cell.
    #[must_use]
    pub fn new(
        os: impl Into<String>,
        runtime_version: impl Into<String>,
        numlib_version: impl Into<String>,
        build_docs: bool,
    ) -> Self {
        Self {
            os: os.into(),
            runtime_version: runtime_version.into(),
            numlib_version: numlib_version.into(),
            build_docs,
        }
    }

    /// A short human-readable label, used in events and reports.
    #[must_use]
    pub fn label(&self) -> String {
        format!(
            "{}/runtime-{}/numlib-{}",
            self.os, self.runtime_version, self.numlib_version
        )
    }
}

impl fmt::Display for MatrixCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_label() {
        let cell = MatrixCell::new("linux", "3.12", "1.26", true);
        assert_eq!(cell.label(), "linux/runtime-3.12/numlib-1.26");
        assert_eq!(cell.to_string(), cell.label());
    }

    #[test]
    fn test_cell_identity_is_axis_tuple() {
        let a = MatrixCell::new("linux", "3.12", "1.26", false);
        let b = MatrixCell::new("linux", "3.12", "1.26", false);
        let c = MatrixCell::new("macos", "3.12", "1.26", false);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_cell_serialization() {
        let cell = MatrixCell::new("macos", "3.11", "1.24", false);
        let json = serde_json::to_string(&cell).unwrap();
        let back: MatrixCell = serde_json::from_str(&json).unwrap();
        assert_eq!(cell, back);
    }
}
