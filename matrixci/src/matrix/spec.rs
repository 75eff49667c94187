//! Matrix declaration and expansion.

use super::MatrixCell;
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};

/// One declared matrix entry: a runtime version paired with a
/// numeric-library version and a docs flag.
///
/// The pairing is part of the declaration. Runtime and library versions are
/// never crossed with each other during expansion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixEntry {
    /// Language runtime version.
    pub runtime_version: String,
    /// Numeric-library version paired with this runtime version.
    pub numlib_version: String,
    /// Whether cells from this entry build documentation.
    #[serde(default)]
    pub build_docs: bool,
}

impl MatrixEntry {
    /// Creates a new entry with docs disabled.
    #[must_use]
    pub fn new(runtime_version: impl Into<String>, numlib_version: impl Into<String>) -> Self {
        Self {
            runtime_version: runtime_version.into(),
            numlib_version: numlib_version.into(),
            build_docs: false,
        }
    }

    /// Enables the documentation build for this entry's cells.
    #[must_use]
    pub fn with_docs(mut self) -> Self {
        self.build_docs = true;
        self
    }
}

/// The declared build matrix: an ordered OS axis and ordered paired entries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatrixSpec {
    /// Operating system axis values, in declaration order.
    #[serde(default)]
    pub oses: Vec<String>,
    /// Paired (runtime, numlib, docs) entries, in declaration order.
    #[serde(default)]
    pub entries: Vec<MatrixEntry>,
}

impl MatrixSpec {
    /// Creates an empty matrix.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an operating system axis value.
    #[must_use]
    pub fn with_os(mut self, os: impl Into<String>) -> Self {
        self.oses.push(os.into());
        self
    }

    /// Adds a paired entry.
    #[must_use]
    pub fn with_entry(mut self, entry: MatrixEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Number of cells expansion will produce.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.entries.len() * self.oses.len()
    }

    /// Returns true if expansion yields no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cell_count() == 0
    }

    /// Validates the declaration.
    ///
    /// # Errors
    ///
    /// Returns an error if any axis value is blank or a (runtime, numlib)
    /// pair is declared twice.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for os in &self.oses {
            if os.trim().is_empty() {
                return Err(ConfigError::new("matrix OS value cannot be blank").with_field("oses"));
            }
        }
        for entry in &self.entries {
            if entry.runtime_version.trim().is_empty() || entry.numlib_version.trim().is_empty() {
                return Err(
                    ConfigError::new("matrix entry versions cannot be blank").with_field("entries")
                );
            }
        }

        let mut seen = std::collections::HashSet::new();
        for entry in &self.entries {
            let key = (entry.runtime_version.as_str(), entry.numlib_version.as_str());
            if !seen.insert(key) {
                return Err(ConfigError::new(format!(
                    "matrix entry ({}, {}) declared more than once",
                    entry.runtime_version, entry.numlib_version
                ))
                .with_field("entries"));
            }
        }

        Ok(())
    }

    /// Expands the declaration into the ordered list of cells to execute.
    ///
    /// For each declared entry, for each OS, one cell is emitted
    /// (entry-major, OS-minor). Expansion is total and order-preserving;
    /// nothing beyond the explicit enumeration is generated. An empty axis
    /// yields an empty list.
    #[must_use]
    pub fn expand(&self) -> Vec<MatrixCell> {
        let mut cells = Vec::with_capacity(self.cell_count());
        for entry in &self.entries {
            for os in &self.oses {
                cells.push(MatrixCell::new(
                    os.clone(),
                    entry.runtime_version.clone(),
                    entry.numlib_version.clone(),
                    entry.build_docs,
                ));
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference_matrix() -> MatrixSpec {
        MatrixSpec::new()
            .with_os("linux")
            .with_os("macos")
            .with_entry(MatrixEntry::new("3.10", "1.24"))
            .with_entry(MatrixEntry::new("3.11", "1.25"))
            .with_entry(MatrixEntry::new("3.12", "1.26").with_docs())
    }

    #[test]
    fn test_expansion_count_matches_declaration() {
        let matrix = reference_matrix();
        let cells = matrix.expand();
        assert_eq!(cells.len(), matrix.cell_count());
        assert_eq!(cells.len(), 6);
    }

    #[test]
    fn test_expansion_preserves_declaration_order() {
        let cells = reference_matrix().expand();
        let labels: Vec<String> = cells.iter().map(MatrixCell::label).collect();
        assert_eq!(
            labels,
            vec![
                "linux/runtime-3.10/numlib-1.24",
                "macos/runtime-3.10/numlib-1.24",
                "linux/runtime-3.11/numlib-1.25",
                "macos/runtime-3.11/numlib-1.25",
                "linux/runtime-3.12/numlib-1.26",
                "macos/runtime-3.12/numlib-1.26",
            ]
        );
    }

    #[test]
    fn test_expansion_has_no_duplicates() {
        let cells = reference_matrix().expand();
        let unique: std::collections::HashSet<_> = cells.iter().collect();
        assert_eq!(unique.len(), cells.len());
    }

    #[test]
    fn test_pairing_is_never_crossed() {
        // 3.10 is paired with 1.24 only; no cell may combine 3.10 with
        // another declared library version.
        let cells = reference_matrix().expand();
        for cell in &cells {
            if cell.runtime_version == "3.10" {
                assert_eq!(cell.numlib_version, "1.24");
            }
        }
    }

    #[test]
    fn test_docs_flag_attaches_to_its_entry_only() {
        let cells = reference_matrix().expand();
        for cell in &cells {
            assert_eq!(cell.build_docs, cell.runtime_version == "3.12");
        }
    }

    #[test]
    fn test_empty_axis_expands_to_nothing() {
        let no_entries = MatrixSpec::new().with_os("linux");
        assert!(no_entries.is_empty());
        assert!(no_entries.expand().is_empty());

        let no_oses = MatrixSpec::new().with_entry(MatrixEntry::new("3.12", "1.26"));
        assert!(no_oses.is_empty());
        assert!(no_oses.expand().is_empty());
    }

    #[test]
    fn test_validate_rejects_blank_values() {
        let matrix = MatrixSpec::new().with_os("  ");
        assert!(matrix.validate().is_err());

        let matrix = MatrixSpec::new()
            .with_os("linux")
            .with_entry(MatrixEntry::new("", "1.26"));
        assert!(matrix.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_duplicate_pairs() {
        let matrix = MatrixSpec::new()
            .with_os("linux")
            .with_entry(MatrixEntry::new("3.12", "1.26"))
            .with_entry(MatrixEntry::new("3.12", "1.26").with_docs());
        assert!(matrix.validate().is_err());
    }

    #[test]
    fn test_matrix_serialization() -> anyhow::Result<()> {
        let matrix = reference_matrix();
        let json = serde_json::to_string(&matrix)?;
        let back: MatrixSpec = serde_json::from_str(&json)?;
        assert_eq!(matrix, back);
        Ok(())
    }
}
