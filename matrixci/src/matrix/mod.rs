//! Build-matrix declaration and expansion.
//!
//! The matrix is an explicit enumerated cross-list: an ordered operating
//! system axis crossed with ordered (runtime version, numeric-library
//! version, docs flag) entries. The version pairing is declared, never
//! derived, so expansion can't silently change coverage.

mod cell;
mod spec;

pub use cell::MatrixCell;
pub use spec::{MatrixEntry, MatrixSpec};
