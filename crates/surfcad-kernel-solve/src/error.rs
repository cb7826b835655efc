//! Error types for solver settings.

use thiserror::Error;

/// Errors reported by solver settings validation.
///
/// Solver runs themselves never fail with an error; see the crate docs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolveError {
    /// A settings field is out of range.
    #[error("invalid solver settings: {0}")]
    InvalidConfig(String),
}

/// Result type for solver settings validation.
pub type Result<T> = std::result::Result<T, SolveError>;
