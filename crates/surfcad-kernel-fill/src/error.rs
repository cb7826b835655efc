//! Error types for hole detection and filling.

use thiserror::Error;

use crate::PointId;

/// Errors that can occur while detecting or filling holes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FillError {
    /// A closed triangle referenced an edge that was never recorded.
    #[error("hole side {from} -> {to} has no recorded edge")]
    MissingEdge {
        /// Start point of the side.
        from: PointId,
        /// End point of the side.
        to: PointId,
    },

    /// A control grid does not match its segment counts.
    #[error("surface {surface}: expected {expected} control points, got {actual}")]
    GridSize {
        /// Index of the offending grid in the input.
        surface: usize,
        /// `(3·segments_u + 1) · (3·segments_v + 1)`.
        expected: usize,
        /// Number of ids or positions supplied.
        actual: usize,
    },
}

/// Result type for fill operations.
pub type Result<T> = std::result::Result<T, FillError>;
