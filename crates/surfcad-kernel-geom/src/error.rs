//! Error types for surface construction.

use thiserror::Error;

/// Errors raised while building a surface from scene data.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// A patch grid needs at least one segment in each direction.
    #[error("surface needs at least one segment per direction (got {segments_u}x{segments_v})")]
    EmptySegments {
        /// Segments along `u`.
        segments_u: usize,
        /// Segments along `v`.
        segments_v: usize,
    },

    /// The number of control points does not match the segment counts.
    #[error("control grid has {actual} points, expected {expected}")]
    GridSize {
        /// Expected number of points.
        expected: usize,
        /// Number of points supplied.
        actual: usize,
    },

    /// Torus radii must be positive and finite.
    #[error("invalid torus radii: major={major}, minor={minor}")]
    InvalidRadius {
        /// Major radius.
        major: f64,
        /// Minor radius.
        minor: f64,
    },
}

/// Result type for surface construction.
pub type Result<T> = std::result::Result<T, GeomError>;
