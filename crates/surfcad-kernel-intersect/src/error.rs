//! Error types for intersection tracing.

use surfcad_kernel_solve::SolveError;
use thiserror::Error;

/// Errors that can occur while tracing an intersection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IntersectError {
    /// The seed search found no point where the surfaces coincide.
    #[error("No {}intersection detected", if *.self_intersection { "self-" } else { "" })]
    NoIntersection {
        /// Whether this was a self-intersection request.
        self_intersection: bool,
    },

    /// The configuration is unusable.
    #[error("invalid intersection settings: {0}")]
    InvalidConfig(String),

    /// The nested solver settings are unusable.
    #[error(transparent)]
    Solver(#[from] SolveError),
}

/// Result type for intersection operations.
pub type Result<T> = std::result::Result<T, IntersectError>;
