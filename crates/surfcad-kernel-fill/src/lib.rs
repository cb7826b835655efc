#![warn(missing_docs)]

//! Triangular hole detection and Gregory patch filling for networks of
//! bicubic Bézier patches.
//!
//! [`HoleDetector`] finds triples of corner points joined pairwise by a
//! single patch edge, i.e. triangular gaps in the network. [`GregoryFill`]
//! turns one such [`Hole`] into three 20-point Gregory patches meeting
//! smoothly at the hole's centre.

pub mod error;
pub mod gregory;
pub mod holes;

pub use error::{FillError, Result};
pub use gregory::{GregoryFill, GregoryPatch, GregoryVertex, CONTROL_MESH_LEN, GREGORY_POINTS};
pub use holes::{ControlGrid, EdgeInfo, EdgePlacement, Hole, HoleDetector};

/// Identity of a control point shared between patches.
///
/// Two patches meet along an edge when their boundary rows start and end
/// at the same ids; positions alone are never compared.
pub type PointId = u64;
