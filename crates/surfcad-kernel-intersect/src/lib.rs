#![warn(missing_docs)]

//! Surface-surface intersection tracing.
//!
//! [`Intersection`] finds a seed point with the conjugate-gradient
//! minimizer and marches the curve with damped Newton steps, producing an
//! [`IntersectionCurve`]: the polyline plus per-point parameters on both
//! surfaces and curve/surface normals. The curve utilities in [`stitch`]
//! combine two traced curves into one trimming boundary.
//!
//! # Example
//!
//! ```
//! use surfcad_kernel_geom::{BezierSurface, TorusSurface};
//! use surfcad_kernel_intersect::{Intersection, IntersectionConfig};
//! use surfcad_kernel_math::Point3;
//!
//! let torus = TorusSurface::new(1.0, 0.3).unwrap();
//! let mut grid = Vec::new();
//! for row in 0..4 {
//!     for col in 0..4 {
//!         let (x, z) = (col as f64 / 3.0 - 0.5, row as f64 / 3.0 - 0.5);
//!         grid.push(Point3::new(4.0 * x, 0.0, 4.0 * z));
//!     }
//! }
//! let plane = BezierSurface::new(grid, 1, 1, false, false).unwrap();
//!
//! let config = IntersectionConfig { cursor_samples: 4, ..Default::default() };
//! let curve = Intersection::new(&torus, &plane, config)
//!     .unwrap()
//!     .find_with_cursor(Point3::new(1.3, 0.0, 0.0))
//!     .unwrap();
//! assert!(curve.is_closed());
//! ```

pub mod config;
pub mod curve;
pub mod error;
pub mod intersection;
pub mod stitch;

pub use config::IntersectionConfig;
pub use curve::{compute_int_curve_normal, CurveSample, IntersectionCurve, SurfaceSide};
pub use error::{IntersectError, Result};
pub use intersection::Intersection;
pub use stitch::{intersect_curves, stitch_intersection_curves, Crossing, MIN_CROSSING_SEPARATION};
