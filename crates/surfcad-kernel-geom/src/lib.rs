#![warn(missing_docs)]

//! Parametric surfaces for the surfcad kernel.
//!
//! Every surface is a stateless evaluator over normalized parameters
//! `(u, v) ∈ [0, 1]²`. Periodic directions wrap, bounded directions clamp,
//! and [`ParametricSurface::clamp`] reports whether clamping was needed so
//! that curve tracers can tell when they walked off a patch boundary.
//!
//! # Key types
//!
//! - [`TorusSurface`] — periodic in both directions
//! - [`BezierSurface`] — C0 grid of bicubic Bézier segments
//! - [`PointSurface`] — degenerate constant surface (cursor assist)
//! - [`SurfaceDesc`] — plain-data description of a scene surface

pub mod bezier;
pub mod desc;
pub mod error;
pub mod point;
pub mod torus;

pub use bezier::BezierSurface;
pub use desc::{bezier_grid_from_de_boor, SurfaceDesc};
pub use error::{GeomError, Result};
pub use point::PointSurface;
pub use torus::TorusSurface;

use surfcad_kernel_math::{Point2, Point3, Vec3};

/// Below this length `du × dv` is treated as a vanishing normal.
pub const NORMAL_EPSILON: f64 = 1e-12;

/// The kind of a surface (for match-based dispatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceKind {
    /// Torus, periodic in `u` and `v`.
    Torus,
    /// Segmented bicubic Bézier grid.
    Bezier,
    /// Constant point.
    Point,
}

/// A parametric surface over normalized `(u, v)` parameters.
///
/// `evaluate`, `d_du`, `d_dv` and `normal` must agree with each other:
/// the normal is `normalize(d_du × d_dv)`.
pub trait ParametricSurface: Send + Sync + std::fmt::Debug {
    /// Evaluate the surface at `(u, v)`.
    fn evaluate(&self, uv: Point2) -> Point3;

    /// Partial derivative with respect to `u`.
    fn d_du(&self, uv: Point2) -> Vec3;

    /// Partial derivative with respect to `v`.
    fn d_dv(&self, uv: Point2) -> Vec3;

    /// Unit normal at `(u, v)`, or the zero vector where the surface is
    /// degenerate.
    fn normal(&self, uv: Point2) -> Vec3 {
        self.d_du(uv)
            .cross(&self.d_dv(uv))
            .try_normalize(NORMAL_EPSILON)
            .unwrap_or_else(Vec3::zeros)
    }

    /// Whether `u` wraps around.
    fn is_periodic_u(&self) -> bool;

    /// Whether `v` wraps around.
    fn is_periodic_v(&self) -> bool;

    /// Bring `uv` back into the parameter domain.
    ///
    /// Periodic directions wrap with `x - floor(x)`; bounded directions
    /// clamp to `[0, 1]`. Returns `false` if a bounded direction had to be
    /// clamped, i.e. the parameter had left the domain.
    fn clamp(&self, uv: &mut Point2) -> bool {
        let in_u = clamp_param(&mut uv.x, self.is_periodic_u());
        let in_v = clamp_param(&mut uv.y, self.is_periodic_v());
        in_u && in_v
    }

    /// The kind of this surface.
    fn kind(&self) -> SurfaceKind;
}

/// Wrap or clamp a single normalized parameter. Returns `false` when a
/// bounded parameter was outside `[0, 1]` or the value is not finite.
pub fn clamp_param(x: &mut f64, periodic: bool) -> bool {
    if !x.is_finite() {
        return false;
    }
    if periodic {
        *x -= x.floor();
        return true;
    }
    if *x < 0.0 {
        *x = 0.0;
        false
    } else if *x > 1.0 {
        *x = 1.0;
        false
    } else {
        true
    }
}
