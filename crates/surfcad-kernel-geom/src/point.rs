//! Degenerate constant surface.

use surfcad_kernel_math::{Point2, Point3, Vec3};

use crate::{ParametricSurface, SurfaceKind};

/// A surface that evaluates to the same point everywhere.
///
/// Intersecting a real surface with a `PointSurface` turns the distance
/// minimizer into a closest-point query, which is how a cursor position
/// biases intersection seeding.
#[derive(Debug, Clone)]
pub struct PointSurface {
    /// The constant position.
    pub position: Point3,
}

impl PointSurface {
    /// Create a constant surface at `position`.
    pub fn new(position: Point3) -> Self {
        Self { position }
    }
}

impl ParametricSurface for PointSurface {
    fn evaluate(&self, _uv: Point2) -> Point3 {
        self.position
    }

    fn d_du(&self, _uv: Point2) -> Vec3 {
        Vec3::zeros()
    }

    fn d_dv(&self, _uv: Point2) -> Vec3 {
        Vec3::zeros()
    }

    fn normal(&self, _uv: Point2) -> Vec3 {
        Vec3::zeros()
    }

    // Parameters are meaningless, so they wrap and never leave the domain.
    fn is_periodic_u(&self) -> bool {
        true
    }

    fn is_periodic_v(&self) -> bool {
        true
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Point
    }
}
