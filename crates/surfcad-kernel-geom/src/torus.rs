//! Torus surface.

use std::f64::consts::TAU;

use surfcad_kernel_math::{Point2, Point3, Transform, Vec3};

use crate::{GeomError, ParametricSurface, Result, SurfaceKind};

/// A torus around the local Y axis, placed by a model transform.
///
/// Parameterization with `α = 2πu`, `β = 2πv`:
/// ```text
/// P(u, v) = M · ((R + r·cos β)·cos α, r·sin β, (R + r·cos β)·sin α)
/// ```
///
/// The model transform is applied to points and derivatives, so the
/// surface lives in world space like the rest of the scene.
#[derive(Debug, Clone)]
pub struct TorusSurface {
    /// Distance from the torus center to the tube center.
    pub major_radius: f64,
    /// Tube radius.
    pub minor_radius: f64,
    /// Model transform.
    pub transform: Transform,
}

impl TorusSurface {
    /// Create a torus at the origin.
    pub fn new(major_radius: f64, minor_radius: f64) -> Result<Self> {
        Self::with_transform(major_radius, minor_radius, Transform::identity())
    }

    /// Create a torus placed by `transform`.
    pub fn with_transform(
        major_radius: f64,
        minor_radius: f64,
        transform: Transform,
    ) -> Result<Self> {
        let valid = |r: f64| r.is_finite() && r > 0.0;
        if !valid(major_radius) || !valid(minor_radius) {
            return Err(GeomError::InvalidRadius {
                major: major_radius,
                minor: minor_radius,
            });
        }
        Ok(Self {
            major_radius,
            minor_radius,
            transform,
        })
    }

    fn angles(uv: Point2) -> ((f64, f64), (f64, f64)) {
        ((TAU * uv.x).sin_cos(), (TAU * uv.y).sin_cos())
    }
}

impl ParametricSurface for TorusSurface {
    fn evaluate(&self, uv: Point2) -> Point3 {
        let ((sin_a, cos_a), (sin_b, cos_b)) = Self::angles(uv);
        let ring = self.major_radius + self.minor_radius * cos_b;
        let local = Point3::new(ring * cos_a, self.minor_radius * sin_b, ring * sin_a);
        self.transform.apply_point(&local)
    }

    fn d_du(&self, uv: Point2) -> Vec3 {
        let ((sin_a, cos_a), (_, cos_b)) = Self::angles(uv);
        let ring = self.major_radius + self.minor_radius * cos_b;
        let local = TAU * Vec3::new(-ring * sin_a, 0.0, ring * cos_a);
        self.transform.apply_vec(&local)
    }

    fn d_dv(&self, uv: Point2) -> Vec3 {
        let ((sin_a, cos_a), (sin_b, cos_b)) = Self::angles(uv);
        let r = self.minor_radius;
        let local = TAU * Vec3::new(-r * sin_b * cos_a, r * cos_b, -r * sin_b * sin_a);
        self.transform.apply_vec(&local)
    }

    fn is_periodic_u(&self) -> bool {
        true
    }

    fn is_periodic_v(&self) -> bool {
        true
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Torus
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid() -> impl Iterator<Item = Point2> {
        (0..=8).flat_map(|i| (0..=8).map(move |j| Point2::new(i as f64 / 8.0, j as f64 / 8.0)))
    }

    #[test]
    fn test_outer_equator() {
        let torus = TorusSurface::new(2.0, 0.5).unwrap();
        let p = torus.evaluate(Point2::new(0.0, 0.0));
        assert_relative_eq!(p.x, 2.5, epsilon = 1e-12);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-12);

        // Top of the tube at v = 1/4.
        let top = torus.evaluate(Point2::new(0.0, 0.25));
        assert_relative_eq!(top.y, 0.5, epsilon = 1e-12);
        assert_relative_eq!(top.x, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_periodicity() {
        let torus = TorusSurface::new(1.0, 0.3).unwrap();
        for k in 0..=10 {
            let t = k as f64 / 10.0;
            let a = torus.evaluate(Point2::new(0.0, t));
            let b = torus.evaluate(Point2::new(1.0, t));
            assert!((a - b).norm() < 1e-12);

            let c = torus.evaluate(Point2::new(t, 0.0));
            let d = torus.evaluate(Point2::new(t, 1.0));
            assert!((c - d).norm() < 1e-12);
        }
    }

    #[test]
    fn test_normal_orthogonal_to_derivatives() {
        let transform = Transform::translation(1.0, -2.0, 0.5).then(&Transform::rotation_x(0.7));
        let torus = TorusSurface::with_transform(1.5, 0.4, transform).unwrap();
        for uv in grid() {
            let n = torus.normal(uv);
            assert!(n.dot(&torus.d_du(uv)).abs() < 1e-4);
            assert!(n.dot(&torus.d_dv(uv)).abs() < 1e-4);
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let torus = TorusSurface::new(1.0, 0.25).unwrap();
        let h = 1e-6;
        for uv in grid() {
            let fd_u = (torus.evaluate(Point2::new(uv.x + h, uv.y))
                - torus.evaluate(Point2::new(uv.x - h, uv.y)))
                / (2.0 * h);
            let fd_v = (torus.evaluate(Point2::new(uv.x, uv.y + h))
                - torus.evaluate(Point2::new(uv.x, uv.y - h)))
                / (2.0 * h);
            assert!((fd_u - torus.d_du(uv)).norm() < 1e-5);
            assert!((fd_v - torus.d_dv(uv)).norm() < 1e-5);
        }
    }

    #[test]
    fn test_transform_applied() {
        let torus =
            TorusSurface::with_transform(1.0, 0.2, Transform::translation(0.0, 3.0, 0.0)).unwrap();
        let p = torus.evaluate(Point2::new(0.0, 0.0));
        assert_relative_eq!(p.y, 3.0, epsilon = 1e-12);
        assert_relative_eq!(p.x, 1.2, epsilon = 1e-12);
    }

    #[test]
    fn test_clamp_always_wraps() {
        let torus = TorusSurface::new(1.0, 0.2).unwrap();
        let mut uv = Point2::new(1.75, -0.5);
        assert!(torus.clamp(&mut uv));
        assert_relative_eq!(uv.x, 0.75, epsilon = 1e-12);
        assert_relative_eq!(uv.y, 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_invalid_radius() {
        assert!(TorusSurface::new(0.0, 1.0).is_err());
        assert!(TorusSurface::new(1.0, -0.5).is_err());
        assert!(TorusSurface::new(f64::NAN, 0.5).is_err());
    }
}
