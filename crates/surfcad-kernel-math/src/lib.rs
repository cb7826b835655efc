#![warn(missing_docs)]

//! Math types for the surfcad kernel.
//!
//! Thin wrappers around nalgebra: points and vectors for surface
//! geometry, the 4D joint parameter vector `(u, v, s, t)` threaded through
//! the intersection solvers, and an affine model transform.

use nalgebra::{Matrix4, Vector3, Vector4};
use serde::{Deserialize, Serialize};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in 2D parameter space.
pub type Point2 = nalgebra::Point2<f64>;

/// Joint parameter vector `(u, v, s, t)`: `(u, v)` on the first surface,
/// `(s, t)` on the second.
pub type Vec4 = Vector4<f64>;

/// A 4x4 matrix.
pub type Mat4 = Matrix4<f64>;

/// Build a joint parameter vector from the two surface parameter pairs.
pub fn join_params(uv: Point2, st: Point2) -> Vec4 {
    Vec4::new(uv.x, uv.y, st.x, st.y)
}

/// The `(u, v)` half of a joint parameter vector.
pub fn params_p(params: &Vec4) -> Point2 {
    Point2::new(params.x, params.y)
}

/// The `(s, t)` half of a joint parameter vector.
pub fn params_q(params: &Vec4) -> Point2 {
    Point2::new(params.z, params.w)
}

/// Midpoint of two points.
pub fn midpoint(a: &Point3, b: &Point3) -> Point3 {
    Point3::from((a.coords + b.coords) * 0.5)
}

/// A 4x4 affine transformation matrix (the model matrix of a scene object).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Mat4,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Non-uniform scale by `(sx, sy, sz)`.
    pub fn scale(sx: f64, sy: f64, sz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 0)] = sx;
        m[(1, 1)] = sy;
        m[(2, 2)] = sz;
        Self { matrix: m }
    }

    /// Rotation about the X axis by `angle` radians.
    pub fn rotation_x(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(1, 1)] = c;
        m[(1, 2)] = -s;
        m[(2, 1)] = s;
        m[(2, 2)] = c;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Compose: `self` then `other` (self * other).
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vec4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vec4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
        assert_eq!(t, Transform::default());
    }

    #[test]
    fn test_translation_ignored_for_vectors() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - Point3::new(11.0, 22.0, 33.0)).norm() < 1e-12);

        let v = t.apply_vec(&Vec3::new(1.0, 0.0, 0.0));
        assert!((v - Vec3::x()).norm() < 1e-12);
    }

    #[test]
    fn test_rotation_z_90() {
        let t = Transform::rotation_z(PI / 2.0);
        let result = t.apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(result.x.abs() < 1e-12);
        assert!((result.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_x_90() {
        let t = Transform::rotation_x(PI / 2.0);
        let result = t.apply_point(&Point3::new(0.0, 1.0, 0.0));
        assert!(result.y.abs() < 1e-12);
        assert!((result.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_compose_applies_right_operand_first() {
        // scale * translate: (0,0,0) -> (1,0,0) -> (2,0,0)
        let composed =
            Transform::scale(2.0, 2.0, 2.0).then(&Transform::translation(1.0, 0.0, 0.0));
        let result = composed.apply_point(&Point3::origin());
        assert!((result.x - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_param_halves() {
        let params = join_params(Point2::new(0.1, 0.2), Point2::new(0.3, 0.4));
        assert_eq!(params_p(&params), Point2::new(0.1, 0.2));
        assert_eq!(params_q(&params), Point2::new(0.3, 0.4));
    }

    #[test]
    fn test_midpoint() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 4.0, -2.0);
        assert_eq!(midpoint(&a, &b), Point3::new(1.0, 2.0, -1.0));
    }

    #[test]
    fn test_transform_json_roundtrip() {
        let t = Transform::translation(1.0, 2.0, 3.0).then(&Transform::scale(2.0, 2.0, 2.0));
        let json = serde_json::to_string(&t).unwrap();
        let back: Transform = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t);
    }
}
