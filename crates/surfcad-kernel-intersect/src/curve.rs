//! Traced intersection curves.

use surfcad_kernel_math::{params_p, params_q, Point2, Point3, Vec3, Vec4};

/// Below this length a curve normal is reported as the zero vector.
const CURVE_NORMAL_EPSILON: f64 = 1e-12;

/// Which surface of the pair a per-point quantity refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceSide {
    /// The first surface `P(u, v)`.
    P,
    /// The second surface `Q(s, t)`.
    Q,
}

/// Normal of the intersection curve lying in the tangent plane of one
/// surface.
///
/// The curve tangent is `nP × nQ`; the in-surface normal is that
/// surface's normal crossed with the tangent. Degenerate inputs (parallel
/// or zero normals) give the zero vector.
pub fn compute_int_curve_normal(normal_p: Vec3, normal_q: Vec3, side: SurfaceSide) -> Vec3 {
    let Some(tangent) = normal_p.cross(&normal_q).try_normalize(CURVE_NORMAL_EPSILON) else {
        return Vec3::zeros();
    };
    let normal = match side {
        SurfaceSide::P => normal_p,
        SurfaceSide::Q => normal_q,
    };
    normal
        .cross(&tangent)
        .try_normalize(CURVE_NORMAL_EPSILON)
        .unwrap_or_else(Vec3::zeros)
}

/// Everything recorded for one traced point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveSample {
    /// Midpoint of `P(u, v)` and `Q(s, t)`.
    pub point: Point3,
    /// `(u, v, s, t)`.
    pub params: Vec4,
    /// Curve normal in the tangent plane of `P`.
    pub normal_p: Vec3,
    /// Curve normal in the tangent plane of `Q`.
    pub normal_q: Vec3,
    /// Surface normal of `P`.
    pub surface_normal_p: Vec3,
    /// Surface normal of `Q`.
    pub surface_normal_q: Vec3,
}

/// A traced intersection polyline with per-point parameters and normals.
///
/// All sequences have the same length. A closed loop repeats its first
/// point exactly at the end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IntersectionCurve {
    /// Curve points in 3D.
    pub points: Vec<Point3>,
    /// `(u, v, s, t)` per point.
    pub params: Vec<Vec4>,
    /// Curve normals in the tangent plane of `P`.
    pub normals_p: Vec<Vec3>,
    /// Curve normals in the tangent plane of `Q`.
    pub normals_q: Vec<Vec3>,
    /// Surface normals of `P`.
    pub surface_normals_p: Vec<Vec3>,
    /// Surface normals of `Q`.
    pub surface_normals_q: Vec<Vec3>,
}

impl IntersectionCurve {
    /// Create an empty curve.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample.
    pub fn push(&mut self, sample: CurveSample) {
        self.points.push(sample.point);
        self.params.push(sample.params);
        self.normals_p.push(sample.normal_p);
        self.normals_q.push(sample.normal_q);
        self.surface_normals_p.push(sample.surface_normal_p);
        self.surface_normals_q.push(sample.surface_normal_q);
    }

    /// Sample at `index`, if in range.
    pub fn sample(&self, index: usize) -> Option<CurveSample> {
        Some(CurveSample {
            point: *self.points.get(index)?,
            params: *self.params.get(index)?,
            normal_p: *self.normals_p.get(index)?,
            normal_q: *self.normals_q.get(index)?,
            surface_normal_p: *self.surface_normals_p.get(index)?,
            surface_normal_q: *self.surface_normals_q.get(index)?,
        })
    }

    /// Number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if the curve has no points.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// True if the last point repeats the first.
    pub fn is_closed(&self) -> bool {
        self.points.len() > 2 && self.points.first() == self.points.last()
    }

    /// Reverse the point order in place.
    pub fn reverse(&mut self) {
        self.points.reverse();
        self.params.reverse();
        self.normals_p.reverse();
        self.normals_q.reverse();
        self.surface_normals_p.reverse();
        self.surface_normals_q.reverse();
    }

    /// Move every point of `other` onto the end of `self`.
    pub fn append(&mut self, other: &mut IntersectionCurve) {
        self.points.append(&mut other.points);
        self.params.append(&mut other.params);
        self.normals_p.append(&mut other.normals_p);
        self.normals_q.append(&mut other.normals_q);
        self.surface_normals_p.append(&mut other.surface_normals_p);
        self.surface_normals_q.append(&mut other.surface_normals_q);
    }

    /// The `(u, v)` trace of the curve on `P`.
    pub fn params_on_p(&self) -> Vec<Point2> {
        self.params.iter().map(params_p).collect()
    }

    /// The `(s, t)` trace of the curve on `Q`.
    pub fn params_on_q(&self) -> Vec<Point2> {
        self.params.iter().map(params_q).collect()
    }

    /// Curve normals on the given side.
    pub fn normals(&self, side: SurfaceSide) -> &[Vec3] {
        match side {
            SurfaceSide::P => &self.normals_p,
            SurfaceSide::Q => &self.normals_q,
        }
    }
}
