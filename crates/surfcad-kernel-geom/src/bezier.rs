//! Segmented bicubic Bézier surface (C0 control grid).

use surfcad_kernel_math::{Point2, Point3, Vec3};

use crate::{GeomError, ParametricSurface, Result, SurfaceKind};

/// A grid of bicubic Bézier patches sharing boundary control points.
///
/// The control grid has `3·segments_u + 1` columns (along `u`) and
/// `3·segments_v + 1` rows (along `v`), stored row by row. Segment `(i, j)`
/// owns the 4x4 block whose top-left control point is at column `3i`,
/// row `3j`. For a cylinder the last column repeats the first one and
/// `periodic_u` is set.
#[derive(Debug, Clone)]
pub struct BezierSurface {
    points: Vec<Point3>,
    segments_u: usize,
    segments_v: usize,
    periodic_u: bool,
    periodic_v: bool,
}

impl BezierSurface {
    /// Create a surface from a row-major C0 control grid.
    pub fn new(
        points: Vec<Point3>,
        segments_u: usize,
        segments_v: usize,
        periodic_u: bool,
        periodic_v: bool,
    ) -> Result<Self> {
        if segments_u == 0 || segments_v == 0 {
            return Err(GeomError::EmptySegments {
                segments_u,
                segments_v,
            });
        }
        let expected = (3 * segments_u + 1) * (3 * segments_v + 1);
        if points.len() != expected {
            return Err(GeomError::GridSize {
                expected,
                actual: points.len(),
            });
        }
        Ok(Self {
            points,
            segments_u,
            segments_v,
            periodic_u,
            periodic_v,
        })
    }

    /// Number of control-grid columns.
    pub fn width(&self) -> usize {
        3 * self.segments_u + 1
    }

    /// Number of control-grid rows.
    pub fn height(&self) -> usize {
        3 * self.segments_v + 1
    }

    /// Segment counts `(u, v)`.
    pub fn segments(&self) -> (usize, usize) {
        (self.segments_u, self.segments_v)
    }

    /// Control grid, row-major.
    pub fn control_points(&self) -> &[Point3] {
        &self.points
    }

    /// The 4x4 control block of segment `(seg_u, seg_v)`, indexed `[row][col]`.
    fn patch(&self, seg_u: usize, seg_v: usize) -> [[Vec3; 4]; 4] {
        let width = self.width();
        let mut block = [[Vec3::zeros(); 4]; 4];
        for (j, row) in block.iter_mut().enumerate() {
            for (i, cp) in row.iter_mut().enumerate() {
                *cp = self.points[(3 * seg_v + j) * width + 3 * seg_u + i].coords;
            }
        }
        block
    }

    /// Locate the patch owning `uv` and the local parameters inside it.
    fn locate(&self, uv: Point2) -> (usize, usize, f64, f64) {
        let (seg_u, local_u) = locate_segment(uv.x, self.segments_u);
        let (seg_v, local_v) = locate_segment(uv.y, self.segments_v);
        (seg_u, seg_v, local_u, local_v)
    }

    /// Each row of the block evaluated at `local_u`.
    fn rows_at(block: &[[Vec3; 4]; 4], local_u: f64) -> [Vec3; 4] {
        [
            cubic(&block[0], local_u),
            cubic(&block[1], local_u),
            cubic(&block[2], local_u),
            cubic(&block[3], local_u),
        ]
    }
}

/// Map a normalized parameter to `(segment index, local parameter)`.
fn locate_segment(x: f64, segments: usize) -> (usize, f64) {
    let width = 1.0 / segments as f64;
    let x = x.clamp(0.0, 1.0);
    let index = ((x / width).floor() as usize).min(segments - 1);
    let local = (x - index as f64 * width) / width;
    (index, local)
}

/// Cubic de Casteljau.
fn cubic(p: &[Vec3; 4], t: f64) -> Vec3 {
    let a = p[0].lerp(&p[1], t);
    let b = p[1].lerp(&p[2], t);
    let c = p[2].lerp(&p[3], t);
    quadratic(&[a, b, c], t)
}

/// Quadratic de Casteljau.
fn quadratic(p: &[Vec3; 3], t: f64) -> Vec3 {
    let a = p[0].lerp(&p[1], t);
    let b = p[1].lerp(&p[2], t);
    a.lerp(&b, t)
}

/// Bernstein derivative control points of a cubic.
fn hodograph(p: &[Vec3; 4]) -> [Vec3; 3] {
    [
        3.0 * (p[1] - p[0]),
        3.0 * (p[2] - p[1]),
        3.0 * (p[3] - p[2]),
    ]
}

impl ParametricSurface for BezierSurface {
    fn evaluate(&self, uv: Point2) -> Point3 {
        let (seg_u, seg_v, lu, lv) = self.locate(uv);
        let block = self.patch(seg_u, seg_v);
        Point3::from(cubic(&Self::rows_at(&block, lu), lv))
    }

    fn d_du(&self, uv: Point2) -> Vec3 {
        let (seg_u, seg_v, lu, lv) = self.locate(uv);
        let block = self.patch(seg_u, seg_v);
        let rows = [
            quadratic(&hodograph(&block[0]), lu),
            quadratic(&hodograph(&block[1]), lu),
            quadratic(&hodograph(&block[2]), lu),
            quadratic(&hodograph(&block[3]), lu),
        ];
        // d(local)/du = segments_u
        cubic(&rows, lv) * self.segments_u as f64
    }

    fn d_dv(&self, uv: Point2) -> Vec3 {
        let (seg_u, seg_v, lu, lv) = self.locate(uv);
        let block = self.patch(seg_u, seg_v);
        let rows = Self::rows_at(&block, lu);
        quadratic(&hodograph(&rows), lv) * self.segments_v as f64
    }

    fn is_periodic_u(&self) -> bool {
        self.periodic_u
    }

    fn is_periodic_v(&self) -> bool {
        self.periodic_v
    }

    fn kind(&self) -> SurfaceKind {
        SurfaceKind::Bezier
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Flat grid in the XZ plane at height `y`, spanning `[0, size]²`.
    pub(crate) fn flat_grid(
        segments_u: usize,
        segments_v: usize,
        size: f64,
        y: f64,
    ) -> Vec<Point3> {
        let w = 3 * segments_u + 1;
        let h = 3 * segments_v + 1;
        let mut points = Vec::with_capacity(w * h);
        for row in 0..h {
            for col in 0..w {
                points.push(Point3::new(
                    size * col as f64 / (w - 1) as f64,
                    y,
                    size * row as f64 / (h - 1) as f64,
                ));
            }
        }
        points
    }

    /// A bumpy grid: flat grid with a height field applied.
    fn wavy_grid(segments_u: usize, segments_v: usize) -> Vec<Point3> {
        flat_grid(segments_u, segments_v, 2.0, 0.0)
            .into_iter()
            .map(|p| Point3::new(p.x, (p.x * 1.7).sin() * (p.z * 2.3).cos() * 0.4, p.z))
            .collect()
    }

    fn params() -> impl Iterator<Item = Point2> {
        (0..=10).flat_map(|i| (0..=10).map(move |j| Point2::new(i as f64 / 10.0, j as f64 / 10.0)))
    }

    #[test]
    fn test_flat_grid_is_flat() {
        let surface = BezierSurface::new(flat_grid(3, 2, 4.0, 1.5), 3, 2, false, false).unwrap();
        for uv in params() {
            assert_relative_eq!(surface.evaluate(uv).y, 1.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_corners_interpolated() {
        let surface = BezierSurface::new(wavy_grid(2, 2), 2, 2, false, false).unwrap();
        let pts = surface.control_points();
        let w = surface.width();
        let h = surface.height();
        assert!((surface.evaluate(Point2::new(0.0, 0.0)) - pts[0]).norm() < 1e-12);
        assert!((surface.evaluate(Point2::new(1.0, 0.0)) - pts[w - 1]).norm() < 1e-12);
        assert!((surface.evaluate(Point2::new(0.0, 1.0)) - pts[(h - 1) * w]).norm() < 1e-12);
        assert!((surface.evaluate(Point2::new(1.0, 1.0)) - pts[h * w - 1]).norm() < 1e-12);
        // Segment junction passes through the shared control point.
        assert!((surface.evaluate(Point2::new(0.5, 0.0)) - pts[3]).norm() < 1e-12);
    }

    #[test]
    fn test_flat_grid_linear_derivatives() {
        let surface = BezierSurface::new(flat_grid(2, 3, 6.0, 0.0), 2, 3, false, false).unwrap();
        for uv in params() {
            assert!((surface.d_du(uv) - Vec3::new(6.0, 0.0, 0.0)).norm() < 1e-9);
            assert!((surface.d_dv(uv) - Vec3::new(0.0, 0.0, 6.0)).norm() < 1e-9);
        }
    }

    #[test]
    fn test_derivatives_match_finite_differences() {
        let surface = BezierSurface::new(wavy_grid(2, 2), 2, 2, false, false).unwrap();
        let h = 1e-6;
        // Stay away from segment junctions where the C0 grid has kinks.
        for uv in [
            Point2::new(0.2, 0.3),
            Point2::new(0.7, 0.15),
            Point2::new(0.35, 0.8),
            Point2::new(0.9, 0.6),
        ] {
            let fd_u = (surface.evaluate(Point2::new(uv.x + h, uv.y))
                - surface.evaluate(Point2::new(uv.x - h, uv.y)))
                / (2.0 * h);
            let fd_v = (surface.evaluate(Point2::new(uv.x, uv.y + h))
                - surface.evaluate(Point2::new(uv.x, uv.y - h)))
                / (2.0 * h);
            assert!((fd_u - surface.d_du(uv)).norm() < 1e-5, "du at {uv:?}");
            assert!((fd_v - surface.d_dv(uv)).norm() < 1e-5, "dv at {uv:?}");
        }
    }

    #[test]
    fn test_normal_orthogonal_to_derivatives() {
        let surface = BezierSurface::new(wavy_grid(2, 2), 2, 2, false, false).unwrap();
        for uv in params() {
            let n = surface.normal(uv);
            assert!(n.dot(&surface.d_du(uv)).abs() < 1e-4);
            assert!(n.dot(&surface.d_dv(uv)).abs() < 1e-4);
        }
    }

    #[test]
    fn test_clamp_reports_domain_exit() {
        let surface = BezierSurface::new(flat_grid(1, 1, 1.0, 0.0), 1, 1, false, false).unwrap();
        let mut inside = Point2::new(0.3, 0.9);
        assert!(surface.clamp(&mut inside));

        let mut outside = Point2::new(1.2, 0.5);
        assert!(!surface.clamp(&mut outside));
        assert_eq!(outside, Point2::new(1.0, 0.5));
    }

    #[test]
    fn test_periodic_clamp_wraps() {
        let surface = BezierSurface::new(flat_grid(2, 1, 1.0, 0.0), 2, 1, true, false).unwrap();
        let mut uv = Point2::new(1.1, 0.5);
        assert!(surface.clamp(&mut uv));
        assert_relative_eq!(uv.x, 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_grid_size_validated() {
        let err = BezierSurface::new(flat_grid(1, 1, 1.0, 0.0), 2, 1, false, false).unwrap_err();
        assert_eq!(
            err,
            GeomError::GridSize {
                expected: 28,
                actual: 16
            }
        );
        assert!(BezierSurface::new(Vec::new(), 0, 1, false, false).is_err());
    }
}
