//! Plain-data surface descriptions handed over by the scene.
//!
//! The scene owns entities and transforms; the kernel only sees resolved
//! coordinates. A [`SurfaceDesc`] is built fresh for every request and
//! turned into an evaluator with [`SurfaceDesc::build`].

use serde::{Deserialize, Serialize};
use surfcad_kernel_math::{Point3, Transform, Vec3};

use crate::{BezierSurface, GeomError, ParametricSurface, Result, TorusSurface};

/// Description of a surface-bearing scene object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SurfaceDesc {
    /// Torus with its model transform.
    Torus {
        /// Major radius.
        major_radius: f64,
        /// Minor radius.
        minor_radius: f64,
        /// Model transform.
        #[serde(default)]
        transform: Transform,
    },
    /// C0 Bézier grid of `(3·segments_u + 1) × (3·segments_v + 1)` points.
    BezierC0 {
        /// Row-major control points.
        points: Vec<Point3>,
        /// Segments along `u`.
        segments_u: usize,
        /// Segments along `v`.
        segments_v: usize,
        /// Closed in `u` (the last column repeats the first).
        #[serde(default)]
        cylinder: bool,
    },
    /// Uniform bicubic B-spline grid of `(segments_u + 3) × (segments_v + 3)`
    /// de Boor points.
    BezierC2 {
        /// Row-major de Boor points.
        de_boor: Vec<Point3>,
        /// Segments along `u`.
        segments_u: usize,
        /// Segments along `v`.
        segments_v: usize,
        /// Closed in `u` (the caller repeats the first three columns at the end).
        #[serde(default)]
        cylinder: bool,
    },
}

impl SurfaceDesc {
    /// Build the evaluator for this description.
    pub fn build(&self) -> Result<Box<dyn ParametricSurface>> {
        match self {
            SurfaceDesc::Torus {
                major_radius,
                minor_radius,
                transform,
            } => Ok(Box::new(TorusSurface::with_transform(
                *major_radius,
                *minor_radius,
                transform.clone(),
            )?)),
            SurfaceDesc::BezierC0 {
                points,
                segments_u,
                segments_v,
                cylinder,
            } => Ok(Box::new(BezierSurface::new(
                points.clone(),
                *segments_u,
                *segments_v,
                *cylinder,
                false,
            )?)),
            SurfaceDesc::BezierC2 {
                de_boor,
                segments_u,
                segments_v,
                cylinder,
            } => {
                let points = bezier_grid_from_de_boor(de_boor, *segments_u, *segments_v)?;
                Ok(Box::new(BezierSurface::new(
                    points,
                    *segments_u,
                    *segments_v,
                    *cylinder,
                    false,
                )?))
            }
        }
    }
}

/// Convert a uniform bicubic de Boor grid into the equivalent C0 Bézier grid.
///
/// Input is row-major with `segments_u + 3` columns and `segments_v + 3`
/// rows; output is row-major with `3·segments_u + 1` columns and
/// `3·segments_v + 1` rows.
pub fn bezier_grid_from_de_boor(
    de_boor: &[Point3],
    segments_u: usize,
    segments_v: usize,
) -> Result<Vec<Point3>> {
    if segments_u == 0 || segments_v == 0 {
        return Err(GeomError::EmptySegments {
            segments_u,
            segments_v,
        });
    }
    let in_w = segments_u + 3;
    let in_h = segments_v + 3;
    if de_boor.len() != in_w * in_h {
        return Err(GeomError::GridSize {
            expected: in_w * in_h,
            actual: de_boor.len(),
        });
    }

    // Rows first: in_h rows of out_w points.
    let out_w = 3 * segments_u + 1;
    let rows: Vec<Vec<Vec3>> = de_boor
        .chunks(in_w)
        .map(|row| {
            let coords: Vec<Vec3> = row.iter().map(|p| p.coords).collect();
            bezier_from_de_boor(&coords)
        })
        .collect();

    // Then columns.
    let out_h = 3 * segments_v + 1;
    let mut out = vec![Point3::origin(); out_w * out_h];
    for col in 0..out_w {
        let column: Vec<Vec3> = rows.iter().map(|r| r[col]).collect();
        for (row, p) in bezier_from_de_boor(&column).into_iter().enumerate() {
            out[row * out_w + col] = Point3::from(p);
        }
    }
    Ok(out)
}

/// Uniform cubic B-spline to piecewise Bézier, one direction.
///
/// `d.len() - 3` segments; returns `3·segments + 1` points.
fn bezier_from_de_boor(d: &[Vec3]) -> Vec<Vec3> {
    let segments = d.len() - 3;
    let mut out = Vec::with_capacity(3 * segments + 1);
    out.push((d[0] + 4.0 * d[1] + d[2]) / 6.0);
    for i in 0..segments {
        out.push((2.0 * d[i + 1] + d[i + 2]) / 3.0);
        out.push((d[i + 1] + 2.0 * d[i + 2]) / 3.0);
        out.push((d[i + 1] + 4.0 * d[i + 2] + d[i + 3]) / 6.0);
    }
    out
}
