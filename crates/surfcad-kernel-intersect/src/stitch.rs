//! Combining two traced curves into one closed boundary.
//!
//! Trimming a surface by two intersection curves needs the region bounded
//! by both. [`intersect_curves`] finds where the polylines cross, and
//! [`stitch_intersection_curves`] walks one curve from the first crossing
//! to the second and the other curve back again.

use surfcad_kernel_math::{Point3, Vec3};
use tracing::debug;

use crate::curve::{IntersectionCurve, SurfaceSide};

/// Default minimum separation between the two crossings found by
/// [`intersect_curves`].
pub const MIN_CROSSING_SEPARATION: f64 = 0.1;

/// Index pair `(index_in_a, index_in_b)` of a polyline crossing.
pub type Crossing = (usize, usize);

/// Find two crossings between polylines `a` and `b`.
///
/// The first crossing is the globally closest point pair. The second is the
/// closest pair whose points are both at least `min_separation` away from
/// their counterparts in the first. Returns `None` if either polyline is
/// empty or no second pair exists.
pub fn intersect_curves(a: &[Point3], b: &[Point3], min_separation: f64) -> Option<[Crossing; 2]> {
    let closest = |accept: &dyn Fn(usize, usize) -> bool| {
        let mut best: Option<(Crossing, f64)> = None;
        for (i, pa) in a.iter().enumerate() {
            for (j, pb) in b.iter().enumerate() {
                if !accept(i, j) {
                    continue;
                }
                let d = (pa - pb).norm_squared();
                if best.map_or(true, |(_, bd)| d < bd) {
                    best = Some(((i, j), d));
                }
            }
        }
        best
    };

    let ((i1, j1), d1) = closest(&|_, _| true)?;
    let sep_sq = min_separation * min_separation;
    let ((i2, j2), d2) = closest(&|i, j| {
        (a[i] - a[i1]).norm_squared() >= sep_sq && (b[j] - b[j1]).norm_squared() >= sep_sq
    })?;

    debug!(first = d1, second = d2, "curve crossings found");
    Some([(i1, j1), (i2, j2)])
}

/// Build one closed polyline from two curves and their crossings.
///
/// Curve `a` is walked from the first crossing to the second, then curve
/// `b` from the second crossing back to the first. On a closed curve either
/// way round reaches the other crossing; the direction is the one whose
/// leading tangent points along the other curve's normal on `side`. An open
/// curve can only be walked one way. The result repeats its first point at
/// the end.
pub fn stitch_intersection_curves(
    a: &IntersectionCurve,
    b: &IntersectionCurve,
    crossings: [Crossing; 2],
    side: SurfaceSide,
) -> Vec<Point3> {
    let [(ia1, jb1), (ia2, jb2)] = crossings;
    let mut boundary = Vec::new();
    if a.is_empty() || b.is_empty() {
        return boundary;
    }

    let along_b = b.normals(side).get(jb1).copied();
    let forward_a = choose_direction(a, ia1, ia2, along_b);
    walk(a, ia1, ia2, forward_a, &mut boundary);

    let along_a = a.normals(side).get(ia2).copied();
    let forward_b = choose_direction(b, jb2, jb1, along_a);
    walk(b, jb2, jb1, forward_b, &mut boundary);

    if let Some(&first) = boundary.first() {
        boundary.push(first);
    }
    boundary
}

/// Number of distinct points on a closed curve (the repeat is dropped).
fn cycle_len(curve: &IntersectionCurve) -> usize {
    if curve.is_closed() {
        curve.len() - 1
    } else {
        curve.len()
    }
}

fn choose_direction(
    curve: &IntersectionCurve,
    from: usize,
    to: usize,
    guide: Option<Vec3>,
) -> bool {
    if !curve.is_closed() {
        return from <= to;
    }
    let n = cycle_len(curve);
    let next = (from + 1) % n;
    match guide {
        Some(guide) => (curve.points[next] - curve.points[from]).dot(&guide) >= 0.0,
        None => true,
    }
}

fn walk(curve: &IntersectionCurve, from: usize, to: usize, forward: bool, out: &mut Vec<Point3>) {
    let n = cycle_len(curve);
    if n == 0 {
        return;
    }
    let (from, to) = (from % n, to % n);
    let mut index = from;
    loop {
        out.push(curve.points[index]);
        if index == to {
            break;
        }
        index = if forward {
            (index + 1) % n
        } else {
            (index + n - 1) % n
        };
    }
}
