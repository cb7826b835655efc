//! Gregory patch filling of triangular holes.
//!
//! A hole with three boundary edges is filled by three 20-point Gregory
//! patches, one per hole corner. Each boundary edge is split at its
//! midpoint; the three midpoints are joined to a shared centre by internal
//! cubic curves, and every patch covers the quadrilateral between two
//! half-edges and two internal curves.
//!
//! Point layout of one corner patch, rows from the centre outwards:
//!
//! ```text
//!  0  1     2     3        row 0: centre ... midpoint of edge e
//!  4  5  6  7  8  9        row 1: interior twins (u, v) at 5/6 and 7/8
//! 10 11 12 13 14 15        row 2: interior twins at 11/12 and 13/14
//! 16 17    18    19        row 3: midpoint of edge e+1 ... hole corner
//! ```

use surfcad_kernel_math::{midpoint, Point3, Vec3};
use tracing::debug;

use crate::holes::{EdgeInfo, Hole};

/// Control points per corner patch.
pub const GREGORY_POINTS: usize = 20;

/// Indices in the control-mesh line list.
pub const CONTROL_MESH_LEN: usize = 72;

/// Segments the control-mesh pattern is replicated for.
const MESH_SEGMENTS: usize = 4;

/// Line list of one corner patch: every interior point joined to the
/// boundary point it was derived from, plus the pair of twins at 5/6.
const MESH_PATTERN: [u32; 18] = [1, 6, 2, 8, 4, 5, 10, 11, 9, 7, 15, 13, 17, 12, 18, 14, 5, 6];

/// A filled-hole vertex with the entity it belongs to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GregoryVertex {
    /// Control point position.
    pub position: Point3,
    /// Owning entity id.
    pub owner: u64,
}

/// The three corner patches filling one hole.
#[derive(Debug, Clone, PartialEq)]
pub struct GregoryPatch {
    /// Control points per corner; `corners[e]` sits between edge `e` and
    /// edge `(e + 1) % 3` of the hole.
    pub corners: [[Point3; GREGORY_POINTS]; 3],
    /// Owning entity id.
    pub owner: u64,
}

impl GregoryPatch {
    /// The point shared by all three patches.
    pub fn center(&self) -> Point3 {
        self.corners[0][0]
    }

    /// All 60 control points, corner by corner, tagged with the owner.
    pub fn vertices(&self) -> Vec<GregoryVertex> {
        self.corners
            .iter()
            .flatten()
            .map(|&position| GregoryVertex {
                position,
                owner: self.owner,
            })
            .collect()
    }

    /// The control-mesh line list. See [`GregoryFill::control_mesh`].
    pub fn control_mesh(&self) -> [u32; CONTROL_MESH_LEN] {
        GregoryFill::control_mesh()
    }

    /// The control-mesh line list without the lines that reference
    /// vertices past the 60 generated ones.
    pub fn valid_control_mesh(&self) -> Vec<u32> {
        let count = (3 * GREGORY_POINTS) as u32;
        self.control_mesh()
            .chunks_exact(2)
            .filter(|line| line.iter().all(|&i| i < count))
            .flatten()
            .copied()
            .collect()
    }
}

/// Midpoint cascades of one hole edge and its neighbour row.
///
/// `r`, `s`, `t` are the three levels of pairwise averaging of the four
/// boundary points, i.e. de Casteljau subdivision at the midpoint; the
/// primed arrays are the same for the neighbour row.
#[derive(Debug, Clone, Copy)]
struct EdgeCascade {
    boundary: [Point3; 4],
    r: [Point3; 3],
    s: [Point3; 2],
    t: Point3,
    r_in: [Point3; 3],
    s_in: [Point3; 2],
    t_in: Point3,
}

fn average(points: &[Point3]) -> [Point3; 3] {
    [
        midpoint(&points[0], &points[1]),
        midpoint(&points[1], &points[2]),
        midpoint(&points[2], &points[3]),
    ]
}

fn halve(points: &[Point3; 3]) -> [Point3; 2] {
    [midpoint(&points[0], &points[1]), midpoint(&points[1], &points[2])]
}

/// `a + (a − b)`: reflection of `b` through `a`.
fn extrapolate(a: Point3, b: Point3) -> Point3 {
    a + (a - b)
}

impl EdgeCascade {
    fn new(edge: &EdgeInfo) -> Self {
        let r = average(&edge.points);
        let s = halve(&r);
        let r_in = average(&edge.neighbors);
        let s_in = halve(&r_in);
        Self {
            boundary: edge.points,
            r,
            s,
            t: midpoint(&s[0], &s[1]),
            r_in,
            s_in,
            t_in: midpoint(&s_in[0], &s_in[1]),
        }
    }

    /// Tangent at the midpoint, pointing towards the end of the edge.
    fn forward_tangent(&self) -> Vec3 {
        self.s[1] - self.t
    }

    /// Tangent at the midpoint, pointing towards the start of the edge.
    fn backward_tangent(&self) -> Vec3 {
        self.s[0] - self.t
    }
}

/// Internal curves from the centre to each edge midpoint.
#[derive(Debug, Clone, Copy)]
struct InternalCurves {
    center: Point3,
    /// `p[e] = [P1, P2, P3]` of the curve ending at edge `e`.
    p: [[Point3; 3]; 3],
}

impl InternalCurves {
    fn new(cascades: &[EdgeCascade; 3]) -> Self {
        let p3 = cascades.map(|c| c.t);
        let p2 = cascades.map(|c| extrapolate(c.t, c.t_in));
        let q: [Point3; 3] =
            std::array::from_fn(|e| Point3::from((3.0 * p2[e].coords - p3[e].coords) / 2.0));
        let center = Point3::from((q[0].coords + q[1].coords + q[2].coords) / 3.0);
        let p1: [Point3; 3] =
            std::array::from_fn(|e| Point3::from((2.0 * q[e].coords + center.coords) / 3.0));
        Self {
            center,
            p: std::array::from_fn(|e| [p1[e], p2[e], p3[e]]),
        }
    }
}

/// Builds Gregory patches for detected holes.
#[derive(Debug, Clone, Copy, Default)]
pub struct GregoryFill;

impl GregoryFill {
    /// Fill `hole`, tagging every vertex with `owner`.
    pub fn fill(hole: &Hole, owner: u64) -> GregoryPatch {
        let cascades = [
            EdgeCascade::new(&hole.edges[0]),
            EdgeCascade::new(&hole.edges[1]),
            EdgeCascade::new(&hole.edges[2]),
        ];
        let curves = InternalCurves::new(&cascades);
        let corners = std::array::from_fn(|e| corner_points(&cascades, &curves, e));
        debug!(corners = ?hole.corners, center = ?curves.center, "filled hole");
        GregoryPatch { corners, owner }
    }

    /// Line-list indices of the control net.
    ///
    /// The per-corner pattern is replicated at offsets 0, 20, 40 and 60;
    /// the last copy references vertices a three-corner patch does not
    /// have. [`GregoryPatch::valid_control_mesh`] drops those lines.
    pub fn control_mesh() -> [u32; CONTROL_MESH_LEN] {
        let mut indices = [0; CONTROL_MESH_LEN];
        for segment in 0..MESH_SEGMENTS {
            let offset = (segment * GREGORY_POINTS) as u32;
            for (k, &index) in MESH_PATTERN.iter().enumerate() {
                indices[segment * MESH_PATTERN.len() + k] = index + offset;
            }
        }
        indices
    }
}

/// The 20 control points of the patch at the corner between edge `e` and
/// edge `n = (e + 1) % 3`.
fn corner_points(
    cascades: &[EdgeCascade; 3],
    curves: &InternalCurves,
    e: usize,
) -> [Point3; GREGORY_POINTS] {
    let n = (e + 1) % 3;
    let (ce, cn) = (&cascades[e], &cascades[n]);
    let [p1e, p2e, p3e] = curves.p[e];
    let [p1n, p2n, p3n] = curves.p[n];
    let p0 = curves.center;

    // Cross derivatives along the internal curves blend the centre
    // tangent into the boundary tangent at the edge midpoint.
    let along_n = p1n - p0;
    let along_e = p1e - p0;
    let tangent_e = ce.forward_tangent();
    let tangent_n = cn.backward_tangent();

    [
        p0,
        p1e,
        p2e,
        p3e,
        p1n,
        p1n + along_e * (2.0 / 3.0) + tangent_n * (1.0 / 3.0),
        p1e + along_n * (2.0 / 3.0) + tangent_e * (1.0 / 3.0),
        extrapolate(ce.s[1], ce.s_in[1]),
        p2e + along_n * (1.0 / 3.0) + tangent_e * (2.0 / 3.0),
        ce.s[1],
        p2n,
        p2n + along_e * (1.0 / 3.0) + tangent_n * (2.0 / 3.0),
        extrapolate(cn.s[0], cn.s_in[0]),
        extrapolate(ce.r[2], ce.r_in[2]),
        extrapolate(cn.r[0], cn.r_in[0]),
        ce.r[2],
        p3n,
        cn.s[0],
        cn.r[0],
        cn.boundary[0],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::holes::tests::triangle_hole;
    use crate::HoleDetector;
    use approx::assert_relative_eq;

    fn symmetric_fill() -> GregoryPatch {
        let holes = HoleDetector::detect(&triangle_hole()).unwrap();
        GregoryFill::fill(&holes[0], 42)
    }

    #[test]
    fn test_center_shared_by_all_corners() {
        let patch = symmetric_fill();
        let vertices = patch.vertices();
        assert_eq!(vertices.len(), 60);
        assert_eq!(vertices[0].position, vertices[20].position);
        assert_eq!(vertices[0].position, vertices[40].position);
        assert!(vertices.iter().all(|v| v.owner == 42));

        // The hole is symmetric about the origin.
        let center = patch.center();
        assert_relative_eq!(center.x, 0.0, epsilon = 1e-12);
        assert_relative_eq!(center.z, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_planar_hole_stays_planar() {
        let patch = symmetric_fill();
        for v in patch.vertices() {
            assert_relative_eq!(v.position.y, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_neighbouring_corners_share_boundaries() {
        let holes = HoleDetector::detect(&triangle_hole()).unwrap();
        let hole = &holes[0];
        let patch = GregoryFill::fill(hole, 0);
        for e in 0..3 {
            let n = (e + 1) % 3;
            let (a, b) = (&patch.corners[e], &patch.corners[n]);
            // Column 0 of corner e is row 0 of corner n.
            assert_eq!([a[0], a[4], a[10], a[16]], [b[0], b[1], b[2], b[3]]);
            // Corner e ends at the hole corner shared by edges e and n.
            assert_eq!(a[19], hole.edges[n].points[0]);
            assert_eq!(a[19], hole.edges[e].points[3]);
        }
    }

    #[test]
    fn test_boundary_halves_follow_edges() {
        let holes = HoleDetector::detect(&triangle_hole()).unwrap();
        let hole = &holes[0];
        let patch = GregoryFill::fill(hole, 0);
        // Straight edges split into straight halves.
        let edge = &hole.edges[0];
        let mid = midpoint(&edge.points[0], &edge.points[3]);
        let c = &patch.corners[0];
        assert_relative_eq!((c[3] - mid).norm(), 0.0, epsilon = 1e-12);
        let half = edge.points[3] - mid;
        for (k, &index) in [9, 15, 19].iter().enumerate() {
            let expected = mid + half * ((k + 1) as f64 / 3.0);
            assert_relative_eq!((c[index] - expected).norm(), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_control_mesh_layout() {
        let mesh = GregoryFill::control_mesh();
        assert_eq!(mesh.len(), CONTROL_MESH_LEN);
        assert_eq!(&mesh[..18], &MESH_PATTERN);
        assert_eq!(mesh[18], MESH_PATTERN[0] + 20);
        assert_eq!(mesh[54], MESH_PATTERN[0] + 60);
        assert!(mesh.iter().any(|&i| i >= 60));

        let patch = symmetric_fill();
        assert_eq!(patch.control_mesh(), mesh);
        let valid = patch.valid_control_mesh();
        assert_eq!(valid.len(), 54);
        assert_eq!(&valid[..], &mesh[..54]);
        assert!(valid.iter().all(|&i| i < 60));
    }
}
