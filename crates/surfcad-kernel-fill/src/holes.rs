//! Triangular hole detection.
//!
//! Every segment of every input grid contributes its four boundary edges
//! to an undirected graph over control-point ids. A hole is a 3-cycle in
//! that graph whose three sides are each bounded by exactly one patch
//! edge: the three patches meet around a triangular gap no patch covers.

use std::collections::{BTreeMap, BTreeSet};

use surfcad_kernel_math::Point3;
use tracing::debug;

use crate::{FillError, PointId, Result};

/// Control points of one C0 bicubic Bézier surface.
///
/// Row-major grid of `(3·segments_u + 1)` columns by `(3·segments_v + 1)`
/// rows; segment `(i, j)` spans columns `3i..=3i+3` and rows `3j..=3j+3`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlGrid {
    /// Entity id of the owning surface.
    pub surface: u64,
    /// Segments along u.
    pub segments_u: usize,
    /// Segments along v.
    pub segments_v: usize,
    /// Point id per grid slot.
    pub ids: Vec<PointId>,
    /// Position per grid slot.
    pub positions: Vec<Point3>,
}

impl ControlGrid {
    /// Columns in the grid.
    pub fn width(&self) -> usize {
        3 * self.segments_u + 1
    }

    /// Rows in the grid.
    pub fn height(&self) -> usize {
        3 * self.segments_v + 1
    }

    fn index(&self, col: usize, row: usize) -> usize {
        row * self.width() + col
    }

    fn check(&self, surface: usize) -> Result<()> {
        let expected = self.width() * self.height();
        for actual in [self.ids.len(), self.positions.len()] {
            if actual != expected {
                return Err(FillError::GridSize {
                    surface,
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}

/// Which side of a segment an edge lies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EdgePlacement {
    /// First row of the segment.
    Top,
    /// Last row of the segment.
    Bottom,
    /// First column of the segment.
    Left,
    /// Last column of the segment.
    Right,
}

const PLACEMENTS: [EdgePlacement; 4] = [
    EdgePlacement::Top,
    EdgePlacement::Bottom,
    EdgePlacement::Left,
    EdgePlacement::Right,
];

/// One directed boundary edge of a segment.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInfo {
    /// Side of the segment.
    pub placement: EdgePlacement,
    /// Index of the owning grid in the detector input.
    pub surface: usize,
    /// Segment `(i, j)` within that grid.
    pub segment: (usize, usize),
    /// Grid indices of the four boundary points, in edge direction.
    pub indices: [usize; 4],
    /// Boundary control points, from `from` to `to`.
    pub points: [Point3; 4],
    /// The next row of control points inside the segment, in the same
    /// order as `points`.
    pub neighbors: [Point3; 4],
    /// Id of the first boundary point.
    pub from: PointId,
    /// Id of the last boundary point.
    pub to: PointId,
    /// True if this is the edge traversed against its grid order.
    pub reversed: bool,
}

impl EdgeInfo {
    fn new(
        grid: &ControlGrid,
        surface: usize,
        segment: (usize, usize),
        placement: EdgePlacement,
    ) -> Self {
        let (col, row) = (3 * segment.0, 3 * segment.1);
        let slot = |k: usize, depth: usize| match placement {
            EdgePlacement::Top => grid.index(col + k, row + depth),
            EdgePlacement::Bottom => grid.index(col + k, row + 3 - depth),
            EdgePlacement::Left => grid.index(col + depth, row + k),
            EdgePlacement::Right => grid.index(col + 3 - depth, row + k),
        };
        let indices = [slot(0, 0), slot(1, 0), slot(2, 0), slot(3, 0)];
        let inner = [slot(0, 1), slot(1, 1), slot(2, 1), slot(3, 1)];
        Self {
            placement,
            surface,
            segment,
            indices,
            points: indices.map(|i| grid.positions[i]),
            neighbors: inner.map(|i| grid.positions[i]),
            from: grid.ids[indices[0]],
            to: grid.ids[indices[3]],
            reversed: false,
        }
    }

    /// The same edge traversed from `to` to `from`.
    pub fn reversed(&self) -> Self {
        let flip = |mut a: [Point3; 4]| {
            a.reverse();
            a
        };
        let mut indices = self.indices;
        indices.reverse();
        Self {
            placement: self.placement,
            surface: self.surface,
            segment: self.segment,
            indices,
            points: flip(self.points),
            neighbors: flip(self.neighbors),
            from: self.to,
            to: self.from,
            reversed: !self.reversed,
        }
    }

    fn is_degenerate(&self) -> bool {
        self.from == self.to
    }
}

/// A triangular gap bounded by three patch edges.
///
/// `edges[k]` runs from `corners[k]` to `corners[(k + 1) % 3]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Hole {
    /// The bounding edges, chained head to tail.
    pub edges: [EdgeInfo; 3],
    /// Corner ids in ascending order.
    pub corners: [PointId; 3],
}

/// Finds triangular holes in a patch network.
#[derive(Debug, Default)]
pub struct HoleDetector {
    adjacency: BTreeMap<PointId, BTreeSet<PointId>>,
    edges: BTreeMap<(PointId, PointId), Vec<EdgeInfo>>,
}

impl HoleDetector {
    /// Find every triangular hole between `grids`.
    ///
    /// The result does not depend on the order of `grids` beyond the
    /// `surface` indices recorded in each edge.
    pub fn detect(grids: &[ControlGrid]) -> Result<Vec<Hole>> {
        let mut detector = Self::default();
        for (surface, grid) in grids.iter().enumerate() {
            grid.check(surface)?;
            detector.add_grid(grid, surface);
        }
        let triples = detector.triples();
        let holes = detector.holes(&triples)?;
        debug!(
            surfaces = grids.len(),
            edges = detector.edges.len() / 2,
            triangles = triples.len(),
            holes = holes.len(),
            "hole detection finished"
        );
        Ok(holes)
    }

    fn add_grid(&mut self, grid: &ControlGrid, surface: usize) {
        for j in 0..grid.segments_v {
            for i in 0..grid.segments_u {
                for placement in PLACEMENTS {
                    let edge = EdgeInfo::new(grid, surface, (i, j), placement);
                    if !edge.is_degenerate() {
                        self.add_edge(edge);
                    }
                }
            }
        }
    }

    fn add_edge(&mut self, edge: EdgeInfo) {
        let (a, b) = (edge.from, edge.to);
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
        let back = edge.reversed();
        self.edges.entry((b, a)).or_default().push(back);
        self.edges.entry((a, b)).or_default().push(edge);
    }

    fn neighbors(&self, point: PointId) -> impl Iterator<Item = PointId> + '_ {
        self.adjacency.get(&point).into_iter().flatten().copied()
    }

    /// Sorted, deduplicated 3-cycles of the adjacency graph.
    fn triples(&self) -> Vec<[PointId; 3]> {
        let mut triples = Vec::new();
        for (&p, around_p) in &self.adjacency {
            for a in around_p.iter().copied() {
                for b in self.neighbors(a) {
                    if b == p {
                        continue;
                    }
                    if self.adjacency.get(&b).is_some_and(|n| n.contains(&p)) {
                        let mut triple = [p, a, b];
                        triple.sort_unstable();
                        triples.push(triple);
                    }
                }
            }
        }
        triples.sort_unstable();
        triples.dedup();
        triples
    }

    fn edge(&self, from: PointId, to: PointId) -> Result<&[EdgeInfo]> {
        self.edges
            .get(&(from, to))
            .map(Vec::as_slice)
            .ok_or(FillError::MissingEdge { from, to })
    }

    fn holes(&self, triples: &[[PointId; 3]]) -> Result<Vec<Hole>> {
        let mut holes = Vec::new();
        for &[a, b, c] in triples {
            let sides = [self.edge(a, b)?, self.edge(b, c)?, self.edge(c, a)?];
            // A side with two patch edges along it is covered.
            if sides.iter().any(|side| side.len() != 1) {
                debug!(corners = ?[a, b, c], "triangle side is shared; not a hole");
                continue;
            }
            holes.push(Hole {
                edges: sides.map(|side| side[0].clone()),
                corners: [a, b, c],
            });
        }
        Ok(holes)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use surfcad_kernel_math::Vec3;

    /// Single-segment grid whose first row runs from `start` to `end`
    /// (ids `from`/`to` at its ends) and whose other rows step `outward`.
    /// Inner ids are `base..base + 16`.
    pub(crate) fn side_patch(
        start: Point3,
        end: Point3,
        outward: Vec3,
        from: PointId,
        to: PointId,
        base: PointId,
    ) -> ControlGrid {
        let mut ids = Vec::new();
        let mut positions = Vec::new();
        for row in 0..4 {
            for col in 0..4 {
                let t = col as f64 / 3.0;
                let along = Point3::from(start.coords * (1.0 - t) + end.coords * t);
                positions.push(along + outward * (row as f64 / 3.0));
                ids.push(match (row, col) {
                    (0, 0) => from,
                    (0, 3) => to,
                    _ => base + (row * 4 + col) as PointId,
                });
            }
        }
        ControlGrid {
            surface: base,
            segments_u: 1,
            segments_v: 1,
            ids,
            positions,
        }
    }

    /// Three patches around an equilateral triangle in `y = 0` with corner
    /// ids 1, 2, 3.
    pub(crate) fn triangle_hole() -> Vec<ControlGrid> {
        let corners: Vec<Point3> = (0..3)
            .map(|k| {
                let angle = std::f64::consts::TAU * k as f64 / 3.0;
                Point3::new(angle.cos(), 0.0, angle.sin())
            })
            .collect();
        (0..3)
            .map(|k| {
                let (a, b) = (corners[k], corners[(k + 1) % 3]);
                let mid = surfcad_kernel_math::midpoint(&a, &b);
                let outward = (mid - Point3::origin()).normalize() * 0.5;
                side_patch(
                    a,
                    b,
                    outward,
                    k as PointId + 1,
                    (k + 1) as PointId % 3 + 1,
                    100 * (k as PointId + 1),
                )
            })
            .collect()
    }

    /// `n × n` tiling of unit patches sharing ids along their seams.
    fn tiled(n: usize) -> Vec<ControlGrid> {
        let lattice = 3 * n + 1;
        let mut grids = Vec::new();
        for pj in 0..n {
            for pi in 0..n {
                let mut ids = Vec::new();
                let mut positions = Vec::new();
                for row in 0..4 {
                    for col in 0..4 {
                        let (gc, gr) = (3 * pi + col, 3 * pj + row);
                        ids.push((gr * lattice + gc) as PointId);
                        positions.push(Point3::new(gc as f64 / 3.0, 0.0, gr as f64 / 3.0));
                    }
                }
                grids.push(ControlGrid {
                    surface: (pj * n + pi) as u64,
                    segments_u: 1,
                    segments_v: 1,
                    ids,
                    positions,
                });
            }
        }
        grids
    }

    #[test]
    fn test_single_hole() {
        let holes = HoleDetector::detect(&triangle_hole()).unwrap();
        assert_eq!(holes.len(), 1);
        let hole = &holes[0];
        assert_eq!(hole.corners, [1, 2, 3]);
        for k in 0..3 {
            let edge = &hole.edges[k];
            assert_eq!(edge.from, hole.corners[k]);
            assert_eq!(edge.to, hole.corners[(k + 1) % 3]);
            assert_eq!(edge.placement, EdgePlacement::Top);
            // Chained head to tail in space as well.
            assert_eq!(edge.points[3], hole.edges[(k + 1) % 3].points[0]);
        }
    }

    #[test]
    fn test_hole_independent_of_input_order() {
        let grids = triangle_hole();
        for order in [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]] {
            let permuted: Vec<ControlGrid> = order.iter().map(|&k| grids[k].clone()).collect();
            let holes = HoleDetector::detect(&permuted).unwrap();
            assert_eq!(holes.len(), 1, "order {order:?}");
            assert_eq!(holes[0].corners, [1, 2, 3]);
        }
    }

    #[test]
    fn test_tiled_grid_has_no_holes() {
        assert!(HoleDetector::detect(&tiled(3)).unwrap().is_empty());

        // One multi-segment surface covering the same area.
        let lattice = 7;
        let mut ids = Vec::new();
        let mut positions = Vec::new();
        for row in 0..lattice {
            for col in 0..lattice {
                ids.push((row * lattice + col) as PointId);
                positions.push(Point3::new(col as f64, 0.0, row as f64));
            }
        }
        let grid = ControlGrid {
            surface: 0,
            segments_u: 2,
            segments_v: 2,
            ids,
            positions,
        };
        assert!(HoleDetector::detect(&[grid]).unwrap().is_empty());
    }

    #[test]
    fn test_shared_side_is_not_a_hole() {
        let mut grids = triangle_hole();
        // A second patch along the 1 -> 2 side covers it.
        let cover = side_patch(
            grids[0].positions[0],
            grids[0].positions[3],
            Vec3::new(0.0, 0.5, 0.0),
            1,
            2,
            900,
        );
        grids.push(cover);
        assert!(HoleDetector::detect(&grids).unwrap().is_empty());
    }

    #[test]
    fn test_degenerate_edges_skipped() {
        let mut grids = triangle_hole();
        // A patch collapsed onto corner 1 contributes no edges at all.
        let mut collapsed = grids[0].clone();
        collapsed.ids = vec![1; 16];
        grids.push(collapsed);
        let holes = HoleDetector::detect(&grids).unwrap();
        assert_eq!(holes.len(), 1);
        assert_eq!(holes[0].corners, [1, 2, 3]);
    }

    #[test]
    fn test_grid_size_mismatch() {
        let mut grids = triangle_hole();
        grids[1].positions.pop();
        assert_eq!(
            HoleDetector::detect(&grids).unwrap_err(),
            FillError::GridSize {
                surface: 1,
                expected: 16,
                actual: 15
            }
        );
    }

    #[test]
    fn test_reversed_edge() {
        let grids = triangle_hole();
        let edge = EdgeInfo::new(&grids[0], 0, (0, 0), EdgePlacement::Left);
        let back = edge.reversed();
        assert_eq!(back.from, edge.to);
        assert_eq!(back.points[0], edge.points[3]);
        assert_eq!(back.neighbors[3], edge.neighbors[0]);
        assert!(back.reversed);
        assert_eq!(back.reversed(), edge);
    }
}
