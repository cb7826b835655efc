//! Conjugate-gradient minimization of the squared distance between two
//! parametric surfaces.
//!
//! The minimizer is the seeding stage of intersection tracing: a point
//! where `‖P(u, v) − Q(s, t)‖² ≈ 0` lies on the intersection curve.

use serde::{Deserialize, Serialize};
use surfcad_kernel_geom::{ParametricSurface, PointSurface};
use surfcad_kernel_math::{join_params, params_p, params_q, Point2, Point3, Vec4};
use tracing::debug;

use crate::line_search::{find_step_size, LineSearchConfig};
use crate::{clamp_params, sample, sample_uv, self_param_distance_sq, Result, SolveError};

/// Conjugate-gradient parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CgConfig {
    /// Stop once `‖direction‖²` falls below this.
    pub tolerance: f64,
    /// Iteration cap per minimization.
    pub max_iterations: usize,
    /// Reset the search direction to steepest descent every this many
    /// iterations.
    pub restart_interval: usize,
    /// Inner line search.
    pub line_search: LineSearchConfig,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 50,
            restart_interval: 20,
            line_search: LineSearchConfig::default(),
        }
    }
}

impl CgConfig {
    /// Validate settings, including the inner line search.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SolveError::InvalidConfig(
                "cg tolerance must be positive".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(SolveError::InvalidConfig(
                "cg max_iterations must be at least 1".into(),
            ));
        }
        if self.restart_interval == 0 {
            return Err(SolveError::InvalidConfig(
                "cg restart_interval must be at least 1".into(),
            ));
        }
        self.line_search.validate()
    }
}

/// Outcome of a distance minimization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizeResult {
    /// Final `(u, v, s, t)`.
    pub params: Vec4,
    /// `‖P − Q‖²` at `params`; infinite when the run diverged.
    pub distance_sq: f64,
    /// Whether the direction norm dropped below tolerance.
    pub converged: bool,
    /// Iterations performed.
    pub iterations: usize,
}

impl MinimizeResult {
    /// True if the run left both domains and its solution is meaningless.
    pub fn diverged(&self) -> bool {
        !self.distance_sq.is_finite()
    }
}

/// Minimizes `f(u, v, s, t) = ‖P(u, v) − Q(s, t)‖²`.
#[derive(Debug, Clone, Copy)]
pub struct DistanceMinimizer<'a> {
    p: &'a dyn ParametricSurface,
    q: &'a dyn ParametricSurface,
    config: CgConfig,
}

impl<'a> DistanceMinimizer<'a> {
    /// Create a minimizer for the surface pair `(p, q)`.
    pub fn new(
        p: &'a dyn ParametricSurface,
        q: &'a dyn ParametricSurface,
        config: CgConfig,
    ) -> Self {
        Self { p, q, config }
    }

    /// Squared distance between `P(u, v)` and `Q(s, t)`.
    pub fn objective(&self, params: &Vec4) -> f64 {
        (self.p.evaluate(params_p(params)) - self.q.evaluate(params_q(params))).norm_squared()
    }

    /// Gradient of [`objective`](Self::objective).
    ///
    /// With `d = P − Q`: `∂f/∂u = 2d·Pu`, `∂f/∂v = 2d·Pv`,
    /// `∂f/∂s = −2d·Qs`, `∂f/∂t = −2d·Qt`.
    pub fn gradient(&self, params: &Vec4) -> Vec4 {
        let uv = params_p(params);
        let st = params_q(params);
        let diff = self.p.evaluate(uv) - self.q.evaluate(st);
        Vec4::new(
            2.0 * diff.dot(&self.p.d_du(uv)),
            2.0 * diff.dot(&self.p.d_dv(uv)),
            -2.0 * diff.dot(&self.q.d_du(st)),
            -2.0 * diff.dot(&self.q.d_dv(st)),
        )
    }

    fn clamped(&self, mut params: Vec4) -> Vec4 {
        clamp_params(self.p, self.q, &mut params);
        params
    }

    /// Run CG from `start`.
    ///
    /// Polak-Ribière directions with a steepest-descent restart every
    /// `restart_interval` iterations, or whenever the conjugate direction
    /// stops being a descent direction. Parameters are clamped after every
    /// step; if both surfaces report leaving their domain at once the run
    /// is treated as diverged.
    pub fn minimize(&self, start: Vec4) -> MinimizeResult {
        // Unvalidated settings may carry a zero interval.
        let restart_interval = self.config.restart_interval.max(1);
        let mut x = self.clamped(start);
        let mut f = self.objective(&x);
        let mut g = self.gradient(&x);
        let mut direction = -g;
        let mut converged = false;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            if direction.norm_squared() < self.config.tolerance {
                converged = true;
                break;
            }

            let mut slope = g.dot(&direction);
            if slope >= 0.0 {
                direction = -g;
                slope = g.dot(&direction);
            }

            let search = find_step_size(
                |alpha| self.objective(&self.clamped(x + alpha * direction)),
                f,
                slope,
                &self.config.line_search,
            );
            if !search.success {
                break;
            }
            iterations += 1;

            x += search.step * direction;
            let (in_p, in_q) = clamp_params(self.p, self.q, &mut x);
            if !in_p && !in_q {
                return MinimizeResult {
                    params: x,
                    distance_sq: f64::INFINITY,
                    converged: false,
                    iterations,
                };
            }

            f = self.objective(&x);
            let g_next = self.gradient(&x);
            direction = if iterations % restart_interval == 0 {
                -g_next
            } else {
                let denom = g.norm_squared();
                let beta = if denom > 0.0 {
                    (g_next.dot(&(g_next - g)) / denom).max(0.0)
                } else {
                    0.0
                };
                -g_next + beta * direction
            };
            g = g_next;
        }

        if !converged && direction.norm_squared() < self.config.tolerance {
            converged = true;
        }

        MinimizeResult {
            params: x,
            distance_sq: f,
            converged,
            iterations,
        }
    }

    /// Multi-start search over a `(samples + 1)⁴` grid of starting
    /// parameters, returning the run with the smallest squared distance.
    ///
    /// With `exclusion = Some(r)` the pair is a self-intersection: starting
    /// points and results whose `(u, v)` and `(s, t)` halves are closer than
    /// `r` in parameter space are skipped, since they only find the
    /// trivial coincidence of the surface with itself.
    pub fn starting_params(
        &self,
        samples: usize,
        exclusion: Option<f64>,
    ) -> Option<MinimizeResult> {
        let exclusion_sq = exclusion.map(|r| r * r);
        let trivial = |params: &Vec4| match exclusion_sq {
            Some(r_sq) => self_param_distance_sq(self.p, params) < r_sq,
            None => false,
        };

        let mut best: Option<MinimizeResult> = None;
        let mut runs = 0usize;
        for i in 0..=samples {
            for j in 0..=samples {
                for k in 0..=samples {
                    for l in 0..=samples {
                        let start = Vec4::new(
                            sample(i, samples),
                            sample(j, samples),
                            sample(k, samples),
                            sample(l, samples),
                        );
                        if trivial(&start) {
                            continue;
                        }
                        runs += 1;
                        let result = self.minimize(start);
                        if result.diverged() || trivial(&result.params) {
                            continue;
                        }
                        if best.map_or(true, |b| result.distance_sq < b.distance_sq) {
                            best = Some(result);
                        }
                    }
                }
            }
        }

        debug!(
            runs,
            best_distance_sq = ?best.map(|b| b.distance_sq),
            "multi-start seed search finished"
        );
        best
    }
}

/// Parameters of the point on `surface` closest to `target`.
///
/// Runs the distance minimizer against a [`PointSurface`] from a
/// `(samples + 1)²` grid of starts and keeps the best. The returned
/// parameters are the `(u, v)` half.
pub fn closest_params(
    surface: &dyn ParametricSurface,
    target: Point3,
    samples: usize,
    config: CgConfig,
) -> Option<(Point2, f64)> {
    let cursor = PointSurface::new(target);
    let minimizer = DistanceMinimizer::new(surface, &cursor, config);

    let mut best: Option<MinimizeResult> = None;
    for i in 0..=samples {
        for j in 0..=samples {
            let start = join_params(sample_uv(i, j, samples), Point2::new(0.5, 0.5));
            let result = minimizer.minimize(start);
            if result.diverged() {
                continue;
            }
            if best.map_or(true, |b| result.distance_sq < b.distance_sq) {
                best = Some(result);
            }
        }
    }
    best.map(|b| (params_p(&b.params), b.distance_sq))
}
