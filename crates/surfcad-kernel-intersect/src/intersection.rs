//! Marching intersection tracer.
//!
//! Tracing runs in three stages:
//!
//! 1. **Seed**: conjugate-gradient search for parameters where the two
//!    surfaces coincide, either over a full parameter grid or starting
//!    from the points nearest a user cursor.
//! 2. **Forward march**: repeated Newton steps of fixed arc length along
//!    the curve tangent until the curve closes, leaves a domain, stalls
//!    or hits the iteration cap.
//! 3. **Backward march**: if the forward march did not close a loop, the
//!    same from the seed with the step negated. Its points are reversed
//!    and placed in front of the forward points.

use surfcad_kernel_geom::ParametricSurface;
use surfcad_kernel_math::{
    join_params, midpoint, params_p, params_q, Point2, Point3, Vec3, Vec4,
};
use surfcad_kernel_solve::{
    closest_params, self_param_distance_sq, DistanceMinimizer, MinimizeResult, NewtonResult,
    NewtonSolver, NewtonStatus,
};
use tracing::{debug, trace, warn};

use crate::config::IntersectionConfig;
use crate::curve::{compute_int_curve_normal, CurveSample, IntersectionCurve, SurfaceSide};
use crate::{IntersectError, Result};

/// Why a march stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MarchEnd {
    /// Came back to the first point.
    Closed,
    /// Left the domain of a bounded surface.
    Boundary,
    /// Neither the point nor the parameters moved.
    Stalled,
    /// Step cap reached.
    IterationCap,
}

/// A Newton step after step-halving retries.
#[derive(Debug, Clone, Copy)]
struct Advance {
    result: NewtonResult,
    /// Signed arc length of the last attempt.
    step: f64,
}

/// Intersection tracer for a pair of surfaces, or one surface against
/// itself.
#[derive(Debug, Clone, Copy)]
pub struct Intersection<'a> {
    p: &'a dyn ParametricSurface,
    q: &'a dyn ParametricSurface,
    self_intersection: bool,
    config: IntersectionConfig,
}

impl<'a> Intersection<'a> {
    /// Tracer for `P ∩ Q`.
    pub fn new(
        p: &'a dyn ParametricSurface,
        q: &'a dyn ParametricSurface,
        config: IntersectionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            p,
            q,
            self_intersection: false,
            config,
        })
    }

    /// Tracer for the self-intersection of `surface`.
    ///
    /// Seeds that only rediscover the surface coinciding with itself
    /// (parameter halves closer than `trivial_seed_radius`) are rejected.
    pub fn self_intersection(
        surface: &'a dyn ParametricSurface,
        config: IntersectionConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            p: surface,
            q: surface,
            self_intersection: true,
            config,
        })
    }

    /// The settings in use.
    pub fn config(&self) -> &IntersectionConfig {
        &self.config
    }

    /// Trace the intersection from a seed found by a full grid search.
    pub fn find(&self) -> Result<IntersectionCurve> {
        let seed = self.seed_from_grid();
        self.trace(seed)
    }

    /// Trace the intersection from a seed near `cursor`.
    ///
    /// The parameters on each surface closest to `cursor` form the
    /// starting guess, which is then refined by the distance minimizer.
    pub fn find_with_cursor(&self, cursor: Point3) -> Result<IntersectionCurve> {
        let seed = self.seed_from_cursor(cursor);
        self.trace(seed)
    }

    fn exclusion(&self) -> Option<f64> {
        self.self_intersection.then_some(self.config.trivial_seed_radius)
    }

    fn is_trivial(&self, params: &Vec4) -> bool {
        let radius = self.config.trivial_seed_radius;
        self.self_intersection && self_param_distance_sq(self.p, params) < radius * radius
    }

    fn minimizer(&self) -> DistanceMinimizer<'a> {
        DistanceMinimizer::new(self.p, self.q, self.config.cg)
    }

    fn seed_from_grid(&self) -> Option<MinimizeResult> {
        self.minimizer().starting_params(self.config.samples, self.exclusion())
    }

    fn seed_from_cursor(&self, cursor: Point3) -> Option<MinimizeResult> {
        let cg = self.config.cg;
        let samples = self.config.cursor_samples;
        let (uv, _) = closest_params(self.p, cursor, samples, cg)?;
        let minimizer = self.minimizer();

        if !self.self_intersection {
            let (st, _) = closest_params(self.q, cursor, samples, cg)?;
            let result = minimizer.minimize(join_params(uv, st));
            return (!result.diverged()).then_some(result);
        }

        // Both halves would land on the same parameters; keep the cursor
        // half and search the second half over the grid instead.
        let mut best: Option<MinimizeResult> = None;
        for i in 0..=samples {
            for j in 0..=samples {
                let st = Point2::new(i as f64 / samples as f64, j as f64 / samples as f64);
                let start = join_params(uv, st);
                if self.is_trivial(&start) {
                    continue;
                }
                let result = minimizer.minimize(start);
                if result.diverged() || self.is_trivial(&result.params) {
                    continue;
                }
                if best.map_or(true, |b| result.distance_sq < b.distance_sq) {
                    best = Some(result);
                }
            }
        }
        best
    }

    fn trace(&self, seed: Option<MinimizeResult>) -> Result<IntersectionCurve> {
        let no_intersection = IntersectError::NoIntersection {
            self_intersection: self.self_intersection,
        };
        let Some(seed) = seed else {
            debug!("seed search produced no candidate");
            return Err(no_intersection);
        };
        if seed.distance_sq > self.config.precision || self.is_trivial(&seed.params) {
            debug!(distance_sq = seed.distance_sq, "seed rejected");
            return Err(no_intersection);
        }

        let start = self.sample(&seed.params);
        debug!(
            point = ?start.point,
            distance_sq = seed.distance_sq,
            self_intersection = self.self_intersection,
            "tracing intersection"
        );

        let mut forward = IntersectionCurve::new();
        forward.push(start);
        let end = self.march(&start, 1.0, &mut forward);
        if end == MarchEnd::Closed {
            debug!(points = forward.len(), "intersection closed into a loop");
            return Ok(forward);
        }

        let mut curve = IntersectionCurve::new();
        self.march(&start, -1.0, &mut curve);
        curve.reverse();
        curve.append(&mut forward);
        debug!(points = curve.len(), "intersection traced");
        Ok(curve)
    }

    /// Everything recorded for the curve point at `params`.
    fn sample(&self, params: &Vec4) -> CurveSample {
        let uv = params_p(params);
        let st = params_q(params);
        let n_p = self.p.normal(uv);
        let n_q = self.q.normal(st);
        CurveSample {
            point: midpoint(&self.p.evaluate(uv), &self.q.evaluate(st)),
            params: *params,
            normal_p: compute_int_curve_normal(n_p, n_q, SurfaceSide::P),
            normal_q: compute_int_curve_normal(n_p, n_q, SurfaceSide::Q),
            surface_normal_p: n_p,
            surface_normal_q: n_q,
        }
    }

    /// True if a Newton result should be retried with a shorter step.
    fn step_failed(&self, status: NewtonStatus, point: Point3, target: Option<Point3>) -> bool {
        match status {
            NewtonStatus::Converged => target
                .is_some_and(|target| (point - target).norm_squared() > self.config.precision),
            NewtonStatus::LeftDomain { .. } => false,
            NewtonStatus::NotConverged | NewtonStatus::Diverged => true,
        }
    }

    /// Solve one step of signed length `step` from `(params, point)`,
    /// halving it up to `max_retries` times while the solve fails or
    /// overshoots. The last attempt is returned either way.
    fn advance(
        &self,
        newton: &NewtonSolver<'_>,
        params: Vec4,
        point: Point3,
        step: f64,
    ) -> Advance {
        let tangent = newton.curve_tangent(&params);
        let target_of = |d: f64| tangent.map(|t: Vec3| point + t * d);

        let mut d = step;
        let mut result = newton.solve(params, point, d);
        let mut retries = 0;
        while retries < self.config.max_retries
            && self.step_failed(result.status, self.sample(&result.params).point, target_of(d))
        {
            retries += 1;
            d = step * 0.5f64.powi(retries as i32);
            result = newton.solve(params, point, d);
        }
        Advance { result, step: d }
    }

    /// March from `start` in direction `sign`, appending to `out`.
    ///
    /// Only the forward march (`sign > 0`) closes a loop; it appends an
    /// exact copy of `start` when it does.
    fn march(&self, start: &CurveSample, sign: f64, out: &mut IntersectionCurve) -> MarchEnd {
        let newton = NewtonSolver::new(self.p, self.q, self.config.newton);
        // A loop can pass its first point at up to half a step.
        let close = self.config.loop_close_epsilon.max(self.config.step);
        let close_sq = close * close;
        let mut params = start.params;
        let mut point = start.point;
        let mut last_recorded = start.point;

        let end = 'steps: {
            for iteration in 1..=self.config.max_iterations {
                let Advance { result, step } =
                    self.advance(&newton, params, point, sign * self.config.step);
                if step.abs() < self.config.step {
                    trace!(iteration, step, "step shortened");
                }

                if let NewtonStatus::LeftDomain { boundary } = result.status {
                    let sample = self.sample(&boundary);
                    let moved = (sample.point - last_recorded).norm_squared();
                    if moved >= self.config.duplicate_epsilon {
                        out.push(sample);
                    }
                    break 'steps MarchEnd::Boundary;
                }

                let sample = self.sample(&result.params);
                if sign > 0.0
                    && iteration >= self.config.min_loop_iterations
                    && (sample.point - start.point).norm_squared() < close_sq
                {
                    out.push(*start);
                    break 'steps MarchEnd::Closed;
                }

                if (sample.point - last_recorded).norm_squared() < self.config.duplicate_epsilon {
                    if result.params == params {
                        break 'steps MarchEnd::Stalled;
                    }
                    params = result.params;
                    continue;
                }

                out.push(sample);
                last_recorded = sample.point;
                params = result.params;
                point = sample.point;
            }
            MarchEnd::IterationCap
        };

        match end {
            MarchEnd::Stalled => warn!(points = out.len(), sign, "march stalled"),
            MarchEnd::IterationCap => warn!(
                points = out.len(),
                sign,
                max_iterations = self.config.max_iterations,
                "march hit the iteration cap"
            ),
            _ => debug!(points = out.len(), sign, end = ?end, "march finished"),
        }
        end
    }
}
