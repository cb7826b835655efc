//! Damped Newton solver for marching along an intersection curve.
//!
//! One call advances from a known curve point by a signed arc-length step
//! `d`. The unknowns are `(u, v, s, t)`; the four equations are
//!
//! ```text
//! P(u, v) − Q(s, t) = 0                 (3 equations)
//! (M − start) · T   = d                 (1 equation)
//! ```
//!
//! where `M = (P + Q) / 2` and `T` is the curve tangent at the starting
//! estimate, `normalize(nP × nQ)`.

use serde::{Deserialize, Serialize};
use surfcad_kernel_geom::ParametricSurface;
use surfcad_kernel_math::{midpoint, params_p, params_q, Mat4, Point3, Vec3, Vec4};

use crate::{clamp_params, Result, SolveError};

/// Below this length a tangent estimate is considered degenerate.
const TANGENT_EPSILON: f64 = 1e-10;

/// Newton parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewtonConfig {
    /// Converged once the squared norm of the Newton step falls below this.
    pub tolerance: f64,
    /// Iteration cap per solve.
    pub max_iterations: usize,
    /// Fraction of the Newton step applied per iteration.
    pub damping: f64,
}

impl Default for NewtonConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iterations: 30,
            damping: 0.1,
        }
    }
}

impl NewtonConfig {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(SolveError::InvalidConfig(
                "newton tolerance must be positive".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(SolveError::InvalidConfig(
                "newton max_iterations must be at least 1".into(),
            ));
        }
        if !(self.damping > 0.0 && self.damping <= 1.0) {
            return Err(SolveError::InvalidConfig(
                "newton damping must be in (0, 1]".into(),
            ));
        }
        Ok(())
    }
}

/// How a Newton solve ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NewtonStatus {
    /// Step norm fell below tolerance.
    Converged,
    /// Iteration cap reached, or the Jacobian was singular.
    NotConverged,
    /// An iterate left a bounded domain. `boundary` holds the clamped
    /// parameters of that iterate.
    LeftDomain {
        /// Clamped parameters on the domain boundary.
        boundary: Vec4,
    },
    /// An iterate became non-finite.
    Diverged,
}

/// Which direction the arc-length constraint was measured along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TangentSource {
    /// Cross product of the two surface normals.
    Normals,
    /// Fallback: `∂P/∂u` (normals near-parallel).
    DerivativeU,
    /// Second fallback: `∂P/∂v`.
    DerivativeV,
}

/// Outcome of a Newton solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonResult {
    /// The solution, or the last good iterate if the solve failed.
    pub params: Vec4,
    /// How the solve ended.
    pub status: NewtonStatus,
    /// Iterations performed.
    pub iterations: usize,
    /// Direction used for the arc-length equation.
    pub tangent_source: TangentSource,
}

impl NewtonResult {
    /// True for [`NewtonStatus::Converged`].
    pub fn converged(&self) -> bool {
        self.status == NewtonStatus::Converged
    }
}

/// Newton solver over a surface pair.
#[derive(Debug, Clone, Copy)]
pub struct NewtonSolver<'a> {
    p: &'a dyn ParametricSurface,
    q: &'a dyn ParametricSurface,
    config: NewtonConfig,
}

impl<'a> NewtonSolver<'a> {
    /// Create a solver for the surface pair `(p, q)`.
    pub fn new(
        p: &'a dyn ParametricSurface,
        q: &'a dyn ParametricSurface,
        config: NewtonConfig,
    ) -> Self {
        Self { p, q, config }
    }

    /// Unit tangent of the intersection curve at `params`, if the normals
    /// are not parallel.
    pub fn curve_tangent(&self, params: &Vec4) -> Option<Vec3> {
        let n_p = self.p.normal(params_p(params));
        let n_q = self.q.normal(params_q(params));
        unit(n_p.cross(&n_q))
    }

    fn fallback_tangent(&self, params: &Vec4, source: TangentSource) -> Option<Vec3> {
        let uv = params_p(params);
        match source {
            TangentSource::Normals => self.curve_tangent(params),
            TangentSource::DerivativeU => unit(self.p.d_du(uv)),
            TangentSource::DerivativeV => unit(self.p.d_dv(uv)),
        }
    }

    /// Advance from `start` (whose curve point is `start_point`) by the
    /// signed arc length `step`.
    ///
    /// When the normals are near-parallel the tangent falls back to
    /// `∂P/∂u`; if that solve does not converge it is retried once along
    /// `∂P/∂v`.
    pub fn solve(&self, start: Vec4, start_point: Point3, step: f64) -> NewtonResult {
        if let Some(tangent) = self.curve_tangent(&start) {
            return self.solve_along(start, start_point, step, tangent, TangentSource::Normals);
        }

        let mut result = NewtonResult {
            params: start,
            status: NewtonStatus::NotConverged,
            iterations: 0,
            tangent_source: TangentSource::DerivativeU,
        };
        for source in [TangentSource::DerivativeU, TangentSource::DerivativeV] {
            let Some(tangent) = self.fallback_tangent(&start, source) else {
                continue;
            };
            result = self.solve_along(start, start_point, step, tangent, source);
            if result.status != NewtonStatus::NotConverged {
                break;
            }
        }
        result
    }

    fn solve_along(
        &self,
        start: Vec4,
        start_point: Point3,
        step: f64,
        tangent: Vec3,
        tangent_source: TangentSource,
    ) -> NewtonResult {
        let mut x = start;
        let finish = |params, status, iterations| NewtonResult {
            params,
            status,
            iterations,
            tangent_source,
        };

        for iteration in 1..=self.config.max_iterations {
            let uv = params_p(&x);
            let st = params_q(&x);
            let p = self.p.evaluate(uv);
            let q = self.q.evaluate(st);
            let diff = p - q;
            let arc = (midpoint(&p, &q) - start_point).dot(&tangent) - step;
            let residual = Vec4::new(diff.x, diff.y, diff.z, arc);

            let p_u = self.p.d_du(uv);
            let p_v = self.p.d_dv(uv);
            let q_s = self.q.d_du(st);
            let q_t = self.q.d_dv(st);
            #[rustfmt::skip]
            let jacobian = Mat4::new(
                p_u.x, p_v.x, -q_s.x, -q_t.x,
                p_u.y, p_v.y, -q_s.y, -q_t.y,
                p_u.z, p_v.z, -q_s.z, -q_t.z,
                0.5 * p_u.dot(&tangent), 0.5 * p_v.dot(&tangent),
                0.5 * q_s.dot(&tangent), 0.5 * q_t.dot(&tangent),
            );

            let Some(delta) = jacobian.lu().solve(&residual) else {
                return finish(x, NewtonStatus::NotConverged, iteration);
            };

            let previous = x;
            x -= self.config.damping * delta;
            if x.iter().any(|c| !c.is_finite()) {
                return finish(previous, NewtonStatus::Diverged, iteration);
            }
            let (in_p, in_q) = clamp_params(self.p, self.q, &mut x);
            if !(in_p && in_q) {
                return finish(previous, NewtonStatus::LeftDomain { boundary: x }, iteration);
            }
            if delta.norm_squared() < self.config.tolerance {
                return finish(x, NewtonStatus::Converged, iteration);
            }
        }
        finish(x, NewtonStatus::NotConverged, self.config.max_iterations)
    }
}

fn unit(v: Vec3) -> Option<Vec3> {
    if v.iter().all(|c| c.is_finite()) {
        v.try_normalize(TANGENT_EPSILON)
    } else {
        None
    }
}
