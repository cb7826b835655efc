#![warn(missing_docs)]

//! Numerical solvers for surface-surface problems.
//!
//! All solvers work on the joint parameter vector `(u, v, s, t)` of two
//! [`ParametricSurface`](surfcad_kernel_geom::ParametricSurface)s `P(u, v)`
//! and `Q(s, t)`:
//!
//! - [`find_step_size`] — Armijo backtracking line search
//! - [`DistanceMinimizer`] — conjugate-gradient minimization of
//!   `‖P − Q‖²`, plus multi-start seeding on a parameter grid
//! - [`NewtonSolver`] — marches an intersection curve by a fixed
//!   arc-length step
//!
//! Solver failures are reported as status values, never as errors: the
//! caller decides whether a failed step means "retry", "curve ended" or
//! "no intersection". Only settings validation returns [`SolveError`].

pub mod conjugate_gradient;
pub mod error;
pub mod line_search;
pub mod newton;

pub use conjugate_gradient::{closest_params, CgConfig, DistanceMinimizer, MinimizeResult};
pub use error::{Result, SolveError};
pub use line_search::{find_step_size, LineSearchConfig, LineSearchResult};
pub use newton::{NewtonConfig, NewtonResult, NewtonSolver, NewtonStatus, TangentSource};

use surfcad_kernel_geom::ParametricSurface;
use surfcad_kernel_math::{params_p, params_q, Point2, Vec4};

/// Clamp both halves of a joint parameter vector.
///
/// Returns `(in_p, in_q)`: whether each half was already inside its
/// surface's domain.
pub fn clamp_params(
    p: &dyn ParametricSurface,
    q: &dyn ParametricSurface,
    params: &mut Vec4,
) -> (bool, bool) {
    let mut uv = params_p(params);
    let mut st = params_q(params);
    let in_p = p.clamp(&mut uv);
    let in_q = q.clamp(&mut st);
    *params = Vec4::new(uv.x, uv.y, st.x, st.y);
    (in_p, in_q)
}

/// Squared parameter-space distance between the `(u, v)` and `(s, t)`
/// halves, wrapping across periodic directions of `surface`.
///
/// Only meaningful when both halves live on the same surface, i.e. for
/// self-intersection.
pub fn self_param_distance_sq(surface: &dyn ParametricSurface, params: &Vec4) -> f64 {
    let wrap = |d: f64, periodic: bool| {
        let d = d.abs();
        if periodic {
            d.min(1.0 - d)
        } else {
            d
        }
    };
    let a = params_p(params);
    let b = params_q(params);
    let du = wrap(a.x - b.x, surface.is_periodic_u());
    let dv = wrap(a.y - b.y, surface.is_periodic_v());
    du * du + dv * dv
}

/// Regular sample of `[0, 1]` with `samples + 1` values.
pub(crate) fn sample(i: usize, samples: usize) -> f64 {
    if samples == 0 {
        0.5
    } else {
        i as f64 / samples as f64
    }
}

/// Convenience: the `(u, v)` point of sample `(i, j)`.
pub(crate) fn sample_uv(i: usize, j: usize, samples: usize) -> Point2 {
    Point2::new(sample(i, samples), sample(j, samples))
}
