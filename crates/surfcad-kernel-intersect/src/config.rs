//! Intersection tracing settings.

use serde::{Deserialize, Serialize};
use surfcad_kernel_solve::{CgConfig, NewtonConfig};

use crate::{IntersectError, Result};

/// Tracing parameters. Every iteration cap and the seed grid resolution
/// are exposed here because they bound the cost of a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntersectionConfig {
    /// Arc-length step between traced points.
    pub step: f64,
    /// Squared-distance threshold for the seed sanity check and the
    /// per-step overshoot check.
    pub precision: f64,
    /// A point closer than this to the first point closes the loop. The
    /// radius never drops below `step`, since consecutive points can be up
    /// to a step apart.
    pub loop_close_epsilon: f64,
    /// Steps that must elapse before a loop may close.
    pub min_loop_iterations: usize,
    /// Step cap per march direction.
    pub max_iterations: usize,
    /// Step-halving retries after a failed Newton solve.
    pub max_retries: u32,
    /// Seed grid resolution: `(samples + 1)⁴` CG runs.
    pub samples: usize,
    /// Per-surface grid resolution for cursor-assisted seeding:
    /// `(cursor_samples + 1)²` runs per surface.
    pub cursor_samples: usize,
    /// Parameter-space radius of the trivial self-coincidence.
    pub trivial_seed_radius: f64,
    /// Squared distance under which a new point repeats the previous one.
    pub duplicate_epsilon: f64,
    /// Seed minimizer.
    pub cg: CgConfig,
    /// Marching solver.
    pub newton: NewtonConfig,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            step: 0.01,
            precision: 1e-4,
            loop_close_epsilon: 0.01,
            min_loop_iterations: 10,
            max_iterations: 15000,
            max_retries: 5,
            samples: 10,
            cursor_samples: 8,
            trivial_seed_radius: 0.1,
            duplicate_epsilon: 1e-8,
            cg: CgConfig::default(),
            newton: NewtonConfig::default(),
        }
    }
}

impl IntersectionConfig {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.step) {
            return Err(IntersectError::InvalidConfig("step must be positive".into()));
        }
        if !positive(self.precision) {
            return Err(IntersectError::InvalidConfig(
                "precision must be positive".into(),
            ));
        }
        if !positive(self.loop_close_epsilon) {
            return Err(IntersectError::InvalidConfig(
                "loop_close_epsilon must be positive".into(),
            ));
        }
        if self.max_iterations == 0 {
            return Err(IntersectError::InvalidConfig(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.samples == 0 || self.cursor_samples == 0 {
            return Err(IntersectError::InvalidConfig(
                "seed grids need at least one sample interval".into(),
            ));
        }
        self.cg.validate()?;
        self.newton.validate()?;
        Ok(())
    }
}
