//! Armijo backtracking line search.

use serde::{Deserialize, Serialize};

use crate::{Result, SolveError};

/// Line search parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineSearchConfig {
    /// Sufficient-decrease constant `c` in `φ(0) − φ(α) ≥ −α·c·φ'(0)`.
    pub armijo_parameter: f64,
    /// Factor applied to `α` after a rejected trial.
    pub shrink_factor: f64,
    /// First trial step.
    pub initial_step: f64,
    /// Give up once `α` drops below this.
    pub min_step: f64,
    /// Maximum number of `φ` evaluations.
    pub max_evaluations: usize,
}

impl Default for LineSearchConfig {
    fn default() -> Self {
        Self {
            armijo_parameter: 1e-4,
            shrink_factor: 0.5,
            initial_step: 1.0,
            min_step: 1e-8,
            max_evaluations: 20,
        }
    }
}

impl LineSearchConfig {
    /// Validate settings.
    pub fn validate(&self) -> Result<()> {
        if !(self.armijo_parameter > 0.0 && self.armijo_parameter < 1.0) {
            return Err(SolveError::InvalidConfig(
                "line search armijo_parameter must be in (0, 1)".into(),
            ));
        }
        if !(self.shrink_factor > 0.0 && self.shrink_factor < 1.0) {
            return Err(SolveError::InvalidConfig(
                "line search shrink_factor must be in (0, 1)".into(),
            ));
        }
        let positive = |value: f64| value.is_finite() && value > 0.0;
        if !positive(self.initial_step) || !positive(self.min_step) {
            return Err(SolveError::InvalidConfig(
                "line search steps must be positive".into(),
            ));
        }
        if self.max_evaluations == 0 {
            return Err(SolveError::InvalidConfig(
                "line search max_evaluations must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Outcome of a line search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSearchResult {
    /// Accepted step, or `min_step` on failure.
    pub step: f64,
    /// Whether the Armijo condition was met.
    pub success: bool,
    /// Number of `φ` evaluations spent.
    pub evaluations: usize,
}

/// Find a step `α` along a descent direction satisfying the Armijo
/// sufficient-decrease condition.
///
/// `phi` is the objective restricted to the search line, `phi0 = φ(0)` and
/// `slope0 = φ'(0)`. A non-negative slope is not a descent direction and
/// fails immediately.
pub fn find_step_size<F>(
    mut phi: F,
    phi0: f64,
    slope0: f64,
    config: &LineSearchConfig,
) -> LineSearchResult
where
    F: FnMut(f64) -> f64,
{
    let failure = |evaluations| LineSearchResult {
        step: config.min_step,
        success: false,
        evaluations,
    };

    // NaN slopes fail here too.
    if !(slope0 < 0.0) {
        return failure(0);
    }

    let mut alpha = config.initial_step;
    let mut evaluations = 0;
    while evaluations < config.max_evaluations && alpha >= config.min_step {
        let value = phi(alpha);
        evaluations += 1;
        if value.is_finite() && phi0 - value >= -alpha * config.armijo_parameter * slope0 {
            return LineSearchResult {
                step: alpha,
                success: true,
                evaluations,
            };
        }
        alpha *= config.shrink_factor;
    }
    failure(evaluations)
}
