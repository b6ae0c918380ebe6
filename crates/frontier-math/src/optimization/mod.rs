//! Constrained optimization.
//!
//! [`minimize`] solves
//!
//! ```text
//! min f(x)   subject to   lo ≤ x ≤ hi,   c_k(x) = 0  for every k
//! ```
//!
//! with an augmented Lagrangian outer loop
//!
//! ```text
//! L_ρ(x, λ) = f(x) + Σ λ_k c_k(x) + ρ/2 Σ c_k(x)²
//! ```
//!
//! whose bound-constrained subproblems are handled by a spectral projected
//! gradient method. Equality constraints are therefore soft inside the
//! search; the caller sees the best point found, its residual violation and
//! whether the search met its tolerances.

mod projected_gradient;

use crate::error::{MathError, MathResult};
use projected_gradient::{spg, BoxSettings};

/// An equality constraint: feasible points evaluate to zero.
pub type EqualityConstraint<'a> = Box<dyn Fn(&[f64]) -> f64 + 'a>;

/// Configuration for optimization algorithms.
#[derive(Debug, Clone, Copy)]
pub struct OptimizationConfig {
    /// Relative change in objective below which a subproblem is considered
    /// solved.
    pub tolerance: f64,
    /// Projected gradient norm below which a subproblem is considered solved.
    pub gradient_tolerance: f64,
    /// Maximum absolute equality residual accepted as feasible.
    pub feasibility_tolerance: f64,
    /// Maximum iterations per subproblem.
    pub max_iterations: u32,
    /// Maximum multiplier updates.
    pub max_outer_iterations: u32,
    /// Relative step for numerical gradients.
    pub step_size: f64,
    /// Starting quadratic penalty weight.
    pub initial_penalty: f64,
    /// Cap on the quadratic penalty weight.
    pub max_penalty: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-12,
            gradient_tolerance: 1e-8,
            feasibility_tolerance: 1e-8,
            max_iterations: 500,
            max_outer_iterations: 30,
            step_size: 1e-7,
            initial_penalty: 10.0,
            max_penalty: 1e8,
        }
    }
}

impl OptimizationConfig {
    /// Sets the objective-change tolerance.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the feasibility tolerance.
    #[must_use]
    pub fn with_feasibility_tolerance(mut self, tolerance: f64) -> Self {
        self.feasibility_tolerance = tolerance;
        self
    }

    /// Sets the maximum iterations per subproblem.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the maximum number of multiplier updates.
    #[must_use]
    pub fn with_max_outer_iterations(mut self, max_outer_iterations: u32) -> Self {
        self.max_outer_iterations = max_outer_iterations;
        self
    }

    fn validate(&self) -> MathResult<()> {
        let positive = [
            ("tolerance", self.tolerance),
            ("gradient_tolerance", self.gradient_tolerance),
            ("feasibility_tolerance", self.feasibility_tolerance),
            ("step_size", self.step_size),
            ("initial_penalty", self.initial_penalty),
            ("max_penalty", self.max_penalty),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(MathError::invalid_input(format!(
                    "{name} must be positive and finite, got {value}"
                )));
            }
        }
        if self.max_iterations == 0 || self.max_outer_iterations == 0 {
            return Err(MathError::invalid_input("iteration limits must be non-zero"));
        }
        Ok(())
    }

    fn box_settings(&self) -> BoxSettings {
        BoxSettings {
            gradient_tolerance: self.gradient_tolerance,
            function_tolerance: self.tolerance,
            max_iterations: self.max_iterations,
            step_size: self.step_size,
        }
    }
}

/// Result of an optimization run.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Best parameters found.
    pub parameters: Vec<f64>,
    /// Objective value at `parameters` (without penalty terms).
    pub objective_value: f64,
    /// Largest absolute equality residual at `parameters`.
    pub constraint_violation: f64,
    /// Total subproblem iterations used.
    pub iterations: u32,
    /// Whether the optimization converged.
    pub converged: bool,
}

fn max_violation(constraints: &[EqualityConstraint<'_>], x: &[f64]) -> f64 {
    constraints
        .iter()
        .map(|c| {
            let v = c(x);
            if v.is_finite() {
                v.abs()
            } else {
                f64::INFINITY
            }
        })
        .fold(0.0, f64::max)
}

fn validate_bounds(bounds: &[(f64, f64)]) -> MathResult<()> {
    for (index, &(lower, upper)) in bounds.iter().enumerate() {
        if lower.is_nan() || upper.is_nan() || lower > upper {
            return Err(MathError::InvalidBound {
                index,
                lower,
                upper,
            });
        }
    }
    Ok(())
}

/// Minimizes `objective` subject to box bounds and equality constraints.
///
/// The initial guess is clamped into the bounds before the search starts.
/// Running out of iterations is not an error: the best point is returned with
/// `converged == false`.
///
/// # Errors
///
/// Returns an error if `initial_guess` and `bounds` differ in length, the
/// problem is empty, a bound is inverted, the configuration is invalid, or
/// the objective is not finite at the (clamped) initial guess.
///
/// # Example
///
/// ```rust
/// use frontier_math::optimization::{minimize, EqualityConstraint, OptimizationConfig};
///
/// // Minimize x² + y² on the line x + y = 1.
/// let objective = |x: &[f64]| x[0] * x[0] + x[1] * x[1];
/// let constraints: Vec<EqualityConstraint<'_>> = vec![Box::new(|x: &[f64]| x[0] + x[1] - 1.0)];
///
/// let result = minimize(
///     objective,
///     &[0.0, 0.0],
///     &[(-10.0, 10.0), (-10.0, 10.0)],
///     &constraints,
///     &OptimizationConfig::default(),
/// )
/// .unwrap();
///
/// assert!(result.converged);
/// assert!((result.parameters[0] - 0.5).abs() < 1e-5);
/// ```
pub fn minimize<F>(
    objective: F,
    initial_guess: &[f64],
    bounds: &[(f64, f64)],
    constraints: &[EqualityConstraint<'_>],
    config: &OptimizationConfig,
) -> MathResult<OptimizationResult>
where
    F: Fn(&[f64]) -> f64,
{
    config.validate()?;
    if initial_guess.is_empty() {
        return Err(MathError::invalid_input("cannot optimize over zero variables"));
    }
    if initial_guess.len() != bounds.len() {
        return Err(MathError::dimension_mismatch(
            initial_guess.len(),
            bounds.len(),
        ));
    }
    validate_bounds(bounds)?;

    let mut x = initial_guess.to_vec();
    projected_gradient::project(&mut x, bounds);
    if !objective(&x).is_finite() {
        return Err(MathError::non_finite("objective at initial guess"));
    }

    let settings = config.box_settings();
    let mut multipliers = vec![0.0; constraints.len()];
    let mut penalty = config.initial_penalty;
    let mut violation = max_violation(constraints, &x);
    let mut iterations = 0_u32;
    let mut converged = false;

    for outer in 0..config.max_outer_iterations {
        let merit = |p: &[f64]| {
            let mut value = objective(p);
            for (c, lambda) in constraints.iter().zip(&multipliers) {
                let r = c(p);
                value += lambda * r + 0.5 * penalty * r * r;
            }
            value
        };

        let inner = spg(&merit, &x, bounds, settings);
        iterations = iterations.saturating_add(inner.iterations);
        x = inner.x;

        let previous = violation;
        violation = max_violation(constraints, &x);
        log::trace!(
            "outer {outer}: merit={:.6e} violation={violation:.3e} penalty={penalty:.1e} inner_converged={}",
            inner.value,
            inner.converged
        );

        if violation <= config.feasibility_tolerance && inner.converged {
            converged = true;
            break;
        }
        if constraints.is_empty() {
            break;
        }

        for (c, lambda) in constraints.iter().zip(multipliers.iter_mut()) {
            let r = c(&x);
            if r.is_finite() {
                *lambda += penalty * r;
            }
        }
        if violation > 0.25 * previous {
            penalty = (penalty * 10.0).min(config.max_penalty);
        }
    }

    let objective_value = objective(&x);
    if !converged {
        log::debug!(
            "minimize did not converge: objective={objective_value:.6e} violation={violation:.3e} iterations={iterations}"
        );
    }

    Ok(OptimizationResult {
        parameters: x,
        objective_value,
        constraint_violation: violation,
        iterations,
        converged,
    })
}
