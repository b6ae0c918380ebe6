//! Constrained portfolio solves.
//!
//! Three problems share [`frontier_math::optimization::minimize`]:
//!
//! | Problem | Objective | Equality constraints |
//! |---------|-----------|----------------------|
//! | [`max_sharpe`] | `-E[R]/σ` | `Σw = 1` |
//! | [`min_volatility_for_return`] | `σ` | `Σw = 1`, `E[R] = target` |
//! | [`closest_allocation`] | `\|σ* - σ\| + \|R* - E[R]\|` | `Σw = 1`, optional pins |
//!
//! Each solve starts from the uniform allocation (or a caller warm start)
//! and gets exactly one retry from a jittered guess. A solve that still has
//! not converged is returned with `converged == false` and logged at `warn`.

mod closest;
mod max_sharpe;
mod min_volatility;

pub use closest::closest_allocation;
pub use max_sharpe::max_sharpe;
pub use min_volatility::min_volatility_for_return;

use frontier_math::optimization::{minimize, EqualityConstraint, OptimizationResult};
use tracing::warn;

use crate::error::{PortfolioError, PortfolioResult};
use crate::metrics::evaluate;
use crate::types::{Allocation, SolverSettings, SolvedPortfolio, Statistics};

/// Floor on volatility inside solver objectives that divide by it.
pub(crate) const VOLATILITY_FLOOR: f64 = 1e-12;

/// `Σw - 1`.
pub(crate) fn sum_to_one<'a>() -> EqualityConstraint<'a> {
    Box::new(|w: &[f64]| w.iter().sum::<f64>() - 1.0)
}

/// Uniform `1/n` guess, or a copy of the caller's warm start.
pub(crate) fn initial_guess(n: usize, warm_start: Option<&[f64]>) -> PortfolioResult<Vec<f64>> {
    match warm_start {
        Some(w) if w.len() != n => Err(PortfolioError::invalid_argument(format!(
            "warm start has {} weights for {n} assets",
            w.len()
        ))),
        Some(w) if w.iter().any(|v| !v.is_finite()) => Err(PortfolioError::invalid_argument(
            "warm start contains non-finite weights",
        )),
        Some(w) => Ok(w.to_vec()),
        None => Ok(vec![1.0 / n as f64; n]),
    }
}

/// Deterministic perturbation of an initial guess.
fn jitter(x: &[f64], epsilon: f64) -> Vec<f64> {
    let n = x.len() as f64;
    x.iter()
        .enumerate()
        .map(|(i, v)| v + epsilon * (i as f64 + 1.0) / n)
        .collect()
}

/// A solver run plus whether it came from the retry.
pub(crate) struct Attempt {
    pub result: OptimizationResult,
    pub retried: bool,
}

/// Runs the solver, retrying once from a jittered guess if it fails to
/// converge.
///
/// When neither run converges, the one with the smaller constraint
/// violation wins, then the smaller objective.
pub(crate) fn solve_with_retry(
    objective: &dyn Fn(&[f64]) -> f64,
    guess: &[f64],
    bounds: &[(f64, f64)],
    constraints: &[EqualityConstraint<'_>],
    settings: &SolverSettings,
    operation: &str,
) -> PortfolioResult<Attempt> {
    let config = settings.optimization_config();
    let first = minimize(objective, guess, bounds, constraints, &config)?;
    if first.converged {
        return Ok(Attempt {
            result: first,
            retried: false,
        });
    }

    let second = minimize(
        objective,
        &jitter(guess, settings.retry_jitter),
        bounds,
        constraints,
        &config,
    )?;

    let result = if second.converged || better(&second, &first, settings.feasibility_tolerance) {
        second
    } else {
        first
    };

    if !result.converged {
        warn!(
            operation,
            objective = result.objective_value,
            violation = result.constraint_violation,
            iterations = result.iterations,
            "solver did not converge after retry"
        );
    }

    Ok(Attempt {
        result,
        retried: true,
    })
}

fn better(a: &OptimizationResult, b: &OptimizationResult, feasibility: f64) -> bool {
    let va = a.constraint_violation;
    let vb = b.constraint_violation;
    if (va - vb).abs() > feasibility {
        va < vb
    } else {
        a.objective_value < b.objective_value
    }
}

/// Evaluates a finished solve against the statistics.
///
/// # Errors
///
/// Returns `DegenerateRisk` if the solution has zero volatility.
pub(crate) fn into_solved(stats: &Statistics, attempt: Attempt) -> PortfolioResult<SolvedPortfolio> {
    let Attempt { result, retried } = attempt;
    let point = evaluate(stats, &Allocation::from_weights(result.parameters))?;
    Ok(SolvedPortfolio {
        point,
        objective_value: result.objective_value,
        constraint_violation: result.constraint_violation,
        converged: result.converged,
        retried,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_guess() {
        assert_eq!(initial_guess(4, None).unwrap(), vec![0.25; 4]);
        assert_eq!(
            initial_guess(2, Some(&[0.1, 0.9])).unwrap(),
            vec![0.1, 0.9]
        );
        assert!(initial_guess(3, Some(&[0.5, 0.5])).is_err());
        assert!(initial_guess(2, Some(&[f64::NAN, 1.0])).is_err());
    }

    #[test]
    fn test_jitter_is_deterministic_and_distinct() {
        let x = [0.25; 4];
        let a = jitter(&x, 1e-3);
        assert_eq!(a, jitter(&x, 1e-3));
        assert!(a.iter().zip(&x).all(|(j, v)| j > v));
        assert!(a.windows(2).all(|p| p[0] < p[1]));
        assert_eq!(jitter(&x, 0.0), x.to_vec());
    }

    #[test]
    fn test_sum_to_one() {
        let c = sum_to_one();
        assert_eq!(c(&[0.25, 0.75]), 0.0);
        assert!((c(&[0.5, 0.6]) - 0.1).abs() < 1e-15);
    }

    #[test]
    fn test_retry_keeps_best_effort() {
        // x in [0, 1] can never reach x = 2; both runs fail and the result is
        // still returned, flagged.
        let settings = SolverSettings {
            max_iterations: 50,
            max_outer_iterations: 3,
            ..SolverSettings::default()
        };
        let constraints = vec![Box::new(|x: &[f64]| x[0] - 2.0) as EqualityConstraint<'_>];
        let attempt = solve_with_retry(
            &|x: &[f64]| x[0] * x[0],
            &[0.5],
            &[(0.0, 1.0)],
            &constraints,
            &settings,
            "test",
        )
        .unwrap();

        assert!(attempt.retried);
        assert!(!attempt.result.converged);
        assert!((attempt.result.parameters[0] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_no_retry_when_converged() {
        let attempt = solve_with_retry(
            &|x: &[f64]| (x[0] - 0.3).powi(2),
            &[0.5],
            &[(0.0, 1.0)],
            &[],
            &SolverSettings::default(),
            "test",
        )
        .unwrap();
        assert!(!attempt.retried);
        assert!(attempt.result.converged);
    }
}
