//! Minimum volatility at a target return.

use frontier_math::optimization::EqualityConstraint;

use super::{initial_guess, solve_with_retry, sum_to_one};
use crate::error::{PortfolioError, PortfolioResult};
use crate::frontier::FrontierPoint;
use crate::metrics::{annualized_return, portfolio_volatility};
use crate::types::{Allocation, EngineConfig, Statistics};

/// Finds the least volatile fully invested allocation whose expected return
/// equals `target`.
///
/// Targets outside the attainable return range cannot be met; the solver
/// then returns its best effort with `converged == false` rather than an
/// error.
///
/// # Errors
///
/// Returns `InvalidArgument` for a non-finite target, a warm start of the
/// wrong length, or bounds that cannot sum to one.
pub fn min_volatility_for_return(
    stats: &Statistics,
    target: f64,
    config: &EngineConfig,
    warm_start: Option<&[f64]>,
) -> PortfolioResult<FrontierPoint> {
    if !target.is_finite() {
        return Err(PortfolioError::invalid_argument(format!(
            "target return must be finite, got {target}"
        )));
    }

    let n = stats.asset_count();
    let bounds = config.weight_bounds(n)?;
    let guess = initial_guess(n, warm_start)?;

    let objective = |w: &[f64]| portfolio_volatility(stats, w);
    let constraints: Vec<EqualityConstraint<'_>> = vec![
        sum_to_one(),
        Box::new(move |w: &[f64]| annualized_return(stats, w) - target),
    ];

    let attempt = solve_with_retry(
        &objective,
        &guess,
        &bounds,
        &constraints,
        &config.solver,
        "min_volatility_for_return",
    )?;
    let result = attempt.result;
    let realized_return = annualized_return(stats, &result.parameters);

    Ok(FrontierPoint {
        target_return: target,
        volatility: result.objective_value,
        realized_return,
        allocation: Allocation::from_weights(result.parameters),
        converged: result.converged,
        constraint_violation: result.constraint_violation,
    })
}
