//! Allocation closest to a desired (volatility, return) point.

use frontier_math::optimization::EqualityConstraint;

use super::{initial_guess, into_solved, solve_with_retry, sum_to_one};
use crate::error::{PortfolioError, PortfolioResult};
use crate::metrics::{annualized_return, portfolio_volatility};
use crate::types::{EngineConfig, SolvedPortfolio, Statistics};

/// Finds the allocation whose (volatility, return) is closest to the desired
/// point in L1 distance.
///
/// An absent value is treated as zero. When both desired values are
/// non-zero they are also added as hard equality constraints; otherwise
/// only the distance is minimized.
///
/// This is the uncached solve; [`crate::closest::ClosestAllocationFinder`]
/// memoizes it.
///
/// # Errors
///
/// Returns `InvalidArgument` for a non-finite desired value or bounds that
/// cannot sum to one, and `DegenerateRisk` if the solution has zero
/// volatility.
pub fn closest_allocation(
    stats: &Statistics,
    desired_volatility: Option<f64>,
    desired_return: Option<f64>,
    config: &EngineConfig,
) -> PortfolioResult<SolvedPortfolio> {
    let target_vol = desired_volatility.unwrap_or(0.0);
    let target_ret = desired_return.unwrap_or(0.0);
    if !(target_vol.is_finite() && target_ret.is_finite()) {
        return Err(PortfolioError::invalid_argument(format!(
            "desired point must be finite, got ({target_vol}, {target_ret})"
        )));
    }

    let n = stats.asset_count();
    let bounds = config.weight_bounds(n)?;
    let guess = initial_guess(n, None)?;

    let objective = |w: &[f64]| {
        (target_vol - portfolio_volatility(stats, w)).abs()
            + (target_ret - annualized_return(stats, w)).abs()
    };

    let mut constraints: Vec<EqualityConstraint<'_>> = vec![sum_to_one()];
    if target_vol != 0.0 && target_ret != 0.0 {
        constraints.push(Box::new(move |w: &[f64]| {
            portfolio_volatility(stats, w) - target_vol
        }));
        constraints.push(Box::new(move |w: &[f64]| {
            annualized_return(stats, w) - target_ret
        }));
    }

    let attempt = solve_with_retry(
        &objective,
        &guess,
        &bounds,
        &constraints,
        &config.solver,
        "closest_allocation",
    )?;
    into_solved(stats, attempt)
}
