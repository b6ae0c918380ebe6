//! Maximum Sharpe ratio allocation.

use tracing::debug;

use super::{initial_guess, into_solved, solve_with_retry, sum_to_one, VOLATILITY_FLOOR};
use crate::error::PortfolioResult;
use crate::metrics::{annualized_return, portfolio_volatility};
use crate::types::{EngineConfig, SolvedPortfolio, Statistics};

/// Finds the fully invested allocation with the highest Sharpe ratio.
///
/// Minimizes `-E[R]/σ` subject to `Σw = 1` and the configured weight bounds,
/// starting from the uniform allocation.
///
/// # Errors
///
/// Returns `InvalidArgument` if the bounds cannot sum to one and
/// `DegenerateRisk` if the solution has zero volatility. Non-convergence is
/// reported through [`SolvedPortfolio::converged`].
pub fn max_sharpe(stats: &Statistics, config: &EngineConfig) -> PortfolioResult<SolvedPortfolio> {
    let n = stats.asset_count();
    let bounds = config.weight_bounds(n)?;
    let guess = initial_guess(n, None)?;

    let objective = |w: &[f64]| {
        let vol = portfolio_volatility(stats, w).max(VOLATILITY_FLOOR);
        -annualized_return(stats, w) / vol
    };
    let constraints = vec![sum_to_one()];

    let attempt = solve_with_retry(
        &objective,
        &guess,
        &bounds,
        &constraints,
        &config.solver,
        "max_sharpe",
    )?;
    let solved = into_solved(stats, attempt)?;

    debug!(
        sharpe = solved.point.sharpe,
        converged = solved.converged,
        "max sharpe solve finished"
    );
    Ok(solved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::sharpe;
    use crate::types::Allocation;
    use nalgebra::{DMatrix, DVector};

    #[test]
    fn test_uncorrelated_tangency() {
        // With a diagonal covariance the tangency weights are proportional to
        // μ_i / σ_i².
        let stats = Statistics::new(
            vec!["AAA".into(), "BBB".into()],
            DVector::from_vec(vec![0.1 / 252.0, 0.05 / 252.0]),
            DMatrix::from_row_slice(2, 2, &[0.04, 0.0, 0.0, 0.01]),
            252.0,
        )
        .unwrap();

        let solved = max_sharpe(&stats, &EngineConfig::sequential()).unwrap();
        let w = solved.point.allocation.weights();

        // 0.1/0.04 = 2.5 and 0.05/0.01 = 5, so w = (1/3, 2/3).
        assert!(solved.constraint_violation < 1e-6);
        assert!((w[0] - 1.0 / 3.0).abs() < 1e-3);
        assert!((w[1] - 2.0 / 3.0).abs() < 1e-3);
        assert!((solved.point.allocation.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_beats_uniform() {
        let stats = Statistics::new(
            vec!["AAA".into(), "BBB".into(), "CCC".into()],
            DVector::from_vec(vec![0.0006, 0.0002, 0.0004]),
            DMatrix::from_row_slice(
                3,
                3,
                &[0.09, 0.01, 0.02, 0.01, 0.04, 0.0, 0.02, 0.0, 0.06],
            ),
            252.0,
        )
        .unwrap();

        let solved = max_sharpe(&stats, &EngineConfig::sequential()).unwrap();
        let uniform = Allocation::uniform(3).unwrap();
        let baseline = sharpe(&stats, uniform.weights()).unwrap();
        assert!(solved.point.sharpe >= baseline - 1e-9);
        assert!(solved
            .point
            .allocation
            .weights()
            .iter()
            .all(|w| (-1e-12..=1.0 + 1e-12).contains(w)));
    }
}
