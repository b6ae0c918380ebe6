//! Portfolio metrics.
//!
//! ## Formulas
//!
//! ```text
//! E[R_p] = D · μᵀw
//! σ_p    = sqrt(wᵀ Σ w)
//! S_p    = E[R_p] / σ_p
//! ```
//!
//! `D` is the annualization factor stored with the statistics. Weights need
//! not sum to one; normalization is the caller's job. Nothing here mutates
//! its inputs.

use frontier_math::linear_algebra::{dot, ensure_len, quadratic_form};

use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{Allocation, PortfolioPoint, Statistics};

/// Annualized expected return of `weights`.
///
/// # Errors
///
/// Returns `InvalidArgument` if the weight count differs from the asset count.
pub fn expected_return(stats: &Statistics, weights: &[f64]) -> PortfolioResult<f64> {
    check_weights(stats, weights)?;
    Ok(annualized_return(stats, weights))
}

/// Annualized volatility of `weights`.
///
/// A zero result is returned as-is; only [`sharpe`] treats it as an error.
pub fn volatility(stats: &Statistics, weights: &[f64]) -> PortfolioResult<f64> {
    check_weights(stats, weights)?;
    Ok(portfolio_volatility(stats, weights))
}

/// Sharpe ratio `expected_return / volatility`.
///
/// # Errors
///
/// Returns `DegenerateRisk` if the volatility is zero.
pub fn sharpe(stats: &Statistics, weights: &[f64]) -> PortfolioResult<f64> {
    let ret = expected_return(stats, weights)?;
    let vol = volatility(stats, weights)?;
    sharpe_ratio(ret, vol, "sharpe")
}

/// Evaluates an allocation into a [`PortfolioPoint`].
///
/// # Errors
///
/// Returns `DegenerateRisk` if the volatility is zero.
pub fn evaluate(stats: &Statistics, allocation: &Allocation) -> PortfolioResult<PortfolioPoint> {
    let weights = allocation.weights();
    let expected_return = expected_return(stats, weights)?;
    let volatility = volatility(stats, weights)?;
    let sharpe = sharpe_ratio(expected_return, volatility, "portfolio evaluation")?;

    Ok(PortfolioPoint {
        allocation: allocation.clone(),
        expected_return,
        volatility,
        sharpe,
    })
}

pub(crate) fn sharpe_ratio(ret: f64, vol: f64, operation: &str) -> PortfolioResult<f64> {
    if vol > 0.0 && vol.is_finite() {
        Ok(ret / vol)
    } else {
        Err(PortfolioError::degenerate_risk(operation))
    }
}

/// Unchecked expected return for solver objectives.
pub(crate) fn annualized_return(stats: &Statistics, weights: &[f64]) -> f64 {
    stats.trading_days_per_year() * dot(stats.mean_returns().as_slice(), weights)
}

/// Unchecked volatility for solver objectives.
///
/// Tiny negative quadratic forms from rounding are clamped to zero.
pub(crate) fn portfolio_volatility(stats: &Statistics, weights: &[f64]) -> f64 {
    quadratic_form(stats.covariance(), weights).max(0.0).sqrt()
}

fn check_weights(stats: &Statistics, weights: &[f64]) -> PortfolioResult<()> {
    ensure_len(stats.asset_count(), weights.len()).map_err(|_| {
        PortfolioError::invalid_argument(format!(
            "{} weights for {} assets",
            weights.len(),
            stats.asset_count()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{DMatrix, DVector};

    fn stats() -> Statistics {
        Statistics::new(
            vec!["AAA".into(), "BBB".into()],
            DVector::from_vec(vec![0.0004, 0.0002]),
            DMatrix::from_row_slice(2, 2, &[0.04, 0.006, 0.006, 0.09]),
            252.0,
        )
        .unwrap()
    }

    #[test]
    fn test_expected_return() {
        let r = expected_return(&stats(), &[0.5, 0.5]).unwrap();
        assert_relative_eq!(r, 252.0 * 0.0003, epsilon = 1e-14);
    }

    #[test]
    fn test_volatility() {
        // 0.25 * 0.04 + 2 * 0.25 * 0.006 + 0.25 * 0.09
        let v = volatility(&stats(), &[0.5, 0.5]).unwrap();
        assert_relative_eq!(v, 0.0355_f64.sqrt(), epsilon = 1e-14);
    }

    #[test]
    fn test_unnormalized_weights() {
        let s = stats();
        let r1 = expected_return(&s, &[1.0, 1.0]).unwrap();
        let r2 = expected_return(&s, &[0.5, 0.5]).unwrap();
        assert_relative_eq!(r1, 2.0 * r2, epsilon = 1e-14);
    }

    #[test]
    fn test_sharpe_is_exact_ratio() {
        let s = stats();
        let w = [0.3, 0.7];
        let expected = expected_return(&s, &w).unwrap() / volatility(&s, &w).unwrap();
        assert_eq!(sharpe(&s, &w).unwrap(), expected);
    }

    #[test]
    fn test_degenerate_risk() {
        let flat = Statistics::new(
            vec!["FLAT".into()],
            DVector::zeros(1),
            DMatrix::zeros(1, 1),
            252.0,
        )
        .unwrap();

        assert_eq!(volatility(&flat, &[1.0]).unwrap(), 0.0);
        assert!(matches!(
            sharpe(&flat, &[1.0]),
            Err(PortfolioError::DegenerateRisk { .. })
        ));
        let allocation = Allocation::new(vec![1.0]).unwrap();
        assert!(matches!(
            evaluate(&flat, &allocation),
            Err(PortfolioError::DegenerateRisk { .. })
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        assert!(matches!(
            expected_return(&stats(), &[1.0]),
            Err(PortfolioError::InvalidArgument { .. })
        ));
        assert!(volatility(&stats(), &[1.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_evaluate() {
        let s = stats();
        let allocation = Allocation::new(vec![0.3, 0.7]).unwrap();
        let point = evaluate(&s, &allocation).unwrap();
        assert_eq!(point.allocation, allocation);
        assert_eq!(point.sharpe, point.expected_return / point.volatility);
    }
}
