//! Return/risk estimation from price history.
//!
//! ## Method
//!
//! ```text
//! r[t,a]  = ln(p[t,a] / p[t-1,a])
//! μ[a]    = mean of valid r[·,a]
//! Σ[a,b]  = D · sample_cov(r[·,a], r[·,b])      (pairwise complete, n-1 denominator)
//! ```
//!
//! where `D` is the trading-days-per-year annualization factor. Missing
//! returns are dropped pairwise, never treated as zero.
//!
//! Pairwise deletion can produce an indefinite matrix when assets are
//! observed over different periods. In that case negative eigenvalues are
//! clipped to zero, giving the nearest PSD matrix.

mod returns;

pub use returns::{log_returns, LogReturnMatrix};

use frontier_math::linear_algebra::{clip_to_positive_semidefinite, min_eigenvalue};
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::error::{PortfolioError, PortfolioResult};
use crate::types::{PriceSeries, Statistics, DEFAULT_TRADING_DAYS_PER_YEAR};

/// Estimates statistics annualized with 252 trading days.
///
/// # Errors
///
/// Returns `InsufficientData` for no assets, or an asset or asset pair with
/// fewer than two jointly valid returns. The n-1 covariance needs two
/// returns, so at least three price rows are required.
pub fn estimate(prices: &PriceSeries) -> PortfolioResult<Statistics> {
    estimate_annualized(prices, DEFAULT_TRADING_DAYS_PER_YEAR)
}

/// Estimates statistics with an explicit annualization factor.
pub fn estimate_annualized(
    prices: &PriceSeries,
    trading_days_per_year: f64,
) -> PortfolioResult<Statistics> {
    let returns = log_returns(prices)?;
    estimate_from_returns(&returns, trading_days_per_year)
}

/// Estimates statistics from precomputed log-returns.
pub fn estimate_from_returns(
    returns: &LogReturnMatrix,
    trading_days_per_year: f64,
) -> PortfolioResult<Statistics> {
    let n = returns.assets().len();
    if n == 0 {
        return Err(PortfolioError::insufficient_data("no assets"));
    }

    let mut means = DVector::zeros(n);
    for a in 0..n {
        let (sum, count) = returns
            .valid_column(a)
            .fold((0.0, 0_usize), |(s, c), r| (s + r, c + 1));
        if count == 0 {
            return Err(PortfolioError::insufficient_data(format!(
                "asset '{}' has no valid returns",
                returns.assets()[a]
            )));
        }
        means[a] = sum / count as f64;
    }

    let mut raw = pairwise_covariance(returns.values(), returns.assets())?;
    let lambda = min_eigenvalue(&raw)?;
    if lambda < 0.0 {
        debug!(min_eigenvalue = lambda, "clipping indefinite pairwise covariance");
        raw = clip_to_positive_semidefinite(&raw)?;
    }
    let covariance = raw * trading_days_per_year;

    debug!(
        assets = n,
        periods = returns.len(),
        trading_days_per_year,
        "estimated return statistics"
    );

    Statistics::new(
        returns.assets().to_vec(),
        means,
        covariance,
        trading_days_per_year,
    )
}

/// Sample covariance over rows where both columns are valid.
fn pairwise_covariance(values: &DMatrix<f64>, assets: &[String]) -> PortfolioResult<DMatrix<f64>> {
    let n = values.ncols();
    let periods = values.nrows();
    let mut cov = DMatrix::zeros(n, n);

    for i in 0..n {
        for j in i..n {
            let pairs: Vec<(f64, f64)> = (0..periods)
                .map(|t| (values[(t, i)], values[(t, j)]))
                .filter(|(x, y)| !x.is_nan() && !y.is_nan())
                .collect();

            if pairs.len() < 2 {
                let reason = if i == j {
                    format!(
                        "asset '{}' has {} valid returns, need at least 2",
                        assets[i],
                        pairs.len()
                    )
                } else {
                    format!(
                        "assets '{}' and '{}' share {} valid returns, need at least 2",
                        assets[i],
                        assets[j],
                        pairs.len()
                    )
                };
                return Err(PortfolioError::insufficient_data(reason));
            }

            let count = pairs.len() as f64;
            let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / count;
            let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / count;
            let c = pairs
                .iter()
                .map(|(x, y)| (x - mean_x) * (y - mean_y))
                .sum::<f64>()
                / (count - 1.0);

            cov[(i, j)] = c;
            cov[(j, i)] = c;
        }
    }

    Ok(cov)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;
    use frontier_math::linear_algebra::{is_positive_semidefinite, is_symmetric};

    fn dates(n: u32) -> Vec<NaiveDate> {
        (1..=n)
            .map(|d| NaiveDate::from_ymd_opt(2024, 5, d).unwrap())
            .collect()
    }

    #[test]
    fn test_two_asset_scenario() {
        let prices = PriceSeries::from_rows(
            vec!["A".into(), "B".into()],
            dates(3),
            vec![vec![100.0, 50.0], vec![101.0, 49.0], vec![102.0, 51.0]],
        )
        .unwrap();

        let stats = estimate(&prices).unwrap();

        let a = [(101.0_f64 / 100.0).ln(), (102.0_f64 / 101.0).ln()];
        let b = [(49.0_f64 / 50.0).ln(), (51.0_f64 / 49.0).ln()];
        let mean_a = (a[0] + a[1]) / 2.0;
        let mean_b = (b[0] + b[1]) / 2.0;
        let cov_ab = (a[0] - mean_a) * (b[0] - mean_b) + (a[1] - mean_a) * (b[1] - mean_b);
        let var_a = (a[0] - mean_a).powi(2) + (a[1] - mean_a).powi(2);

        assert_relative_eq!(stats.mean_returns()[0], mean_a, epsilon = 1e-15);
        assert_relative_eq!(stats.mean_returns()[1], mean_b, epsilon = 1e-15);
        assert_relative_eq!(stats.covariance()[(0, 0)], 252.0 * var_a, epsilon = 1e-12);
        assert_relative_eq!(stats.covariance()[(0, 1)], 252.0 * cov_ab, epsilon = 1e-12);
        assert_eq!(stats.covariance()[(0, 1)], stats.covariance()[(1, 0)]);
    }

    #[test]
    fn test_custom_annualization() {
        let prices = PriceSeries::from_rows(
            vec!["A".into()],
            dates(4),
            vec![vec![10.0], vec![11.0], vec![10.5], vec![12.0]],
        )
        .unwrap();

        let daily = estimate_annualized(&prices, 1.0).unwrap();
        let yearly = estimate(&prices).unwrap();
        assert_relative_eq!(
            yearly.covariance()[(0, 0)],
            252.0 * daily.covariance()[(0, 0)],
            epsilon = 1e-15
        );
        assert_eq!(yearly.trading_days_per_year(), 252.0);
    }

    #[test]
    fn test_missing_values_are_excluded() {
        let prices = PriceSeries::new(
            vec!["A".into(), "B".into()],
            dates(5),
            vec![
                vec![Some(100.0), Some(20.0)],
                vec![Some(102.0), Some(21.0)],
                vec![Some(101.0), None],
                vec![Some(104.0), Some(22.0)],
                vec![Some(103.0), Some(23.0)],
            ],
        )
        .unwrap();

        let stats = estimate(&prices).unwrap();

        // B has returns only for periods 0 and 3; A uses all four.
        let b = [(21.0_f64 / 20.0).ln(), (23.0_f64 / 22.0).ln()];
        assert_relative_eq!(stats.mean_returns()[1], (b[0] + b[1]) / 2.0, epsilon = 1e-15);

        let a_all = (103.0_f64 / 100.0).ln() / 4.0;
        assert_relative_eq!(stats.mean_returns()[0], a_all, epsilon = 1e-15);
        assert!(stats.covariance().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_disjoint_overlaps_give_psd_covariance() {
        // A and B move together, then B and C, then A against C.
        let shocks = [0.01, -0.02, 0.015, -0.005, 0.02, -0.01];
        let mut rows = Vec::new();
        let (mut a, mut b, mut c) = (100.0_f64, 50.0_f64, 20.0_f64);

        rows.push(vec![Some(a), Some(b), None]);
        for s in shocks {
            a *= f64::exp(s);
            b *= f64::exp(s);
            rows.push(vec![Some(a), Some(b), None]);
        }
        rows.push(vec![None, Some(b), Some(c)]);
        for s in shocks {
            b *= f64::exp(s);
            c *= f64::exp(s);
            rows.push(vec![None, Some(b), Some(c)]);
        }
        rows.push(vec![Some(a), None, Some(c)]);
        for s in shocks {
            a *= f64::exp(s);
            c *= f64::exp(-s);
            rows.push(vec![Some(a), None, Some(c)]);
        }

        let n = rows.len() as u32;
        let prices = PriceSeries::new(
            vec!["A".into(), "B".into(), "C".into()],
            (0..n)
                .map(|d| {
                    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(d.into())
                })
                .collect(),
            rows,
        )
        .unwrap();

        let returns = log_returns(&prices).unwrap();
        let raw = pairwise_covariance(returns.values(), returns.assets()).unwrap();
        assert!(min_eigenvalue(&raw).unwrap() < 0.0);

        let stats = estimate(&prices).unwrap();
        let cov = stats.covariance();
        assert!(is_symmetric(cov, 0.0));
        assert!(is_positive_semidefinite(cov, 1e-12));
        assert!(crate::metrics::volatility(&stats, &[1.0 / 3.0; 3]).unwrap() > 0.0);
    }

    #[test]
    fn test_single_asset_constant_price() {
        let prices = PriceSeries::from_rows(
            vec!["FLAT".into()],
            dates(4),
            vec![vec![5.0], vec![5.0], vec![5.0], vec![5.0]],
        )
        .unwrap();

        let stats = estimate(&prices).unwrap();
        assert_eq!(stats.covariance().shape(), (1, 1));
        assert_eq!(stats.covariance()[(0, 0)], 0.0);
    }

    #[test]
    fn test_insufficient_observations() {
        let two_rows = PriceSeries::from_rows(
            vec!["A".into()],
            dates(2),
            vec![vec![1.0], vec![2.0]],
        )
        .unwrap();
        assert!(matches!(
            estimate(&two_rows),
            Err(PortfolioError::InsufficientData { .. })
        ));

        let no_overlap = PriceSeries::new(
            vec!["A".into(), "B".into()],
            dates(4),
            vec![
                vec![Some(1.0), None],
                vec![Some(2.0), None],
                vec![Some(3.0), Some(1.0)],
                vec![None, Some(2.0)],
            ],
        )
        .unwrap();
        let err = estimate(&no_overlap).unwrap_err();
        assert!(matches!(err, PortfolioError::InsufficientData { .. }));
    }
}
