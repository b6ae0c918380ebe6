//! Return/risk statistics for an asset universe.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use uuid::Uuid;

use crate::error::{PortfolioError, PortfolioResult};

/// Mean log-returns and annualized covariance for a set of assets.
///
/// Every instance carries a generation id. Clones share it, so it identifies
/// one estimation result for cache keys; building a new `Statistics` always
/// yields a new id. The pair is never mutated after construction.
#[derive(Debug, Clone, Serialize)]
pub struct Statistics {
    id: Uuid,
    assets: Vec<String>,
    mean_returns: DVector<f64>,
    covariance: DMatrix<f64>,
    trading_days_per_year: f64,
}

impl Statistics {
    /// Creates statistics from per-period mean returns and an annualized
    /// covariance matrix.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientData` for an empty universe and
    /// `InvalidArgument` for mismatched dimensions, non-finite entries or a
    /// non-positive annualization factor.
    pub fn new(
        assets: Vec<String>,
        mean_returns: DVector<f64>,
        covariance: DMatrix<f64>,
        trading_days_per_year: f64,
    ) -> PortfolioResult<Self> {
        let n = assets.len();
        if n == 0 {
            return Err(PortfolioError::insufficient_data(
                "statistics need at least one asset",
            ));
        }
        if mean_returns.len() != n || covariance.nrows() != n || covariance.ncols() != n {
            return Err(PortfolioError::invalid_argument(format!(
                "{n} assets but {} mean returns and a ({}x{}) covariance",
                mean_returns.len(),
                covariance.nrows(),
                covariance.ncols()
            )));
        }
        if mean_returns.iter().chain(covariance.iter()).any(|v| !v.is_finite()) {
            return Err(PortfolioError::invalid_argument(
                "statistics contain non-finite values",
            ));
        }
        if !(trading_days_per_year.is_finite() && trading_days_per_year > 0.0) {
            return Err(PortfolioError::invalid_argument(format!(
                "trading days per year must be positive, got {trading_days_per_year}"
            )));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            assets,
            mean_returns,
            covariance,
            trading_days_per_year,
        })
    }

    /// Generation id of this estimation result.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Asset names, in weight order.
    #[must_use]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Number of assets.
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Per-period mean log-return of each asset.
    #[must_use]
    pub fn mean_returns(&self) -> &DVector<f64> {
        &self.mean_returns
    }

    /// Annualized covariance matrix.
    #[must_use]
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    /// Annualization factor these statistics were built with.
    #[must_use]
    pub fn trading_days_per_year(&self) -> f64 {
        self.trading_days_per_year
    }

    /// Annualized mean return of each asset.
    #[must_use]
    pub fn annualized_returns(&self) -> DVector<f64> {
        &self.mean_returns * self.trading_days_per_year
    }

    /// Annualized volatility of each asset.
    #[must_use]
    pub fn asset_volatilities(&self) -> DVector<f64> {
        self.covariance.diagonal().map(|v| v.max(0.0).sqrt())
    }

    /// Correlation matrix implied by the covariance.
    ///
    /// Pairs involving a zero-variance asset have zero correlation; the
    /// diagonal is always one.
    #[must_use]
    pub fn correlation(&self) -> DMatrix<f64> {
        let sigma = self.asset_volatilities();
        let n = self.asset_count();
        DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                1.0
            } else {
                let denom = sigma[i] * sigma[j];
                if denom > 0.0 {
                    (self.covariance[(i, j)] / denom).clamp(-1.0, 1.0)
                } else {
                    0.0
                }
            }
        })
    }
}
