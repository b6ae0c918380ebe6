//! Log-return construction.

use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde::Serialize;

use crate::error::{PortfolioError, PortfolioResult};
use crate::types::PriceSeries;

/// Period log-returns `ln(p[t] / p[t-1])`, one row fewer than the prices.
///
/// Entries that are not finite (a zero, negative or missing price on either
/// side) are stored as `NaN` and treated as missing downstream.
#[derive(Debug, Clone, Serialize)]
pub struct LogReturnMatrix {
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    values: DMatrix<f64>,
}

impl LogReturnMatrix {
    /// Asset names, in column order.
    #[must_use]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// End date of each period.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of periods.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.nrows()
    }

    /// Returns true if there are no periods.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.nrows() == 0
    }

    /// Log-return for (period, asset), `None` if missing.
    #[must_use]
    pub fn get(&self, period: usize, asset: usize) -> Option<f64> {
        self.values.get((period, asset)).copied().filter(|v| !v.is_nan())
    }

    /// Valid observations of one asset.
    pub fn valid_column(&self, asset: usize) -> impl Iterator<Item = f64> + '_ {
        (0..self.values.nrows())
            .map(move |t| self.values[(t, asset)])
            .filter(|v| !v.is_nan())
    }

    pub(crate) fn values(&self) -> &DMatrix<f64> {
        &self.values
    }
}

/// Computes period log-returns from a price series.
///
/// # Errors
///
/// Returns `InsufficientData` when the series has fewer than two rows or no
/// assets.
pub fn log_returns(prices: &PriceSeries) -> PortfolioResult<LogReturnMatrix> {
    if prices.asset_count() == 0 {
        return Err(PortfolioError::insufficient_data(
            "price series has no assets",
        ));
    }
    if prices.len() < 2 {
        return Err(PortfolioError::insufficient_data(format!(
            "need at least 2 price rows, got {}",
            prices.len()
        )));
    }

    let p = prices.matrix();
    let values = DMatrix::from_fn(p.nrows() - 1, p.ncols(), |t, a| {
        let r = (p[(t + 1, a)] / p[(t, a)]).ln();
        if r.is_finite() {
            r
        } else {
            f64::NAN
        }
    });

    Ok(LogReturnMatrix {
        assets: prices.assets().to_vec(),
        dates: prices.dates()[1..].to_vec(),
        values,
    })
}
