//! Price history input.

use std::collections::HashSet;

use chrono::NaiveDate;
use nalgebra::DMatrix;
use serde::Serialize;

use crate::error::{PortfolioError, PortfolioResult};

/// A date-indexed table of per-asset prices.
///
/// Rows are observation dates in strictly increasing order, columns are
/// uniquely named assets. Missing cells are stored as `NaN` and surface as
/// `None` through [`PriceSeries::price`].
///
/// A series is immutable once built; [`select`](Self::select) and
/// [`between`](Self::between) return new series.
#[derive(Debug, Clone, Serialize)]
pub struct PriceSeries {
    assets: Vec<String>,
    dates: Vec<NaiveDate>,
    prices: DMatrix<f64>,
}

impl PriceSeries {
    /// Builds a series from rows of optional prices.
    ///
    /// Non-finite values are treated as missing.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if asset names repeat, dates are not
    /// strictly increasing, or the table is not rectangular.
    pub fn new(
        assets: Vec<String>,
        dates: Vec<NaiveDate>,
        rows: Vec<Vec<Option<f64>>>,
    ) -> PortfolioResult<Self> {
        let mut seen = HashSet::with_capacity(assets.len());
        for asset in &assets {
            if !seen.insert(asset.as_str()) {
                return Err(PortfolioError::invalid_argument(format!(
                    "duplicate asset '{asset}'"
                )));
            }
        }

        if dates.len() != rows.len() {
            return Err(PortfolioError::invalid_argument(format!(
                "{} dates for {} price rows",
                dates.len(),
                rows.len()
            )));
        }

        if let Some(pair) = dates.windows(2).find(|pair| pair[0] >= pair[1]) {
            return Err(PortfolioError::invalid_argument(format!(
                "dates must be strictly increasing: {} followed by {}",
                pair[0], pair[1]
            )));
        }

        let n_assets = assets.len();
        let mut data = Vec::with_capacity(rows.len() * n_assets);
        for (t, row) in rows.iter().enumerate() {
            if row.len() != n_assets {
                return Err(PortfolioError::invalid_argument(format!(
                    "row {t} has {} prices, expected {n_assets}",
                    row.len()
                )));
            }
            data.extend(
                row.iter()
                    .map(|cell| cell.filter(|p| p.is_finite()).unwrap_or(f64::NAN)),
            );
        }

        Ok(Self {
            prices: DMatrix::from_row_slice(rows.len(), n_assets, &data),
            assets,
            dates,
        })
    }

    /// Builds a series from fully populated rows.
    pub fn from_rows(
        assets: Vec<String>,
        dates: Vec<NaiveDate>,
        rows: Vec<Vec<f64>>,
    ) -> PortfolioResult<Self> {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(Some).collect())
            .collect();
        Self::new(assets, dates, rows)
    }

    /// Asset names, in column order.
    #[must_use]
    pub fn assets(&self) -> &[String] {
        &self.assets
    }

    /// Observation dates, in row order.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Number of assets (columns).
    #[must_use]
    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    /// Number of observations (rows).
    #[must_use]
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if the series has no observations.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Price at (row, column), `None` if missing or out of range.
    #[must_use]
    pub fn price(&self, row: usize, column: usize) -> Option<f64> {
        self.prices.get((row, column)).copied().filter(|p| !p.is_nan())
    }

    /// Raw price matrix with `NaN` for missing cells.
    pub(crate) fn matrix(&self) -> &DMatrix<f64> {
        &self.prices
    }

    /// Column index of an asset.
    #[must_use]
    pub fn asset_index(&self, asset: &str) -> Option<usize> {
        self.assets.iter().position(|a| a == asset)
    }

    /// Restricts the series to the given assets, in the given order.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for an unknown or repeated asset.
    pub fn select<S: AsRef<str>>(&self, assets: &[S]) -> PortfolioResult<Self> {
        let mut columns = Vec::with_capacity(assets.len());
        let mut names = Vec::with_capacity(assets.len());
        for asset in assets {
            let asset = asset.as_ref();
            let index = self.asset_index(asset).ok_or_else(|| {
                PortfolioError::invalid_argument(format!("unknown asset '{asset}'"))
            })?;
            if columns.contains(&index) {
                return Err(PortfolioError::invalid_argument(format!(
                    "duplicate asset '{asset}'"
                )));
            }
            columns.push(index);
            names.push(asset.to_string());
        }

        Ok(Self {
            prices: self.prices.select_columns(&columns),
            assets: names,
            dates: self.dates.clone(),
        })
    }

    /// Restricts the series to observations in `[start, end]`.
    ///
    /// An empty window yields an empty series; the estimator rejects it.
    #[must_use]
    pub fn between(&self, start: NaiveDate, end: NaiveDate) -> Self {
        let rows: Vec<usize> = self
            .dates
            .iter()
            .enumerate()
            .filter(|(_, d)| **d >= start && **d <= end)
            .map(|(i, _)| i)
            .collect();

        Self {
            prices: self.prices.select_rows(&rows),
            assets: self.assets.clone(),
            dates: rows.iter().map(|&i| self.dates[i]).collect(),
        }
    }
}
