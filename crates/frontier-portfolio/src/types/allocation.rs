//! Allocations and the points they map to in (volatility, return) space.

use serde::{Deserialize, Serialize};

use super::Statistics;
use crate::error::{PortfolioError, PortfolioResult};

/// Tolerance on `sum(weights) == 1` for caller-supplied allocations.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// A vector of asset weights.
///
/// Caller-supplied allocations are validated against their bounds and must
/// sum to one within [`WEIGHT_SUM_TOLERANCE`]. Solver outputs are stored as
/// found; their accuracy is described by the accompanying `converged` flag
/// and constraint violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    weights: Vec<f64>,
}

impl Allocation {
    /// Creates a long-only allocation (every weight in `[0, 1]`).
    pub fn new(weights: Vec<f64>) -> PortfolioResult<Self> {
        Self::with_bounds(weights, 0.0, 1.0)
    }

    /// Creates an allocation whose weights lie in `[lower, upper]`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the vector is empty, a weight is outside
    /// the bounds or non-finite, or the weights do not sum to one.
    pub fn with_bounds(weights: Vec<f64>, lower: f64, upper: f64) -> PortfolioResult<Self> {
        if weights.is_empty() {
            return Err(PortfolioError::invalid_argument("allocation has no weights"));
        }
        if let Some((i, w)) = weights
            .iter()
            .enumerate()
            .find(|(_, w)| !w.is_finite() || **w < lower || **w > upper)
        {
            return Err(PortfolioError::invalid_argument(format!(
                "weight {i} = {w} outside [{lower}, {upper}]"
            )));
        }
        let sum: f64 = weights.iter().sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(PortfolioError::invalid_argument(format!(
                "weights sum to {sum}, expected 1"
            )));
        }
        Ok(Self { weights })
    }

    /// Equal weight `1/n` on each of `n` assets.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for `n == 0`.
    pub fn uniform(n: usize) -> PortfolioResult<Self> {
        if n == 0 {
            return Err(PortfolioError::invalid_argument("allocation has no weights"));
        }
        Ok(Self {
            weights: vec![1.0 / n as f64; n],
        })
    }

    /// Wraps sampler or solver output without validation.
    pub(crate) fn from_weights(weights: Vec<f64>) -> Self {
        Self { weights }
    }

    /// The weights.
    #[must_use]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Number of weights.
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Returns true if there are no weights.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Sum of the weights.
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.weights.iter().sum()
    }

    /// Pairs each weight with its asset name.
    pub fn labeled<'a>(
        &'a self,
        statistics: &'a Statistics,
    ) -> impl Iterator<Item = (&'a str, f64)> + 'a {
        statistics
            .assets()
            .iter()
            .map(String::as_str)
            .zip(self.weights.iter().copied())
    }
}

/// An allocation evaluated against a set of statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioPoint {
    /// The weights evaluated.
    pub allocation: Allocation,
    /// Annualized expected return.
    pub expected_return: f64,
    /// Annualized volatility (always > 0 for a constructed point).
    pub volatility: f64,
    /// `expected_return / volatility`.
    pub sharpe: f64,
}

/// Output of one of the constrained solves.
///
/// `converged == false` means the solver ran out of iterations (after its
/// single retry); the point is still the best found.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolvedPortfolio {
    /// The best allocation found, evaluated.
    pub point: PortfolioPoint,
    /// Solver objective at the solution.
    pub objective_value: f64,
    /// Largest absolute equality residual at the solution.
    pub constraint_violation: f64,
    /// Whether the solver reported convergence.
    pub converged: bool,
    /// Whether the jittered retry was needed.
    pub retried: bool,
}
