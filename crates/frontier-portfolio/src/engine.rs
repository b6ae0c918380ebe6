//! High-level allocation engine.
//!
//! [`AllocationEngine`] bundles an [`EngineConfig`] with a
//! [`ClosestAllocationFinder`] so a presentation layer can drive the whole
//! pipeline through one value:
//!
//! ```text
//! PriceSeries ──estimate──▶ Statistics ──sample──▶ SampleSet
//!                               │                     │
//!                               ├──max_sharpe──▶ SolvedPortfolio
//!                               ├──frontier◀──────────┘
//!                               └──find_closest──▶ SolvedPortfolio (cached)
//! ```
//!
//! Every step is a pure function of its inputs; the only shared state is the
//! closest-allocation cache.

use serde::Serialize;
use tracing::info;

use crate::closest::ClosestAllocationFinder;
use crate::error::PortfolioResult;
use crate::estimation::estimate_annualized;
use crate::frontier::{build_frontier, build_frontier_from_samples, FrontierCurve, ReturnGrid};
use crate::optimization;
use crate::sampling::{sample_with_config, SampleSet};
use crate::types::{EngineConfig, PriceSeries, SolvedPortfolio, Statistics};

/// Everything derived from one price history.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    /// Estimated statistics.
    pub statistics: Statistics,
    /// Monte Carlo allocations.
    pub samples: SampleSet,
    /// Solved maximum Sharpe allocation.
    pub max_sharpe: SolvedPortfolio,
    /// Efficient frontier spanning the sampled returns.
    pub frontier: FrontierCurve,
}

/// Configured entry point to estimation, sampling and optimization.
#[derive(Debug)]
pub struct AllocationEngine {
    finder: ClosestAllocationFinder,
}

impl AllocationEngine {
    /// Creates an engine.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if the configuration does not validate.
    pub fn new(config: EngineConfig) -> PortfolioResult<Self> {
        config.validate()?;
        Ok(Self {
            finder: ClosestAllocationFinder::new(config),
        })
    }

    /// The engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        self.finder.config()
    }

    /// The memoizing closest-allocation finder.
    #[must_use]
    pub fn finder(&self) -> &ClosestAllocationFinder {
        &self.finder
    }

    /// Estimates statistics with the configured annualization.
    pub fn estimate(&self, prices: &PriceSeries) -> PortfolioResult<Statistics> {
        estimate_annualized(prices, self.config().trading_days_per_year)
    }

    /// Draws the configured number of Monte Carlo allocations.
    pub fn sample(&self, stats: &Statistics) -> PortfolioResult<SampleSet> {
        sample_with_config(stats, self.config())
    }

    /// Solves for the maximum Sharpe allocation.
    pub fn max_sharpe(&self, stats: &Statistics) -> PortfolioResult<SolvedPortfolio> {
        optimization::max_sharpe(stats, self.config())
    }

    /// Builds the frontier across the returns seen in `samples`.
    pub fn frontier(&self, stats: &Statistics, samples: &SampleSet) -> PortfolioResult<FrontierCurve> {
        build_frontier_from_samples(stats, samples, self.config())
    }

    /// Builds the frontier across a caller-supplied return range.
    pub fn frontier_between(
        &self,
        stats: &Statistics,
        min_return: f64,
        max_return: f64,
    ) -> PortfolioResult<FrontierCurve> {
        let grid = ReturnGrid::linspace(min_return, max_return, self.config().frontier_point_count)?;
        build_frontier(stats, &grid, self.config())
    }

    /// Cached closest-allocation lookup.
    pub fn find_closest(
        &self,
        stats: &Statistics,
        desired_volatility: Option<f64>,
        desired_return: Option<f64>,
    ) -> PortfolioResult<SolvedPortfolio> {
        self.finder
            .find_closest(stats, desired_volatility, desired_return)
    }

    /// Runs estimation, sampling, the max-Sharpe solve and the frontier.
    pub fn analyze(&self, prices: &PriceSeries) -> PortfolioResult<Analysis> {
        let statistics = self.estimate(prices)?;
        let samples = self.sample(&statistics)?;
        let max_sharpe = self.max_sharpe(&statistics)?;
        let frontier = self.frontier(&statistics, &samples)?;

        info!(
            assets = statistics.asset_count(),
            samples = samples.len(),
            frontier_points = frontier.len(),
            sharpe = max_sharpe.point.sharpe,
            "analysis complete"
        );

        Ok(Analysis {
            statistics,
            samples,
            max_sharpe,
            frontier,
        })
    }
}
