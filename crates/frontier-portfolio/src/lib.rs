//! # Frontier Portfolio
//!
//! Allocation estimation and optimization from price history.
//!
//! This crate turns a table of asset prices into return/risk statistics and
//! answers the allocation questions built on them: what random allocations
//! achieve, which allocation maximizes the Sharpe ratio, the minimum
//! volatility for each target return, and which allocation sits closest to a
//! chosen (volatility, return) point.
//!
//! ## Design Philosophy
//!
//! - **Pure functions**: Every derived value is computed from explicit inputs
//! - **Immutable statistics**: `Statistics` are replaced, never updated; each carries a generation id
//! - **Non-convergence is data**: Solver results carry a `converged` flag instead of failing
//! - **Config-driven parallelism**: Optional rayon support with threshold-based switching
//!
//! ## Features
//!
//! - **Estimation**: Log returns, mean returns and annualized pairwise-complete covariance
//! - **Metrics**: Expected return, volatility, Sharpe ratio
//! - **Sampling**: Seeded Monte Carlo allocations with max-Sharpe extraction
//! - **Optimization**: Max-Sharpe, minimum volatility at a target, closest allocation
//! - **Frontier**: Efficient frontier over a target-return grid
//! - **Memoization**: Cached closest-allocation lookups keyed by statistics generation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use frontier_portfolio::prelude::*;
//!
//! let engine = AllocationEngine::new(EngineConfig::default().with_seed(42))?;
//! let stats = engine.estimate(&prices)?;
//! let samples = engine.sample(&stats)?;
//! let best = engine.max_sharpe(&stats)?;
//! let frontier = engine.frontier(&stats, &samples)?;
//! let picked = engine.find_closest(&stats, Some(0.15), Some(0.08))?;
//! ```
//!
//! ## Module Overview
//!
//! - [`types`] - Price series, statistics, allocations and configuration
//! - [`estimation`] - Log returns and statistics
//! - [`metrics`] - Portfolio return, volatility and Sharpe ratio
//! - [`sampling`] - Monte Carlo allocation sampling
//! - [`optimization`] - The constrained portfolio solves
//! - [`frontier`] - Efficient frontier construction
//! - [`closest`] - Memoized closest-allocation finder
//! - [`engine`] - High-level facade
//!
//! ## Feature Flags
//!
//! - `parallel`: Enable rayon-based parallel sample evaluation and frontier solves

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod closest;
pub mod engine;
pub mod error;
pub mod estimation;
pub mod frontier;
pub mod metrics;
pub mod optimization;
mod parallel;
pub mod sampling;
pub mod types;

pub use error::{PortfolioError, PortfolioResult};

pub use types::{
    Allocation, EngineConfig, PortfolioPoint, PriceSeries, SolvedPortfolio, SolverSettings,
    Statistics, DEFAULT_FRONTIER_POINT_COUNT, DEFAULT_SAMPLE_COUNT, DEFAULT_TRADING_DAYS_PER_YEAR,
    WEIGHT_SUM_TOLERANCE,
};

pub use closest::{AllocationCache, CacheKey, ClosestAllocationFinder};
pub use engine::{AllocationEngine, Analysis};
pub use estimation::{
    estimate, estimate_annualized, estimate_from_returns, log_returns, LogReturnMatrix,
};
pub use frontier::{
    build_frontier, build_frontier_from_samples, FrontierCurve, FrontierPoint, ReturnGrid,
};
pub use metrics::{evaluate, expected_return, sharpe, volatility};
pub use optimization::{closest_allocation, max_sharpe, min_volatility_for_return};
pub use sampling::{sample, sample_seeded, sample_with_config, sample_with_rng, SampleSet};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::closest::ClosestAllocationFinder;
    pub use crate::engine::{AllocationEngine, Analysis};
    pub use crate::error::{PortfolioError, PortfolioResult};
    pub use crate::estimation::{estimate, estimate_annualized, log_returns};
    pub use crate::frontier::{build_frontier, FrontierCurve, FrontierPoint, ReturnGrid};
    pub use crate::metrics::{evaluate, expected_return, sharpe, volatility};
    pub use crate::optimization::{closest_allocation, max_sharpe, min_volatility_for_return};
    pub use crate::sampling::{sample, sample_seeded, SampleSet};
    pub use crate::types::{
        Allocation, EngineConfig, PortfolioPoint, PriceSeries, SolvedPortfolio, SolverSettings,
        Statistics,
    };
}
