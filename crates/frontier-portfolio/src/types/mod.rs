//! Domain types for allocation analytics.
//!
//! - [`PriceSeries`]: Date-indexed price table supplied by ingestion
//! - [`Statistics`]: Mean log-returns and annualized covariance
//! - [`Allocation`]: A weight vector
//! - [`PortfolioPoint`]: An allocation with its return, volatility and Sharpe ratio
//! - [`SolvedPortfolio`]: A solver output with its convergence flag
//! - [`EngineConfig`]: Configuration for estimation, sampling and solving

mod allocation;
mod config;
mod prices;
mod statistics;

pub use allocation::{Allocation, PortfolioPoint, SolvedPortfolio, WEIGHT_SUM_TOLERANCE};
pub use config::{
    EngineConfig, SolverSettings, DEFAULT_FRONTIER_POINT_COUNT, DEFAULT_SAMPLE_COUNT,
    DEFAULT_TRADING_DAYS_PER_YEAR,
};
pub use prices::PriceSeries;
pub use statistics::Statistics;
