//! Efficient frontier construction.
//!
//! A frontier is built by solving the minimum-volatility problem at each
//! value of an ascending grid of target returns. Every grid value produces
//! exactly one point, in grid order, whether or not its solve converged.

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{PortfolioError, PortfolioResult};
use crate::optimization::min_volatility_for_return;
use crate::parallel::maybe_parallel_map;
use crate::sampling::SampleSet;
use crate::types::{Allocation, EngineConfig, Statistics};

/// Ascending, equally spaced target returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnGrid {
    values: Vec<f64>,
}

impl ReturnGrid {
    /// `count` equally spaced values from `min` to `max` inclusive.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` if `count < 2`, either end is not finite, or
    /// `min > max`.
    pub fn linspace(min: f64, max: f64, count: usize) -> PortfolioResult<Self> {
        if count < 2 {
            return Err(PortfolioError::invalid_argument(format!(
                "frontier needs at least 2 points, got {count}"
            )));
        }
        if !(min.is_finite() && max.is_finite()) || min > max {
            return Err(PortfolioError::invalid_argument(format!(
                "invalid return range [{min}, {max}]"
            )));
        }

        let step = (max - min) / (count - 1) as f64;
        let mut values: Vec<f64> = (0..count).map(|i| min + step * i as f64).collect();
        values[count - 1] = max;
        Ok(Self { values })
    }

    /// Spans the expected returns observed in a sample set.
    pub fn from_samples(samples: &SampleSet, count: usize) -> PortfolioResult<Self> {
        let (min, max) = samples.return_range();
        Self::linspace(min, max, count)
    }

    /// The target returns, ascending.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of targets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always false: a grid holds at least two values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One minimum-volatility solve on the frontier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontierPoint {
    /// Requested expected return.
    pub target_return: f64,
    /// Best-effort minimum volatility.
    pub volatility: f64,
    /// Expected return of `allocation`, equal to the target when converged.
    pub realized_return: f64,
    /// Weights found by the solver.
    pub allocation: Allocation,
    /// Whether the solver converged (after its retry).
    pub converged: bool,
    /// Largest equality residual at the solution.
    pub constraint_violation: f64,
}

/// Frontier points in ascending target-return order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrontierCurve {
    statistics_id: Uuid,
    points: Vec<FrontierPoint>,
}

impl FrontierCurve {
    /// Generation id of the statistics the curve was built from.
    #[must_use]
    pub fn statistics_id(&self) -> Uuid {
        self.statistics_id
    }

    /// The points, ascending by target return.
    #[must_use]
    pub fn points(&self) -> &[FrontierPoint] {
        &self.points
    }

    /// `(volatility, target_return)` pairs for plotting.
    #[must_use]
    pub fn pairs(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .map(|p| (p.volatility, p.target_return))
            .collect()
    }

    /// Points whose solve did not converge.
    pub fn non_converged(&self) -> impl Iterator<Item = &FrontierPoint> {
        self.points.iter().filter(|p| !p.converged)
    }

    /// Returns true if every solve converged.
    #[must_use]
    pub fn all_converged(&self) -> bool {
        self.points.iter().all(|p| p.converged)
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the curve has no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Solves the minimum-volatility problem at every grid value.
///
/// Each solve starts from the uniform allocation, so the result does not
/// depend on whether points are solved in parallel.
///
/// # Errors
///
/// Propagates structural errors from the solves (bad bounds, invalid
/// targets). Non-convergence is flagged per point instead.
pub fn build_frontier(
    stats: &Statistics,
    grid: &ReturnGrid,
    config: &EngineConfig,
) -> PortfolioResult<FrontierCurve> {
    let points = maybe_parallel_map(grid.values(), config, |target| {
        min_volatility_for_return(stats, *target, config, None)
    })
    .into_iter()
    .collect::<PortfolioResult<Vec<_>>>()?;

    let curve = FrontierCurve {
        statistics_id: stats.id(),
        points,
    };

    let failed = curve.non_converged().count();
    if failed > 0 {
        warn!(
            failed,
            points = curve.len(),
            "frontier contains non-converged points"
        );
    }
    debug!(points = curve.len(), "built efficient frontier");
    Ok(curve)
}

/// Builds a frontier of `config.frontier_point_count` points spanning the
/// returns seen in `samples`.
pub fn build_frontier_from_samples(
    stats: &Statistics,
    samples: &SampleSet,
    config: &EngineConfig,
) -> PortfolioResult<FrontierCurve> {
    let grid = ReturnGrid::from_samples(samples, config.frontier_point_count)?;
    build_frontier(stats, &grid, config)
}
