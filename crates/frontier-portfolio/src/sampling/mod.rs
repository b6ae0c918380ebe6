//! Monte Carlo sampling of long-only allocations.
//!
//! Each draw takes `N` independent `U[0, 1)` values and divides them by their
//! sum. The result lies on the unit simplex but is not uniform over it; the
//! random-weights-then-normalize scheme is kept so seeded runs reproduce.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::debug;

use crate::error::{PortfolioError, PortfolioResult};
use crate::metrics::evaluate;
use crate::parallel::maybe_parallel_map;
use crate::types::{Allocation, EngineConfig, PortfolioPoint, Statistics};

/// Evaluated random allocations plus the index of the best Sharpe ratio.
#[derive(Debug, Clone, Serialize)]
pub struct SampleSet {
    points: Vec<PortfolioPoint>,
    max_sharpe_index: usize,
}

impl SampleSet {
    fn from_points(points: Vec<PortfolioPoint>) -> PortfolioResult<Self> {
        if points.is_empty() {
            return Err(PortfolioError::invalid_argument("sample set is empty"));
        }
        // Strict comparison keeps the first index on ties.
        let mut best = 0;
        for (i, p) in points.iter().enumerate().skip(1) {
            if p.sharpe > points[best].sharpe {
                best = i;
            }
        }
        Ok(Self {
            points,
            max_sharpe_index: best,
        })
    }

    /// All sampled points, in draw order.
    #[must_use]
    pub fn points(&self) -> &[PortfolioPoint] {
        &self.points
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false: a sample set holds at least one point.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the first point with the highest Sharpe ratio.
    #[must_use]
    pub fn max_sharpe_index(&self) -> usize {
        self.max_sharpe_index
    }

    /// The first point with the highest Sharpe ratio.
    #[must_use]
    pub fn max_sharpe(&self) -> &PortfolioPoint {
        &self.points[self.max_sharpe_index]
    }

    /// The first point with the lowest volatility.
    #[must_use]
    pub fn min_volatility(&self) -> &PortfolioPoint {
        let mut best = &self.points[0];
        for p in &self.points[1..] {
            if p.volatility < best.volatility {
                best = p;
            }
        }
        best
    }

    /// `(min, max)` expected return across the samples.
    #[must_use]
    pub fn return_range(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.expected_return), hi.max(p.expected_return))
            })
    }

    /// `(min, max)` volatility across the samples.
    #[must_use]
    pub fn volatility_range(&self) -> (f64, f64) {
        self.points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p.volatility), hi.max(p.volatility))
            })
    }
}

/// Draws one weight vector on the simplex.
fn draw_weights<R: Rng + ?Sized>(rng: &mut R, n: usize) -> Vec<f64> {
    loop {
        let raw: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
        let sum: f64 = raw.iter().sum();
        // All-zero draws are possible in principle; redraw rather than divide by zero.
        if sum > 0.0 {
            return raw.into_iter().map(|w| w / sum).collect();
        }
    }
}

/// Samples `count` allocations using entropy-seeded randomness.
///
/// # Errors
///
/// Returns `InvalidArgument` for `count == 0` and `DegenerateRisk` if a
/// sampled allocation has zero volatility.
pub fn sample(stats: &Statistics, count: usize) -> PortfolioResult<SampleSet> {
    let mut rng = StdRng::from_entropy();
    sample_with_rng(stats, count, &mut rng, &EngineConfig::sequential())
}

/// Samples `count` allocations reproducibly from `seed`.
pub fn sample_seeded(stats: &Statistics, count: usize, seed: u64) -> PortfolioResult<SampleSet> {
    let mut rng = StdRng::seed_from_u64(seed);
    sample_with_rng(stats, count, &mut rng, &EngineConfig::sequential())
}

/// Samples `config.sample_count` allocations, seeded from `config.seed`
/// when present.
pub fn sample_with_config(stats: &Statistics, config: &EngineConfig) -> PortfolioResult<SampleSet> {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    sample_with_rng(stats, config.sample_count, &mut rng, config)
}

/// Samples `count` allocations from the given generator.
///
/// Weights are drawn sequentially so the output depends only on the
/// generator state; evaluation may run in parallel.
pub fn sample_with_rng<R: Rng + ?Sized>(
    stats: &Statistics,
    count: usize,
    rng: &mut R,
    config: &EngineConfig,
) -> PortfolioResult<SampleSet> {
    if count == 0 {
        return Err(PortfolioError::invalid_argument(
            "sample count must be positive",
        ));
    }

    let n = stats.asset_count();
    let allocations: Vec<Allocation> = (0..count)
        .map(|_| Allocation::from_weights(draw_weights(rng, n)))
        .collect();

    let points = maybe_parallel_map(&allocations, config, |a| evaluate(stats, a))
        .into_iter()
        .collect::<PortfolioResult<Vec<_>>>()?;

    let set = SampleSet::from_points(points)?;
    debug!(
        samples = set.len(),
        max_sharpe = set.max_sharpe().sharpe,
        "sampled allocations"
    );
    Ok(set)
}
