//! Configuration for the allocation engine.

use frontier_math::optimization::OptimizationConfig;
use serde::{Deserialize, Serialize};

use crate::error::{PortfolioError, PortfolioResult};

/// Trading days used to annualize per-period statistics.
pub const DEFAULT_TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Number of Monte Carlo allocations drawn by default.
pub const DEFAULT_SAMPLE_COUNT: usize = 15_000;

/// Number of target returns on the efficient frontier by default.
pub const DEFAULT_FRONTIER_POINT_COUNT: usize = 50;

/// Settings for the constrained solver and its retry.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Relative objective change that ends a subproblem.
    pub tolerance: f64,
    /// Largest accepted equality residual.
    pub feasibility_tolerance: f64,
    /// Iteration cap per subproblem.
    pub max_iterations: u32,
    /// Cap on multiplier updates.
    pub max_outer_iterations: u32,
    /// Perturbation added to the initial guess for the single retry.
    pub retry_jitter: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        let base = OptimizationConfig::default();
        Self {
            tolerance: base.tolerance,
            feasibility_tolerance: base.feasibility_tolerance,
            max_iterations: base.max_iterations,
            max_outer_iterations: base.max_outer_iterations,
            retry_jitter: 1e-3,
        }
    }
}

impl SolverSettings {
    /// Translates to the numerical layer's configuration.
    #[must_use]
    pub fn optimization_config(&self) -> OptimizationConfig {
        OptimizationConfig {
            tolerance: self.tolerance,
            feasibility_tolerance: self.feasibility_tolerance,
            max_iterations: self.max_iterations,
            max_outer_iterations: self.max_outer_iterations,
            ..OptimizationConfig::default()
        }
    }
}

/// Configuration for estimation, sampling and optimization.
///
/// All fields have defaults, so a partial JSON/TOML document deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Annualization factor for mean returns and covariance.
    pub trading_days_per_year: f64,

    /// Monte Carlo allocations to draw.
    pub sample_count: usize,

    /// Target returns on the efficient frontier.
    pub frontier_point_count: usize,

    /// Lower bound on every weight in constrained solves.
    /// A negative value allows short positions.
    pub weight_lower_bound: f64,

    /// Upper bound on every weight in constrained solves.
    pub weight_upper_bound: f64,

    /// Seed for the Monte Carlo sampler; `None` draws from entropy.
    pub seed: Option<u64>,

    /// Constrained solver settings.
    pub solver: SolverSettings,

    /// Enable parallel processing (requires 'parallel' feature).
    pub parallel: bool,

    /// Minimum item count to trigger parallel processing.
    /// Below this threshold, sequential is faster due to thread overhead.
    pub parallel_threshold: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trading_days_per_year: DEFAULT_TRADING_DAYS_PER_YEAR,
            sample_count: DEFAULT_SAMPLE_COUNT,
            frontier_point_count: DEFAULT_FRONTIER_POINT_COUNT,
            weight_lower_bound: 0.0,
            weight_upper_bound: 1.0,
            seed: None,
            solver: SolverSettings::default(),
            parallel: true,
            parallel_threshold: 8,
        }
    }
}

impl EngineConfig {
    /// Creates a new config with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a config that always uses sequential processing.
    #[must_use]
    pub fn sequential() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Sets the annualization factor.
    #[must_use]
    pub fn with_trading_days_per_year(mut self, days: f64) -> Self {
        self.trading_days_per_year = days;
        self
    }

    /// Sets the Monte Carlo sample count.
    #[must_use]
    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Sets the number of frontier points.
    #[must_use]
    pub fn with_frontier_point_count(mut self, count: usize) -> Self {
        self.frontier_point_count = count;
        self
    }

    /// Sets the per-weight bounds.
    #[must_use]
    pub fn with_weight_bounds(mut self, lower: f64, upper: f64) -> Self {
        self.weight_lower_bound = lower;
        self.weight_upper_bound = upper;
        self
    }

    /// Sets the sampler seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the solver settings.
    #[must_use]
    pub fn with_solver(mut self, solver: SolverSettings) -> Self {
        self.solver = solver;
        self
    }

    /// Sets whether to use parallel processing.
    #[must_use]
    pub fn with_parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    /// Sets the threshold for parallel processing.
    #[must_use]
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.parallel_threshold = threshold;
        self
    }

    /// Returns true if parallel processing should be used for the given count.
    #[must_use]
    pub fn should_parallelize(&self, count: usize) -> bool {
        cfg!(feature = "parallel") && self.parallel && count >= self.parallel_threshold
    }

    /// Checks every field for a usable value.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` describing the first bad field.
    pub fn validate(&self) -> PortfolioResult<()> {
        if !(self.trading_days_per_year.is_finite() && self.trading_days_per_year > 0.0) {
            return Err(PortfolioError::invalid_argument(format!(
                "trading_days_per_year must be positive, got {}",
                self.trading_days_per_year
            )));
        }
        if self.sample_count == 0 {
            return Err(PortfolioError::invalid_argument("sample_count must be positive"));
        }
        if self.frontier_point_count < 2 {
            return Err(PortfolioError::invalid_argument(format!(
                "frontier_point_count must be at least 2, got {}",
                self.frontier_point_count
            )));
        }
        if !(self.weight_lower_bound.is_finite() && self.weight_upper_bound.is_finite())
            || self.weight_lower_bound > self.weight_upper_bound
        {
            return Err(PortfolioError::invalid_argument(format!(
                "invalid weight bounds [{}, {}]",
                self.weight_lower_bound, self.weight_upper_bound
            )));
        }
        let s = &self.solver;
        if !(s.tolerance > 0.0 && s.feasibility_tolerance > 0.0 && s.retry_jitter >= 0.0)
            || s.max_iterations == 0
            || s.max_outer_iterations == 0
        {
            return Err(PortfolioError::invalid_argument(
                "solver tolerances and iteration limits must be positive",
            ));
        }
        Ok(())
    }

    /// Per-weight bounds for `n` assets.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` when no weight vector within the bounds can
    /// sum to one.
    pub fn weight_bounds(&self, n: usize) -> PortfolioResult<Vec<(f64, f64)>> {
        let (lo, hi) = (self.weight_lower_bound, self.weight_upper_bound);
        let count = n as f64;
        if n == 0 || lo * count > 1.0 || hi * count < 1.0 {
            return Err(PortfolioError::invalid_argument(format!(
                "weights in [{lo}, {hi}] cannot sum to 1 over {n} assets"
            )));
        }
        Ok(vec![(lo, hi); n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let config = EngineConfig::default();
        assert_eq!(config.trading_days_per_year, 252.0);
        assert_eq!(config.sample_count, 15_000);
        assert_eq!(config.frontier_point_count, 50);
        assert_eq!(config.weight_lower_bound, 0.0);
        assert_eq!(config.weight_upper_bound, 1.0);
        assert!(config.seed.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sequential() {
        let config = EngineConfig::sequential();
        assert!(!config.parallel);
        assert!(!config.should_parallelize(1_000));
    }

    #[test]
    fn test_builder_pattern() {
        let config = EngineConfig::new()
            .with_trading_days_per_year(365.0)
            .with_sample_count(500)
            .with_frontier_point_count(10)
            .with_weight_bounds(-0.5, 1.5)
            .with_seed(7)
            .with_threshold(4);

        assert_eq!(config.trading_days_per_year, 365.0);
        assert_eq!(config.sample_count, 500);
        assert_eq!(config.frontier_point_count, 10);
        assert_eq!(config.weight_lower_bound, -0.5);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.parallel_threshold, 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(EngineConfig::new().with_sample_count(0).validate().is_err());
        assert!(EngineConfig::new().with_frontier_point_count(1).validate().is_err());
        assert!(EngineConfig::new().with_trading_days_per_year(0.0).validate().is_err());
        assert!(EngineConfig::new().with_weight_bounds(1.0, 0.0).validate().is_err());

        let solver = SolverSettings {
            max_iterations: 0,
            ..SolverSettings::default()
        };
        assert!(EngineConfig::new().with_solver(solver).validate().is_err());
    }

    #[test]
    fn test_weight_bounds() {
        let config = EngineConfig::default();
        assert_eq!(config.weight_bounds(3).unwrap(), vec![(0.0, 1.0); 3]);
        assert!(config.weight_bounds(0).is_err());

        // Upper bound of 0.2 cannot reach a total of 1 with three assets.
        let tight = EngineConfig::new().with_weight_bounds(0.0, 0.2);
        assert!(tight.weight_bounds(3).is_err());
        assert!(tight.weight_bounds(5).is_ok());
    }

    #[test]
    fn test_should_parallelize() {
        let config = EngineConfig::new().with_threshold(10);

        #[cfg(feature = "parallel")]
        {
            assert!(!config.should_parallelize(5));
            assert!(config.should_parallelize(10));
        }

        #[cfg(not(feature = "parallel"))]
        {
            assert!(!config.should_parallelize(5));
            assert!(!config.should_parallelize(10));
        }
    }

    #[test]
    fn test_serde() {
        let config = EngineConfig::new().with_seed(42).with_sample_count(1_000);

        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);

        let partial: EngineConfig = serde_json::from_str(r#"{"sample_count": 250}"#).unwrap();
        assert_eq!(partial.sample_count, 250);
        assert_eq!(partial.trading_days_per_year, 252.0);
        assert_eq!(partial.solver, SolverSettings::default());
    }
}
