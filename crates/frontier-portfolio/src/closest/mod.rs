//! Memoized closest-allocation lookups.
//!
//! Interactive callers ask for the allocation nearest a (volatility, return)
//! point on every pointer move, so solves are cached by
//! `(statistics id, desired volatility, desired return)`.

mod cache;

pub use cache::{AllocationCache, CacheKey};

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use crate::error::PortfolioResult;
use crate::optimization::closest_allocation;
use crate::types::{EngineConfig, SolvedPortfolio, Statistics};

/// Closest-allocation solver with a shared result cache.
///
/// Safe to share across threads. Errors are never cached.
#[derive(Debug)]
pub struct ClosestAllocationFinder {
    config: EngineConfig,
    cache: AllocationCache,
    solves: AtomicUsize,
}

impl ClosestAllocationFinder {
    /// Creates a finder with an empty cache.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            cache: AllocationCache::new(),
            solves: AtomicUsize::new(0),
        }
    }

    /// Returns the cached solve for this query, solving on a miss.
    ///
    /// Absent values are treated as zero, so `(None, None)` and
    /// `(Some(0.0), Some(0.0))` share one cache entry.
    ///
    /// # Errors
    ///
    /// See [`closest_allocation`].
    pub fn find_closest(
        &self,
        stats: &Statistics,
        desired_volatility: Option<f64>,
        desired_return: Option<f64>,
    ) -> PortfolioResult<SolvedPortfolio> {
        let key = CacheKey::new(stats.id(), desired_volatility, desired_return);
        if let Some(hit) = self.cache.get(&key) {
            debug!(?desired_volatility, ?desired_return, "closest allocation cache hit");
            return Ok(hit);
        }

        debug!(?desired_volatility, ?desired_return, "closest allocation cache miss");
        self.solves.fetch_add(1, Ordering::Relaxed);
        let solved = closest_allocation(
            stats,
            Some(desired_volatility.unwrap_or(0.0)),
            Some(desired_return.unwrap_or(0.0)),
            &self.config,
        )?;
        self.cache.insert(key, solved.clone());
        Ok(solved)
    }

    /// Number of solves performed (cache misses that reached the solver).
    ///
    /// Lookups are not coalesced: threads that miss on the same key at the
    /// same time each run the solver and each count here, and the last
    /// insert wins. Solves are deterministic, so every caller still sees the
    /// same result.
    #[must_use]
    pub fn solve_count(&self) -> usize {
        self.solves.load(Ordering::Relaxed)
    }

    /// The underlying cache.
    #[must_use]
    pub fn cache(&self) -> &AllocationCache {
        &self.cache
    }

    /// The configuration used for solves.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl Default for ClosestAllocationFinder {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}
