//! Memoization cache for closest-allocation solves.

use dashmap::DashMap;
use uuid::Uuid;

use crate::types::SolvedPortfolio;

/// Canonical cache key: statistics generation plus the desired point.
///
/// Absent values are stored as `0.0` and `-0.0` as `0.0`, so every query
/// that solves the same problem maps to the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    statistics_id: Uuid,
    volatility_bits: u64,
    return_bits: u64,
}

impl CacheKey {
    /// Builds the key for a query.
    #[must_use]
    pub fn new(
        statistics_id: Uuid,
        desired_volatility: Option<f64>,
        desired_return: Option<f64>,
    ) -> Self {
        Self {
            statistics_id,
            volatility_bits: canonical_bits(desired_volatility),
            return_bits: canonical_bits(desired_return),
        }
    }

    /// Generation id of the statistics the key belongs to.
    #[must_use]
    pub fn statistics_id(&self) -> Uuid {
        self.statistics_id
    }
}

fn canonical_bits(value: Option<f64>) -> u64 {
    let v = value.unwrap_or(0.0);
    if v == 0.0 {
        0.0_f64.to_bits()
    } else {
        v.to_bits()
    }
}

/// Thread-safe, eviction-free cache of solved closest allocations.
///
/// Entries never go stale: statistics are immutable, and new statistics get a
/// new id. On concurrent inserts for one key the last write wins.
#[derive(Debug, Default)]
pub struct AllocationCache {
    entries: DashMap<CacheKey, SolvedPortfolio>,
}

impl AllocationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a solved allocation.
    #[must_use]
    pub fn get(&self, key: &CacheKey) -> Option<SolvedPortfolio> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    /// Stores a solved allocation.
    pub fn insert(&self, key: CacheKey, solved: SolvedPortfolio) {
        self.entries.insert(key, solved);
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry belonging to one statistics generation.
    pub fn evict_statistics(&self, statistics_id: Uuid) {
        self.entries
            .retain(|key, _| key.statistics_id != statistics_id);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Allocation, PortfolioPoint};

    fn solved(sharpe: f64) -> SolvedPortfolio {
        SolvedPortfolio {
            point: PortfolioPoint {
                allocation: Allocation::uniform(2).unwrap(),
                expected_return: sharpe * 0.1,
                volatility: 0.1,
                sharpe,
            },
            objective_value: 0.0,
            constraint_violation: 0.0,
            converged: true,
            retried: false,
        }
    }

    #[test]
    fn test_key_canonicalization() {
        let id = Uuid::new_v4();
        assert_eq!(CacheKey::new(id, None, None), CacheKey::new(id, Some(0.0), Some(0.0)));
        assert_eq!(
            CacheKey::new(id, Some(-0.0), None),
            CacheKey::new(id, Some(0.0), None)
        );
        assert_ne!(
            CacheKey::new(id, Some(0.1), None),
            CacheKey::new(id, None, Some(0.1))
        );
        assert_ne!(
            CacheKey::new(id, Some(0.1), None),
            CacheKey::new(Uuid::new_v4(), Some(0.1), None)
        );
    }

    #[test]
    fn test_insert_get() {
        let cache = AllocationCache::new();
        let key = CacheKey::new(Uuid::new_v4(), Some(0.2), Some(0.1));
        assert!(cache.get(&key).is_none());

        cache.insert(key, solved(1.0));
        assert_eq!(cache.get(&key), Some(solved(1.0)));
        assert_eq!(cache.len(), 1);

        // last write wins
        cache.insert(key, solved(2.0));
        assert_eq!(cache.get(&key).map(|s| s.point.sharpe), Some(2.0));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_evict_and_clear() {
        let cache = AllocationCache::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cache.insert(CacheKey::new(a, Some(0.1), None), solved(1.0));
        cache.insert(CacheKey::new(a, Some(0.2), None), solved(1.0));
        cache.insert(CacheKey::new(b, Some(0.1), None), solved(1.0));

        cache.evict_statistics(a);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&CacheKey::new(b, Some(0.1), None)).map(|s| s.converged), Some(true));

        cache.clear();
        assert!(cache.is_empty());
    }
}
