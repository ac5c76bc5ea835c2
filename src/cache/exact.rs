//! Exact-match cache keyed by content hash.

use super::config::{CacheConfig, Verbosity};
use super::stats::{AtomicStats, CacheStats};
use super::accepted_result;
use crate::fingerprint::ContentHash;
use crate::matching::{BestMatch, ExactMatch, MatchStrategy};
use crate::record::Record;
use crate::store::Store;
use crate::{Error, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Cache that hits only when the raw input hashes identically to a stored
/// record in the same partition.
pub struct ExactCache<T> {
    store: Arc<Store<T>>,
    config: CacheConfig,
    stats: Arc<AtomicStats>,
}

impl<T: Clone> ExactCache<T> {
    pub fn new(config: CacheConfig) -> Self {
        Self::with_store(Arc::new(Store::new()), config)
    }

    /// Build over an existing (possibly shared) store.
    pub fn with_store(store: Arc<Store<T>>, config: CacheConfig) -> Self {
        Self {
            store,
            config,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    /// Look up `raw_input` in `partition_key`.
    ///
    /// Returns a record with the query's hash, carrying the stored result on
    /// a hit or no result on a miss. Never writes to the store.
    pub fn call(
        &self,
        partition_key: &str,
        raw_input: &str,
        verbosity: Verbosity,
        threshold: f32,
    ) -> Result<Record<T>> {
        let candidates = self.store.snapshot_candidates(partition_key)?;
        let hash = ContentHash::of(raw_input);

        let best = if candidates.is_empty() {
            BestMatch::none()
        } else {
            ExactMatch.find_best(&candidates, &hash)?
        };
        let result = accepted_result(&candidates, &best, threshold)?;
        let hit = result.is_some();
        self.stats.record_lookup(hit);

        if verbosity >= Verbosity::Summary {
            info!(partition_key, hit, score = best.score, "exact cache lookup");
        }
        if verbosity >= Verbosity::Detailed {
            debug!(
                partition_key,
                candidates = candidates.len(),
                position = ?best.position,
                hash = %hash,
                "exact cache candidates"
            );
        }

        let record = Record::miss(partition_key, hash);
        Ok(match result {
            Some(result) => record.with_result(result),
            None => record,
        })
    }

    /// [`call`](Self::call) with the configured verbosity and threshold.
    pub fn lookup(&self, partition_key: &str, raw_input: &str) -> Result<Record<T>> {
        self.call(
            partition_key,
            raw_input,
            self.config.verbosity,
            self.config.min_similarity,
        )
    }

    /// Store a filled-in record. Miss tokens are rejected.
    pub fn insert(&self, record: Record<T>) -> Result<usize> {
        let position = self.store.append(record)?;
        self.stats.record_insert();
        Ok(position)
    }

    /// Return the cached result, or run `compute`, store its output and
    /// return it. `compute` is not called on a hit.
    pub fn get_or_compute<F, E>(
        &self,
        partition_key: &str,
        raw_input: &str,
        compute: F,
    ) -> std::result::Result<T, E>
    where
        F: FnOnce() -> std::result::Result<T, E>,
        E: From<Error>,
    {
        let mut record = self.lookup(partition_key, raw_input)?;
        if let Some(result) = record.result() {
            return Ok(result.clone());
        }
        let value = compute()?;
        record.set_result(value.clone());
        self.insert(record)?;
        Ok(value)
    }

    pub fn store(&self) -> &Arc<Store<T>> {
        &self.store
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }
}

impl<T: Clone> Default for ExactCache<T> {
    fn default() -> Self {
        Self::new(CacheConfig::exact())
    }
}

impl<T> Clone for ExactCache<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_then_hit() {
        let cache: ExactCache<String> = ExactCache::default();
        let mut record = cache.lookup("m1", "hello").unwrap();
        assert!(!record.is_valid());
        assert_eq!(record.content_hash(), &ContentHash::of("hello"));

        record.set_result("A".into());
        assert_eq!(cache.insert(record).unwrap(), 0);

        let hit = cache.lookup("m1", "hello").unwrap();
        assert_eq!(hit.result().map(String::as_str), Some("A"));
        assert!(hit.embedding().is_none());

        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.inserts), (1, 1, 1));
    }

    #[test]
    fn test_partitions_are_isolated() {
        let cache: ExactCache<u32> = ExactCache::default();
        cache
            .insert(Record::miss("m1", ContentHash::of("hello")).with_result(1))
            .unwrap();
        assert!(!cache.lookup("m2", "hello").unwrap().is_valid());
    }

    #[test]
    fn test_verbosity_does_not_change_outcome() {
        let cache: ExactCache<u32> = ExactCache::default();
        cache
            .insert(Record::miss("m1", ContentHash::of("q")).with_result(5))
            .unwrap();
        for level in 0..=2u8 {
            let record = cache.call("m1", "q", level.into(), 1.0).unwrap();
            assert_eq!(record.result(), Some(&5));
            let record = cache.call("m1", "other", level.into(), 1.0).unwrap();
            assert!(record.result().is_none());
        }
    }

    #[test]
    fn test_threshold_above_one_rejects_exact_hit() {
        let cache: ExactCache<u32> = ExactCache::default();
        cache
            .insert(Record::miss("m1", ContentHash::of("q")).with_result(5))
            .unwrap();
        let record = cache.call("m1", "q", Verbosity::Silent, 1.5).unwrap();
        assert!(!record.is_valid());
    }

    #[test]
    fn test_get_or_compute_runs_once() {
        let cache: ExactCache<String> = ExactCache::default();
        let mut calls = 0;
        for _ in 0..3 {
            let value: Result<String> = cache.get_or_compute("m1", "prompt", || {
                calls += 1;
                Ok("answer".to_string())
            });
            assert_eq!(value.unwrap(), "answer");
        }
        assert_eq!(calls, 1);
        assert_eq!(cache.store().len().unwrap(), 1);
    }

    #[test]
    fn test_get_or_compute_failure_stores_nothing() {
        let cache: ExactCache<String> = ExactCache::default();
        let value: Result<String> =
            cache.get_or_compute("m1", "prompt", || Err(Error::validation("upstream failed")));
        assert!(value.is_err());
        assert!(cache.store().is_empty().unwrap());
    }
}
