//! Fuzzy-match cache keyed by embedding similarity.

use super::accepted_result;
use super::config::{CacheConfig, Verbosity};
use super::stats::{AtomicStats, CacheStats};
use crate::embeddings::{magnitude, normalize_vector, Embedder, Embedding};
use crate::fingerprint::ContentHash;
use crate::matching::{BestMatch, CosineMatch, EmbeddingQuery, MatchStrategy};
use crate::record::Record;
use crate::store::Store;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use tracing::{debug, info};

/// Cache that hits when the input's embedding is close enough to a stored
/// record's embedding in the same partition.
///
/// The embedder is owned by the cache; every lookup embeds the raw input once.
pub struct FuzzyCache<T, E> {
    store: Arc<Store<T>>,
    embedder: Arc<E>,
    config: CacheConfig,
    stats: Arc<AtomicStats>,
}

impl<T: Clone, E: Embedder> FuzzyCache<T, E> {
    pub fn new(embedder: E, config: CacheConfig) -> Self {
        Self::with_store(Arc::new(Store::new()), Arc::new(embedder), config)
    }

    /// Build over an existing (possibly shared) store and embedder.
    pub fn with_store(store: Arc<Store<T>>, embedder: Arc<E>, config: CacheConfig) -> Self {
        Self {
            store,
            embedder,
            config,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    /// Look up `raw_input` in `partition_key`.
    ///
    /// The returned record carries the query's hash and normalized embedding,
    /// plus the stored result when the best candidate scores at least
    /// `threshold`. Embedder failures surface as
    /// [`Error::EmbeddingUnavailable`].
    pub fn call(
        &self,
        partition_key: &str,
        raw_input: &str,
        verbosity: Verbosity,
        threshold: f32,
    ) -> Result<Record<T>> {
        let candidates = self.store.snapshot_candidates(partition_key)?;
        let embedding = self.embed(raw_input)?;
        let query = EmbeddingQuery {
            hash: ContentHash::of(raw_input),
            embedding: normalize_vector(&embedding.vector),
        };

        let best = if candidates.is_empty() {
            BestMatch::none()
        } else {
            CosineMatch.find_best(&candidates, &query)?
        };
        let result = accepted_result(&candidates, &best, threshold)?;
        let hit = result.is_some();
        self.stats.record_lookup(hit);

        if verbosity >= Verbosity::Summary {
            info!(
                partition_key,
                hit,
                similarity = best.score,
                threshold,
                "fuzzy cache lookup"
            );
        }
        if verbosity >= Verbosity::Detailed {
            debug!(
                partition_key,
                candidates = candidates.len(),
                position = ?best.position,
                embedding_ms = embedding.elapsed.as_secs_f64() * 1000.0,
                dimensions = query.embedding.len(),
                "fuzzy cache candidates"
            );
        }

        let record = Record::miss(partition_key, query.hash).with_embedding(query.embedding);
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

    /// Return the cached result for a similar enough input, or run `compute`,
    /// store its output under this input's embedding and return it.
    pub fn get_or_compute<F, Er>(
        &self,
        partition_key: &str,
        raw_input: &str,
        compute: F,
    ) -> std::result::Result<T, Er>
    where
        F: FnOnce() -> std::result::Result<T, Er>,
        Er: From<Error>,
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

    fn embed(&self, raw_input: &str) -> Result<Embedding> {
        let embedding = self.embedder.embed(raw_input).map_err(|e| {
            if e.is_embedding_unavailable() {
                e
            } else {
                Error::embedding_unavailable_with_context(
                    "embedder failed",
                    ErrorContext::new()
                        .with_details(e.to_string())
                        .with_source("fuzzy_cache"),
                )
            }
        })?;
        if embedding.vector.is_empty() {
            return Err(Error::embedding_unavailable_with_context(
                "embedder returned an empty vector",
                ErrorContext::new().with_source("fuzzy_cache"),
            ));
        }
        let norm = magnitude(&embedding.vector);
        if norm == 0.0 || !norm.is_finite() {
            return Err(Error::embedding_unavailable_with_context(
                "embedder returned a vector that cannot be normalized",
                ErrorContext::new()
                    .with_details(format!("L2 norm {}", norm))
                    .with_source("fuzzy_cache"),
            ));
        }
        Ok(embedding)
    }

    pub fn store(&self) -> &Arc<Store<T>> {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<E> {
        &self.embedder
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn stats(&self) -> CacheStats {
        self.stats.to_stats()
    }
}

impl<T, E> Clone for FuzzyCache<T, E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            embedder: Arc::clone(&self.embedder),
            config: self.config.clone(),
            stats: Arc::clone(&self.stats),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::FnEmbedder;
    use std::time::Duration;

    fn table(text: &str) -> Result<Vec<f32>> {
        match text {
            "north" => Ok(vec![0.0, 2.0]),
            "north-ish" => Ok(vec![0.1, 1.0]),
            "east" => Ok(vec![3.0, 0.0]),
            "" => Ok(Vec::new()),
            "silence" => Ok(vec![0.0, 0.0]),
            _ => Err(Error::validation(format!("no vector for {:?}", text))),
        }
    }

    fn cache(threshold: f32) -> FuzzyCache<String, FnEmbedder<fn(&str) -> Result<Vec<f32>>>> {
        FuzzyCache::new(
            FnEmbedder::new(table as fn(&str) -> Result<Vec<f32>>),
            CacheConfig::default().with_min_similarity(threshold),
        )
    }

    #[test]
    fn test_miss_token_carries_normalized_embedding() {
        let cache = cache(0.95);
        let record = cache.lookup("m1", "north").unwrap();
        assert!(!record.is_valid());
        assert_eq!(record.embedding(), Some(&[0.0, 1.0][..]));
        assert_eq!(record.content_hash(), &ContentHash::of("north"));
    }

    #[test]
    fn test_similar_input_hits_with_query_identity() {
        let cache = cache(0.95);
        let mut record = cache.lookup("m1", "north").unwrap();
        record.set_result("N".into());
        cache.insert(record).unwrap();

        let hit = cache.lookup("m1", "north-ish").unwrap();
        assert_eq!(hit.result().map(String::as_str), Some("N"));
        assert_eq!(hit.content_hash(), &ContentHash::of("north-ish"));

        assert!(!cache.lookup("m1", "east").unwrap().is_valid());
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let cache = cache(0.95);
        cache
            .insert(
                Record::miss("m1", ContentHash::of("north"))
                    .with_embedding(vec![0.0, 1.0])
                    .with_result("N".to_string()),
            )
            .unwrap();
        let record = cache.call("m1", "north", Verbosity::Detailed, 1.0).unwrap();
        assert!(record.is_valid());
        let record = cache.call("m1", "east", Verbosity::Summary, 0.0).unwrap();
        assert!(record.is_valid());
        let record = cache.call("m1", "east", Verbosity::Silent, 0.001).unwrap();
        assert!(!record.is_valid());
    }

    #[test]
    fn test_embedder_failure_is_embedding_unavailable() {
        let cache = cache(0.95);
        let err = cache.lookup("m1", "unknown text").unwrap_err();
        assert!(err.is_embedding_unavailable());
        let err = cache.lookup("m1", "").unwrap_err();
        assert!(err.is_embedding_unavailable());
        let err = cache.lookup("m1", "silence").unwrap_err();
        assert!(err.is_embedding_unavailable());
    }

    #[test]
    fn test_insert_rejects_unnormalized_embedding() {
        let cache = cache(0.95);
        let err = cache
            .insert(
                Record::miss("m1", ContentHash::of("diagonal"))
                    .with_embedding(vec![2.0, 2.0])
                    .with_result("wrong".to_string()),
            )
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        // The query [3, 0] has cosine 0.707 with [2, 2]; nothing was stored.
        assert!(!cache.lookup("m1", "east").unwrap().is_valid());
        assert_eq!(cache.stats().inserts, 0);
    }

    #[test]
    fn test_exact_records_in_partition_are_ignored() {
        let cache = cache(-1.0);
        cache
            .insert(Record::miss("m1", ContentHash::of("north")).with_result("plain".to_string()))
            .unwrap();
        assert!(!cache.lookup("m1", "north").unwrap().is_valid());
    }

    #[test]
    fn test_get_or_compute_reuses_similar_result() {
        let cache = cache(0.95);
        let first: Result<String> = cache.get_or_compute("m1", "north", || Ok("N".into()));
        assert_eq!(first.unwrap(), "N");
        let second: Result<String> =
            cache.get_or_compute("m1", "north-ish", || panic!("should hit"));
        assert_eq!(second.unwrap(), "N");
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.store().len().unwrap(), 1);
    }

    #[test]
    fn test_embedding_latency_is_reported() {
        struct Slow;
        impl Embedder for Slow {
            fn embed(&self, _: &str) -> Result<Embedding> {
                Ok(Embedding::new(vec![1.0, 0.0], Duration::from_millis(40)))
            }
        }
        let cache: FuzzyCache<u8, Slow> = FuzzyCache::new(Slow, CacheConfig::default());
        let embedding = cache.embed("anything").unwrap();
        assert_eq!(embedding.elapsed, Duration::from_millis(40));
    }
}
