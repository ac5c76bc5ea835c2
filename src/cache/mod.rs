//! Lookup caches for expensive, deterministic computations.
//!
//! Two facades share one protocol:
//!
//! 1. The caller asks the cache for `(partition_key, raw_input)`.
//! 2. On a hit the returned [`Record`](crate::record::Record) carries the stored result.
//! 3. On a miss the record is a miss token. The caller computes the value,
//!    sets it on the record and inserts it.
//!
//! Lookups never write, so the expensive computation runs under the caller's
//! control and each result is inserted exactly once by whoever computed it.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ExactCache`] | Matches inputs by SHA-256 content hash |
//! | [`FuzzyCache`] | Matches inputs by embedding cosine similarity |
//! | [`CacheConfig`] | Default threshold and verbosity |
//! | [`CacheStats`] | Hit, miss and insert counters |
//!
//! ## Example
//!
//! ```rust
//! use ai_lib_cache::cache::ExactCache;
//!
//! let cache: ExactCache<String> = ExactCache::default();
//! let mut record = cache.lookup("gpt-4o", "hello")?;
//! assert!(!record.is_valid());
//!
//! record.set_result("A".to_string());
//! cache.insert(record)?;
//!
//! let hit = cache.lookup("gpt-4o", "hello")?;
//! assert_eq!(hit.result().map(String::as_str), Some("A"));
//! # Ok::<(), ai_lib_cache::Error>(())
//! ```

mod config;
mod exact;
mod fuzzy;
mod stats;

pub use config::{CacheConfig, Verbosity, DEFAULT_MIN_SIMILARITY};
pub use exact::ExactCache;
pub use fuzzy::FuzzyCache;
pub use stats::CacheStats;

use crate::matching::BestMatch;
use crate::store::CandidateSnapshot;
use crate::{Error, ErrorContext, Result};

/// Result of the stored record at `best.slot`, if it clears `threshold`.
fn accepted_result<T: Clone>(
    candidates: &CandidateSnapshot<T>,
    best: &BestMatch,
    threshold: f32,
) -> Result<Option<T>> {
    let slot = match best.slot {
        Some(slot) if best.meets(threshold) => slot,
        _ => return Ok(None),
    };
    candidates
        .get(slot)
        .and_then(|(_, record)| record.result())
        .cloned()
        .map(Some)
        .ok_or_else(|| {
            Error::invariant_with_context(
                "matched candidate has no stored result",
                ErrorContext::new()
                    .with_field_path(format!("candidates[{}].result", slot))
                    .with_source("cache"),
            )
        })
}
