//! # ai-lib-cache
//!
//! Concurrent in-memory lookup cache for expensive, deterministic computations
//! such as model API calls.
//!
//! ## Overview
//!
//! Inputs are strings scoped by an exact-match partition key (typically the
//! model and its configuration). Within a partition, two matching strategies
//! are available:
//!
//! - **Exact**: the SHA-256 hash of the input must equal a stored record's hash.
//! - **Fuzzy**: the input's normalized embedding must reach a cosine similarity
//!   threshold against a stored record's embedding.
//!
//! Lookups are read-only and return a [`Record`]. On a miss the caller runs the
//! expensive computation, fills in the record and inserts it. The store is
//! append-only and safe to share across threads.
//!
//! ## Quick Start
//!
//! ```rust
//! use ai_lib_cache::cache::{CacheConfig, FuzzyCache};
//! use ai_lib_cache::embeddings::FnEmbedder;
//!
//! // Any embedding model works; this toy one counts vowels and consonants.
//! let embedder = FnEmbedder::new(|text: &str| {
//!     let vowels = text.chars().filter(|c| "aeiou".contains(*c)).count() as f32;
//!     let others = text.chars().filter(|c| c.is_alphabetic()).count() as f32 - vowels;
//!     Ok(vec![vowels, others])
//! });
//! let cache: FuzzyCache<String, _> =
//!     FuzzyCache::new(embedder, CacheConfig::default().with_min_similarity(0.9));
//!
//! let answer = cache.get_or_compute("model-a", "How is it going?", || {
//!     Ok::<_, ai_lib_cache::Error>("B".to_string())
//! })?;
//! assert_eq!(answer, "B");
//! # Ok::<(), ai_lib_cache::Error>(())
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Exact and fuzzy cache facades, configuration, statistics |
//! | [`store`] | Concurrent append-only record store |
//! | [`index`] | Partition key to record position index |
//! | [`matching`] | Hash-equality and cosine-similarity strategies |
//! | [`embeddings`] | Embedder trait, chunking wrapper, vector operations |
//! | [`record`] | The cached record and its validity |
//! | [`fingerprint`] | Content hashing |

pub mod cache;
pub mod embeddings;
pub mod fingerprint;
pub mod index;
pub mod matching;
pub mod record;
pub mod store;

pub use cache::{CacheConfig, CacheStats, ExactCache, FuzzyCache, Verbosity};
pub use embeddings::{Embedder, Embedding};
pub use fingerprint::ContentHash;
pub use record::Record;
pub use store::Store;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
