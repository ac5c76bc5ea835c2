//! Embedding support for fuzzy matching.
//!
//! This module provides:
//! - The [`Embedder`] collaborator trait the fuzzy cache calls
//! - A chunk-and-average wrapper for inputs longer than a model's window
//! - Vector operations (dot product, normalization, averaging)

mod embedder;
mod vectors;

pub use embedder::{ChunkedEmbedder, Embedder, Embedding, FnEmbedder};
pub use vectors::{
    average_vectors, cosine_similarity, dot_product, magnitude, normalize_vector, Vector,
};
