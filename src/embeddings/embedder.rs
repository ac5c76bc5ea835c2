//! Embedder collaborator interface.

use super::vectors::average_vectors;
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An embedding vector and the time the model took to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub elapsed: Duration,
}

impl Embedding {
    pub fn new(vector: Vec<f32>, elapsed: Duration) -> Self {
        Self { vector, elapsed }
    }

    pub fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Turns text into a vector.
///
/// Implementations are handed to a fuzzy cache at construction time and
/// called synchronously from whichever thread performs the lookup. Failures
/// should be reported as [`Error::EmbeddingUnavailable`]. The returned vector
/// need not be normalized.
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Embedding>;
}

impl<E: Embedder + ?Sized> Embedder for Arc<E> {
    fn embed(&self, text: &str) -> Result<Embedding> {
        (**self).embed(text)
    }
}

impl<E: Embedder + ?Sized> Embedder for Box<E> {
    fn embed(&self, text: &str) -> Result<Embedding> {
        (**self).embed(text)
    }
}

/// Adapts a plain function into an [`Embedder`], timing each call.
pub struct FnEmbedder<F> {
    f: F,
}

impl<F> FnEmbedder<F>
where
    F: Fn(&str) -> Result<Vec<f32>> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Embedder for FnEmbedder<F>
where
    F: Fn(&str) -> Result<Vec<f32>> + Send + Sync,
{
    fn embed(&self, text: &str) -> Result<Embedding> {
        let start = Instant::now();
        let vector = (self.f)(text)?;
        Ok(Embedding::new(vector, start.elapsed()))
    }
}

/// Splits long inputs into word windows, embeds each, and averages.
///
/// Inputs of at most `max_words` whitespace-separated words go to the inner
/// embedder untouched. The reported latency is the sum over chunks.
pub struct ChunkedEmbedder<E> {
    inner: E,
    max_words: usize,
}

impl<E: Embedder> ChunkedEmbedder<E> {
    pub fn new(inner: E, max_words: usize) -> Self {
        Self {
            inner,
            max_words: max_words.max(1),
        }
    }

    pub fn max_words(&self) -> usize {
        self.max_words
    }

    pub fn inner(&self) -> &E {
        &self.inner
    }
}

impl<E: Embedder> Embedder for ChunkedEmbedder<E> {
    fn embed(&self, text: &str) -> Result<Embedding> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.len() <= self.max_words {
            return self.inner.embed(text);
        }

        let mut vectors = Vec::with_capacity(words.len().div_ceil(self.max_words));
        let mut elapsed = Duration::ZERO;
        for chunk in words.chunks(self.max_words) {
            let embedding = self.inner.embed(&chunk.join(" "))?;
            elapsed += embedding.elapsed;
            vectors.push(embedding.vector);
        }
        let vector = average_vectors(&vectors).map_err(|e| {
            Error::embedding_unavailable_with_context(
                "chunk embeddings could not be averaged",
                ErrorContext::new()
                    .with_details(e.to_string())
                    .with_source("chunked_embedder"),
            )
        })?;
        tracing::trace!(chunks = vectors.len(), "averaged chunk embeddings");
        Ok(Embedding::new(vector, elapsed))
    }
}
