//! Matching strategies over a partition's candidates.
//!
//! A strategy only finds the best candidate and its score. Deciding whether
//! that score is good enough is left to the cache facade.

use crate::embeddings::dot_product;
use crate::fingerprint::ContentHash;
use crate::store::CandidateSnapshot;
use crate::{Error, ErrorContext, Result};

/// Score reported by [`ExactMatch`] on a hit, and by [`CosineMatch`] for a
/// candidate with the query's own content hash.
pub const EXACT_MATCH_SCORE: f32 = 1.0;

/// Score reported when no candidate matched. Below any valid cosine similarity
/// except -1 itself, and always paired with `position == None`.
pub const NO_MATCH_SCORE: f32 = -1.0;

/// Outcome of a candidate scan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestMatch {
    pub score: f32,
    /// Store position of the best candidate.
    pub position: Option<usize>,
    /// Index of the best candidate within the scanned snapshot.
    pub slot: Option<usize>,
}

impl BestMatch {
    pub fn none() -> Self {
        Self {
            score: NO_MATCH_SCORE,
            position: None,
            slot: None,
        }
    }

    pub fn at(slot: usize, position: usize, score: f32) -> Self {
        Self {
            score,
            position: Some(position),
            slot: Some(slot),
        }
    }

    /// A candidate was found and scored at least `threshold`.
    pub fn meets(&self, threshold: f32) -> bool {
        self.position.is_some() && self.score >= threshold
    }
}

pub trait MatchStrategy {
    type Query: ?Sized;

    fn find_best<T>(
        &self,
        candidates: &CandidateSnapshot<T>,
        query: &Self::Query,
    ) -> Result<BestMatch>;
}

/// First candidate whose content hash equals the query hash.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExactMatch;

impl MatchStrategy for ExactMatch {
    type Query = ContentHash;

    fn find_best<T>(
        &self,
        candidates: &CandidateSnapshot<T>,
        query: &ContentHash,
    ) -> Result<BestMatch> {
        Ok(candidates
            .iter()
            .enumerate()
            .find(|(_, (_, record))| record.content_hash() == query)
            .map(|(slot, (position, _))| BestMatch::at(slot, position, EXACT_MATCH_SCORE))
            .unwrap_or_else(BestMatch::none))
    }
}

/// Query for [`CosineMatch`]: the input's content hash and its unit-length
/// embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingQuery {
    pub hash: ContentHash,
    pub embedding: Vec<f32>,
}

/// Highest cosine similarity over all candidates carrying an embedding.
///
/// Both sides must be unit length, so the dot product is the cosine
/// similarity. A candidate with the query's content hash scores exactly
/// [`EXACT_MATCH_SCORE`] without a dot product, so identical text always
/// clears a threshold of 1. Rounding can push a dot product slightly past 1;
/// such scores are clamped. Ties go to the earliest candidate. Candidates
/// without an embedding are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineMatch;

impl MatchStrategy for CosineMatch {
    type Query = EmbeddingQuery;

    fn find_best<T>(
        &self,
        candidates: &CandidateSnapshot<T>,
        query: &EmbeddingQuery,
    ) -> Result<BestMatch> {
        let mut best = BestMatch::none();
        for (slot, (position, record)) in candidates.iter().enumerate() {
            let Some(embedding) = record.embedding() else {
                continue;
            };
            let score = if record.content_hash() == &query.hash {
                EXACT_MATCH_SCORE
            } else {
                dot_product(&query.embedding, embedding)
                    .map_err(|e| {
                        Error::validation_with_context(
                            "candidate embedding dimension differs from query",
                            ErrorContext::new()
                                .with_field_path(format!("records[{}].embedding", position))
                                .with_details(e.to_string())
                                .with_source("cosine_match"),
                        )
                    })?
                    .min(EXACT_MATCH_SCORE)
            };
            if best.position.is_none() || score > best.score {
                best = BestMatch::at(slot, position, score);
            }
        }
        Ok(best)
    }
}
