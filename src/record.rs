//! The cached record.

use crate::fingerprint::ContentHash;
use std::time::SystemTime;

/// A cached entry, or a miss token when `result` is `None`.
///
/// A miss token is handed back to the caller by a lookup. The caller computes
/// the expensive value, sets it with [`Record::set_result`] and then appends
/// the record to the store. Only records with a result may be stored.
#[derive(Debug, Clone, PartialEq)]
pub struct Record<T> {
    partition_key: String,
    content_hash: ContentHash,
    embedding: Option<Vec<f32>>,
    result: Option<T>,
    created_at: SystemTime,
}

impl<T> Record<T> {
    /// A record with no result for `partition_key` and `content_hash`.
    pub fn miss(partition_key: impl Into<String>, content_hash: ContentHash) -> Self {
        Self {
            partition_key: partition_key.into(),
            content_hash,
            embedding: None,
            result: None,
            created_at: SystemTime::now(),
        }
    }

    /// Attach an embedding. The store only accepts unit-length embeddings.
    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_result(mut self, result: T) -> Self {
        self.result = Some(result);
        self
    }

    pub fn set_result(&mut self, result: T) {
        self.result = Some(result);
    }

    /// A record is valid exactly when it carries a result.
    pub fn is_valid(&self) -> bool {
        self.result.is_some()
    }

    pub fn partition_key(&self) -> &str {
        &self.partition_key
    }

    pub fn content_hash(&self) -> &ContentHash {
        &self.content_hash
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    pub fn into_result(self) -> Option<T> {
        self.result
    }

    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_miss_token_is_invalid() {
        let record: Record<String> = Record::miss("m1", ContentHash::of("hello"));
        assert!(!record.is_valid());
        assert!(record.result().is_none());
        assert!(record.embedding().is_none());
        assert_eq!(record.partition_key(), "m1");
    }

    #[test]
    fn test_set_result_makes_valid() {
        let mut record = Record::miss("m1", ContentHash::of("hello"));
        record.set_result("A".to_string());
        assert!(record.is_valid());
        assert_eq!(record.result().map(String::as_str), Some("A"));
        assert_eq!(record.into_result(), Some("A".to_string()));
    }

    #[test]
    fn test_builder_sets_embedding() {
        let record = Record::miss("m1", ContentHash::of("x"))
            .with_embedding(vec![1.0, 0.0])
            .with_result(7u32);
        assert_eq!(record.embedding(), Some(&[1.0, 0.0][..]));
        assert_eq!(record.result(), Some(&7));
        assert!(record.created_at() <= SystemTime::now());
    }
}
