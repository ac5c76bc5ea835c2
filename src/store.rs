//! Concurrent record store.

use crate::embeddings::magnitude;
use crate::index::PartitionIndex;
use crate::record::Record;
use crate::{Error, ErrorContext, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// Largest accepted deviation of a stored embedding's L2 norm from 1.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-3;

struct StoreInner<T> {
    records: Vec<Arc<Record<T>>>,
    index: PartitionIndex,
    /// Embedding length per partition, fixed by its first embedded record.
    dimensions: HashMap<String, usize>,
}

/// Append-only record collection plus its partition index.
///
/// Both structures live behind one `RwLock`, so an append is a single
/// critical section: once a position is visible in the index, the record at
/// that position is fully visible in the collection. Readers hold the read
/// lock only long enough to copy out the candidates of one partition.
pub struct Store<T> {
    inner: RwLock<StoreInner<T>>,
}

impl<T> Store<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                records: Vec::new(),
                index: PartitionIndex::new(),
                dimensions: HashMap::new(),
            }),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreInner<T>>> {
        self.inner.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreInner<T>>> {
        self.inner.write().map_err(|_| poisoned())
    }

    /// Append a record and index it under its partition key.
    ///
    /// Returns the record's 0-based position. Rejected with
    /// [`Error::Validation`]: miss tokens (records without a result),
    /// embeddings whose L2 norm is not 1 within [`UNIT_NORM_TOLERANCE`], and
    /// embeddings whose length differs from earlier ones in the partition.
    pub fn append(&self, record: Record<T>) -> Result<usize> {
        if !record.is_valid() {
            return Err(Error::validation_with_context(
                "cannot store a record without a result",
                ErrorContext::new()
                    .with_field_path("record.result")
                    .with_source("store"),
            ));
        }
        if let Some(embedding) = record.embedding() {
            let norm = magnitude(embedding);
            let unit = (norm - 1.0).abs() <= UNIT_NORM_TOLERANCE;
            if !unit {
                return Err(Error::validation_with_context(
                    "embedding is not unit length",
                    ErrorContext::new()
                        .with_field_path("record.embedding")
                        .with_details(format!("L2 norm {}", norm))
                        .with_source("store"),
                ));
            }
        }

        let mut inner = self.write()?;
        let key = record.partition_key().to_string();
        if let Some(embedding) = record.embedding() {
            match inner.dimensions.get(&key) {
                Some(&expected) if expected != embedding.len() => {
                    return Err(Error::validation_with_context(
                        "embedding dimension differs from partition",
                        ErrorContext::new()
                            .with_field_path("record.embedding")
                            .with_details(format!(
                                "expected {}, got {}",
                                expected,
                                embedding.len()
                            ))
                            .with_source("store"),
                    ));
                }
                Some(_) => {}
                None => {
                    inner.dimensions.insert(key.clone(), embedding.len());
                }
            }
        }
        let position = inner.records.len();
        inner.records.push(Arc::new(record));
        inner.index.insert(&key, position);
        trace!(partition_key = %key, position, "record appended");
        Ok(position)
    }

    /// Copy out the candidates for `key` under a brief read lock.
    ///
    /// An unknown key yields an empty snapshot.
    pub fn snapshot_candidates(&self, key: &str) -> Result<CandidateSnapshot<T>> {
        let inner = self.read()?;
        let positions = inner.index.get_or_empty(key);
        let mut records = Vec::with_capacity(positions.len());
        for &position in positions {
            let record = inner.records.get(position).ok_or_else(|| {
                Error::invariant_with_context(
                    "indexed position outside record collection",
                    ErrorContext::new()
                        .with_field_path(format!("partitions[{}]", key))
                        .with_details(format!(
                            "position {}, len {}",
                            position,
                            inner.records.len()
                        ))
                        .with_source("store"),
                )
            })?;
            records.push(Arc::clone(record));
        }
        Ok(CandidateSnapshot {
            positions: positions.to_vec(),
            records,
        })
    }

    /// Strict partition lookup; an unknown key is [`Error::KeyNotFound`].
    pub fn positions(&self, key: &str) -> Result<Vec<usize>> {
        Ok(self.read()?.index.get(key)?.to_vec())
    }

    /// Soft partition lookup; an unknown key yields no positions.
    pub fn positions_or_empty(&self, key: &str) -> Result<Vec<usize>> {
        Ok(self.read()?.index.get_or_empty(key).to_vec())
    }

    pub fn get(&self, position: usize) -> Result<Option<Arc<Record<T>>>> {
        Ok(self.read()?.records.get(position).cloned())
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.records.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    pub fn partition_len(&self, key: &str) -> Result<usize> {
        Ok(self.read()?.index.get_or_empty(key).len())
    }

    pub fn partition_keys(&self) -> Result<Vec<String>> {
        Ok(self.read()?.index.keys().map(str::to_string).collect())
    }
}

impl<T> Default for Store<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> Error {
    Error::invariant_with_context(
        "store lock poisoned",
        ErrorContext::new().with_source("store"),
    )
}

/// Candidate records of one partition, in insertion order.
///
/// Holds shared handles to the records, so scanning never races a
/// concurrent append. Appends after the snapshot are not observed.
pub struct CandidateSnapshot<T> {
    positions: Vec<usize>,
    records: Vec<Arc<Record<T>>>,
}

impl<T> CandidateSnapshot<T> {
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// `(position, record)` pairs in partition order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Record<T>)> {
        self.positions
            .iter()
            .copied()
            .zip(self.records.iter().map(|r| r.as_ref()))
    }

    /// The `(position, record)` pair at `slot`, the index into this snapshot.
    pub fn get(&self, slot: usize) -> Option<(usize, &Record<T>)> {
        let position = *self.positions.get(slot)?;
        let record = self.records.get(slot)?;
        Some((position, record.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
