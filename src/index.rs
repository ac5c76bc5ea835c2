//! Partition index: partition key to ordered record positions.

use crate::{Error, Result};
use std::collections::HashMap;

/// Append-only map from partition key to the positions of its records,
/// in insertion order.
///
/// Not synchronized on its own; [`Store`](crate::store::Store) guards it
/// together with the record collection.
#[derive(Debug, Default, Clone)]
pub struct PartitionIndex {
    partitions: HashMap<String, Vec<usize>>,
}

impl PartitionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Strict lookup: an unknown key is [`Error::KeyNotFound`].
    pub fn get(&self, key: &str) -> Result<&[usize]> {
        self.partitions
            .get(key)
            .map(Vec::as_slice)
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Soft lookup: an unknown key yields an empty slice.
    pub fn get_or_empty(&self, key: &str) -> &[usize] {
        self.partitions.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn insert(&mut self, key: &str, position: usize) {
        match self.partitions.get_mut(key) {
            Some(positions) => positions.push(position),
            None => {
                self.partitions.insert(key.to_string(), vec![position]);
            }
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.partitions.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.partitions.keys().map(String::as_str)
    }

    /// Number of partitions.
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}
