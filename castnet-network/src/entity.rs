//! Dense integer indexing for actors and directors.

use crate::error::NetworkError;
use std::collections::HashMap;

/// Bidirectional map between an entity's external key and its dense index.
///
/// Indices are handed out in first-seen order starting at 0. The index only
/// grows: there is no removal, and an assigned index is never reused.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityIndex {
    keys: Vec<String>,
    positions: HashMap<String, usize>,
}

impl EntityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from keys listed in index order.
    pub fn from_keys(keys: Vec<String>) -> Result<Self, NetworkError> {
        let mut positions = HashMap::with_capacity(keys.len());
        for (idx, key) in keys.iter().enumerate() {
            if positions.insert(key.clone(), idx).is_some() {
                return Err(NetworkError::invalid_input(format!(
                    "duplicate entity key '{key}' at index {idx}"
                )));
            }
        }
        Ok(Self { keys, positions })
    }

    /// Index of `key`, assigning the next free one if the key is new.
    pub fn add(&mut self, key: &str) -> usize {
        if let Some(&idx) = self.positions.get(key) {
            return idx;
        }
        let idx = self.keys.len();
        self.keys.push(key.to_string());
        self.positions.insert(key.to_string(), idx);
        idx
    }

    pub fn lookup(&self, key: &str) -> Option<usize> {
        self.positions.get(key).copied()
    }

    pub fn key(&self, idx: usize) -> Option<&str> {
        self.keys.get(idx).map(String::as_str)
    }

    pub fn size(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Keys in index order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &str)> {
        self.keys.iter().enumerate().map(|(i, k)| (i, k.as_str()))
    }
}
