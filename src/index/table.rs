//! InMemoryIndex implementation
//!
//! BTreeMap-based index with RwLock for concurrency.

use std::collections::BTreeMap;

use parking_lot::RwLock;

/// In-memory index of current values
///
/// The index itself knows nothing about the log. The engine only calls
/// `put`/`delete` after the matching record is durable.
#[derive(Debug, Default)]
pub struct InMemoryIndex {
    data: RwLock<BTreeMap<String, String>>,
}

impl InMemoryIndex {
    /// Create a new empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index holding `entries`
    pub fn from_map(entries: BTreeMap<String, String>) -> Self {
        Self {
            data: RwLock::new(entries),
        }
    }

    /// Get a value by key (read lock)
    ///
    /// `None` means the key is absent; an empty value is `Some("")`.
    pub fn get(&self, key: &str) -> Option<String> {
        self.data.read().get(key).cloned()
    }

    /// Put a key-value pair (write lock)
    pub fn put(&self, key: String, value: String) {
        self.data.write().insert(key, value);
    }

    /// Remove a key (write lock). Returns whether it was present.
    pub fn delete(&self, key: &str) -> bool {
        self.data.write().remove(key).is_some()
    }

    /// Check whether a key is present
    pub fn contains(&self, key: &str) -> bool {
        self.data.read().contains_key(key)
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Copy of all entries in key order
    pub fn entries(&self) -> Vec<(String, String)> {
        self.data
            .read()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
