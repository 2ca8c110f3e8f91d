//! Map wrapper that never creates entries as a side effect of a lookup.
//!
//! Tracking tables in the agent are keyed by hardware handles. A lookup for a
//! handle that was already torn down must come back empty instead of
//! resurrecting a default entry, and an insert for a handle that is already
//! tracked must not silently reset its state. `SyncMap` makes both cases
//! explicit:
//!
//! - `get()` returns `Option`
//! - `insert_new()` refuses to overwrite and reports [`SyncMapError::KeyExists`]
//! - `remove_existing()` reports [`SyncMapError::KeyNotFound`]

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

/// Error type for SyncMap operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncMapError {
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Key already present: {0}")]
    KeyExists(String),
}

/// A map that only grows or shrinks through explicit calls.
///
/// # Example
///
/// ```
/// use swagent_common::SyncMap;
///
/// let mut map: SyncMap<u64, &str> = SyncMap::new();
/// assert!(map.get(&7).is_none());
/// assert!(map.is_empty());
///
/// map.insert_new(7, "acl_drop").unwrap();
/// assert!(map.insert_new(7, "other").is_err());
/// assert_eq!(map.get(&7), Some(&"acl_drop"));
/// ```
#[derive(Debug, Clone)]
pub struct SyncMap<K, V> {
    inner: HashMap<K, V>,
}

impl<K, V> SyncMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            inner: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the value for `key`. Never creates an entry.
    pub fn get(&self, key: &K) -> Option<&V> {
        self.inner.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.inner.iter()
    }
}

impl<K, V> SyncMap<K, V>
where
    K: Eq + Hash + Debug,
{
    /// Inserts `value` only if `key` is not tracked yet.
    ///
    /// The existing entry is left untouched on conflict.
    pub fn insert_new(&mut self, key: K, value: V) -> Result<(), SyncMapError> {
        if self.inner.contains_key(&key) {
            return Err(SyncMapError::KeyExists(format!("{:?}", key)));
        }
        self.inner.insert(key, value);
        Ok(())
    }

    /// Removes `key`, failing if it is not tracked. The map is unchanged on
    /// failure.
    pub fn remove_existing(&mut self, key: &K) -> Result<V, SyncMapError> {
        self.inner
            .remove(key)
            .ok_or_else(|| SyncMapError::KeyNotFound(format!("{:?}", key)))
    }
}

impl<K, V> Default for SyncMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}
