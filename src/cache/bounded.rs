use std::collections::HashMap;
use std::hash::Hash;

use crate::error::{DdError, DdResult};

/// An exact map with a hard capacity.
///
/// Inserting past the capacity fails with [`DdError::CacheOverflow`]; the
/// caller is expected to discard the partial work and restart with a larger
/// capacity.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    map: HashMap<K, V>,
    capacity: usize,
}

impl<K: Eq + Hash, V: Copy> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            capacity,
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.get(key).copied()
    }

    /// Stores the entry, or reports overflow when the cache is full.
    ///
    /// The entry is not stored on overflow.
    pub fn try_insert(&mut self, key: K, value: V) -> DdResult<()> {
        if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            return Err(DdError::CacheOverflow);
        }
        self.map.insert(key, value);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn values(&self) -> impl Iterator<Item = V> + '_ {
        self.map.values().copied()
    }
}
