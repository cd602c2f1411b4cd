//! Direct-mapped cache with generation-based O(1) clearing.
//!
//! Clearing only bumps the generation stamp; entries with a stale stamp read
//! as empty. This matters because every reordering swap and every collection
//! wipes the computed table.

use std::cell::Cell;

use crate::utils::MyHash;

#[derive(Clone)]
struct Entry<K, V> {
    key: K,
    value: V,
    generation: u64,
}

impl<K: Default, V: Default> Default for Entry<K, V> {
    fn default() -> Self {
        Self {
            key: K::default(),
            value: V::default(),
            generation: 0,
        }
    }
}

/// A fixed-size, lossy memo table: each key maps to exactly one slot and a
/// newer entry overwrites an older one.
pub struct DirectMappedCache<K, V> {
    entries: Vec<Entry<K, V>>,
    bits: usize,
    bitmask: u64,
    generation: u64,
    hits: Cell<usize>,
    misses: Cell<usize>,
}

impl<K: Default, V: Default> DirectMappedCache<K, V> {
    /// Creates a cache with `2^bits` slots.
    pub fn new(bits: usize) -> Self {
        assert!(bits <= 31, "Cache bits must be in range 0..=31, got {}", bits);
        let size = 1usize << bits;
        Self {
            entries: (0..size).map(|_| Entry::default()).collect(),
            bits,
            bitmask: (size - 1) as u64,
            generation: 1,
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    /// Reallocates the table with `2^bits` slots, dropping all entries.
    pub fn resize(&mut self, bits: usize) {
        let hits = self.hits.get();
        let misses = self.misses.get();
        *self = Self::new(bits);
        self.hits.set(hits);
        self.misses.set(misses);
    }
}

impl<K, V> DirectMappedCache<K, V> {
    pub fn capacity(&self) -> usize {
        self.entries.len()
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn misses(&self) -> usize {
        self.misses.get()
    }

    pub fn clear(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

impl<K: MyHash + Eq, V> DirectMappedCache<K, V> {
    #[inline]
    fn index(&self, key: &K) -> usize {
        (key.hash() & self.bitmask) as usize
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let entry = &self.entries[self.index(key)];
        if entry.generation == self.generation && entry.key == *key {
            self.hits.set(self.hits.get() + 1);
            Some(&entry.value)
        } else {
            self.misses.set(self.misses.get() + 1);
            None
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        let idx = self.index(&key);
        self.entries[idx] = Entry {
            key,
            value,
            generation: self.generation,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_get() {
        let mut cache = DirectMappedCache::<u64, i32>::new(4);
        cache.insert(1, 42);
        cache.insert(2, 99);
        assert_eq!(cache.get(&1), Some(&42));
        assert_eq!(cache.get(&2), Some(&99));
        assert_eq!(cache.get(&3), None);
        assert_eq!(cache.hits(), 2);
        assert_eq!(cache.misses(), 1);
    }

    #[test]
    fn test_clear_is_generation_bump() {
        let mut cache = DirectMappedCache::<u64, i32>::new(4);
        for i in 0..10u64 {
            cache.insert(i, i as i32);
            assert_eq!(cache.get(&i), Some(&(i as i32)));
            cache.clear();
            assert_eq!(cache.get(&i), None);
        }
    }

    #[test]
    fn test_resize_drops_entries() {
        let mut cache = DirectMappedCache::<u64, i32>::new(2);
        cache.insert(5, 1);
        cache.resize(6);
        assert_eq!(cache.capacity(), 64);
        assert_eq!(cache.bits(), 6);
        assert_eq!(cache.get(&5), None);
    }

    #[test]
    fn test_collisions_keep_one_entry_per_slot() {
        let mut cache = DirectMappedCache::<u64, i32>::new(2);
        for i in 0..16u64 {
            cache.insert(i, i as i32);
        }
        let found = (0..16u64).filter(|i| cache.get(i).is_some()).count();
        assert!(found <= 4);
    }
}
