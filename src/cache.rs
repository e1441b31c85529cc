use std::collections::HashMap;
use std::hash::Hash;

/// Bounded insert-only map.
///
/// Once the entry count reaches capacity, inserts of new keys are dropped
/// until the cache is explicitly cleared. Updates of existing keys are
/// always accepted. There is no eviction.
#[derive(Debug)]
pub struct BoundedCache<K, V> {
    map: HashMap<K, V>,
    capacity: usize,
    saturated: bool,
}

impl<K: Eq + Hash, V> BoundedCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            map: HashMap::new(),
            capacity,
            saturated: false,
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.map.get(key)
    }

    /// Returns false when the entry was dropped because the cache is full.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.map.len() >= self.capacity && !self.map.contains_key(&key) {
            if !self.saturated {
                log::debug!(
                    "cache reached capacity ({} entries), new inserts dropped until cleared",
                    self.capacity
                );
                self.saturated = true;
            }
            return false;
        }
        self.map.insert(key, value);
        true
    }

    pub fn clear(&mut self) {
        self.map.clear();
        self.saturated = false;
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
}
