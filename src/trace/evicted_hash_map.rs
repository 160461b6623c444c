//! # Evicted Map

use crate::{Key, KeyValue, Value};
use std::collections::{HashMap, LinkedList};

/// A hash map with a capped number of attributes that retains the most
/// recently set entries.
///
/// Overflow is a normal outcome, not a failure: inserting beyond the capacity
/// evicts the oldest entry and increments a monotonic dropped counter, so
/// data loss stays observable. The map is not internally synchronized; the
/// owning span serializes access under its own lock.
#[derive(Clone, Debug, PartialEq)]
pub struct EvictedHashMap {
    map: HashMap<Key, Value>,
    evict_list: LinkedList<Key>,
    capacity: u32,
    dropped_count: u32,
}

impl EvictedHashMap {
    /// Create a new `EvictedHashMap` with a given capacity.
    pub fn new(capacity: u32) -> Self {
        EvictedHashMap {
            map: HashMap::new(),
            evict_list: Default::default(),
            capacity,
            dropped_count: 0,
        }
    }

    /// Inserts a key-value pair into the map.
    pub fn insert(&mut self, item: KeyValue) {
        // Check for existing item
        if let Some(value) = self.map.get_mut(&item.key) {
            *value = item.value;
            self.move_key_to_front(item.key);
            return;
        }

        // Add new item
        self.evict_list.push_front(item.key.clone());
        self.map.insert(item.key, item.value);

        // Verify size not exceeded
        if self.evict_list.len() as u32 > self.capacity {
            self.remove_oldest();
            self.dropped_count += 1;
        }
    }

    /// Returns the value for the given key, if retained.
    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.map.get(key)
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the map is empty.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The number of entries evicted over the lifetime of the map.
    pub fn dropped_count(&self) -> u32 {
        self.dropped_count
    }

    /// Snapshot of the currently retained keys, in no significant order.
    pub fn keys(&self) -> Vec<Key> {
        self.map.keys().cloned().collect()
    }

    /// Returns an iterator over the retained entries.
    pub fn iter(&self) -> std::collections::hash_map::Iter<'_, Key, Value> {
        self.map.iter()
    }

    fn move_key_to_front(&mut self, key: Key) {
        if self.evict_list.is_empty() {
            // If empty, push front
            self.evict_list.push_front(key);
        } else if self.evict_list.front() == Some(&key) {
            // Already the front, ignore
        } else {
            // Else split linked lists around key and combine
            let key_idx = self
                .evict_list
                .iter()
                .position(|k| k == &key)
                .expect("key must exist in evicted hash map, this is a bug");
            let mut tail = self.evict_list.split_off(key_idx);
            let item = tail.pop_front().expect("split tail starts at key");
            self.evict_list.push_front(item);
            self.evict_list.append(&mut tail);
        }
    }

    fn remove_oldest(&mut self) {
        if let Some(oldest_item) = self.evict_list.pop_back() {
            self.map.remove(&oldest_item);
        }
    }
}

impl<'a> IntoIterator for &'a EvictedHashMap {
    type Item = (&'a Key, &'a Value);
    type IntoIter = std::collections::hash_map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.map.iter()
    }
}
