//! LRU eviction: the least recently used entry leaves first.
//!
//! Hits and in-place updates both promote the entry to the head of the
//! recency list; the victim is always the tail.

use std::time::Instant;

use hashbrown::HashMap;

use super::list::{EntryList, ListIter, NodeId};
use super::CacheKey;
use crate::expiry::Expiry;

pub(crate) struct LruCache<K, V> {
    index: HashMap<K, NodeId>,
    list: EntryList<K, V>,
    capacity: usize,
}

impl<K: CacheKey, V> LruCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity(capacity + 1),
            list: EntryList::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Lookup. A hit promotes the entry to most recently used; an
    /// expired entry is removed before returning.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<&V> {
        let id = *self.index.get(key)?;
        if self.list.node(id).exp.is_expired(now) {
            self.index.remove(key);
            self.list.unlink(id);
            return None;
        }
        self.list.move_to_front(id);
        Some(&self.list.node(id).value)
    }

    pub fn put(&mut self, key: K, value: V, exp: Expiry) {
        if let Some(&id) = self.index.get(&key) {
            {
                let node = self.list.node_mut(id);
                node.value = value;
                node.exp = exp;
            }
            // an update counts as a use
            self.list.move_to_front(id);
            return;
        }
        let id = self.list.push_front(key.clone(), value, exp);
        self.index.insert(key, id);
    }

    pub fn over_capacity(&self) -> bool {
        self.index.len() > self.capacity
    }

    /// Remove and return the least recently used entry.
    pub fn evict(&mut self) -> Option<(K, V)> {
        let node = self.list.pop_back()?;
        self.index.remove(&node.key);
        Some((node.key, node.value))
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        Some(self.list.unlink(id).value)
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
    }

    pub fn iter(&self) -> ListIter<'_, K, V> {
        self.list.iter()
    }
}
