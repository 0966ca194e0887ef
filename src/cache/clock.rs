//! CLOCK eviction: a one-bit LRU approximation.
//!
//! Entries occupy a fixed ring of slots. Each access sets the slot's
//! visited bit; the hand sweeps forward on insert, clearing visited
//! bits until it finds a slot it may claim. Occupied slots under the
//! hand are evicted; empty slots (left by deletes or expiry) are reused
//! in place.

use std::time::Instant;

use hashbrown::HashMap;

use super::CacheKey;
use crate::expiry::Expiry;

struct ClockEntry<K, V> {
    key: K,
    value: V,
    exp: Expiry,
}

struct Slot<K, V> {
    entry: Option<ClockEntry<K, V>>,
    visited: bool,
}

pub(crate) struct ClockCache<K, V> {
    slots: Vec<Slot<K, V>>,
    hand: usize,
    index: HashMap<K, usize>,
    capacity: usize,
}

impl<K: CacheKey, V> ClockCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity)
                .map(|_| Slot {
                    entry: None,
                    visited: false,
                })
                .collect(),
            hand: 0,
            index: HashMap::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Lookup. A hit marks the slot visited; an expired entry empties
    /// its slot (the slot stays in the ring for reuse).
    pub fn get(&mut self, key: &K, now: Instant) -> Option<&V> {
        let idx = *self.index.get(key)?;
        let expired = match self.slots[idx].entry.as_ref() {
            Some(entry) => entry.exp.is_expired(now),
            None => return None,
        };
        if expired {
            self.slots[idx].entry = None;
            self.slots[idx].visited = false;
            self.index.remove(key);
            return None;
        }
        self.slots[idx].visited = true;
        self.slots[idx].entry.as_ref().map(|entry| &entry.value)
    }

    /// Insert or update. A fresh insert sweeps the hand and may evict
    /// the occupant of the claimed slot, which is returned for the
    /// eviction callback.
    pub fn put(&mut self, key: K, value: V, exp: Expiry) -> Option<(K, V)> {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(entry) = self.slots[idx].entry.as_mut() {
                entry.value = value;
                entry.exp = exp;
                // an overwrite counts as a touch
                self.slots[idx].visited = true;
                return None;
            }
            self.index.remove(&key);
        }

        self.advance_hand();
        let victim = self.evict_at_hand();

        let idx = self.hand;
        self.slots[idx].entry = Some(ClockEntry {
            key: key.clone(),
            value,
            exp,
        });
        self.slots[idx].visited = false;
        self.index.insert(key, idx);
        self.hand = (self.hand + 1) % self.capacity;
        victim
    }

    pub fn over_capacity(&self) -> bool {
        // insertion evicts inline, so the ring can never overflow
        false
    }

    /// Force one eviction: sweep until the hand rests on an occupied,
    /// unvisited slot and clear it.
    pub fn evict(&mut self) -> Option<(K, V)> {
        if self.index.is_empty() {
            return None;
        }
        loop {
            self.advance_hand();
            if let Some(victim) = self.evict_at_hand() {
                return Some(victim);
            }
            // hand rests on an empty slot; step past it
            self.hand = (self.hand + 1) % self.capacity;
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.slots[idx].visited = false;
        self.slots[idx].entry.take().map(|entry| entry.value)
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            slot.entry = None;
            slot.visited = false;
        }
        self.hand = 0;
        self.index.clear();
    }

    pub fn iter(&self) -> ClockIter<'_, K, V> {
        ClockIter {
            entries: self.index.iter(),
            slots: &self.slots,
        }
    }

    /// Sweep forward, clearing visited bits, until the hand rests on a
    /// slot that was not visited since the last pass. Terminates within
    /// one full revolution.
    fn advance_hand(&mut self) {
        while self.slots[self.hand].visited {
            self.slots[self.hand].visited = false;
            self.hand = (self.hand + 1) % self.capacity;
        }
    }

    fn evict_at_hand(&mut self) -> Option<(K, V)> {
        let entry = self.slots[self.hand].entry.take()?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value))
    }
}

pub(crate) struct ClockIter<'a, K, V> {
    entries: hashbrown::hash_map::Iter<'a, K, usize>,
    slots: &'a [Slot<K, V>],
}

impl<'a, K, V> Iterator for ClockIter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, &idx) in self.entries.by_ref() {
            if let Some(entry) = self.slots[idx].entry.as_ref() {
                return Some((key, &entry.value));
            }
        }
        None
    }
}
