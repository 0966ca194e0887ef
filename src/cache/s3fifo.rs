//! S3-FIFO eviction: three FIFO queues with ghost-based re-admission.
//!
//! New keys enter a small probationary queue. When expelled from it,
//! entries that saw enough hits are promoted to the main queue; the
//! rest leave the cache but linger as key-only ghosts. A key that
//! returns while its ghost is still remembered skips the small queue
//! and is admitted straight to main. Main-queue eviction gives each
//! accessed entry up to three extra laps before it finally goes.
//!
//! Nodes live in a slab arena; the queues hold slot handles, and the
//! index maps keys to handles — including the handles of ghosts, which
//! stay indexed until their ghost-queue slot is recycled.

use std::collections::VecDeque;
use std::time::Instant;

use hashbrown::HashMap;

use super::CacheKey;
use crate::expiry::Expiry;

/// Access counter ceiling; a hit can raise `freq` no further.
const FREQ_MAX: i8 = 3;
/// Sentinel marking a ghost or dead tombstone.
const FREQ_GHOST: i8 = -1;

struct S3Node<K, V> {
    /// Cleared only when a returning key re-binds to a fresh node, so
    /// a stale ghost can never delete the new binding.
    key: Option<K>,
    /// `None` once the entry became a ghost or tombstone.
    value: Option<V>,
    exp: Expiry,
    /// `-1` ghost/tombstone, `0..=3` live.
    freq: i8,
}

impl<K, V> S3Node<K, V> {
    fn is_live(&self) -> bool {
        self.freq >= 0
    }
}

pub(crate) struct S3FifoCache<K, V> {
    slab: Vec<Option<S3Node<K, V>>>,
    free: Vec<usize>,
    index: HashMap<K, usize>,
    small: VecDeque<usize>,
    main: VecDeque<usize>,
    ghost: VecDeque<usize>,
    small_cap: usize,
    main_cap: usize,
    promotion_threshold: i8,
    /// Count of live entries across both resident queues.
    live: usize,
    capacity: usize,
}

impl<K: CacheKey, V> S3FifoCache<K, V> {
    pub fn new(capacity: usize, small_ratio: f64, promotion_threshold: u8) -> Self {
        let small_cap = ((capacity as f64 * small_ratio) as usize)
            .max(1)
            .min(capacity);
        let main_cap = capacity - small_cap;
        Self {
            slab: Vec::with_capacity(capacity + 1),
            free: Vec::new(),
            index: HashMap::with_capacity(capacity + 1),
            small: VecDeque::with_capacity(small_cap + 1),
            main: VecDeque::with_capacity(main_cap + 1),
            ghost: VecDeque::with_capacity(main_cap + 1),
            small_cap,
            main_cap,
            promotion_threshold: promotion_threshold.min(FREQ_MAX as u8) as i8,
            live: 0,
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.live
    }

    /// Resident keys only; a ghost binding does not count.
    pub fn contains(&self, key: &K) -> bool {
        self.index
            .get(key)
            .and_then(|&id| self.slab[id].as_ref())
            .is_some_and(S3Node::is_live)
    }

    /// Lookup. A hit bumps the frequency counter without relinking; a
    /// ghost binding behaves as a miss and does not promote by itself.
    pub fn get(&mut self, key: &K, now: Instant) -> Option<&V> {
        let id = *self.index.get(key)?;
        let node = self.slab[id].as_mut()?;
        if !node.is_live() {
            return None;
        }
        if node.exp.is_expired(now) {
            // tombstone in place; the queue sweep frees the slot later
            node.value = None;
            node.key = None;
            node.freq = FREQ_GHOST;
            self.index.remove(key);
            self.live -= 1;
            return None;
        }
        node.freq = (node.freq + 1).min(FREQ_MAX);
        node.value.as_ref()
    }

    pub fn put(&mut self, key: K, value: V, exp: Expiry) {
        if let Some(&id) = self.index.get(&key) {
            if let Some(node) = self.slab[id].as_mut() {
                if node.is_live() {
                    node.value = Some(value);
                    node.exp = exp;
                    return;
                }
                // ghost hit: disown the stale ghost and admit the
                // returning key straight to main
                node.key = None;
            }
            let id = self.alloc(S3Node {
                key: Some(key.clone()),
                value: Some(value),
                exp,
                freq: 0,
            });
            self.main.push_back(id);
            self.index.insert(key, id);
            self.live += 1;
            return;
        }

        let id = self.alloc(S3Node {
            key: Some(key.clone()),
            value: Some(value),
            exp,
            freq: 0,
        });
        self.small.push_back(id);
        self.index.insert(key, id);
        self.live += 1;
    }

    pub fn over_capacity(&self) -> bool {
        self.live > self.capacity
    }

    /// Expel one live entry, preferring the small queue while it runs
    /// over its share. Tombstones encountered along the way are freed
    /// silently.
    pub fn evict(&mut self) -> Option<(K, V)> {
        loop {
            if self.small.is_empty() && self.main.is_empty() {
                return None;
            }
            let from_small = self.small.len() > self.small_cap || self.main.is_empty();
            let victim = if from_small {
                self.evict_small()
            } else {
                self.evict_main()
            };
            if let Some(victim) = victim {
                self.live -= 1;
                return Some(victim);
            }
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let id = *self.index.get(key)?;
        let node = self.slab[id].as_mut()?;
        if !node.is_live() {
            // deleting a ghost is a no-op: the key is not resident
            return None;
        }
        let value = node.value.take();
        node.key = None;
        node.freq = FREQ_GHOST;
        self.index.remove(key);
        self.live -= 1;
        value
    }

    pub fn clear(&mut self) {
        self.slab.clear();
        self.free.clear();
        self.index.clear();
        self.small.clear();
        self.main.clear();
        self.ghost.clear();
        self.live = 0;
    }

    pub fn iter(&self) -> S3Iter<'_, K, V> {
        S3Iter {
            entries: self.index.iter(),
            slab: &self.slab,
        }
    }

    /// Pop one handle off the small queue. Returns the victim if this
    /// step actually expelled a live entry from the cache.
    fn evict_small(&mut self) -> Option<(K, V)> {
        let id = self.small.pop_front()?;
        let Some(node) = self.slab[id].as_mut() else {
            return None;
        };
        if !node.is_live() {
            // dead tombstone left by delete or expiry
            self.release(id);
            return None;
        }
        if node.freq >= self.promotion_threshold {
            node.freq = 0;
            self.main.push_back(id);
            if self.main.len() > self.main_cap {
                return self.evict_main();
            }
            return None;
        }
        // not reused while probationary: the value leaves the cache
        // and the key becomes a ghost
        let value = node.value.take()?;
        node.freq = FREQ_GHOST;
        let key = node.key.clone()?;
        self.ghost.push_back(id);
        self.trim_ghosts();
        Some((key, value))
    }

    /// Pop handles off the main queue until one is truly evicted.
    /// Entries with remaining frequency are recirculated with the
    /// counter decremented.
    fn evict_main(&mut self) -> Option<(K, V)> {
        while let Some(id) = self.main.pop_front() {
            let Some(node) = self.slab[id].as_mut() else {
                continue;
            };
            if !node.is_live() {
                self.release(id);
                continue;
            }
            if node.freq >= 1 {
                node.freq -= 1;
                self.main.push_back(id);
                continue;
            }
            let Some(node) = self.slab[id].take() else {
                continue;
            };
            self.free.push(id);
            let (Some(key), Some(value)) = (node.key, node.value) else {
                continue;
            };
            self.index.remove(&key);
            return Some((key, value));
        }
        None
    }

    /// Forget the oldest ghosts once the ghost queue outgrows the main
    /// queue's share of the capacity.
    fn trim_ghosts(&mut self) {
        while self.ghost.len() > self.main_cap {
            if let Some(id) = self.ghost.pop_front() {
                if let Some(node) = self.slab[id].take() {
                    if let Some(key) = node.key {
                        self.index.remove(&key);
                    }
                }
                self.free.push(id);
            }
        }
    }

    fn alloc(&mut self, node: S3Node<K, V>) -> usize {
        match self.free.pop() {
            Some(id) => {
                self.slab[id] = Some(node);
                id
            }
            None => {
                self.slab.push(Some(node));
                self.slab.len() - 1
            }
        }
    }

    fn release(&mut self, id: usize) {
        self.slab[id] = None;
        self.free.push(id);
    }
}

pub(crate) struct S3Iter<'a, K, V> {
    entries: hashbrown::hash_map::Iter<'a, K, usize>,
    slab: &'a [Option<S3Node<K, V>>],
}

impl<'a, K, V> Iterator for S3Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        for (key, &id) in self.entries.by_ref() {
            if let Some(node) = self.slab[id].as_ref() {
                if let Some(value) = node.value.as_ref() {
                    return Some((key, value));
                }
            }
        }
        None
    }
}
