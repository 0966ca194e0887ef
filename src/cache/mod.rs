//! The cache abstraction and its policy backends.
//!
//! [`Cache`] owns the operation counters, the default TTL, and the
//! eviction callback; everything ordering-related is delegated to the
//! policy backend chosen at construction. Backends are dispatched
//! through a tagged enum, so a cache is a single allocation-free match
//! away from its policy on every operation.

mod clock;
mod fifo;
mod list;
mod lru;
mod s3fifo;

use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::config::{CacheConfig, EvictionPolicy};
use crate::counters::OpCounters;
use crate::error::{CacheError, CacheResult};
use crate::expiry::Expiry;

use clock::ClockCache;
use fifo::FifoCache;
use lru::LruCache;
use s3fifo::S3FifoCache;

/// Marker for types usable as cache keys.
pub trait CacheKey: Hash + Eq + Clone {}

impl<T: Hash + Eq + Clone> CacheKey for T {}

/// Callback invoked with each evicted `(key, value)` pair, after the
/// victim has left the index and the ordering structure.
///
/// The callback must not touch the cache it is registered on; it runs
/// synchronously inside the operation that triggered the eviction.
pub type EvictionCallback<K, V> = Box<dyn FnMut(&K, &V) + Send>;

enum Backend<K, V> {
    Fifo(FifoCache<K, V>),
    Lru(LruCache<K, V>),
    Clock(ClockCache<K, V>),
    S3Fifo(S3FifoCache<K, V>),
}

/// Bounded in-memory key/value cache.
///
/// Capacity is counted in objects. Entries may carry a TTL; expiry is
/// lazy and only ever observed by `get`. All operations are O(1)
/// amortized regardless of policy.
pub struct Cache<K, V> {
    backend: Backend<K, V>,
    counters: OpCounters,
    default_ttl: Option<Duration>,
    callback: Option<EvictionCallback<K, V>>,
    capacity: usize,
    policy: EvictionPolicy,
}

impl<K: CacheKey, V> Cache<K, V> {
    /// Create a cache with the given policy and capacity and default
    /// settings for everything else.
    pub fn new(policy: EvictionPolicy, capacity: usize) -> CacheResult<Self> {
        let mut config = CacheConfig::new(capacity);
        config.policy = policy;
        Self::with_config(config)
    }

    /// Create a cache from a full configuration.
    pub fn with_config(config: CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        let backend = match config.policy {
            EvictionPolicy::Fifo => Backend::Fifo(FifoCache::new(config.capacity)),
            EvictionPolicy::Lru => Backend::Lru(LruCache::new(config.capacity)),
            EvictionPolicy::Clock => Backend::Clock(ClockCache::new(config.capacity)),
            EvictionPolicy::S3Fifo => Backend::S3Fifo(S3FifoCache::new(
                config.capacity,
                config.small_queue_ratio,
                config.promotion_threshold,
            )),
        };
        debug!(
            policy = %config.policy,
            capacity = config.capacity,
            "cache created"
        );
        Ok(Self {
            backend,
            counters: OpCounters::default(),
            default_ttl: config.default_ttl,
            callback: None,
            capacity: config.capacity,
            policy: config.policy,
        })
    }

    /// Look up a key. Returns `None` on a miss, on a TTL expiry
    /// (removing the entry), and for S3-FIFO ghosts.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        self.counters.n_get += 1;
        let now = Instant::now();
        let value = match &mut self.backend {
            Backend::Fifo(cache) => cache.get(key, now),
            Backend::Lru(cache) => cache.get(key, now),
            Backend::Clock(cache) => cache.get(key, now),
            Backend::S3Fifo(cache) => cache.get(key, now),
        };
        if value.is_some() {
            self.counters.n_hit += 1;
        }
        value
    }

    /// Look up a key, falling back to `default` on a miss.
    pub fn get_or<'a>(&'a mut self, key: &K, default: &'a V) -> &'a V {
        self.get(key).unwrap_or(default)
    }

    /// Strict lookup: a miss (or expiry) is an error instead of a
    /// default.
    pub fn fetch(&mut self, key: &K) -> CacheResult<&V> {
        self.get(key).ok_or(CacheError::KeyNotFound)
    }

    /// Insert or update an entry under the default TTL.
    pub fn put(&mut self, key: K, value: V) {
        let ttl = self.default_ttl;
        self.put_with_ttl(key, value, ttl);
    }

    /// Insert or update an entry with an explicit TTL (`None` never
    /// expires). Updating a present key changes value and expiry in
    /// place; whether it affects eviction order is up to the policy.
    pub fn put_with_ttl(&mut self, key: K, value: V, ttl: Option<Duration>) {
        self.counters.n_put += 1;
        let exp = Expiry::from_ttl(Instant::now(), ttl);
        let inline_victim = match &mut self.backend {
            Backend::Fifo(cache) => {
                cache.put(key, value, exp);
                None
            }
            Backend::Lru(cache) => {
                cache.put(key, value, exp);
                None
            }
            // the ring evicts while claiming a slot, not afterwards
            Backend::Clock(cache) => cache.put(key, value, exp),
            Backend::S3Fifo(cache) => {
                cache.put(key, value, exp);
                None
            }
        };
        if let Some((victim_key, victim_value)) = inline_victim {
            self.notify_evicted(&victim_key, &victim_value);
        }
        self.evict_to_capacity();
    }

    /// Force a single eviction, firing the callback. Returns the
    /// evicted key, or `None` if the cache is empty.
    pub fn evict(&mut self) -> Option<K> {
        let victim = match &mut self.backend {
            Backend::Fifo(cache) => cache.evict(),
            Backend::Lru(cache) => cache.evict(),
            Backend::Clock(cache) => cache.evict(),
            Backend::S3Fifo(cache) => cache.evict(),
        };
        let (key, value) = victim?;
        self.notify_evicted(&key, &value);
        Some(key)
    }

    /// Remove a key. Returns whether it was resident. Never fires the
    /// eviction callback.
    pub fn delete(&mut self, key: &K) -> bool {
        self.counters.n_delete += 1;
        let removed = match &mut self.backend {
            Backend::Fifo(cache) => cache.remove(key),
            Backend::Lru(cache) => cache.remove(key),
            Backend::Clock(cache) => cache.remove(key),
            Backend::S3Fifo(cache) => cache.remove(key),
        };
        removed.is_some()
    }

    /// Whether the key is resident. Does not check TTLs and does not
    /// count as an access.
    pub fn contains(&self, key: &K) -> bool {
        match &self.backend {
            Backend::Fifo(cache) => cache.contains(key),
            Backend::Lru(cache) => cache.contains(key),
            Backend::Clock(cache) => cache.contains(key),
            Backend::S3Fifo(cache) => cache.contains(key),
        }
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        match &self.backend {
            Backend::Fifo(cache) => cache.len(),
            Backend::Lru(cache) => cache.len(),
            Backend::Clock(cache) => cache.len(),
            Backend::S3Fifo(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity in objects.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The policy this cache was built with.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// The TTL applied by [`put`](Self::put).
    pub fn default_ttl(&self) -> Option<Duration> {
        self.default_ttl
    }

    /// Drop every entry. Counters are preserved; no callbacks fire.
    pub fn clear(&mut self) {
        match &mut self.backend {
            Backend::Fifo(cache) => cache.clear(),
            Backend::Lru(cache) => cache.clear(),
            Backend::Clock(cache) => cache.clear(),
            Backend::S3Fifo(cache) => cache.clear(),
        }
    }

    /// Operation totals since construction.
    pub fn counters(&self) -> OpCounters {
        self.counters
    }

    /// Register the eviction callback, replacing any previous one.
    pub fn set_eviction_callback(&mut self, callback: impl FnMut(&K, &V) + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Iterate resident `(key, value)` pairs. Order is
    /// policy-dependent and not part of the contract; every resident
    /// key appears exactly once.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter(match &self.backend {
            Backend::Fifo(cache) => IterInner::List(cache.iter()),
            Backend::Lru(cache) => IterInner::List(cache.iter()),
            Backend::Clock(cache) => IterInner::Clock(cache.iter()),
            Backend::S3Fifo(cache) => IterInner::S3Fifo(cache.iter()),
        })
    }

    /// Iterate resident keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.iter().map(|(key, _)| key)
    }

    /// Iterate resident values.
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, value)| value)
    }

    /// Bulk insert from any `(key, value)` source, under the default
    /// TTL.
    pub fn update<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in entries {
            self.put(key, value);
        }
    }

    /// Evict until the backend is back within capacity.
    fn evict_to_capacity(&mut self) {
        loop {
            let over = match &self.backend {
                Backend::Fifo(cache) => cache.over_capacity(),
                Backend::Lru(cache) => cache.over_capacity(),
                Backend::Clock(cache) => cache.over_capacity(),
                Backend::S3Fifo(cache) => cache.over_capacity(),
            };
            if !over {
                return;
            }
            let victim = match &mut self.backend {
                Backend::Fifo(cache) => cache.evict(),
                Backend::Lru(cache) => cache.evict(),
                Backend::Clock(cache) => cache.evict(),
                Backend::S3Fifo(cache) => cache.evict(),
            };
            match victim {
                Some((key, value)) => self.notify_evicted(&key, &value),
                None => return,
            }
        }
    }

    fn notify_evicted(&mut self, key: &K, value: &V) {
        self.counters.n_evict += 1;
        trace!("evicted one entry");
        if let Some(callback) = self.callback.as_mut() {
            callback(key, value);
        }
    }
}

impl<K: CacheKey, V> fmt::Debug for Cache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cache")
            .field("policy", &self.policy)
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("counters", &self.counters)
            .finish()
    }
}

/// Iterator over a cache's resident `(key, value)` pairs.
pub struct Iter<'a, K, V>(IterInner<'a, K, V>);

enum IterInner<'a, K, V> {
    List(list::ListIter<'a, K, V>),
    Clock(clock::ClockIter<'a, K, V>),
    S3Fifo(s3fifo::S3Iter<'a, K, V>),
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.0 {
            IterInner::List(iter) => iter.next(),
            IterInner::Clock(iter) => iter.next(),
            IterInner::S3Fifo(iter) => iter.next(),
        }
    }
}
