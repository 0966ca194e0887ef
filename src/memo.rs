//! Function memoization on top of the cache dispatch.
//!
//! [`Memo`] needs nothing from the cache beyond `get`, `put`,
//! `contains`, and `clear`, so any policy works.

use crate::cache::{Cache, CacheKey};
use crate::config::{CacheConfig, EvictionPolicy};
use crate::error::CacheResult;

/// Caches the results of a function keyed by its argument.
///
/// ```
/// use cachekit::{EvictionPolicy, Memo};
///
/// let mut square = Memo::new(EvictionPolicy::Lru, 64, |x: &u64| x * x).unwrap();
/// assert_eq!(square.call(12), 144);
/// assert_eq!(square.call(12), 144); // served from the cache
/// ```
pub struct Memo<K, V, F> {
    cache: Cache<K, V>,
    func: F,
}

impl<K, V, F> Memo<K, V, F>
where
    K: CacheKey,
    V: Clone,
    F: FnMut(&K) -> V,
{
    /// Memoize `func` behind a cache with the given policy and
    /// capacity.
    pub fn new(policy: EvictionPolicy, capacity: usize, func: F) -> CacheResult<Self> {
        let mut config = CacheConfig::new(capacity);
        config.policy = policy;
        Ok(Self {
            cache: Cache::with_config(config)?,
            func,
        })
    }

    /// Memoize `func` behind an existing cache, keeping its policy,
    /// TTL, and callback settings.
    pub fn with_cache(cache: Cache<K, V>, func: F) -> Self {
        Self { cache, func }
    }

    /// Return the cached result for `arg`, computing and storing it on
    /// a miss.
    pub fn call(&mut self, arg: K) -> V {
        if let Some(value) = self.cache.get(&arg) {
            return value.clone();
        }
        let value = (self.func)(&arg);
        self.cache.put(arg, value.clone());
        value
    }

    /// The cache backing this memoization.
    pub fn cache(&self) -> &Cache<K, V> {
        &self.cache
    }

    /// Forget all cached results.
    pub fn clear(&mut self) {
        self.cache.clear();
    }
}
