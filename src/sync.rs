//! Coarse-grained thread-safe wrapper.
//!
//! The core [`Cache`] is single-threaded by design. When an instance
//! must be shared, the sanctioned model is one per-instance lock held
//! for the full duration of every operation — nothing finer.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{Cache, CacheKey};
use crate::config::CacheConfig;
use crate::counters::OpCounters;
use crate::error::CacheResult;

/// A [`Cache`] behind a single mutex, cloneable across threads.
///
/// Lookups clone the value out while the lock is held, so no reference
/// into the cache ever escapes the critical section.
pub struct SharedCache<K, V> {
    inner: Arc<Mutex<Cache<K, V>>>,
}

impl<K: CacheKey, V: Clone> SharedCache<K, V> {
    pub fn with_config(config: CacheConfig) -> CacheResult<Self> {
        Ok(Self::from_cache(Cache::with_config(config)?))
    }

    /// Wrap an already-configured cache.
    pub fn from_cache(cache: Cache<K, V>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(cache)),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    pub fn put(&self, key: K, value: V) {
        self.inner.lock().put(key, value);
    }

    pub fn put_with_ttl(&self, key: K, value: V, ttl: Option<Duration>) {
        self.inner.lock().put_with_ttl(key, value, ttl);
    }

    pub fn delete(&self, key: &K) -> bool {
        self.inner.lock().delete(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn counters(&self) -> OpCounters {
        self.inner.lock().counters()
    }
}

impl<K, V> Clone for SharedCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
