//! Cache configuration and policy selection.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{Cache, CacheKey, EvictionCallback};
use crate::error::{CacheError, CacheResult};

/// The eviction policy a cache enforces when it is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EvictionPolicy {
    /// Evict in insertion order; accesses do not affect ordering.
    Fifo,
    /// Evict the least recently used entry.
    #[default]
    Lru,
    /// One-bit LRU approximation over a fixed ring of slots.
    Clock,
    /// Three-queue FIFO with ghost-based re-admission.
    S3Fifo,
}

impl EvictionPolicy {
    /// Canonical policy name, as accepted by [`FromStr`].
    pub fn name(&self) -> &'static str {
        match self {
            EvictionPolicy::Fifo => "FIFO",
            EvictionPolicy::Lru => "LRU",
            EvictionPolicy::Clock => "CLOCK",
            EvictionPolicy::S3Fifo => "S3FIFO",
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FIFO" => Ok(EvictionPolicy::Fifo),
            "LRU" => Ok(EvictionPolicy::Lru),
            "CLOCK" => Ok(EvictionPolicy::Clock),
            "S3FIFO" => Ok(EvictionPolicy::S3Fifo),
            _ => Err(CacheError::InvalidPolicy(s.to_string())),
        }
    }
}

/// Construction parameters for a [`Cache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Capacity in objects. Must be positive.
    pub capacity: usize,
    /// Eviction policy.
    pub policy: EvictionPolicy,
    /// TTL applied when `put` is called without one. `None` means
    /// entries never expire by default.
    pub default_ttl: Option<Duration>,
    /// Fraction of the capacity assigned to the S3-FIFO small queue;
    /// the main queue takes the remainder. Ignored by other policies.
    pub small_queue_ratio: f64,
    /// Minimum access count for promotion from the S3-FIFO small queue
    /// to the main queue. Ignored by other policies.
    pub promotion_threshold: u8,
    /// Flash tier size in MB. This cache is DRAM-only; any non-zero
    /// value fails validation.
    pub flash_size_mb: u64,
    /// Path to a flash-tier file. Rejected like `flash_size_mb`.
    pub flash_path: Option<PathBuf>,
}

impl CacheConfig {
    /// Configuration with the given capacity and default settings.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            policy: EvictionPolicy::default(),
            default_ttl: None,
            small_queue_ratio: 0.1,
            promotion_threshold: 1,
            flash_size_mb: 0,
            flash_path: None,
        }
    }

    /// Check the configuration before a cache is built from it.
    pub fn validate(&self) -> CacheResult<()> {
        if self.capacity == 0 {
            return Err(CacheError::InvalidCapacity(self.capacity));
        }
        if self.flash_size_mb > 0 || self.flash_path.is_some() {
            return Err(CacheError::FlashUnsupported);
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(1024)
    }
}

/// Fluent constructor for a [`Cache`].
///
/// ```
/// use cachekit::{CacheBuilder, EvictionPolicy};
///
/// let mut cache = CacheBuilder::<u64, String>::new(128)
///     .policy(EvictionPolicy::S3Fifo)
///     .build()
///     .unwrap();
/// cache.put(1, "one".to_string());
/// ```
pub struct CacheBuilder<K, V> {
    config: CacheConfig,
    callback: Option<EvictionCallback<K, V>>,
}

impl<K: CacheKey + 'static, V: 'static> CacheBuilder<K, V> {
    /// Start building a cache with the given capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            config: CacheConfig::new(capacity),
            callback: None,
        }
    }

    /// Select the eviction policy.
    pub fn policy(mut self, policy: EvictionPolicy) -> Self {
        self.config.policy = policy;
        self
    }

    /// Default TTL applied to entries stored without one.
    pub fn default_ttl(mut self, ttl: Duration) -> Self {
        self.config.default_ttl = Some(ttl);
        self
    }

    /// Fraction of the capacity assigned to the S3-FIFO small queue.
    pub fn small_queue_ratio(mut self, ratio: f64) -> Self {
        self.config.small_queue_ratio = ratio;
        self
    }

    /// Minimum access count for S3-FIFO small-to-main promotion.
    pub fn promotion_threshold(mut self, threshold: u8) -> Self {
        self.config.promotion_threshold = threshold;
        self
    }

    /// Callback invoked with each evicted `(key, value)` pair.
    pub fn eviction_callback(mut self, callback: impl FnMut(&K, &V) + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Build the cache, validating the accumulated configuration.
    pub fn build(self) -> CacheResult<Cache<K, V>> {
        let mut cache = Cache::with_config(self.config)?;
        if let Some(callback) = self.callback {
            cache.set_eviction_callback(callback);
        }
        Ok(cache)
    }
}

impl<K, V> fmt::Debug for CacheBuilder<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheBuilder")
            .field("config", &self.config)
            .field("callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_names_round_trip() {
        for policy in [
            EvictionPolicy::Fifo,
            EvictionPolicy::Lru,
            EvictionPolicy::Clock,
            EvictionPolicy::S3Fifo,
        ] {
            assert_eq!(policy.name().parse::<EvictionPolicy>(), Ok(policy));
        }
    }

    #[test]
    fn test_policy_parse_is_case_insensitive() {
        assert_eq!("s3fifo".parse::<EvictionPolicy>(), Ok(EvictionPolicy::S3Fifo));
        assert_eq!("Clock".parse::<EvictionPolicy>(), Ok(EvictionPolicy::Clock));
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        assert_eq!(
            "SIEVE".parse::<EvictionPolicy>(),
            Err(CacheError::InvalidPolicy("SIEVE".to_string()))
        );
    }

    #[test]
    fn test_zero_capacity_is_rejected() {
        assert_eq!(
            CacheConfig::new(0).validate(),
            Err(CacheError::InvalidCapacity(0))
        );
    }

    #[test]
    fn test_flash_options_are_rejected() {
        let mut config = CacheConfig::new(100);
        config.flash_size_mb = 512;
        assert_eq!(config.validate(), Err(CacheError::FlashUnsupported));

        let mut config = CacheConfig::new(100);
        config.flash_path = Some(PathBuf::from("/tmp/flash.bin"));
        assert_eq!(config.validate(), Err(CacheError::FlashUnsupported));
    }

    #[test]
    fn test_builder_applies_settings() {
        let cache = CacheBuilder::<u64, u64>::new(64)
            .policy(EvictionPolicy::Clock)
            .default_ttl(Duration::from_secs(30))
            .build()
            .unwrap();
        assert_eq!(cache.capacity(), 64);
        assert_eq!(cache.policy(), EvictionPolicy::Clock);
        assert_eq!(cache.default_ttl(), Some(Duration::from_secs(30)));
    }
}
