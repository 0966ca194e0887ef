//! # cachekit
//!
//! Bounded in-memory key/value caching with pluggable eviction
//! policies: FIFO, LRU, CLOCK, and S3-FIFO behind one interface.
//!
//! A cache holds at most `capacity` objects. `put` inserts or updates,
//! `get` serves resident values, and once the cache is full the
//! configured policy picks the victims. Entries may carry a TTL;
//! expiry is lazy, observed only when an expired entry is next read.
//!
//! ```
//! use cachekit::{Cache, EvictionPolicy};
//!
//! let mut cache = Cache::new(EvictionPolicy::Lru, 2).unwrap();
//! cache.put("a", 1);
//! cache.put("b", 2);
//! cache.get(&"a");
//! cache.put("c", 3); // "b" was least recently used
//! assert!(cache.contains(&"a"));
//! assert!(!cache.contains(&"b"));
//! ```
//!
//! Policies can also be picked by name, e.g. from configuration:
//!
//! ```
//! use cachekit::EvictionPolicy;
//!
//! let policy: EvictionPolicy = "S3FIFO".parse().unwrap();
//! assert_eq!(policy, EvictionPolicy::S3Fifo);
//! ```

#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod counters;
pub mod error;
pub mod expiry;
pub mod memo;
pub mod sync;
pub mod trace;

pub use cache::{Cache, CacheKey, EvictionCallback, Iter};
pub use config::{CacheBuilder, CacheConfig, EvictionPolicy};
pub use counters::OpCounters;
pub use error::{CacheError, CacheResult};
pub use expiry::Expiry;
pub use memo::Memo;
pub use sync::SharedCache;
