//! Error types for cache construction and access.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors surfaced by cache construction and the strict accessors.
///
/// Every error is returned synchronously to the caller of the offending
/// operation; a lazy TTL expiry is a silent miss, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    /// The policy name handed to the constructor is not one of the
    /// supported policies.
    #[error("unknown eviction policy {0:?}")]
    InvalidPolicy(String),

    /// Capacity must be a positive number of objects.
    #[error("cache capacity must be positive, got {0}")]
    InvalidCapacity(usize),

    /// Flash-tier options were set on a DRAM-only cache.
    #[error("flash-backed caching is not supported")]
    FlashUnsupported,

    /// Strict lookup of a key that is absent or expired.
    #[error("key not found")]
    KeyNotFound,
}
