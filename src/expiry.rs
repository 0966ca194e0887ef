//! Entry expiration deadlines.

use std::time::{Duration, Instant};

/// Absolute expiry deadline of a cache entry.
///
/// An entry stored without a TTL has no deadline at all (`Never`)
/// rather than a far-future timestamp, so clock arithmetic can never
/// overflow into accidental expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The entry never expires.
    Never,
    /// The entry expires once the clock passes this instant.
    At(Instant),
}

impl Expiry {
    /// Deadline for an entry inserted at `now` with an optional TTL.
    pub fn from_ttl(now: Instant, ttl: Option<Duration>) -> Self {
        match ttl {
            Some(ttl) => Expiry::At(now + ttl),
            None => Expiry::Never,
        }
    }

    /// Whether the deadline has passed. The comparison is strict: an
    /// entry observed exactly at its deadline is still alive.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self {
            Expiry::Never => false,
            Expiry::At(deadline) => *deadline < now,
        }
    }
}
