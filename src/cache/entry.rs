//! # A single cache entry.
//!
//! [`CacheEntry`] pairs a value with its insertion time and expiry deadline.
//! Expiry is **lazy**: nothing scans for dead entries, they are discarded by
//! the read or write that trips over them.
//!
//! Timestamps use [`tokio::time::Instant`] so TTL behavior is testable under
//! tokio's paused clock.

use std::time::Duration;

use tokio::time::Instant;

/// One cached value with its lifecycle timestamps.
///
/// Entries are never partially written: a key maps either to a complete
/// `CacheEntry` or to nothing.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Creates an entry inserted `now` and expiring after `ttl`.
    pub fn new(value: V, now: Instant, ttl: Duration) -> Self {
        Self {
            value,
            inserted_at: now,
            expires_at: now + ttl,
        }
    }

    /// The cached value.
    pub fn value(&self) -> &V {
        &self.value
    }

    /// True once the TTL has elapsed.
    pub fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }

    /// Time since insertion.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.inserted_at)
    }

    /// Time until expiry (zero if already expired).
    pub fn remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_inclusive_at_deadline() {
        let now = Instant::now();
        let entry = CacheEntry::new("v", now, Duration::from_millis(100));
        assert!(!entry.is_expired(now));
        assert!(!entry.is_expired(now + Duration::from_millis(99)));
        assert!(entry.is_expired(now + Duration::from_millis(100)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_age_and_remaining() {
        let now = Instant::now();
        let entry = CacheEntry::new(1u8, now, Duration::from_millis(100));
        let later = now + Duration::from_millis(30);
        assert_eq!(entry.age(later), Duration::from_millis(30));
        assert_eq!(entry.remaining(later), Duration::from_millis(70));
        assert_eq!(entry.remaining(now + Duration::from_millis(200)), Duration::ZERO);
    }
}
