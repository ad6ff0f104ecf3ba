//! Cache Entry Module
//!
//! Defines a cached aggregation result together with its expiry.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::Instant;

use crate::models::AggregationResult;

/// Expiry used when `now + ttl` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

// == Cache Entry ==
/// A completed refresh for one user.
///
/// Cloning is cheap and yields an immutable snapshot: the result itself is
/// shared behind an `Arc`.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The user identifier this entry belongs to
    pub key: String,
    /// The aggregated result
    pub value: Arc<AggregationResult>,
    /// Wall-clock creation time, for diagnostics
    pub created_at: DateTime<Utc>,
    /// Monotonic instant at which the entry turns stale
    pub expires_at: Instant,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates an entry that stays fresh for `ttl` after `now`.
    ///
    /// A `ttl` too large to add to `now` is capped at roughly a century.
    pub fn new(key: impl Into<String>, value: Arc<AggregationResult>, now: Instant, ttl: Duration) -> Self {
        let expires_at = now
            .checked_add(ttl)
            .or_else(|| now.checked_add(FAR_FUTURE))
            .unwrap_or(now);
        Self {
            key: key.into(),
            value,
            created_at: Utc::now(),
            expires_at,
        }
    }

    // == Freshness ==
    /// An entry is fresh strictly before its expiry instant; at or after
    /// `expires_at` it is stale.
    pub fn is_fresh(&self, now: Instant) -> bool {
        now < self.expires_at
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        !self.is_fresh(now)
    }

    // == Time To Live ==
    /// Remaining freshness, zero once stale.
    pub fn ttl_remaining(&self, now: Instant) -> Duration {
        self.expires_at.saturating_duration_since(now)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn entry(now: Instant, ttl: Duration) -> CacheEntry {
        CacheEntry::new("octocat", Arc::new(AggregationResult::default()), now, ttl)
    }

    #[test]
    fn test_entry_fresh_before_expiry() {
        let now = Instant::now();
        let entry = entry(now, Duration::from_secs(60));

        assert_eq!(entry.key, "octocat");
        assert!(entry.is_fresh(now));
        assert!(entry.is_fresh(now + Duration::from_secs(59)));
    }

    #[test]
    fn test_entry_stale_at_boundary() {
        let now = Instant::now();
        let entry = entry(now, Duration::from_secs(60));

        // Exactly at expires_at the entry is stale
        assert!(entry.is_stale(now + Duration::from_secs(60)));
        assert!(entry.is_stale(now + Duration::from_secs(3600)));
    }

    #[test]
    fn test_unrepresentable_ttl_is_capped() {
        let now = Instant::now();
        let entry = entry(now, Duration::MAX);

        assert!(entry.is_fresh(now));
        assert!(entry.is_fresh(now + Duration::from_secs(10 * 365 * 24 * 60 * 60)));
    }

    #[test]
    fn test_ttl_remaining() {
        let now = Instant::now();
        let entry = entry(now, Duration::from_secs(10));

        assert_eq!(entry.ttl_remaining(now), Duration::from_secs(10));
        assert_eq!(entry.ttl_remaining(now + Duration::from_secs(4)), Duration::from_secs(6));
        assert_eq!(entry.ttl_remaining(now + Duration::from_secs(30)), Duration::ZERO);
    }

    #[test]
    fn test_clone_shares_value() {
        let entry = entry(Instant::now(), Duration::from_secs(10));
        let snapshot = entry.clone();
        assert!(Arc::ptr_eq(&entry.value, &snapshot.value));
    }
}
