//! Cache Statistics Module
//!
//! Tracks cache performance metrics including hits, misses, and refreshes.

use serde::Serialize;

// == Cache Stats ==
/// Tracks cache performance metrics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups that found no fresh entry
    pub misses: u64,
    /// Misses that joined a refresh already in flight
    pub coalesced: u64,
    /// Refreshes started
    pub refreshes: u64,
    /// Refreshes that ended in an error
    pub failed_refreshes: u64,
    /// Failed refreshes answered with the previous value
    pub stale_served: u64,
    /// Entries removed by the size bound or explicit eviction
    pub evictions: u64,
    /// Current number of entries in the cache
    pub total_entries: usize,
    /// Refreshes currently running
    pub in_flight: usize,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_coalesced(&mut self) {
        self.coalesced += 1;
    }

    pub fn record_refresh(&mut self) {
        self.refreshes += 1;
    }

    pub fn record_failed_refresh(&mut self) {
        self.failed_refreshes += 1;
    }

    pub fn record_stale_served(&mut self) {
        self.stale_served += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }
}
