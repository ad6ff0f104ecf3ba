//! Response DTOs for the language service API
//!
//! Defines the structure of outgoing HTTP response bodies. Query results
//! are serialized straight from the domain types in `languages`.

use serde::Serialize;

use crate::cache::CacheStats;

/// Response body for the eviction operation (DELETE /cache/:user)
#[derive(Debug, Clone, Serialize)]
pub struct EvictResponse {
    /// Success message
    pub message: String,
    /// The user whose entry was evicted
    pub user: String,
}

impl EvictResponse {
    /// Creates a new EvictResponse
    pub fn new(user: impl Into<String>) -> Self {
        let user = user.into();
        Self {
            message: format!("Cached entry for '{}' evicted", user),
            user,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Lookups answered from a fresh entry
    pub hits: u64,
    /// Lookups that needed a refresh (started or joined)
    pub misses: u64,
    /// Misses that joined a refresh already in flight
    pub coalesced: u64,
    /// Refreshes started
    pub refreshes: u64,
    /// Refreshes that ended in an error
    pub failed_refreshes: u64,
    /// Failed refreshes answered with the previous value
    pub stale_served: u64,
    /// Entries evicted by the size bound or explicitly
    pub evictions: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Refreshes currently running
    pub in_flight: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl From<CacheStats> for StatsResponse {
    fn from(stats: CacheStats) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            coalesced: stats.coalesced,
            refreshes: stats.refreshes,
            failed_refreshes: stats.failed_refreshes,
            stale_served: stats.stale_served,
            evictions: stats.evictions,
            total_entries: stats.total_entries,
            in_flight: stats.in_flight,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evict_response_serialize() {
        let resp = EvictResponse::new("octocat");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("octocat"));
        assert!(json.contains("evicted"));
    }

    #[test]
    fn test_stats_response_hit_rate() {
        let stats = CacheStats {
            hits: 80,
            misses: 20,
            ..CacheStats::default()
        };
        let resp = StatsResponse::from(stats);
        assert!((resp.hit_rate - 0.8).abs() < 0.001);
    }

    #[test]
    fn test_stats_response_zero_requests() {
        let resp = StatsResponse::from(CacheStats::new());
        assert_eq!(resp.hit_rate, 0.0);
        assert_eq!(resp.in_flight, 0);
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }

    #[test]
    fn test_error_response_serialize() {
        let resp = ErrorResponse::new("Something went wrong");
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"error":"Something went wrong"}"#);
    }
}
