//! Cache Module
//!
//! Per-user cache of aggregation results with TTL expiration, LRU eviction
//! and single-flight refreshes.

mod entry;
mod lru;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;
