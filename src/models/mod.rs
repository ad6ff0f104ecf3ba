//! Domain and Response models for the language service
//!
//! This module defines the aggregation result types handed out by the
//! service and the DTOs used for serializing HTTP response bodies.

pub mod languages;
pub mod responses;

// Re-export commonly used types
pub use languages::{AggregationResult, LanguageShare, RepositoryLanguages};
pub use responses::{ErrorResponse, EvictResponse, HealthResponse, StatsResponse};
