//! API Handlers
//!
//! HTTP request handlers for each language service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::error::{Result, ServiceError};
use crate::models::{
    EvictResponse, HealthResponse, LanguageShare, RepositoryLanguages, StatsResponse,
};
use crate::service::LanguageService;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The query service, shared by every request
    pub service: Arc<LanguageService>,
}

impl AppState {
    pub fn new(service: LanguageService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Builds the GitHub client and cache store from the Config.
    pub fn from_config(config: &crate::config::Config) -> anyhow::Result<Self> {
        Ok(Self::new(LanguageService::from_config(config)?))
    }
}

/// Handler for GET /repositories/:user
///
/// Lists the user's repositories with the languages of each.
pub async fn repositories_handler(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Vec<RepositoryLanguages>>> {
    Ok(Json(state.service.repositories(&user).await?))
}

/// Handler for GET /languages/:user
///
/// Returns the user's language shares, highest first.
pub async fn languages_handler(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Vec<LanguageShare>>> {
    Ok(Json(state.service.languages(&user).await?))
}

/// Handler for DELETE /cache/:user
///
/// Drops the cached entry for a user so the next query refetches.
pub async fn evict_handler(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<EvictResponse>> {
    if state.service.store().evict(&user) {
        Ok(Json(EvictResponse::new(user)))
    } else {
        Err(ServiceError::UserNotFound(format!("{} (not cached)", user)))
    }
}

/// Handler for GET /stats
///
/// Returns current cache statistics.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse::from(state.service.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
