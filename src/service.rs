//! Language Service
//!
//! The query surface: repositories and language shares of a user, served
//! from the cache and refreshed from upstream when missing or stale.

use std::sync::Arc;

use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::time::Instant;
use tracing::info;

use crate::aggregate::{aggregate, LanguageBytes};
use crate::cache::{CacheStats, CacheStore};
use crate::config::Config;
use crate::error::{Result, ServiceError};
use crate::models::{AggregationResult, LanguageShare, RepositoryLanguages};
use crate::upstream::{GitHubClient, GitHubClientConfig, UpstreamClient};

/// Default number of per-repository language calls run at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Answers per-user repository and language queries.
///
/// Created once and shared by reference across concurrent callers.
pub struct LanguageService {
    store: CacheStore,
    client: Arc<dyn UpstreamClient>,
    concurrency: usize,
}

impl LanguageService {
    pub fn new(client: Arc<dyn UpstreamClient>, store: CacheStore) -> Self {
        Self {
            store,
            client,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Limits how many language calls one refresh issues concurrently.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Builds the service against GitHub from configuration.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = GitHubClient::new(GitHubClientConfig::from(config))?;
        let store = CacheStore::new(config.cache_ttl(), config.max_entries)
            .with_stale_fallback(config.serve_stale_on_error);
        Ok(Self::new(Arc::new(client), store).with_concurrency(config.upstream_concurrency))
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    // == Summary ==
    /// Returns the cached aggregation for `user`, refreshing it if needed.
    ///
    /// Concurrent calls for the same user share one upstream fetch sequence.
    pub async fn summary(&self, user: &str) -> Result<Arc<AggregationResult>> {
        if user.trim().is_empty() {
            return Err(ServiceError::InvalidRequest(
                "User cannot be empty".to_string(),
            ));
        }

        let client = Arc::clone(&self.client);
        let owned = user.to_string();
        let concurrency = self.concurrency;
        self.store
            .refresh(user, Instant::now(), move || {
                fetch_and_aggregate(client, owned, concurrency)
            })
            .await
    }

    // == Repositories ==
    /// Repositories of `user` with the languages found in each.
    pub async fn repositories(&self, user: &str) -> Result<Vec<RepositoryLanguages>> {
        Ok(self.summary(user).await?.repositories.clone())
    }

    // == Languages ==
    /// Language shares of `user`, highest percentage first.
    pub async fn languages(&self, user: &str) -> Result<Vec<LanguageShare>> {
        Ok(self.summary(user).await?.language_shares.clone())
    }
}

/// One full refresh: list the user's repositories, fetch each one's
/// languages (bounded concurrency, order preserved), then aggregate.
async fn fetch_and_aggregate(
    client: Arc<dyn UpstreamClient>,
    user: String,
    concurrency: usize,
) -> Result<AggregationResult> {
    let repositories = client.list_repositories(&user).await?;
    info!(
        "Fetching languages of {} repositories for {}",
        repositories.len(),
        user
    );

    let per_repository: Vec<(String, LanguageBytes)> = stream::iter(repositories)
        .map(|repository| {
            let client = Arc::clone(&client);
            async move {
                client
                    .get_languages(&repository)
                    .await
                    .map(|languages| (repository.name, languages))
            }
        })
        .buffered(concurrency)
        .try_collect()
        .await?;

    Ok(aggregate(&per_repository))
}
