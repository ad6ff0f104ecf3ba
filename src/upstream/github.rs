//! GitHub Client
//!
//! [`UpstreamClient`] over the GitHub REST API.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderValue},
    Client, Response, StatusCode, Url,
};
use serde::Deserialize;
use tracing::{debug, warn};

use super::{LanguageBytes, Repository, UpstreamClient};
use crate::config::{Config, DEFAULT_GITHUB_API_URL};
use crate::error::{Result, ServiceError};

/// Page size requested when listing repositories (GitHub's maximum).
const PER_PAGE: usize = 100;

/// Configuration for [`GitHubClient`].
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// API base URL, e.g. `https://api.github.com`
    pub base_url: String,
    /// Sent as User-Agent on every request
    pub user_agent: String,
    /// Optional bearer token; anonymous requests when absent
    pub token: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GitHubClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GITHUB_API_URL.to_string(),
            user_agent: "repo-languages".to_string(),
            token: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for GitHubClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.github_api_url.clone(),
            user_agent: config.user_agent.clone(),
            token: config.github_token.clone(),
            timeout: config.upstream_timeout(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RepositoryDto {
    name: String,
    owner: OwnerDto,
}

#[derive(Debug, Deserialize)]
struct OwnerDto {
    login: String,
}

/// GitHub REST API client.
///
/// Credentials and client identification are fixed at construction and sent
/// as default headers, never per call.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    base_url: Url,
}

impl GitHubClient {
    /// Builds a client from the given configuration.
    pub fn new(config: GitHubClientConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .with_context(|| format!("Invalid GitHub API URL: {}", config.base_url))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("GitHub API URL cannot be used as a base: {}", config.base_url);
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .context("GitHub token contains invalid header characters")?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let http = Client::builder()
            .user_agent(config.user_agent)
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { http, base_url })
    }

    /// Base URL joined with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // cannot_be_a_base was rejected in new(), so path_segments_mut succeeds
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get(&self, url: Url) -> Result<Response> {
        debug!("GET {}", url);
        let response = self.http.get(url).send().await?;
        match rate_limit_error(response.status(), response.headers()) {
            Some(err) => {
                warn!("GitHub rate limit hit: {}", err);
                Err(err)
            }
            None => Ok(response),
        }
    }
}

/// Classifies a response as a rate-limit signal.
///
/// GitHub answers 429, or 403 with `x-ratelimit-remaining: 0`, once the
/// quota is exhausted.
fn rate_limit_error(status: StatusCode, headers: &HeaderMap) -> Option<ServiceError> {
    let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
    let exhausted = header("x-ratelimit-remaining") == Some("0");

    if status == StatusCode::TOO_MANY_REQUESTS || (status == StatusCode::FORBIDDEN && exhausted) {
        let detail = match (header("x-ratelimit-reset"), header("retry-after")) {
            (Some(reset), _) => format!("quota exhausted, resets at epoch {}", reset),
            (None, Some(after)) => format!("retry after {} seconds", after),
            (None, None) => "quota exhausted".to_string(),
        };
        return Some(ServiceError::RateLimited(detail));
    }
    None
}

async fn unexpected_status(response: Response, what: &str) -> ServiceError {
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());
    ServiceError::Upstream(format!("{} returned HTTP {}: {}", what, status, body))
}

#[async_trait]
impl UpstreamClient for GitHubClient {
    async fn list_repositories(&self, user: &str) -> Result<Vec<Repository>> {
        let mut repositories = Vec::new();

        for page in 1.. {
            let mut url = self.endpoint(&["users", user, "repos"]);
            url.query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());

            let response = self.get(url).await?;
            match response.status() {
                status if status.is_success() => {}
                StatusCode::NOT_FOUND => return Err(ServiceError::UserNotFound(user.to_string())),
                _ => return Err(unexpected_status(response, "repository listing").await),
            }

            let batch: Vec<RepositoryDto> = response.json().await?;
            let last_page = batch.len() < PER_PAGE;
            repositories.extend(
                batch
                    .into_iter()
                    .map(|dto| Repository::new(dto.owner.login, dto.name)),
            );
            if last_page {
                break;
            }
        }

        debug!("Listed {} repositories for {}", repositories.len(), user);
        Ok(repositories)
    }

    async fn get_languages(&self, repository: &Repository) -> Result<LanguageBytes> {
        let url = self.endpoint(&["repos", &repository.owner, &repository.name, "languages"]);
        let response = self.get(url).await?;
        if !response.status().is_success() {
            let what = format!("languages of {}/{}", repository.owner, repository.name);
            return Err(unexpected_status(response, &what).await);
        }

        // serde_json is built with preserve_order, so keys keep upstream order
        let body: serde_json::Map<String, serde_json::Value> = response.json().await?;
        body.into_iter()
            .map(|(language, bytes)| match bytes.as_u64() {
                Some(bytes) => Ok((language, bytes)),
                None => Err(ServiceError::Upstream(format!(
                    "non-numeric byte count for {} in {}/{}",
                    language, repository.owner, repository.name
                ))),
            })
            .collect()
    }
}
