//! Upstream Module
//!
//! The code-hosting platform the service reads from, behind the
//! [`UpstreamClient`] trait so the cache and query layers can be driven by
//! any implementation.

mod github;

use async_trait::async_trait;

use crate::error::Result;

pub use crate::aggregate::LanguageBytes;
pub use github::{GitHubClient, GitHubClientConfig};

/// A repository as listed for a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Login of the owning account
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

/// Read access to the upstream platform.
///
/// Implementations map the platform's "quota exhausted" signal to
/// `ServiceError::RateLimited`, an unknown user to
/// `ServiceError::UserNotFound`, and everything else to
/// `ServiceError::Upstream`. No retries happen at this layer.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    /// Lists every repository owned by `user`.
    async fn list_repositories(&self, user: &str) -> Result<Vec<Repository>>;

    /// Returns the language byte counts of one repository, in upstream order.
    async fn get_languages(&self, repository: &Repository) -> Result<LanguageBytes>;
}
