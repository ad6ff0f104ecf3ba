//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Result};

/// Default GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// Longest accepted cache TTL: one year.
pub const MAX_CACHE_TTL_MINUTES: u64 = 365 * 24 * 60;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache TTL in minutes
    pub cache_ttl_minutes: u64,
    /// Maximum number of cached users, 0 means unbounded
    pub max_entries: usize,
    /// Return the previous value when a refresh of a stale entry fails
    pub serve_stale_on_error: bool,
    /// Upstream API base URL
    pub github_api_url: String,
    /// Client identification string sent as User-Agent
    pub user_agent: String,
    /// Optional bearer token for upstream calls
    pub github_token: Option<String>,
    /// Max concurrent per-repository language calls during one refresh
    pub upstream_concurrency: usize,
    /// Per-request upstream timeout in seconds
    pub upstream_timeout_secs: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_TTL_MINUTES` - Cache TTL in minutes, at most one year (default: 60)
    /// - `MAX_ENTRIES` - Maximum cached users, 0 = unbounded (default: 10000)
    /// - `SERVE_STALE_ON_ERROR` - Serve stale data on refresh failure, accepts 1/0, true/false, yes/no, on/off (default: false)
    /// - `GITHUB_API_URL` - Upstream base URL (default: https://api.github.com)
    /// - `GITHUB_USER_AGENT` - Client identification (default: repo-languages)
    /// - `GITHUB_TOKEN` - Optional access token (default: unset)
    /// - `UPSTREAM_CONCURRENCY` - Parallel language calls per refresh (default: 4)
    /// - `UPSTREAM_TIMEOUT_SECS` - Upstream request timeout (default: 30)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_ttl_minutes: parse_var("CACHE_TTL_MINUTES").unwrap_or(defaults.cache_ttl_minutes),
            max_entries: parse_var("MAX_ENTRIES").unwrap_or(defaults.max_entries),
            serve_stale_on_error: env::var("SERVE_STALE_ON_ERROR")
                .ok()
                .and_then(|value| parse_flag(&value))
                .unwrap_or(defaults.serve_stale_on_error),
            github_api_url: env::var("GITHUB_API_URL").unwrap_or(defaults.github_api_url),
            user_agent: env::var("GITHUB_USER_AGENT").unwrap_or(defaults.user_agent),
            github_token: env::var("GITHUB_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            upstream_concurrency: parse_var("UPSTREAM_CONCURRENCY")
                .unwrap_or(defaults.upstream_concurrency),
            upstream_timeout_secs: parse_var("UPSTREAM_TIMEOUT_SECS")
                .unwrap_or(defaults.upstream_timeout_secs),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            cleanup_interval: parse_var("CLEANUP_INTERVAL").unwrap_or(defaults.cleanup_interval),
        }
    }

    /// Rejects values the service cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl_minutes == 0 {
            bail!("CACHE_TTL_MINUTES must be greater than 0");
        }
        if self.cache_ttl_minutes > MAX_CACHE_TTL_MINUTES {
            bail!(
                "CACHE_TTL_MINUTES must be at most {} (one year)",
                MAX_CACHE_TTL_MINUTES
            );
        }
        if self.upstream_concurrency == 0 {
            bail!("UPSTREAM_CONCURRENCY must be at least 1");
        }
        if self.user_agent.trim().is_empty() {
            bail!("GITHUB_USER_AGENT must not be empty");
        }
        if self.cleanup_interval == 0 {
            bail!("CLEANUP_INTERVAL must be greater than 0");
        }
        Ok(())
    }

    /// Cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_minutes.saturating_mul(60))
    }

    /// Upstream request timeout as a Duration.
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_ttl_minutes: 60,
            max_entries: 10_000,
            serve_stale_on_error: false,
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            user_agent: "repo-languages".to_string(),
            github_token: None,
            upstream_concurrency: 4,
            upstream_timeout_secs: 30,
            server_port: 3000,
            cleanup_interval: 60,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Parses the usual spellings of an on/off switch, case-insensitively.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.cache_ttl_minutes, 60);
        assert_eq!(config.max_entries, 10_000);
        assert!(!config.serve_stale_on_error);
        assert_eq!(config.github_api_url, DEFAULT_GITHUB_API_URL);
        assert!(config.github_token.is_none());
        assert_eq!(config.upstream_concurrency, 4);
        assert_eq!(config.server_port, 3000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_ttl_is_minutes() {
        let config = Config {
            cache_ttl_minutes: 5,
            ..Config::default()
        };
        assert_eq!(config.cache_ttl(), Duration::from_secs(300));
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let config = Config {
            cache_ttl_minutes: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_ttl_beyond_one_year() {
        let config = Config {
            cache_ttl_minutes: u64::MAX / 60,
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let config = Config {
            cache_ttl_minutes: MAX_CACHE_TTL_MINUTES,
            ..Config::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_cache_ttl_saturates() {
        let config = Config {
            cache_ttl_minutes: u64::MAX,
            ..Config::default()
        };
        assert_eq!(config.cache_ttl(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn test_parse_flag_spellings() {
        for value in ["1", "true", "TRUE", "yes", "On", " true "] {
            assert_eq!(parse_flag(value), Some(true), "{value}");
        }
        for value in ["0", "false", "No", "off"] {
            assert_eq!(parse_flag(value), Some(false), "{value}");
        }
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
    }

    #[test]
    fn test_validate_rejects_zero_concurrency() {
        let config = Config {
            upstream_concurrency: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_blank_user_agent() {
        let config = Config {
            user_agent: "   ".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "CACHE_TTL_MINUTES",
            "MAX_ENTRIES",
            "SERVE_STALE_ON_ERROR",
            "GITHUB_API_URL",
            "GITHUB_USER_AGENT",
            "GITHUB_TOKEN",
            "UPSTREAM_CONCURRENCY",
            "UPSTREAM_TIMEOUT_SECS",
            "SERVER_PORT",
            "CLEANUP_INTERVAL",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.cache_ttl_minutes, 60);
        assert_eq!(config.max_entries, 10_000);
        assert_eq!(config.user_agent, "repo-languages");
        assert!(config.github_token.is_none());
        assert_eq!(config.cleanup_interval, 60);
    }
}
