//! Aggregation result types
//!
//! What a refresh produces for one user: the per-repository language names
//! and the global percentage ranking.

use serde::Serialize;

/// Languages detected in one repository, in upstream order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryLanguages {
    /// Repository name
    pub name: String,
    /// Language names as returned upstream (not sorted)
    pub languages: Vec<String>,
}

impl RepositoryLanguages {
    pub fn new(name: impl Into<String>, languages: Vec<String>) -> Self {
        Self {
            name: name.into(),
            languages,
        }
    }
}

/// A language's share of the user's total code bytes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    /// Language name
    pub name: String,
    /// Percentage in [0, 100], unrounded
    pub percentage: f64,
}

impl LanguageShare {
    pub fn new(name: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: name.into(),
            percentage,
        }
    }
}

/// Result of aggregating every repository of a user.
///
/// `language_shares` is ordered by percentage descending, ties kept in the
/// order the languages were first seen.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregationResult {
    pub repositories: Vec<RepositoryLanguages>,
    pub language_shares: Vec<LanguageShare>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_serialize() {
        let repo = RepositoryLanguages::new("tokio", vec!["Rust".to_string(), "Shell".to_string()]);
        let json = serde_json::to_string(&repo).unwrap();
        assert_eq!(json, r#"{"name":"tokio","languages":["Rust","Shell"]}"#);
    }

    #[test]
    fn test_language_share_serialize() {
        let share = LanguageShare::new("Go", 75.0);
        let json = serde_json::to_string(&share).unwrap();
        assert_eq!(json, r#"{"name":"Go","percentage":75.0}"#);
    }

    #[test]
    fn test_default_result_is_empty() {
        let result = AggregationResult::default();
        assert!(result.repositories.is_empty());
        assert!(result.language_shares.is_empty());
    }
}
