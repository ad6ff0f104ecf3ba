//! Aggregator Module
//!
//! Turns the per-repository language byte counts fetched upstream into an
//! [`AggregationResult`]. Pure and deterministic, no I/O.

use std::collections::HashMap;

use crate::models::{AggregationResult, LanguageShare, RepositoryLanguages};

/// Language name to byte count, in the order upstream returned it.
pub type LanguageBytes = Vec<(String, u64)>;

// == Aggregate ==
/// Aggregates the language breakdown of every repository of a user.
///
/// Each repository keeps only its language names, in input order. Byte
/// counts are summed per language across all repositories and converted to
/// percentages of the grand total, sorted descending. The sort is stable, so
/// languages with equal percentages stay in first-seen order.
///
/// When no bytes were recorded at all the share list is empty.
pub fn aggregate(per_repository: &[(String, LanguageBytes)]) -> AggregationResult {
    let mut repositories = Vec::with_capacity(per_repository.len());
    // (language, total bytes) in first-seen order, indexed by name
    let mut totals: Vec<(&str, u128)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for (name, languages) in per_repository {
        repositories.push(RepositoryLanguages::new(
            name.clone(),
            languages.iter().map(|(language, _)| language.clone()).collect(),
        ));

        for (language, bytes) in languages {
            let slot = *index.entry(language.as_str()).or_insert_with(|| {
                totals.push((language.as_str(), 0));
                totals.len() - 1
            });
            totals[slot].1 += u128::from(*bytes);
        }
    }

    let grand_total: u128 = totals.iter().map(|(_, bytes)| bytes).sum();
    if grand_total == 0 {
        return AggregationResult {
            repositories,
            language_shares: Vec::new(),
        };
    }

    let mut language_shares: Vec<LanguageShare> = totals
        .into_iter()
        .map(|(language, bytes)| {
            LanguageShare::new(language, 100.0 * bytes as f64 / grand_total as f64)
        })
        .collect();
    // sort_by is stable: ties keep first-seen order
    language_shares.sort_by(|a, b| b.percentage.total_cmp(&a.percentage));

    AggregationResult {
        repositories,
        language_shares,
    }
}
