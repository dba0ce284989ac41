//! Quality signals (spec §4.3.8): `wordCount`, `uniqueWordCount`, and a
//! `relevanceScore` against the run's query tokens. Reuses the exact
//! tokenization rules from the query normalizer (spec §4.1, §9 "provider
//! query dialects belong in the normalizer") so body and query tokens
//! share one vocabulary.

use retrieval_common::QualitySignals;
use retrieval_query::tokenize_body;
use std::collections::HashSet;

/// Compute quality signals for an article body against the run's query
/// tokens (spec §4.3.8).
pub fn compute_quality(body: &str, query_tokens: &[String]) -> QualitySignals {
    let tokens = tokenize_body(body);
    let word_count = tokens.len();

    let unique: HashSet<&String> = tokens.iter().collect();
    let unique_word_count = unique.len();

    let relevance_score = if query_tokens.is_empty() {
        0.0
    } else {
        let hits = query_tokens.iter().filter(|qt| unique.contains(qt)).count();
        round3(hits as f64 / query_tokens.len() as f64)
    };

    QualitySignals { word_count, unique_word_count, relevance_score }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
