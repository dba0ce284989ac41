//! Canonical-URL dedupe and optional similarity dedupe (spec §4.5,
//! testable property §8.4: `unique(unique(xs)) == unique(xs)` and no two
//! survivors share a lowercased canonical URL).

use retrieval_common::NormalizedArticle;
use std::collections::HashSet;

use crate::similarity::{jaccard, text_for_similarity};

/// Collapse a lowercased-canonical-URL duplicate onto its first occurrence.
pub fn dedupe_by_canonical_url(articles: Vec<NormalizedArticle>) -> Vec<NormalizedArticle> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for article in articles {
        let key = article.canonical_url.to_lowercase();
        if seen.insert(key) {
            out.push(article);
        }
    }
    out
}

/// Similarity-based dedupe over the title+excerpt prefix (spec §4.5),
/// configurable and off by default inside the orchestrator.
pub fn dedupe_by_similarity(articles: Vec<NormalizedArticle>, threshold: f64) -> Vec<NormalizedArticle> {
    let mut kept: Vec<NormalizedArticle> = Vec::new();
    let mut kept_texts: Vec<String> = Vec::new();

    'outer: for article in articles {
        let text = text_for_similarity(&article);
        for existing_text in &kept_texts {
            if jaccard(&text, existing_text) >= threshold {
                continue 'outer;
            }
        }
        kept_texts.push(text);
        kept.push(article);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrieval_common::{Provenance, Provider, QualitySignals};

    fn article(url: &str, excerpt: &str) -> NormalizedArticle {
        NormalizedArticle {
            id: url.to_string(),
            title: "A story".to_string(),
            canonical_url: url.to_string(),
            source_host: "example.com".to_string(),
            source_name: None,
            published_at: None,
            published_at_inferred: false,
            modified_at: None,
            excerpt: excerpt.to_string(),
            body: String::new(),
            has_extracted_body: true,
            quality: QualitySignals { word_count: 100, unique_word_count: 50, relevance_score: 0.5 },
            provenance: Provenance { provider: Provider::WebSearch, provider_id: "1".to_string() },
        }
    }

    #[test]
    fn duplicate_canonical_urls_collapse_to_first() {
        let a = article("https://Example.com/Story", "first");
        let b = article("https://example.com/story", "second");
        let out = dedupe_by_canonical_url(vec![a, b]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].excerpt, "first");
    }

    #[test]
    fn idempotent_under_repeated_dedupe() {
        let articles = vec![article("https://a.example/x", "a"), article("https://a.example/x", "b"), article("https://b.example/y", "c")];
        let once = dedupe_by_canonical_url(articles);
        let twice = dedupe_by_canonical_url(once.clone());
        assert_eq!(once.len(), twice.len());
    }

    #[test]
    fn distinct_urls_are_both_kept() {
        let out = dedupe_by_canonical_url(vec![article("https://a.example/x", "a"), article("https://b.example/y", "b")]);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn similarity_dedupe_drops_near_duplicate_text() {
        let a = article("https://a.example/x", "the mayor announced a new budget plan today");
        let b = article("https://b.example/y", "the mayor announced a new budget plan yesterday");
        let out = dedupe_by_similarity(vec![a, b], 0.5);
        assert_eq!(out.len(), 1);
    }
}
