//! Ranking (spec §4.5): `0.40*recency + 0.35*relevance + 0.25*quality`,
//! plus a closed per-host weight table.

use chrono::Utc;
use retrieval_common::NormalizedArticle;

/// Closed per-host score adjustments (spec §4.5): known press-release
/// wire hosts are penalized for being syndication mills rather than
/// original reporting; one listed low-credibility host is penalized harder.
const DOMAIN_WEIGHTS: &[(&str, f64)] = &[
    ("prnewswire.com", -0.20),
    ("businesswire.com", -0.20),
    ("globenewswire.com", -0.20),
    ("lowcredibility.example", -0.40),
];

fn domain_weight(source_host: &str) -> f64 {
    let lower = source_host.to_lowercase();
    DOMAIN_WEIGHTS
        .iter()
        .find(|(host, _)| lower == *host || lower.ends_with(&format!(".{host}")))
        .map(|(_, w)| *w)
        .unwrap_or(0.0)
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Rank score for an article (spec §4.5). Clamped at 0 after the domain
/// weight is applied, so a heavily penalized host never goes negative.
pub fn score(article: &NormalizedArticle, recency_hours: u32) -> f64 {
    let recency = match article.published_at {
        Some(dt) => {
            let age_hours = (Utc::now() - dt).num_seconds() as f64 / 3600.0;
            1.0 - (age_hours / recency_hours.max(1) as f64).clamp(0.0, 1.0)
        }
        None => 0.0,
    };
    let quality = (article.quality.word_count as f64 / 1200.0).min(1.0);
    let relevance = article.quality.relevance_score;

    let base = 0.40 * recency + 0.35 * relevance + 0.25 * quality;
    round4((base + domain_weight(&article.source_host)).max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrieval_common::{Provenance, Provider, QualitySignals};

    fn article(hours_ago: i64, word_count: usize, relevance: f64, host: &str) -> NormalizedArticle {
        NormalizedArticle {
            id: "1".to_string(),
            title: "title".to_string(),
            canonical_url: "https://example.com/a".to_string(),
            source_host: host.to_string(),
            source_name: None,
            published_at: Some(Utc::now() - chrono::Duration::hours(hours_ago)),
            published_at_inferred: false,
            modified_at: None,
            excerpt: String::new(),
            body: String::new(),
            has_extracted_body: true,
            quality: QualitySignals { word_count, unique_word_count: word_count, relevance_score: relevance },
            provenance: Provenance { provider: Provider::WebSearch, provider_id: "1".to_string() },
        }
    }

    #[test]
    fn fresher_article_scores_higher_all_else_equal() {
        let fresh = score(&article(1, 1200, 0.5, "example.com"), 48);
        let stale = score(&article(40, 1200, 0.5, "example.com"), 48);
        assert!(fresh > stale);
    }

    #[test]
    fn missing_published_at_gets_zero_recency() {
        let mut a = article(1, 1200, 0.5, "example.com");
        a.published_at = None;
        let with_date = score(&article(1, 1200, 0.5, "example.com"), 48);
        let without_date = score(&a, 48);
        assert!(without_date < with_date);
    }

    #[test]
    fn press_release_host_is_penalized() {
        let plain = score(&article(1, 1200, 0.5, "example.com"), 48);
        let wire = score(&article(1, 1200, 0.5, "prnewswire.com"), 48);
        assert!(wire < plain);
    }

    #[test]
    fn score_never_goes_negative() {
        let s = score(&article(1000, 0, 0.0, "lowcredibility.example"), 48);
        assert!(s >= 0.0);
    }

    #[test]
    fn score_rounds_to_four_decimals() {
        let s = score(&article(12, 600, 0.333, "example.com"), 48);
        let scaled = (s * 10_000.0).round();
        assert_eq!(s, scaled / 10_000.0);
    }
}
