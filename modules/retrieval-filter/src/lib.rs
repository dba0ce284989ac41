//! Post-extraction filter (spec §4.4): `evaluate(article, options) ->
//! {accept, reasons[], warnings[]}`. Same closed-reason-set shape as
//! `retrieval-connectors::pre_filter`, one stage later in the pipeline and
//! working off the extractor's resolved quality/date signals instead of
//! raw title/snippet text.

use chrono::{DateTime, Utc};
use retrieval_common::NormalizedArticle;

/// Extra recency slack applied to text-inferred dates (spec §4.4): an
/// inferred date is trusted less, so it gets more room before `too_old`.
const INFERRED_SLACK: f64 = 1.25;

/// Promotional phrases counted toward `promo_content` (spec §4.4, closed list).
const PROMO_PHRASES: &[&str] = &[
    "click here",
    "limited time offer",
    "buy now",
    "subscribe today",
    "sign up now",
    "act now",
    "don't miss out",
    "exclusive deal",
    "sponsored content",
    "order now",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    TooOld,
    TooOldInferred,
    TooShort,
    InsufficientUniqueWords,
    LowRelevance,
    BannedSource,
    PromoContent,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::TooOld => "too_old",
            RejectionReason::TooOldInferred => "too_old_inferred",
            RejectionReason::TooShort => "too_short",
            RejectionReason::InsufficientUniqueWords => "insufficient_unique_words",
            RejectionReason::LowRelevance => "low_relevance",
            RejectionReason::BannedSource => "banned_source",
            RejectionReason::PromoContent => "promo_content",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterWarning {
    MissingPublishedAt,
}

impl FilterWarning {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterWarning::MissingPublishedAt => "missing_published_at",
        }
    }
}

/// Tunables threaded into [`evaluate`] (spec §4.4, §6 `retrieval.*`).
#[derive(Debug, Clone)]
pub struct FilterOptions {
    pub recency_hours: u32,
    pub min_word_count: usize,
    pub min_unique_word_count: usize,
    pub min_relevance: f64,
    pub max_promo_phrase_matches: usize,
    /// Closed list of hosts whose articles are never accepted regardless of
    /// other signals.
    pub banned_sources: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FilterDecision {
    pub accept: bool,
    pub reasons: Vec<RejectionReason>,
    pub warnings: Vec<FilterWarning>,
}

fn count_promo_matches(body: &str) -> usize {
    let lower = body.to_lowercase();
    PROMO_PHRASES.iter().filter(|phrase| lower.contains(*phrase)).count()
}

fn too_old(published_at: DateTime<Utc>, recency_hours: u32, inferred: bool) -> bool {
    let age_hours = (Utc::now() - published_at).num_seconds() as f64 / 3600.0;
    let allowed = if inferred { recency_hours as f64 * INFERRED_SLACK } else { recency_hours as f64 };
    age_hours > allowed
}

/// Evaluate an extracted article for acceptance (spec §4.4). An article is
/// accepted iff `reasons` is empty.
pub fn evaluate(article: &NormalizedArticle, options: &FilterOptions) -> FilterDecision {
    let mut reasons = Vec::new();
    let mut warnings = Vec::new();

    if options.banned_sources.iter().any(|h| h.eq_ignore_ascii_case(&article.source_host)) {
        reasons.push(RejectionReason::BannedSource);
    }

    match article.published_at {
        Some(dt) => {
            if too_old(dt, options.recency_hours, article.published_at_inferred) {
                reasons.push(if article.published_at_inferred { RejectionReason::TooOldInferred } else { RejectionReason::TooOld });
            }
        }
        None => warnings.push(FilterWarning::MissingPublishedAt),
    }

    if article.quality.word_count < options.min_word_count {
        reasons.push(RejectionReason::TooShort);
    }

    if article.quality.unique_word_count < options.min_unique_word_count {
        reasons.push(RejectionReason::InsufficientUniqueWords);
    }

    if article.quality.relevance_score < options.min_relevance {
        reasons.push(RejectionReason::LowRelevance);
    }

    if count_promo_matches(&article.body) > options.max_promo_phrase_matches {
        reasons.push(RejectionReason::PromoContent);
    }

    FilterDecision { accept: reasons.is_empty(), reasons, warnings }
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrieval_common::{Provenance, Provider, QualitySignals};

    fn base_options() -> FilterOptions {
        FilterOptions {
            recency_hours: 48,
            min_word_count: 100,
            min_unique_word_count: 20,
            min_relevance: 0.1,
            max_promo_phrase_matches: 2,
            banned_sources: vec!["spamwire.example".to_string()],
        }
    }

    fn article(word_count: usize, unique: usize, relevance: f64, body: &str, published_at: Option<DateTime<Utc>>, inferred: bool) -> NormalizedArticle {
        NormalizedArticle {
            id: "abc123".to_string(),
            title: "A sufficiently long title for this test".to_string(),
            canonical_url: "https://example.com/story".to_string(),
            source_host: "example.com".to_string(),
            source_name: None,
            published_at,
            published_at_inferred: inferred,
            modified_at: None,
            excerpt: "excerpt".to_string(),
            body: body.to_string(),
            has_extracted_body: true,
            quality: QualitySignals { word_count, unique_word_count: unique, relevance_score: relevance },
            provenance: Provenance { provider: Provider::WebSearch, provider_id: "1".to_string() },
        }
    }

    #[test]
    fn clean_article_is_accepted() {
        let a = article(500, 200, 0.5, "ordinary article body", Some(Utc::now()), false);
        let d = evaluate(&a, &base_options());
        assert!(d.accept);
        assert!(d.reasons.is_empty());
    }

    #[test]
    fn missing_published_at_warns_but_does_not_reject() {
        let a = article(500, 200, 0.5, "ordinary article body", None, false);
        let d = evaluate(&a, &base_options());
        assert!(d.accept);
        assert_eq!(d.warnings, vec![FilterWarning::MissingPublishedAt]);
    }

    #[test]
    fn structured_old_date_is_too_old() {
        let old = Utc::now() - chrono::Duration::hours(72);
        let a = article(500, 200, 0.5, "ordinary article body", Some(old), false);
        let d = evaluate(&a, &base_options());
        assert!(d.reasons.contains(&RejectionReason::TooOld));
    }

    #[test]
    fn inferred_date_gets_1_25x_slack() {
        let within_slack = Utc::now() - chrono::Duration::hours(55);
        let a = article(500, 200, 0.5, "ordinary article body", Some(within_slack), true);
        let d = evaluate(&a, &base_options());
        assert!(d.accept, "55h should be within 48*1.25=60h inferred slack");
    }

    #[test]
    fn inferred_date_past_slack_is_too_old_inferred() {
        let past_slack = Utc::now() - chrono::Duration::hours(65);
        let a = article(500, 200, 0.5, "ordinary article body", Some(past_slack), true);
        let d = evaluate(&a, &base_options());
        assert!(d.reasons.contains(&RejectionReason::TooOldInferred));
    }

    #[test]
    fn short_body_is_too_short() {
        let a = article(50, 30, 0.5, "short", Some(Utc::now()), false);
        let d = evaluate(&a, &base_options());
        assert!(d.reasons.contains(&RejectionReason::TooShort));
    }

    #[test]
    fn low_unique_word_count_rejected() {
        let a = article(500, 5, 0.5, "body", Some(Utc::now()), false);
        let d = evaluate(&a, &base_options());
        assert!(d.reasons.contains(&RejectionReason::InsufficientUniqueWords));
    }

    #[test]
    fn low_relevance_rejected() {
        let a = article(500, 200, 0.01, "body", Some(Utc::now()), false);
        let d = evaluate(&a, &base_options());
        assert!(d.reasons.contains(&RejectionReason::LowRelevance));
    }

    #[test]
    fn banned_source_always_rejected() {
        let mut a = article(500, 200, 0.5, "ordinary article body", Some(Utc::now()), false);
        a.source_host = "spamwire.example".to_string();
        let d = evaluate(&a, &base_options());
        assert!(d.reasons.contains(&RejectionReason::BannedSource));
    }

    #[test]
    fn promo_content_rejected_over_threshold() {
        let body = "Click here to subscribe today and act now for this exclusive deal, buy now!";
        let a = article(500, 200, 0.5, body, Some(Utc::now()), false);
        let d = evaluate(&a, &base_options());
        assert!(d.reasons.contains(&RejectionReason::PromoContent));
    }

    #[test]
    fn promo_content_at_threshold_is_accepted() {
        let body = "Click here for the story. Subscribe today for more.";
        let a = article(500, 200, 0.5, body, Some(Utc::now()), false);
        let d = evaluate(&a, &base_options());
        assert!(!d.reasons.contains(&RejectionReason::PromoContent));
    }

    #[test]
    fn rejection_always_carries_a_non_empty_reason_set() {
        let a = article(1, 1, 0.0, "x", Some(Utc::now() - chrono::Duration::hours(1000)), false);
        let d = evaluate(&a, &base_options());
        assert!(!d.accept);
        assert!(!d.reasons.is_empty());
    }
}
