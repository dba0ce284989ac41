//! The data model (spec §3). Entities are value objects unless noted;
//! every object created inside a run is owned by that run.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One of the four upstream retrieval providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    WebSearch,
    WebNewsRss,
    NewsApi,
    EventRegistry,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::WebSearch,
        Provider::WebNewsRss,
        Provider::NewsApi,
        Provider::EventRegistry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::WebSearch => "web-search",
            Provider::WebNewsRss => "web-news-rss",
            Provider::NewsApi => "news-api",
            Provider::EventRegistry => "event-registry",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single search hit before extraction. Produced by connectors, consumed
/// by the extractor. Invariant: `url` is non-empty and HTTP(S).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub provider: Provider,
    pub title: String,
    pub url: String,
    pub snippet: Option<String>,
    pub source_name: Option<String>,
    /// RFC3339 string, as handed back by the provider (unvalidated here —
    /// the extractor/filter are the ones that reason about plausibility).
    pub published_at: Option<String>,
    /// Opaque provider payload, preserved for the extractor's provider-body
    /// fallback (spec §4.3.4).
    pub provider_data: serde_json::Value,
}

impl Candidate {
    pub fn new(provider: Provider, title: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        let id = crate::hash::id_for_url(&url);
        Self {
            id,
            provider,
            title: title.into(),
            url,
            snippet: None,
            source_name: None,
            published_at: None,
            provider_data: serde_json::Value::Null,
        }
    }
}

/// Provenance of a normalized article: which provider and provider-local id
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provenance {
    pub provider: Provider,
    pub provider_id: String,
}

/// Quality signals computed at extraction time (spec §4.3.8), reused
/// unchanged by the filter (§4.4) and ranker (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualitySignals {
    pub word_count: usize,
    pub unique_word_count: usize,
    /// Fraction of query tokens found in the body, in `[0, 1]`.
    pub relevance_score: f64,
}

/// The product of extraction (spec §3 `NormalizedArticle`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedArticle {
    pub id: String,
    pub title: String,
    pub canonical_url: String,
    pub source_host: String,
    pub source_name: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    /// True when `published_at` came from text-inference rather than a
    /// structured source (meta tag, `<time>`, structured data, URL date) —
    /// the filter applies extra recency slack to these (spec §4.4).
    pub published_at_inferred: bool,
    pub modified_at: Option<DateTime<Utc>>,
    pub excerpt: String,
    pub body: String,
    pub has_extracted_body: bool,
    pub quality: QualitySignals,
    pub provenance: Provenance,
}

/// A citation surfaced on a `StoryCluster`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// A group of near-duplicate stories about the same event (spec §3, §4.5).
/// Invariants: score == representative's score rounded to 4 decimals;
/// `members.len() >= 1`; members pairwise distinct by id, representative first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryCluster {
    pub cluster_id: String,
    pub representative: NormalizedArticle,
    pub members: Vec<NormalizedArticle>,
    pub score: f64,
    pub reasons: Vec<String>,
    pub citations: Vec<Citation>,
}

/// The metrics a single connector call can report about itself (spec
/// §4.2): disabled short-circuit, or a caught catastrophic failure. The
/// orchestrator folds this into the run-wide `ProviderMetrics`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectorMetrics {
    pub disabled: bool,
    pub failed: bool,
    pub error: Option<String>,
}

/// Per-run, per-provider accounting (spec §3 `ProviderMetrics`). Mutated
/// only by the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderMetrics {
    pub returned: u32,
    pub deduped: u32,
    pub unique: u32,
    pub queued: u32,
    pub skipped: u32,
    pub pre_filtered: u32,
    pub extraction_attempts: u32,
    pub accepted: u32,
    pub missing_published_at: u32,
    pub disabled: bool,
    pub failed: bool,
    pub error: Option<String>,
    pub query: Option<String>,
    pub extraction_errors: Vec<ExtractionError>,
    pub rejection_reasons: HashMap<String, u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionError {
    pub url: String,
    pub error: String,
}

/// Per-run aggregate metrics (spec §3 `RetrievalMetrics`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalMetrics {
    pub candidate_count: u32,
    pub pre_filtered: u32,
    pub attempted_extractions: u32,
    pub accepted: u32,
    pub duplicates_removed: u32,
    pub newest_article_hours: Option<f64>,
    pub oldest_article_hours: Option<f64>,
    pub per_provider: HashMap<Provider, ProviderMetrics>,
    pub extraction_errors: Vec<ExtractionError>,
}
