//! Connectors (spec §4.2): pure-ish functions `(query, config, options) ->
//! ConnectorResult`. Grounded on `rootsignal-scout`'s `news_scanner.rs` and
//! `scraper.rs` for the "never throw, degrade into metrics" shape of a
//! provider integration, and on `rootsignal-archive`'s `services/feed.rs`
//! for RSS fetching specifically.

pub mod event_registry;
pub mod news_api;
pub mod pre_filter;
pub mod web_news_rss;
pub mod web_search;

pub use event_registry::EventRegistryConnector;
pub use news_api::NewsApiConnector;
pub use web_news_rss::WebNewsRssConnector;
pub use web_search::WebSearchConnector;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use retrieval_common::{Candidate, ConnectorMetrics, Provider};
use retrieval_query::NormalizedQuery;
use tokio_util::sync::CancellationToken;

/// Per-call options threaded into every connector (spec §4.2.2).
#[derive(Debug, Clone)]
pub struct ConnectorOptions {
    pub cancellation: CancellationToken,
    pub recency_hours: u32,
}

/// The uniform connector response (spec §4.2, §3 `ConnectorResult`).
#[derive(Debug, Clone)]
pub struct ConnectorResult {
    pub provider: Provider,
    pub fetched_at: DateTime<Utc>,
    pub query: String,
    pub items: Vec<Candidate>,
    pub metrics: ConnectorMetrics,
}

impl ConnectorResult {
    pub fn disabled(provider: Provider) -> Self {
        Self {
            provider,
            fetched_at: Utc::now(),
            query: String::new(),
            items: Vec::new(),
            metrics: ConnectorMetrics { disabled: true, ..Default::default() },
        }
    }

    pub fn failed(provider: Provider, query: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            provider,
            fetched_at: Utc::now(),
            query: query.into(),
            items: Vec::new(),
            metrics: ConnectorMetrics { failed: true, error: Some(error.into()), ..Default::default() },
        }
    }
}

/// A single upstream provider integration. Implementors must never panic
/// or propagate an error for an expected failure (spec §4.2.4) — the only
/// thing that crosses this boundary is a `ConnectorResult`.
#[async_trait]
pub trait Connector: Send + Sync {
    fn provider(&self) -> Provider;
    async fn fetch(&self, query: &NormalizedQuery, options: &ConnectorOptions) -> ConnectorResult;
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;

    /// A connector stand-in for orchestrator-level tests, returning a fixed
    /// result regardless of input.
    pub struct FixedConnector {
        pub result: ConnectorResult,
    }

    #[async_trait]
    impl Connector for FixedConnector {
        fn provider(&self) -> Provider {
            self.result.provider
        }

        async fn fetch(&self, _query: &NormalizedQuery, _options: &ConnectorOptions) -> ConnectorResult {
            self.result.clone()
        }
    }
}
