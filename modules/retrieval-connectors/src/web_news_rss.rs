//! Web News RSS connector (spec §4.2 "Web News RSS"). Fetches one XML feed
//! and parses entries with `feed_rs`, following
//! `rootsignal-archive::services::feed::FeedService::fetch`'s
//! `reqwest::Client` + `feed_rs::parser::parse` shape. Deliberately does
//! **not** decode aggregator-wrapper URLs here — that happens inside the
//! extractor (spec §4.3.2, §9 Open Question), so this connector just
//! passes wrapper URLs through untouched.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use retrieval_common::config::WebNewsRssConfig;
use retrieval_common::{Candidate, ConnectorMetrics, Provider};
use retrieval_query::NormalizedQuery;
use tracing::warn;

use crate::pre_filter::{apply_pre_filter, PreFilterDecision};
use crate::{Connector, ConnectorOptions, ConnectorResult};

pub struct WebNewsRssConnector {
    client: reqwest::Client,
    config: WebNewsRssConfig,
}

impl WebNewsRssConnector {
    pub fn new(config: WebNewsRssConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build web-news-rss HTTP client");
        Self { client, config }
    }

    /// Build a Google News RSS search URL from a raw query string, using
    /// the configured `hl`/`gl`/`ceid` locale parameters.
    fn feed_url(&self, query: &str) -> String {
        if let Some(explicit) = &self.config.feed_url {
            return explicit.clone();
        }
        let encoded = urlencoding_query(query);
        format!(
            "https://news.google.com/rss/search?q={encoded}&hl={}&gl={}&ceid={}",
            self.config.hl, self.config.gl, self.config.ceid
        )
    }
}

/// Minimal percent-encoding for a query-string value (space -> `%20`, a few
/// reserved characters). `feed_rs`/`reqwest` handle the rest of the request;
/// this only needs to be good enough for a GET query parameter.
fn urlencoding_query(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for b in input.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => out.push(b as char),
            b' ' => out.push_str("%20"),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[async_trait]
impl Connector for WebNewsRssConnector {
    fn provider(&self) -> Provider {
        Provider::WebNewsRss
    }

    async fn fetch(&self, query: &NormalizedQuery, options: &ConnectorOptions) -> ConnectorResult {
        if !self.config.enabled {
            return ConnectorResult::disabled(Provider::WebNewsRss);
        }

        let url = self.feed_url(&query.main_query_string);

        let resp = match self.client.get(&url).header("User-Agent", "RetrievalCore/1.0").send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "web-news-rss: feed fetch failed");
                return ConnectorResult::failed(Provider::WebNewsRss, url, e.to_string());
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            return ConnectorResult::failed(Provider::WebNewsRss, url, format!("HTTP {status}"));
        }

        let bytes = match resp.bytes().await {
            Ok(b) => b,
            Err(e) => return ConnectorResult::failed(Provider::WebNewsRss, url, e.to_string()),
        };

        let parsed = match feed_rs::parser::parse(&bytes[..]) {
            Ok(f) => f,
            Err(e) => return ConnectorResult::failed(Provider::WebNewsRss, url, format!("feed parse error: {e}")),
        };

        let cutoff = Utc::now() - chrono::Duration::hours(options.recency_hours as i64);
        let mut items = Vec::new();

        for entry in parsed.entries.into_iter().take(self.config.max_results as usize) {
            if options.cancellation.is_cancelled() {
                break;
            }
            let Some(link) = entry.links.first().map(|l| l.href.clone()) else { continue };

            let pub_date = entry.published.or(entry.updated).map(|d| d.with_timezone(&Utc));
            if let Some(date) = pub_date {
                if date < cutoff {
                    continue;
                }
            }

            let title = entry.title.map(|t| t.content).unwrap_or_default();
            let snippet = entry.summary.map(|s| s.content).unwrap_or_default();
            let source_name = entry.source.clone();

            let decision = apply_pre_filter(&link, &title, &snippet, &query.query_tokens);
            if let PreFilterDecision::Reject(_) = decision {
                continue;
            }

            let mut candidate = Candidate::new(Provider::WebNewsRss, title, link);
            candidate.snippet = if snippet.is_empty() { None } else { Some(snippet) };
            candidate.source_name = source_name;
            candidate.published_at = pub_date.map(|d| d.to_rfc3339());
            items.push(candidate);
        }

        ConnectorResult {
            provider: Provider::WebNewsRss,
            fetched_at: Utc::now(),
            query: query.main_query_string.clone(),
            items,
            metrics: ConnectorMetrics::default(),
        }
    }
}
