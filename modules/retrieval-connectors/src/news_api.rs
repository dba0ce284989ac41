//! News API connector (spec §4.2 "News API"): paginated `/everything`-style
//! search, sorted by `publishedAt`, filtered by `from`/`to`. Tries a
//! quoted-phrase OR query first, falling back to a bag-of-tokens query
//! (implicit AND, no operator) when the first yields zero items or the
//! upstream rejects it as malformed. Grounded on the same
//! request/response-struct shape as
//! `rootsignal-domains::scraping::adapters::tavily`.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use retrieval_common::config::NewsApiConfig;
use retrieval_common::{Candidate, ConnectorMetrics, Provider};
use retrieval_query::NormalizedQuery;
use serde::Deserialize;
use tracing::warn;

use crate::pre_filter::{apply_pre_filter, PreFilterDecision};
use crate::{Connector, ConnectorOptions, ConnectorResult};

const MAX_PAGE_SIZE: u32 = 100;
const MAX_PAGES: u32 = 5;
const ENDPOINT: &str = "https://newsapi.org/v2/everything";

pub struct NewsApiConnector {
    client: reqwest::Client,
    config: NewsApiConfig,
}

impl NewsApiConnector {
    pub fn new(config: NewsApiConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build news-api HTTP client");
        Self { client, config }
    }

    fn is_malformed_query_error(body: &str) -> bool {
        let lower = body.to_lowercase();
        lower.contains("parameters_incompatible") || lower.contains("malformed") || lower.contains("invalid query")
    }
}

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
struct NewsApiArticle {
    title: String,
    url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "publishedAt", default)]
    published_at: Option<String>,
    #[serde(default)]
    source: Option<NewsApiSource>,
}

#[derive(Debug, Deserialize)]
struct NewsApiSource {
    name: Option<String>,
}

#[async_trait]
impl Connector for NewsApiConnector {
    fn provider(&self) -> Provider {
        Provider::NewsApi
    }

    async fn fetch(&self, query: &NormalizedQuery, options: &ConnectorOptions) -> ConnectorResult {
        let Some(api_key) = self.config.api_key.as_ref() else {
            return ConnectorResult::disabled(Provider::NewsApi);
        };
        if !self.config.enabled {
            return ConnectorResult::disabled(Provider::NewsApi);
        }

        let page_size = self.config.page_size.clamp(1, MAX_PAGE_SIZE);
        let from = (Utc::now() - chrono::Duration::hours(options.recency_hours as i64)).to_rfc3339();
        let to = Utc::now().to_rfc3339();

        let variants = [
            query.news_api_query.clone(),
            retrieval_query::news_api_fallback(&query.main_query_string),
        ];

        let mut last_error: Option<String> = None;

        for variant in variants {
            if variant.trim().is_empty() {
                continue;
            }
            let mut items = Vec::new();

            'pages: for page in 1..=MAX_PAGES {
                if options.cancellation.is_cancelled() {
                    break 'pages;
                }
                let resp = self
                    .client
                    .get(ENDPOINT)
                    .header("X-Api-Key", api_key)
                    .query(&[
                        ("q", variant.as_str()),
                        ("from", from.as_str()),
                        ("to", to.as_str()),
                        ("sortBy", "publishedAt"),
                        ("pageSize", &page_size.to_string()),
                        ("page", &page.to_string()),
                    ])
                    .send()
                    .await;

                let resp = match resp {
                    Ok(r) => r,
                    Err(e) => {
                        last_error = Some(e.to_string());
                        break 'pages;
                    }
                };

                let status = resp.status();
                let text = match resp.text().await {
                    Ok(t) => t,
                    Err(e) => {
                        last_error = Some(e.to_string());
                        break 'pages;
                    }
                };

                let parsed: NewsApiResponse = match serde_json::from_str(&text) {
                    Ok(p) => p,
                    Err(e) => {
                        last_error = Some(format!("parse error: {e}"));
                        break 'pages;
                    }
                };

                if parsed.status != "ok" {
                    if Self::is_malformed_query_error(&text) {
                        warn!(variant = variant.as_str(), "news-api: malformed query, trying fallback");
                        items.clear();
                        break 'pages;
                    }
                    last_error = Some(parsed.message.unwrap_or_else(|| parsed.code.unwrap_or_else(|| format!("HTTP {status}"))));
                    break 'pages;
                }

                if parsed.articles.is_empty() {
                    break 'pages;
                }

                for a in parsed.articles {
                    let title = a.title;
                    let snippet = a.description.unwrap_or_default();
                    let decision = apply_pre_filter(&a.url, &title, &snippet, &query.query_tokens);
                    if let PreFilterDecision::Reject(_) = decision {
                        continue;
                    }
                    let mut candidate = Candidate::new(Provider::NewsApi, title, a.url);
                    candidate.snippet = if snippet.is_empty() { None } else { Some(snippet) };
                    candidate.source_name = a.source.and_then(|s| s.name);
                    candidate.published_at = a.published_at;
                    items.push(candidate);
                }
            }

            if !items.is_empty() {
                return ConnectorResult {
                    provider: Provider::NewsApi,
                    fetched_at: Utc::now(),
                    query: variant,
                    items,
                    metrics: ConnectorMetrics::default(),
                };
            }
        }

        if let Some(err) = last_error {
            return ConnectorResult::failed(Provider::NewsApi, query.news_api_query.clone(), err);
        }

        ConnectorResult {
            provider: Provider::NewsApi,
            fetched_at: Utc::now(),
            query: query.news_api_query.clone(),
            items: Vec::new(),
            metrics: ConnectorMetrics::default(),
        }
    }
}
