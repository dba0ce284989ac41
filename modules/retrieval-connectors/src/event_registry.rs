//! Event Registry connector (spec §4.2 "Event Registry"): one keyword-OR
//! request over the normalizer's token-budgeted keyword list (spec §4.1),
//! retried with successively smaller keyword budgets on a "too many
//! keywords" error.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use retrieval_common::config::EventRegistryConfig;
use retrieval_common::{Candidate, ConnectorMetrics, Provider};
use retrieval_query::NormalizedQuery;
use serde::Deserialize;
use tracing::warn;

use crate::pre_filter::{apply_pre_filter, PreFilterDecision};
use crate::{Connector, ConnectorOptions, ConnectorResult};

const ENDPOINT: &str = "https://eventregistry.org/api/v1/article/getArticles";
/// Successive keyword-count budgets tried on a "too many keywords" error
/// (spec §4.2 Event Registry retry behavior).
const RETRY_BUDGETS: &[usize] = &[15, 12, 10, 8];

pub struct EventRegistryConnector {
    client: reqwest::Client,
    config: EventRegistryConfig,
}

impl EventRegistryConnector {
    pub fn new(config: EventRegistryConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build event-registry HTTP client");
        Self { client, config }
    }

    fn is_too_many_keywords_error(body: &str) -> bool {
        let lower = body.to_lowercase();
        lower.contains("too many keywords") || lower.contains("keyword limit")
    }
}

#[derive(Debug, Deserialize)]
struct ErResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    articles: Option<ErArticles>,
}

#[derive(Debug, Deserialize)]
struct ErArticles {
    #[serde(default)]
    results: Vec<ErArticle>,
}

#[derive(Debug, Deserialize)]
struct ErArticle {
    title: String,
    url: String,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    time: Option<String>,
    #[serde(default)]
    source: Option<ErSource>,
}

#[derive(Debug, Deserialize)]
struct ErSource {
    title: Option<String>,
}

impl ErArticle {
    fn published_at(&self) -> Option<String> {
        let date = self.date.as_ref()?;
        let time = self.time.clone().unwrap_or_else(|| "00:00:00".to_string());
        Some(format!("{date}T{time}Z"))
    }
}

#[async_trait]
impl Connector for EventRegistryConnector {
    fn provider(&self) -> Provider {
        Provider::EventRegistry
    }

    async fn fetch(&self, query: &NormalizedQuery, options: &ConnectorOptions) -> ConnectorResult {
        let Some(api_key) = self.config.api_key.as_ref() else {
            return ConnectorResult::disabled(Provider::EventRegistry);
        };
        if !self.config.enabled {
            return ConnectorResult::disabled(Provider::EventRegistry);
        }

        let lookback = self.config.lookback_hours.unwrap_or(options.recency_hours);
        let date_start = (Utc::now() - chrono::Duration::hours(lookback as i64)).format("%Y-%m-%d").to_string();
        let date_end = Utc::now().format("%Y-%m-%d").to_string();
        let max_events = self.config.max_events.max(1);

        let mut last_error: Option<String> = None;

        for &budget in RETRY_BUDGETS {
            if options.cancellation.is_cancelled() {
                break;
            }
            let keywords: Vec<&String> = query.event_registry_keywords.iter().take(budget).collect();
            if keywords.is_empty() {
                break;
            }
            let keyword_param = keywords.iter().map(|k| k.as_str()).collect::<Vec<_>>().join(" OR ");

            let body = serde_json::json!({
                "action": "getArticles",
                "keyword": keyword_param,
                "keywordOper": "or",
                "dateStart": date_start,
                "dateEnd": date_end,
                "articlesSortBy": "date",
                "articlesCount": max_events,
                "apiKey": api_key,
            });

            let resp = match self.client.post(ENDPOINT).json(&body).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(e.to_string());
                    break;
                }
            };

            let text = match resp.text().await {
                Ok(t) => t,
                Err(e) => {
                    last_error = Some(e.to_string());
                    break;
                }
            };

            let parsed: ErResponse = match serde_json::from_str(&text) {
                Ok(p) => p,
                Err(e) => {
                    last_error = Some(format!("parse error: {e}"));
                    break;
                }
            };

            if let Some(err) = &parsed.error {
                if Self::is_too_many_keywords_error(err) {
                    warn!(budget, "event-registry: too many keywords, retrying smaller budget");
                    continue;
                }
                last_error = Some(err.clone());
                break;
            }

            let mut items = Vec::new();
            for a in parsed.articles.map(|a| a.results).unwrap_or_default() {
                let title = a.title.clone();
                let snippet = a.body.clone().map(|b| b.chars().take(300).collect::<String>()).unwrap_or_default();
                let decision = apply_pre_filter(&a.url, &title, &snippet, &query.query_tokens);
                if let PreFilterDecision::Reject(_) = decision {
                    continue;
                }
                let mut candidate = Candidate::new(Provider::EventRegistry, title, a.url);
                candidate.snippet = if snippet.is_empty() { None } else { Some(snippet) };
                candidate.source_name = a.source.and_then(|s| s.title);
                candidate.published_at = a.published_at();
                candidate.provider_data = a.body.map(serde_json::Value::String).unwrap_or(serde_json::Value::Null);
                items.push(candidate);
            }

            return ConnectorResult {
                provider: Provider::EventRegistry,
                fetched_at: Utc::now(),
                query: keyword_param,
                items,
                metrics: ConnectorMetrics::default(),
            };
        }

        if let Some(err) = last_error {
            return ConnectorResult::failed(Provider::EventRegistry, query.event_registry_keywords.join(" OR "), err);
        }

        ConnectorResult {
            provider: Provider::EventRegistry,
            fetched_at: Utc::now(),
            query: query.event_registry_keywords.join(" OR "),
            items: Vec::new(),
            metrics: ConnectorMetrics::default(),
        }
    }
}
