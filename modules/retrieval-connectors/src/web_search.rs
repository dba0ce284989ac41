//! Web Search connector (spec §4.2 "Web Search"), a Custom Search-style
//! upstream: paginated, date-restricted, sorted by recency. Grounded on
//! `rootsignal-domains::scraping::adapters::tavily`'s
//! request-struct/response-struct/reqwest shape, generalized to pagination
//! and the news-host heuristics this provider needs.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use retrieval_common::{Candidate, ConnectorMetrics, Provider};
use retrieval_query::NormalizedQuery;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::pre_filter::{apply_pre_filter, PreFilterDecision};
use crate::{Connector, ConnectorOptions, ConnectorResult};

const PAGE_SIZE: u32 = 10;
const MAX_RESULTS: u32 = 50;
const ENDPOINT: &str = "https://www.googleapis.com/customsearch/v1";

/// Host suffixes that are almost never news articles (spec §4.2 Web Search).
const NON_NEWS_SUFFIXES: &[&str] = &[".gov", ".edu", ".mil"];

/// Path/host keywords indicating a non-news page (forums, docs, support).
fn non_news_keyword_re() -> Regex {
    Regex::new(r"(?i)forum|community|support|docs|help|academy").expect("valid regex")
}

/// Closed list of social/aggregator hosts rejected regardless of path.
const BLOCKED_HOSTS: &[&str] = &[
    "facebook.com",
    "twitter.com",
    "x.com",
    "reddit.com",
    "youtube.com",
    "pinterest.com",
    "instagram.com",
    "linkedin.com",
    "tiktok.com",
    "quora.com",
];

fn news_url_re() -> Regex {
    Regex::new(r"(?i)/\d{4}/\d{2}/\d{2}/|/\d{4}-\d{2}-\d{2}/|/(news|politics|world|business|technology|local|article|story)/").expect("valid regex")
}

pub struct WebSearchConnector {
    client: reqwest::Client,
    config: retrieval_common::config::WebSearchConfig,
}

impl WebSearchConnector {
    pub fn new(config: retrieval_common::config::WebSearchConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .expect("failed to build web-search HTTP client");
        Self { client, config }
    }

    fn host(url: &str) -> Option<String> {
        url::Url::parse(url).ok().and_then(|u| u.host_str().map(|h| h.to_lowercase()))
    }

    fn is_non_news_host(host: &str) -> bool {
        NON_NEWS_SUFFIXES.iter().any(|suf| host.ends_with(suf)) || non_news_keyword_re().is_match(host)
    }

    fn is_blocked_host(host: &str) -> bool {
        BLOCKED_HOSTS.iter().any(|b| host == *b || host.ends_with(&format!(".{b}")))
    }

    /// When `connectors.webSearch.allowedHosts` is configured, it acts as an
    /// allowlist override: only candidates on one of those hosts survive,
    /// regardless of the non-news/blocked-host heuristics (spec §6).
    fn host_allowed(&self, host: &str) -> bool {
        match &self.config.allowed_hosts {
            Some(allowed) => allowed.iter().any(|a| {
                let a = a.to_lowercase();
                host == a || host.ends_with(&format!(".{a}"))
            }),
            None => true,
        }
    }

    fn looks_like_news_url(url: &str) -> bool {
        news_url_re().is_match(url)
    }

    /// `dateRestrict` value for Custom Search: `d{N}` over the recency window, at least one day.
    fn date_restrict(recency_hours: u32) -> String {
        let days = ((recency_hours as f64) / 24.0).ceil().max(1.0) as u32;
        format!("d{days}")
    }
}

#[derive(Debug, Deserialize)]
struct CseResponse {
    #[serde(default)]
    items: Vec<CseItem>,
}

#[derive(Debug, Deserialize)]
struct CseItem {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
    #[serde(default)]
    pagemap: Option<serde_json::Value>,
}

impl CseItem {
    fn published_at(&self) -> Option<String> {
        self.pagemap
            .as_ref()?
            .get("metatags")?
            .as_array()?
            .first()?
            .as_object()?
            .iter()
            .find(|(k, _)| {
                let k = k.to_lowercase();
                k == "article:published_time" || k == "og:published_time" || k == "date"
            })
            .and_then(|(_, v)| v.as_str())
            .map(|s| s.to_string())
    }
}

#[async_trait]
impl Connector for WebSearchConnector {
    fn provider(&self) -> Provider {
        Provider::WebSearch
    }

    async fn fetch(&self, query: &NormalizedQuery, options: &ConnectorOptions) -> ConnectorResult {
        let (Some(api_key), Some(cx)) = (self.config.api_key.as_ref(), self.config.search_engine_id.as_ref()) else {
            return ConnectorResult::disabled(Provider::WebSearch);
        };
        if !self.config.enabled {
            return ConnectorResult::disabled(Provider::WebSearch);
        }

        let date_restrict = Self::date_restrict(options.recency_hours);
        let cutoff = Utc::now() - chrono::Duration::hours(options.recency_hours as i64);

        let mut items = Vec::new();
        let pages = MAX_RESULTS / PAGE_SIZE;

        for page in 0..pages {
            if options.cancellation.is_cancelled() {
                break;
            }
            let start = page * PAGE_SIZE + 1;
            let resp = self
                .client
                .get(ENDPOINT)
                .query(&[
                    ("q", query.web_search_query.as_str()),
                    ("key", api_key.as_str()),
                    ("cx", cx.as_str()),
                    ("num", &PAGE_SIZE.to_string()),
                    ("start", &start.to_string()),
                    ("dateRestrict", &date_restrict),
                    ("sort", "date"),
                ])
                .send()
                .await;

            let resp = match resp {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "web-search: request failed");
                    return ConnectorResult::failed(Provider::WebSearch, query.web_search_query.clone(), e.to_string());
                }
            };

            if resp.status().as_u16() == 429 {
                debug!("web-search: rate limited, disabling for this run");
                return ConnectorResult::disabled(Provider::WebSearch);
            }
            if !resp.status().is_success() {
                let status = resp.status();
                warn!(%status, "web-search: non-success response");
                return ConnectorResult::failed(Provider::WebSearch, query.web_search_query.clone(), format!("HTTP {status}"));
            }

            let body: CseResponse = match resp.json().await {
                Ok(b) => b,
                Err(e) => {
                    warn!(error = %e, "web-search: malformed response body");
                    return ConnectorResult::failed(Provider::WebSearch, query.web_search_query.clone(), e.to_string());
                }
            };

            if body.items.is_empty() {
                break;
            }

            for raw in body.items {
                let Some(host) = Self::host(&raw.link) else { continue };
                if !self.host_allowed(&host) {
                    continue;
                }
                if Self::is_blocked_host(&host) || Self::is_non_news_host(&host) {
                    continue;
                }
                if self.config.news_only && !Self::looks_like_news_url(&raw.link) {
                    continue;
                }

                let published_at = raw.published_at();
                if let Some(ts) = &published_at {
                    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(ts) {
                        if dt.with_timezone(&Utc) < cutoff {
                            continue;
                        }
                    }
                }

                let decision = apply_pre_filter(&raw.link, &raw.title, &raw.snippet, &query.query_tokens);
                if let PreFilterDecision::Reject(_) = decision {
                    continue;
                }

                let mut candidate = Candidate::new(Provider::WebSearch, raw.title, raw.link);
                candidate.snippet = Some(raw.snippet);
                candidate.published_at = published_at;
                items.push(candidate);
            }
        }

        ConnectorResult {
            provider: Provider::WebSearch,
            fetched_at: Utc::now(),
            query: query.web_search_query.clone(),
            items,
            metrics: ConnectorMetrics::default(),
        }
    }
}
