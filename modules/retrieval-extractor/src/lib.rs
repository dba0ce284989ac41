//! Extractor (spec §4.3): fetch an HTML document, parse title/body/dates,
//! compute quality signals, and fall back to a provider's own body when the
//! HTML fetch comes up short. The process-wide extraction cache lives here
//! (spec §9) rather than as a free global; callers share one
//! [`Extractor`] (and its [`cache::ExtractionCache`]) across a run's
//! worker pool.

pub mod cache;
pub mod canonical;
pub mod dates;
pub mod fetch;
pub mod parse;
pub mod quality;
pub mod url_safety;
pub mod wrapper;

use std::sync::Arc;
use std::time::Instant;

use retrieval_common::{Candidate, NormalizedArticle, Provenance, Provider, RetrievalError};
use retrieval_connectors::ConnectorOptions;

use cache::{CachedExtraction, ExtractionCache};
use fetch::{Fetcher, ReqwestFetcher};

/// Per-call options threaded into `extract` (spec §4.3 contract).
pub struct ExtractOptions<'a> {
    pub user_agent: &'a str,
    pub fetch_timeout_ms: u64,
    pub query_tokens: &'a [String],
    pub connector_options: &'a ConnectorOptions,
}

/// Timing/diagnostic metadata returned alongside the article (spec §4.3 contract).
#[derive(Debug, Clone, Default)]
pub struct ExtractMeta {
    pub fetch_ms: u64,
    pub parse_ms: u64,
    pub redirected_url: Option<String>,
    pub cache_hit: bool,
}

#[derive(Debug, Clone)]
pub struct ExtractResult {
    pub article: Option<NormalizedArticle>,
    pub error: Option<RetrievalError>,
    pub meta: ExtractMeta,
}

/// Provider-payload keys the fallback path looks under for a long-enough
/// body (spec §4.3.4).
const FALLBACK_BODY_KEYS: &[&str] = &["body", "content", "text", "description", "snippet"];
const FALLBACK_MIN_CHARS: usize = 200;

fn provider_fallback_body(candidate: &Candidate) -> Option<String> {
    let obj = candidate.provider_data.as_object();
    let direct = candidate.provider_data.as_str().map(|s| s.to_string());

    let from_keys = obj.and_then(|o| {
        FALLBACK_BODY_KEYS.iter().find_map(|k| o.get(*k).and_then(|v| v.as_str()).map(|s| s.to_string()))
    });

    let candidate_body = from_keys.or(direct)?;
    (candidate_body.chars().count() >= FALLBACK_MIN_CHARS).then_some(candidate_body)
}

pub struct Extractor {
    fetcher: Arc<dyn Fetcher>,
    cache: ExtractionCache,
}

impl Extractor {
    pub fn new(cache_max_entries: usize, cache_ttl_ms: u64) -> Self {
        Self { fetcher: Arc::new(ReqwestFetcher::new()), cache: ExtractionCache::new(cache_max_entries, cache_ttl_ms) }
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, cache_max_entries: usize, cache_ttl_ms: u64) -> Self {
        Self { fetcher, cache: ExtractionCache::new(cache_max_entries, cache_ttl_ms) }
    }

    /// Extract a normalized article from a candidate (spec §4.3 contract,
    /// steps 1-9).
    pub async fn extract(&self, candidate: &Candidate, options: &ExtractOptions<'_>) -> ExtractResult {
        if let Some(cached) = self.cache.get(&candidate.url) {
            return ExtractResult {
                article: cached.article,
                error: cached.error.map(RetrievalError::parse),
                meta: ExtractMeta { fetch_ms: 0, parse_ms: 0, redirected_url: None, cache_hit: true },
            };
        }

        // Step 1: URL safety (spec §4.3.1, §8.1).
        let parsed = match url_safety::check_url_safety(&candidate.url) {
            Ok(u) => u,
            Err(e) => {
                return ExtractResult {
                    article: None,
                    error: Some(RetrievalError::network(e.to_string())),
                    meta: ExtractMeta::default(),
                }
            }
        };

        // Cancellation propagates to every in-flight network call (spec §5):
        // a run-level cancel or deadline-triggered cancel aborts wrapper
        // resolution and the fetch below without waiting for their timeouts.
        let cancellation = &options.connector_options.cancellation;
        if cancellation.is_cancelled() {
            return ExtractResult { article: None, error: Some(RetrievalError::cancelled()), meta: ExtractMeta::default() };
        }

        // Step 2: wrapper decode (spec §4.3.2), Web News RSS only.
        let fetch_url = if candidate.provider == Provider::WebNewsRss && wrapper::is_wrapper_url(&parsed) {
            wrapper::resolve_wrapper(self.fetcher.as_ref(), &parsed, options.user_agent, options.fetch_timeout_ms).await
        } else {
            parsed.to_string()
        };

        // Step 3: fetch, racing the run's cancellation signal so a
        // deadline-triggered cancel aborts the in-flight request immediately
        // rather than waiting out `fetch_timeout_ms`.
        let fetch_start = Instant::now();
        let fetched = tokio::select! {
            result = self.fetcher.get(&fetch_url, options.user_agent, options.fetch_timeout_ms) => result,
            _ = cancellation.cancelled() => Err(RetrievalError::cancelled()),
        };
        let fetch_ms = fetch_start.elapsed().as_millis() as u64;

        let parse_start = Instant::now();

        let (body_html, final_url, from_html) = match &fetched {
            Ok(resp) if resp.is_success() && resp.is_html() => {
                let text = String::from_utf8_lossy(&resp.body).into_owned();
                (Some(text), resp.final_url.clone(), true)
            }
            _ => (None, fetch_url.clone(), false),
        };

        let fallback_body = provider_fallback_body(candidate);

        let result = if let Some(html) = &body_html {
            let parsed_doc = parse::parse_document(html.as_bytes(), &final_url);
            if parsed_doc.body.chars().count() < FALLBACK_MIN_CHARS {
                if let Some(fb) = &fallback_body {
                    self.build_from_fallback(candidate, fb, &final_url)
                } else {
                    self.build_from_html(candidate, &parsed_doc, html, &final_url, options)
                }
            } else {
                self.build_from_html(candidate, &parsed_doc, html, &final_url, options)
            }
        } else if let Some(fb) = &fallback_body {
            self.build_from_fallback(candidate, fb, &final_url)
        } else {
            let msg = match &fetched {
                Ok(resp) => format!("non-HTML or non-2xx response (status {})", resp.status),
                Err(e) => e.message.clone(),
            };
            Err(RetrievalError::network(msg))
        };

        let parse_ms = parse_start.elapsed().as_millis() as u64;

        let (article, error) = match result {
            Ok(article) => (Some(article), None),
            Err(e) => (None, Some(e)),
        };

        self.cache.put(
            &candidate.url,
            article.as_ref().map(|a| a.canonical_url.as_str()),
            (!from_html).then_some(final_url.as_str()),
            CachedExtraction { article: article.clone(), error: error.as_ref().map(|e| e.message.clone()) },
        );

        ExtractResult {
            article,
            error,
            meta: ExtractMeta {
                fetch_ms,
                parse_ms,
                redirected_url: (final_url != candidate.url).then_some(final_url),
                cache_hit: false,
            },
        }
    }

    fn build_from_html(
        &self,
        candidate: &Candidate,
        parsed: &parse::ParsedDocument,
        html: &str,
        final_url: &str,
        options: &ExtractOptions<'_>,
    ) -> Result<NormalizedArticle, RetrievalError> {
        let canonical_source = parsed.canonical_link.clone().unwrap_or_else(|| final_url.to_string());
        let canonical_url = canonical::canonicalize(&canonical_source)
            .or_else(|| canonical::canonicalize(&candidate.url))
            .ok_or_else(|| RetrievalError::parse("could not canonicalize URL"))?;

        let source_host = url::Url::parse(&canonical_url).ok().and_then(|u| u.host_str().map(|h| h.to_string())).unwrap_or_default();

        let resolved_dates = dates::extract_structured_dates(html, final_url);
        let published_at = resolved_dates.published_at.or_else(|| dates::infer_date_from_text(&parsed.body));
        let published_at_inferred = resolved_dates.published_at.is_none() && published_at.is_some();
        let modified_at = resolved_dates.modified_at;

        let title = parsed.title.clone().unwrap_or_else(|| candidate.title.clone());
        let quality = quality::compute_quality(&parsed.body, options.query_tokens);
        let excerpt = parse::normalize_whitespace(&parsed.body.chars().take(280).collect::<String>());

        Ok(NormalizedArticle {
            id: retrieval_common::hash::id_for_url(&canonical_url),
            title,
            canonical_url,
            source_host,
            source_name: candidate.source_name.clone(),
            published_at,
            published_at_inferred,
            modified_at,
            excerpt,
            body: parsed.body.clone(),
            has_extracted_body: true,
            quality,
            provenance: Provenance { provider: candidate.provider, provider_id: candidate.id.clone() },
        })
    }

    fn build_from_fallback(&self, candidate: &Candidate, body: &str, final_url: &str) -> Result<NormalizedArticle, RetrievalError> {
        let canonical_url = canonical::canonicalize(final_url)
            .or_else(|| canonical::canonicalize(&candidate.url))
            .ok_or_else(|| RetrievalError::parse("could not canonicalize URL"))?;
        let source_host = url::Url::parse(&canonical_url).ok().and_then(|u| u.host_str().map(|h| h.to_string())).unwrap_or_default();

        let published_at = candidate
            .published_at
            .as_deref()
            .and_then(dates::parse_date_str)
            .or_else(|| dates::extract_structured_dates("", final_url).published_at);

        let normalized_body = parse::normalize_whitespace(&html_escape::decode_html_entities(body));
        let quality = quality::compute_quality(&normalized_body, &[]);
        let excerpt = normalized_body.chars().take(280).collect::<String>();

        Ok(NormalizedArticle {
            id: retrieval_common::hash::id_for_url(&canonical_url),
            title: candidate.title.clone(),
            canonical_url,
            source_host,
            source_name: candidate.source_name.clone(),
            published_at,
            published_at_inferred: false,
            modified_at: published_at,
            excerpt,
            body: normalized_body,
            has_extracted_body: false,
            quality,
            provenance: Provenance { provider: candidate.provider, provider_id: candidate.id.clone() },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate_with_provider_data(value: serde_json::Value) -> Candidate {
        let mut c = Candidate::new(Provider::EventRegistry, "A sufficiently long title here", "https://example.com/story");
        c.provider_data = value;
        c
    }

    #[test]
    fn provider_fallback_requires_200_chars() {
        let short = candidate_with_provider_data(serde_json::json!({"body": "too short"}));
        assert!(provider_fallback_body(&short).is_none());

        let long_body = "x".repeat(250);
        let long = candidate_with_provider_data(serde_json::json!({"body": long_body}));
        assert!(provider_fallback_body(&long).is_some());
    }

    #[test]
    fn provider_fallback_checks_known_keys() {
        let long_body = "y".repeat(220);
        let c = candidate_with_provider_data(serde_json::json!({"description": long_body}));
        assert!(provider_fallback_body(&c).is_some());
    }

    #[test]
    fn provider_fallback_none_when_no_known_key_present() {
        let c = candidate_with_provider_data(serde_json::json!({"unrelated_field": "x".repeat(500)}));
        assert!(provider_fallback_body(&c).is_none());
    }

    #[tokio::test]
    async fn unsafe_url_never_issues_a_network_request() {
        let fetcher = Arc::new(fetch::test_support::MockFetcher::new());
        let extractor = Extractor::with_fetcher(fetcher.clone(), 100, 60_000);
        let candidate = Candidate::new(Provider::WebSearch, "A sufficiently long title here", "http://localhost/internal");
        let cancellation = tokio_util::sync::CancellationToken::new();
        let connector_options = ConnectorOptions { cancellation, recency_hours: 48 };
        let options = ExtractOptions {
            user_agent: "RetrievalCore/1.0",
            fetch_timeout_ms: 5000,
            query_tokens: &[],
            connector_options: &connector_options,
        };
        let result = extractor.extract(&candidate, &options).await;
        assert!(result.article.is_none());
        assert!(result.error.is_some());
    }
}
