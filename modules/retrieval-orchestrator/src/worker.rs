//! Bounded extraction worker pool (spec §4.6.5-4.6.6). Workers pull from a
//! shared, already round-robin-ordered queue by atomically claiming the
//! next index, so no two workers race on the same candidate and drain
//! order stays exactly what `scoring::round_robin_queue` produced.
//! Grounded on `rootsignal-scout`'s `ChromeScraper`, which bounds
//! concurrency with a `tokio::sync::Semaphore` rather than a fixed-size
//! worker-per-task spawn.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Arc;

use retrieval_common::{Candidate, NormalizedArticle, Provider, ProviderMetrics, RunContext};
use retrieval_connectors::ConnectorOptions;
use retrieval_extractor::{ExtractOptions, Extractor};
use retrieval_filter::FilterOptions;
use tokio::sync::{Mutex, Semaphore};

pub struct WorkerPoolOptions {
    pub global_concurrency: usize,
    pub per_host_concurrency: usize,
    pub user_agent: String,
    pub fetch_timeout_ms: u64,
    pub min_accepted: u32,
    pub query_tokens: Vec<String>,
    pub filter: FilterOptions,
}

pub struct WorkerPoolResult {
    pub accepted: Vec<NormalizedArticle>,
    pub per_provider: HashMap<Provider, ProviderMetrics>,
}

struct Shared {
    queue: Vec<Candidate>,
    next_index: AtomicUsize,
    accepted_count: AtomicU32,
    host_semaphores: Mutex<HashMap<String, Arc<Semaphore>>>,
}

async fn host_permit(shared: &Shared, host: &str, per_host_concurrency: usize) -> tokio::sync::OwnedSemaphorePermit {
    let sem = {
        let mut map = shared.host_semaphores.lock().await;
        map.entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(per_host_concurrency)))
            .clone()
    };
    sem.acquire_owned().await.expect("host semaphore never closed")
}

fn host_of(url: &str) -> String {
    url::Url::parse(url).ok().and_then(|u| u.host_str().map(|h| h.to_string())).unwrap_or_default()
}

/// Run extraction over `queue` with bounded global and per-host
/// concurrency, stopping early once `min_accepted` is reached, the run is
/// cancelled, or the deadline passes (spec §4.6.5, §4.6.6). Permits are
/// released in reverse-acquisition order as each worker's future drops,
/// which is `tokio::sync::Semaphore`'s default behavior.
pub async fn run_pool(
    queue: Vec<Candidate>,
    extractor: Arc<Extractor>,
    connector_options: ConnectorOptions,
    run: RunContext,
    options: WorkerPoolOptions,
) -> WorkerPoolResult {
    let shared = Arc::new(Shared {
        queue,
        next_index: AtomicUsize::new(0),
        accepted_count: AtomicU32::new(0),
        host_semaphores: Mutex::new(HashMap::new()),
    });

    let global = Arc::new(Semaphore::new(options.global_concurrency.max(1)));
    let per_provider: Arc<Mutex<HashMap<Provider, ProviderMetrics>>> = Arc::new(Mutex::new(HashMap::new()));
    let accepted: Arc<Mutex<Vec<NormalizedArticle>>> = Arc::new(Mutex::new(Vec::new()));

    let worker_count = options.global_concurrency.max(1).min(shared.queue.len().max(1));
    let mut handles = Vec::with_capacity(worker_count);

    for _ in 0..worker_count {
        let shared = shared.clone();
        let global = global.clone();
        let per_provider = per_provider.clone();
        let accepted = accepted.clone();
        let extractor = extractor.clone();
        let connector_options = connector_options.clone();
        let run = run.clone();
        let user_agent = options.user_agent.clone();
        let fetch_timeout_ms = options.fetch_timeout_ms;
        let per_host_concurrency = options.per_host_concurrency;
        let query_tokens = options.query_tokens.clone();
        let filter_options = options.filter.clone();
        let min_accepted = options.min_accepted;

        handles.push(tokio::spawn(async move {
            loop {
                if run.deadline_passed() {
                    // Deadline-triggered stop also cancels in-flight fetches (spec §4.6.6, §5),
                    // rather than only refusing to start new ones.
                    run.cancellation.cancel();
                    break;
                }
                if run.is_cancelled() || shared.accepted_count.load(Ordering::SeqCst) >= min_accepted {
                    break;
                }

                let idx = shared.next_index.fetch_add(1, Ordering::SeqCst);
                let Some(candidate) = shared.queue.get(idx) else { break };

                let _global_permit = global.acquire().await.expect("global semaphore never closed");
                let host = host_of(&candidate.url);
                let _host_permit = host_permit(&shared, &host, per_host_concurrency).await;

                {
                    let mut pm = per_provider.lock().await;
                    pm.entry(candidate.provider).or_default().extraction_attempts += 1;
                }

                let extract_options = ExtractOptions {
                    user_agent: &user_agent,
                    fetch_timeout_ms,
                    query_tokens: &query_tokens,
                    connector_options: &connector_options,
                };
                let result = extractor.extract(candidate, &extract_options).await;

                let provider = candidate.provider;
                match result.article {
                    Some(article) => {
                        let decision = retrieval_filter::evaluate(&article, &filter_options);
                        let mut pm_guard = per_provider.lock().await;
                        let pm = pm_guard.entry(provider).or_default();
                        if decision.accept {
                            pm.accepted += 1;
                            if article.published_at.is_none() && provider != Provider::WebSearch {
                                pm.missing_published_at += 1;
                            }
                            drop(pm_guard);
                            accepted.lock().await.push(article);
                            shared.accepted_count.fetch_add(1, Ordering::SeqCst);
                        } else {
                            pm.pre_filtered += 1;
                            for reason in &decision.reasons {
                                *pm.rejection_reasons.entry(reason.as_str().to_string()).or_insert(0) += 1;
                            }
                        }
                    }
                    None => {
                        let mut pm_guard = per_provider.lock().await;
                        let pm = pm_guard.entry(provider).or_default();
                        if let Some(err) = result.error {
                            pm.extraction_errors.push(retrieval_common::ExtractionError {
                                url: candidate.url.clone(),
                                error: err.message,
                            });
                        }
                    }
                }
            }
        }));
    }

    for handle in handles {
        let _ = handle.await;
    }

    let skipped = (shared.queue.len() as u32).saturating_sub(shared.next_index.load(Ordering::SeqCst) as u32);
    if skipped > 0 {
        let mut pm_guard = per_provider.lock().await;
        for candidate in shared.queue.iter().skip(shared.next_index.load(Ordering::SeqCst)) {
            pm_guard.entry(candidate.provider).or_default().skipped += 1;
        }
    }

    WorkerPoolResult {
        accepted: Arc::try_unwrap(accepted).map(|m| m.into_inner()).unwrap_or_default(),
        per_provider: Arc::try_unwrap(per_provider).map(|m| m.into_inner()).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use retrieval_common::Provider;
    use retrieval_extractor::fetch::test_support::MockFetcher;
    use tokio_util::sync::CancellationToken;

    fn run_context() -> RunContext {
        RunContext::new("run-1", "topic", 48, Utc::now() + chrono::Duration::seconds(30))
    }

    fn options(min_accepted: u32) -> WorkerPoolOptions {
        WorkerPoolOptions {
            global_concurrency: 2,
            per_host_concurrency: 2,
            user_agent: "RetrievalCore/1.0".to_string(),
            fetch_timeout_ms: 2000,
            min_accepted,
            query_tokens: vec![],
            filter: FilterOptions {
                recency_hours: 48,
                min_word_count: 0,
                min_unique_word_count: 0,
                min_relevance: 0.0,
                max_promo_phrase_matches: 99,
                banned_sources: vec![],
            },
        }
    }

    #[tokio::test]
    async fn empty_queue_produces_no_accepted_articles() {
        let extractor = Arc::new(Extractor::with_fetcher(Arc::new(MockFetcher::new()), 10, 60_000));
        let connector_options = ConnectorOptions { cancellation: CancellationToken::new(), recency_hours: 48 };
        let result = run_pool(vec![], extractor, connector_options, run_context(), options(5)).await;
        assert!(result.accepted.is_empty());
    }

    #[tokio::test]
    async fn already_cancelled_run_skips_every_candidate() {
        let extractor = Arc::new(Extractor::with_fetcher(Arc::new(MockFetcher::new()), 10, 60_000));
        let connector_options = ConnectorOptions { cancellation: CancellationToken::new(), recency_hours: 48 };
        let run = run_context();
        run.cancellation.cancel();
        let queue = vec![Candidate::new(Provider::WebSearch, "A sufficiently long title here", "https://example.com/a")];
        let result = run_pool(queue, extractor, connector_options, run, options(5)).await;
        assert!(result.accepted.is_empty());
        assert_eq!(result.per_provider.get(&Provider::WebSearch).map(|m| m.skipped), Some(1));
    }
}
