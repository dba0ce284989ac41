//! End-to-end scenarios over `Orchestrator::run` (spec §8): real
//! connectors swapped for `FixedConnector`, real network fetches swapped
//! for an unconfigured `MockFetcher` so every candidate resolves through
//! the extractor's provider-body fallback path deterministically, with no
//! network and no HTML-parsing dependency.

use std::sync::Arc;

use chrono::Utc;
use retrieval_common::config::{ConnectorsConfig, PersistenceConfig, RetrievalConfig, RetrievalTuning};
use retrieval_common::{Candidate, ConnectorMetrics, Provider};
use retrieval_connectors::test_support::FixedConnector;
use retrieval_connectors::{Connector, ConnectorResult};
use retrieval_extractor::fetch::test_support::MockFetcher;
use retrieval_extractor::Extractor;
use retrieval_orchestrator::test_support::{NullArtifactStore, RecordingEmitter};
use retrieval_orchestrator::Orchestrator;

/// A body long enough to clear the extractor's 200-char fallback floor and
/// with enough distinct tokens to clear a modest `min_unique_word_count`.
fn long_body(seed: &str, words: usize) -> String {
    (0..words).map(|i| format!("{seed}{i}")).collect::<Vec<_>>().join(" ")
}

fn candidate(provider: Provider, url: &str, seed: &str) -> Candidate {
    let mut c = Candidate::new(provider, "City budget faces a widening shortfall", url);
    c.snippet = Some("Officials are weighing cuts to the city budget after revenue came in below projections.".to_string());
    c.published_at = Some(Utc::now().to_rfc3339());
    c.provider_data = serde_json::json!({ "body": long_body(seed, 60) });
    c
}

fn connector_result(provider: Provider, candidates: Vec<Candidate>) -> ConnectorResult {
    ConnectorResult {
        provider,
        fetched_at: Utc::now(),
        query: "city budget".to_string(),
        items: candidates,
        metrics: ConnectorMetrics::default(),
    }
}

fn lenient_config(min_accepted: u32, global_concurrency: usize, max_attempts: u32) -> RetrievalConfig {
    RetrievalConfig {
        recency_hours: 48,
        retrieval: RetrievalTuning {
            min_accepted,
            max_attempts,
            global_concurrency,
            per_host_concurrency: 4,
            fetch_timeout_ms: 5_000,
            total_budget_ms: 30_000,
            cache_ttl_ms: 60_000,
            user_agent: "RetrievalCore/1.0".to_string(),
            cluster_threshold: 0.65,
            attach_threshold: 0.55,
            max_clusters: 5,
            max_candidates: 40,
            min_word_count: 30,
            min_unique_word_count: 20,
            // the fallback body path always scores relevance at 0 (it has
            // no query tokens to compare against), so these scenarios rely
            // on a permissive threshold rather than exercising relevance.
            min_relevance: 0.0,
            max_promo_phrase_matches: 99,
            heartbeat_interval_ms: 15_000,
            banned_sources: vec![],
        },
        connectors: ConnectorsConfig::default(),
        persistence: PersistenceConfig::default(),
    }
}

fn orchestrator(connectors: Vec<Arc<dyn Connector>>, config: RetrievalConfig, emitter: Arc<RecordingEmitter>) -> Orchestrator {
    let extractor = Arc::new(Extractor::with_fetcher(Arc::new(MockFetcher::new()), 256, 60_000));
    Orchestrator::new(connectors, extractor, Arc::new(NullArtifactStore), emitter, config)
}

#[tokio::test]
async fn happy_path_accepts_candidates_into_ranked_articles_and_clusters() {
    let candidates = vec![
        candidate(Provider::WebSearch, "https://example.com/story-a", "alpha"),
        candidate(Provider::WebSearch, "https://example.com/story-b", "bravo"),
        candidate(Provider::WebSearch, "https://example.com/story-c", "charlie"),
    ];
    let connector: Arc<dyn Connector> = Arc::new(FixedConnector { result: connector_result(Provider::WebSearch, candidates) });
    let emitter = Arc::new(RecordingEmitter::new());
    let orchestrator = orchestrator(vec![connector], lenient_config(2, 3, 10), emitter.clone());

    let output = orchestrator.run("run-happy", "city budget").await;

    assert!(output.metrics.accepted >= 2, "expected at least 2 accepted, got {}", output.metrics.accepted);
    assert_eq!(output.ranked_articles.len(), output.metrics.accepted as usize);
    assert!(!output.clusters.is_empty());

    let events = emitter.events.lock().unwrap();
    assert!(events.iter().any(|e| e.status == retrieval_orchestrator::emitter::Status::Start));
    assert!(events.iter().any(|e| e.status == retrieval_orchestrator::emitter::Status::Success));
}

#[tokio::test]
async fn disabled_connector_contributes_nothing_while_the_other_still_succeeds() {
    let disabled: Arc<dyn Connector> = Arc::new(FixedConnector { result: ConnectorResult::disabled(Provider::EventRegistry) });
    let working_candidates = vec![candidate(Provider::NewsApi, "https://example.com/news-story", "delta")];
    let working: Arc<dyn Connector> = Arc::new(FixedConnector { result: connector_result(Provider::NewsApi, working_candidates) });

    let emitter = Arc::new(RecordingEmitter::new());
    let orchestrator = orchestrator(vec![disabled, working], lenient_config(1, 2, 10), emitter);

    let output = orchestrator.run("run-disabled", "city budget").await;

    let registry = output.metrics.per_provider.get(&Provider::EventRegistry).unwrap();
    assert!(registry.disabled);
    assert_eq!(registry.returned, 0);

    assert_eq!(output.metrics.accepted, 1);
    assert_eq!(output.metrics.per_provider.get(&Provider::NewsApi).unwrap().accepted, 1);
}

#[tokio::test]
async fn duplicate_url_across_providers_is_deduped_before_extraction_ever_runs() {
    let shared_url = "https://example.com/shared-story";
    let a: Arc<dyn Connector> = Arc::new(FixedConnector {
        result: connector_result(Provider::WebSearch, vec![candidate(Provider::WebSearch, shared_url, "echo")]),
    });
    let b: Arc<dyn Connector> = Arc::new(FixedConnector {
        result: connector_result(Provider::WebNewsRss, vec![candidate(Provider::WebNewsRss, shared_url, "foxtrot")]),
    });

    let emitter = Arc::new(RecordingEmitter::new());
    let orchestrator = orchestrator(vec![a, b], lenient_config(1, 2, 10), emitter);

    let output = orchestrator.run("run-dupes", "city budget").await;

    assert_eq!(output.metrics.duplicates_removed, 1);
    assert_eq!(output.metrics.accepted, 1);
    // exactly one provider did the extraction work; the other's candidate
    // never reached the queue at all.
    let attempted: u32 = output.metrics.per_provider.values().map(|p| p.extraction_attempts).sum();
    assert_eq!(attempted, 1);
}

#[tokio::test]
async fn reaching_min_accepted_stops_the_pool_before_the_whole_queue_drains() {
    let candidates = (0..6)
        .map(|i| candidate(Provider::WebSearch, &format!("https://example.com/story-{i}"), &format!("seed{i}")))
        .collect::<Vec<_>>();
    let connector: Arc<dyn Connector> = Arc::new(FixedConnector { result: connector_result(Provider::WebSearch, candidates) });

    let emitter = Arc::new(RecordingEmitter::new());
    // a single worker makes claim order deterministic: once 2 are accepted
    // the loop's stop check fires before a 3rd candidate is ever claimed.
    let orchestrator = orchestrator(vec![connector], lenient_config(2, 1, 10), emitter);

    let output = orchestrator.run("run-early-stop", "city budget").await;

    assert_eq!(output.metrics.accepted, 2);
    let skipped: u32 = output.metrics.per_provider.values().map(|p| p.skipped).sum();
    assert!(skipped > 0, "expected leftover candidates to be tallied as skipped");
}

#[tokio::test]
async fn a_budget_that_has_already_elapsed_skips_every_queued_candidate() {
    let candidates = vec![
        candidate(Provider::WebSearch, "https://example.com/story-x", "hotel"),
        candidate(Provider::WebSearch, "https://example.com/story-y", "india"),
    ];
    let connector: Arc<dyn Connector> = Arc::new(FixedConnector { result: connector_result(Provider::WebSearch, candidates) });

    let emitter = Arc::new(RecordingEmitter::new());
    let mut config = lenient_config(1, 2, 10);
    config.retrieval.total_budget_ms = 0;
    let orchestrator = orchestrator(vec![connector], config, emitter);

    let output = orchestrator.run("run-deadline", "city budget").await;

    assert_eq!(output.metrics.accepted, 0);
    let skipped: u32 = output.metrics.per_provider.values().map(|p| p.skipped).sum();
    assert_eq!(skipped, 2);
}

#[tokio::test]
async fn a_fatal_emitter_call_is_never_made_on_a_clean_run() {
    let candidates = vec![candidate(Provider::WebSearch, "https://example.com/clean-story", "golf")];
    let connector: Arc<dyn Connector> = Arc::new(FixedConnector { result: connector_result(Provider::WebSearch, candidates) });

    let emitter = Arc::new(RecordingEmitter::new());
    let orchestrator = orchestrator(vec![connector], lenient_config(1, 2, 10), emitter.clone());

    let _ = orchestrator.run("run-clean", "city budget").await;

    assert!(emitter.fatal_errors.lock().unwrap().is_empty());
}
