//! Orchestrator (spec §4.6): wires the query normalizer, connectors,
//! extractor, filter, and cluster crates into one run. Grounded on
//! `rootsignal-scout::core::scrape_pipeline` for the overall shape of a
//! "fan out to providers, then bounded-concurrency process the results"
//! pipeline, simplified away from its event-sourced engine machinery.

pub mod artifact_store;
pub mod emitter;
pub mod safe_fetch;
pub mod scoring;
pub mod worker;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use retrieval_cluster::{ClusterOptions, FinalizeOptions};
use retrieval_common::{Provider, ProviderMetrics, RetrievalConfig, RetrievalMetrics, RunContext, StoryCluster, NormalizedArticle};
use retrieval_connectors::{Connector, ConnectorOptions};
use retrieval_extractor::Extractor;
use retrieval_filter::FilterOptions;
use retrieval_query::{normalize, QueryInput};

use artifact_store::ArtifactStore;
use emitter::{Emitter, Stage, StageEvent, Status};

pub struct Orchestrator {
    connectors: Vec<Arc<dyn Connector>>,
    extractor: Arc<Extractor>,
    artifact_store: Arc<dyn ArtifactStore>,
    emitter: Arc<dyn Emitter>,
    config: RetrievalConfig,
}

pub struct RunOutput {
    pub run_id: String,
    pub ranked_articles: Vec<NormalizedArticle>,
    pub clusters: Vec<StoryCluster>,
    pub metrics: RetrievalMetrics,
}

impl Orchestrator {
    pub fn new(
        connectors: Vec<Arc<dyn Connector>>,
        extractor: Arc<Extractor>,
        artifact_store: Arc<dyn ArtifactStore>,
        emitter: Arc<dyn Emitter>,
        config: RetrievalConfig,
    ) -> Self {
        Self { connectors, extractor, artifact_store, emitter, config }
    }

    /// Run one full retrieval (spec §4.6 steps 1-9): fan out to every
    /// enabled connector, aggregate and dedupe candidates, round-robin
    /// extraction under bounded concurrency, filter, and finalize into
    /// ranked articles plus story clusters.
    pub async fn run(&self, run_id: impl Into<String>, topic: impl Into<String>) -> RunOutput {
        let run_id = run_id.into();
        let topic = topic.into();
        let tuning = &self.config.retrieval;
        let deadline_at = Utc::now() + chrono::Duration::milliseconds(tuning.total_budget_ms as i64);
        let run = RunContext::new(run_id.clone(), topic.clone(), self.config.recency_hours, deadline_at);

        self.emitter.emit(StageEvent::new(run_id.as_str(), Stage::Retrieval, Status::Start)).await;
        let _ = self.artifact_store.ensure_layout().await;

        let query = normalize(&QueryInput::Topic(topic));
        let connector_options = ConnectorOptions { cancellation: run.cancellation.clone(), recency_hours: self.config.recency_hours };
        let fetch_timeout = Duration::from_millis(tuning.fetch_timeout_ms);

        let fetches = self.connectors.iter().cloned().map(|connector| {
            safe_fetch::safe_fetch(connector, query.clone(), connector_options.clone(), fetch_timeout)
        });
        let results = futures::future::join_all(fetches).await;

        let mut per_provider: HashMap<Provider, ProviderMetrics> = HashMap::new();
        let mut candidates = Vec::new();

        for result in &results {
            let snapshot = serde_json::to_vec(&candidate_snapshot(result)).unwrap_or_default();
            let _ = self.artifact_store.save_raw_provider_snapshot(result.provider.as_str(), &run_id, &snapshot).await;

            let pm = per_provider.entry(result.provider).or_default();
            pm.disabled = result.metrics.disabled;
            pm.failed = result.metrics.failed;
            pm.error = result.metrics.error.clone();
            pm.query = Some(result.query.clone());
            pm.returned = result.items.len() as u32;

            candidates.extend(result.items.clone());
        }

        candidates.retain(|c| {
            let decision = retrieval_connectors::pre_filter::apply_pre_filter(
                &c.url,
                &c.title,
                c.snippet.as_deref().unwrap_or(""),
                &query.query_tokens,
            );
            let pass = decision.is_pass();
            if !pass {
                per_provider.entry(c.provider).or_default().pre_filtered += 1;
            }
            pass
        });

        let candidates = scoring::dedupe_across_providers(candidates, &mut per_provider);
        for c in &candidates {
            per_provider.entry(c.provider).or_default().unique += 1;
        }

        let queue = scoring::round_robin_queue(candidates, &query.query_tokens);
        let queue: Vec<_> = queue.into_iter().take(tuning.max_attempts as usize).collect();
        for c in &queue {
            per_provider.entry(c.provider).or_default().queued += 1;
        }

        self.emitter.emit(StageEvent::new(run_id.as_str(), Stage::Retrieval, Status::Progress).with_message(format!("extracting {} candidates", queue.len()))).await;

        let worker_options = worker::WorkerPoolOptions {
            global_concurrency: tuning.global_concurrency,
            per_host_concurrency: tuning.per_host_concurrency,
            user_agent: tuning.user_agent.clone(),
            fetch_timeout_ms: tuning.fetch_timeout_ms,
            min_accepted: tuning.min_accepted,
            query_tokens: query.query_tokens.clone(),
            filter: FilterOptions {
                recency_hours: self.config.recency_hours,
                min_word_count: tuning.min_word_count,
                min_unique_word_count: tuning.min_unique_word_count,
                min_relevance: tuning.min_relevance,
                max_promo_phrase_matches: tuning.max_promo_phrase_matches,
                banned_sources: tuning.banned_sources.clone(),
            },
        };

        let pool_result = worker::run_pool(queue, self.extractor.clone(), connector_options, run.clone(), worker_options).await;

        let post_extraction_rejected: u32 = pool_result.per_provider.values().map(|p| p.pre_filtered).sum();

        for (provider, pm) in pool_result.per_provider {
            let entry = per_provider.entry(provider).or_default();
            entry.extraction_attempts += pm.extraction_attempts;
            entry.accepted += pm.accepted;
            entry.missing_published_at += pm.missing_published_at;
            entry.skipped += pm.skipped;
            entry.pre_filtered += pm.pre_filtered;
            entry.extraction_errors.extend(pm.extraction_errors);
            for (reason, count) in pm.rejection_reasons {
                *entry.rejection_reasons.entry(reason).or_insert(0) += count;
            }
        }

        let accepted_count = pool_result.accepted.len();
        let finalize_options = FinalizeOptions {
            recency_hours: self.config.recency_hours,
            max_candidates: tuning.max_candidates,
            // Spec §4.6 step 7: similarity dedupe is off here by default so accepted
            // near-duplicates aren't double-punished on top of clustering (§4.5).
            dedupe_by_similarity: false,
            similarity_threshold: 0.78,
            cluster: ClusterOptions {
                cluster_threshold: tuning.cluster_threshold,
                attach_threshold: tuning.attach_threshold,
                max_clusters: tuning.max_clusters,
            },
        };
        let (ranked_articles, clusters) = retrieval_cluster::finalize(pool_result.accepted, &finalize_options);

        // Persist each kept article and the cluster set (spec §4.6 step 7).
        for article in &ranked_articles {
            if let Ok(payload) = serde_json::to_vec(article) {
                let _ = self.artifact_store.save_normalized_article(&article.id, &payload).await;
            }
        }
        if let Ok(payload) = serde_json::to_vec(&clusters) {
            let _ = self.artifact_store.save_run_artifact(&run_id, "clusters", &payload).await;
        }

        let newest_article_hours = ranked_articles.iter().filter_map(|a| a.published_at).map(|dt| (Utc::now() - dt).num_seconds() as f64 / 3600.0).fold(None, min_opt);
        let oldest_article_hours = ranked_articles.iter().filter_map(|a| a.published_at).map(|dt| (Utc::now() - dt).num_seconds() as f64 / 3600.0).fold(None, max_opt);

        // Run-level preFiltered is its own formula (spec §4.6.8): URL-dedupe plus
        // post-extraction rejections, not a sum of the per-provider preFiltered
        // field (which also carries the cheap pre-extraction heuristic rejects).
        let duplicates_removed: u32 = per_provider.values().map(|p| p.deduped).sum();

        let metrics = RetrievalMetrics {
            candidate_count: per_provider.values().map(|p| p.returned).sum(),
            pre_filtered: duplicates_removed + post_extraction_rejected,
            attempted_extractions: per_provider.values().map(|p| p.extraction_attempts).sum(),
            accepted: accepted_count as u32,
            duplicates_removed,
            newest_article_hours,
            oldest_article_hours,
            extraction_errors: per_provider.values().flat_map(|p| p.extraction_errors.clone()).collect(),
            per_provider,
        };

        let summary = serde_json::to_vec(&metrics).unwrap_or_default();
        let _ = self.artifact_store.save_run_artifact(&run_id, "metrics", &summary).await;

        self.emitter.emit(StageEvent::new(run_id.as_str(), Stage::Retrieval, Status::Success).with_message(format!("{} accepted", metrics.accepted))).await;

        RunOutput { run_id, ranked_articles, clusters, metrics }
    }
}

fn min_opt(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.min(v)))
}

fn max_opt(acc: Option<f64>, v: f64) -> Option<f64> {
    Some(acc.map_or(v, |a| a.max(v)))
}

fn candidate_snapshot(result: &retrieval_connectors::ConnectorResult) -> serde_json::Value {
    serde_json::json!({
        "provider": result.provider.as_str(),
        "fetched_at": result.fetched_at,
        "query": result.query,
        "item_count": result.items.len(),
    })
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    pub use crate::artifact_store::NullArtifactStore;
    pub use crate::emitter::test_support::RecordingEmitter;
}
