//! Deduper, Ranker, Clusterer (spec §4.5): canonical-URL dedupe, optional
//! similarity dedupe, scoring, and single-pass greedy agglomerative
//! clustering over accepted articles.

pub mod cluster;
pub mod dedupe;
pub mod rank;
pub mod similarity;

pub use cluster::{cluster as cluster_articles, ClusterOptions};
pub use dedupe::{dedupe_by_canonical_url, dedupe_by_similarity};
pub use rank::score;

use retrieval_common::{NormalizedArticle, StoryCluster};

/// Tunables for the finalize step (spec §4.6 step 7).
#[derive(Debug, Clone)]
pub struct FinalizeOptions {
    pub recency_hours: u32,
    pub max_candidates: usize,
    pub dedupe_by_similarity: bool,
    pub similarity_threshold: f64,
    pub cluster: ClusterOptions,
}

/// Run canonical-URL dedupe (optionally similarity dedupe), rank, and
/// cluster over the accepted articles of a run (spec §4.6 step 7):
/// produces at most `maxCandidates` ranked articles and at most
/// `maxClusters` clusters.
pub fn finalize(accepted: Vec<NormalizedArticle>, options: &FinalizeOptions) -> (Vec<NormalizedArticle>, Vec<StoryCluster>) {
    let deduped = dedupe_by_canonical_url(accepted);
    let deduped = if options.dedupe_by_similarity {
        dedupe_by_similarity(deduped, options.similarity_threshold)
    } else {
        deduped
    };

    let mut scored: Vec<(NormalizedArticle, f64)> =
        deduped.into_iter().map(|a| { let s = score(&a, options.recency_hours); (a, s) }).collect();
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap());
    scored.truncate(options.max_candidates);

    let ranked_articles: Vec<NormalizedArticle> = scored.iter().map(|(a, _)| a.clone()).collect();
    let ranked_for_clustering: Vec<(NormalizedArticle, f64, Vec<String>)> =
        scored.into_iter().map(|(a, s)| (a, s, Vec::new())).collect();

    let clusters = cluster_articles(ranked_for_clustering, &options.cluster);

    (ranked_articles, clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrieval_common::{Provenance, Provider, QualitySignals};

    fn article(id: &str) -> NormalizedArticle {
        NormalizedArticle {
            id: id.to_string(),
            title: format!("Story {id} about a completely unrelated local topic"),
            canonical_url: format!("https://example.com/{id}"),
            source_host: "example.com".to_string(),
            source_name: None,
            published_at: None,
            published_at_inferred: false,
            modified_at: None,
            excerpt: format!("excerpt for {id} with unique filler words here"),
            body: String::new(),
            has_extracted_body: true,
            quality: QualitySignals { word_count: 500, unique_word_count: 200, relevance_score: 0.5 },
            provenance: Provenance { provider: Provider::WebSearch, provider_id: "1".to_string() },
        }
    }

    #[test]
    fn finalize_caps_ranked_articles_at_max_candidates() {
        let accepted: Vec<_> = (0..10).map(|i| article(&format!("{i}"))).collect();
        let options = FinalizeOptions {
            recency_hours: 48,
            max_candidates: 3,
            dedupe_by_similarity: false,
            similarity_threshold: 0.78,
            cluster: ClusterOptions::default(),
        };
        let (ranked, _clusters) = finalize(accepted, &options);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn finalize_dedupes_by_canonical_url() {
        let mut a = article("1");
        let b = a.clone();
        a.excerpt = "first".to_string();
        let accepted = vec![a, b];
        let options = FinalizeOptions {
            recency_hours: 48,
            max_candidates: 10,
            dedupe_by_similarity: false,
            similarity_threshold: 0.78,
            cluster: ClusterOptions::default(),
        };
        let (ranked, _clusters) = finalize(accepted, &options);
        assert_eq!(ranked.len(), 1);
    }
}
