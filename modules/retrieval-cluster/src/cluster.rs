//! Single-pass greedy agglomerative clustering (spec §4.5, testable
//! property §8.10: cluster order is non-increasing by score).

use retrieval_common::{Citation, NormalizedArticle, StoryCluster};

use crate::similarity::{jaccard, text_for_similarity};

#[derive(Debug, Clone)]
pub struct ClusterOptions {
    pub cluster_threshold: f64,
    pub attach_threshold: f64,
    pub max_clusters: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self { cluster_threshold: 0.65, attach_threshold: 0.55, max_clusters: 5 }
    }
}

struct WorkingCluster {
    representative_id: String,
    representative_text: String,
    members: Vec<NormalizedArticle>,
    score: f64,
    reasons: Vec<String>,
}

/// Cluster ranked articles, already sorted by descending score, each
/// paired with the rejection-adjacent "reasons" metadata carried forward
/// from ranking (typically empty for accepted articles; present when the
/// caller wants provenance notes folded into the cluster).
pub fn cluster(ranked: Vec<(NormalizedArticle, f64, Vec<String>)>, options: &ClusterOptions) -> Vec<StoryCluster> {
    let mut clusters: Vec<WorkingCluster> = Vec::new();

    for (article, article_score, reasons) in ranked {
        let text = text_for_similarity(&article);

        let mut best: Option<(usize, f64)> = None;
        for (i, c) in clusters.iter().enumerate() {
            let sim = jaccard(&text, &c.representative_text);
            if best.map(|(_, b)| sim > b).unwrap_or(true) {
                best = Some((i, sim));
            }
        }

        match best {
            Some((idx, sim)) if sim >= options.cluster_threshold => {
                let c = &mut clusters[idx];
                if article_score > c.score {
                    c.representative_id = article.id.clone();
                    c.representative_text = text;
                    c.score = article_score;
                    for r in reasons {
                        if !c.reasons.contains(&r) {
                            c.reasons.push(r);
                        }
                    }
                }
                c.members.push(article);
            }
            Some((idx, sim)) if sim >= options.attach_threshold => {
                clusters[idx].members.push(article);
            }
            _ => {
                if clusters.len() < options.max_clusters {
                    clusters.push(WorkingCluster {
                        representative_id: article.id.clone(),
                        representative_text: text,
                        score: article_score,
                        reasons,
                        members: vec![article],
                    });
                }
                // else: discarded from clustering, per spec §4.5.
            }
        }
    }

    let mut out: Vec<StoryCluster> = clusters
        .into_iter()
        .map(|c| {
            let mut members = c.members;
            if let Some(pos) = members.iter().position(|m| m.id == c.representative_id) {
                let rep = members.remove(pos);
                members.insert(0, rep);
            }
            let representative = members[0].clone();
            let citations = members.iter().map(|m| Citation { title: m.title.clone(), url: m.canonical_url.clone() }).collect();

            StoryCluster {
                cluster_id: uuid::Uuid::new_v4().to_string(),
                representative,
                members,
                score: c.score,
                reasons: c.reasons,
                citations,
            }
        })
        .collect();

    out.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrieval_common::{Provenance, Provider, QualitySignals};

    fn article(id: &str, title: &str, excerpt: &str) -> NormalizedArticle {
        NormalizedArticle {
            id: id.to_string(),
            title: title.to_string(),
            canonical_url: format!("https://example.com/{id}"),
            source_host: "example.com".to_string(),
            source_name: None,
            published_at: None,
            published_at_inferred: false,
            modified_at: None,
            excerpt: excerpt.to_string(),
            body: String::new(),
            has_extracted_body: true,
            quality: QualitySignals { word_count: 500, unique_word_count: 200, relevance_score: 0.5 },
            provenance: Provenance { provider: Provider::WebSearch, provider_id: "1".to_string() },
        }
    }

    #[test]
    fn near_duplicate_stories_join_one_cluster() {
        let ranked = vec![
            (article("a", "Mayor announces new budget plan", "city officials unveiled the plan today"), 0.9, vec![]),
            (article("b", "Mayor announces new budget plan today", "city officials unveiled the plan today in detail"), 0.8, vec![]),
        ];
        let clusters = cluster(ranked, &ClusterOptions::default());
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 2);
    }

    #[test]
    fn representative_is_highest_scoring_member_and_comes_first() {
        let ranked = vec![
            (article("a", "Mayor announces new budget plan", "city officials unveiled the plan today"), 0.5, vec![]),
            (article("b", "Mayor announces new budget plan today", "city officials unveiled the plan today in detail"), 0.9, vec![]),
        ];
        let clusters = cluster(ranked, &ClusterOptions::default());
        assert_eq!(clusters[0].representative.id, "b");
        assert_eq!(clusters[0].members[0].id, "b");
    }

    #[test]
    fn dissimilar_stories_form_separate_clusters() {
        let ranked = vec![
            (article("a", "City council approves new housing development", "the vote passed unanimously"), 0.9, vec![]),
            (article("b", "Local bakery wins national pastry award", "the chef celebrated the win"), 0.8, vec![]),
        ];
        let clusters = cluster(ranked, &ClusterOptions::default());
        assert_eq!(clusters.len(), 2);
    }

    #[test]
    fn clusters_beyond_max_are_discarded_not_errored() {
        let ranked: Vec<_> = (0..10)
            .map(|i| (article(&format!("id{i}"), &format!("Totally unrelated topic number {i} about widgets"), "nothing in common with the others at all"), 1.0 - (i as f64) * 0.01, vec![]))
            .collect();
        let opts = ClusterOptions { max_clusters: 3, ..Default::default() };
        let clusters = cluster(ranked, &opts);
        assert!(clusters.len() <= 3);
    }

    #[test]
    fn clusters_are_sorted_by_score_descending() {
        let ranked = vec![
            (article("a", "City council approves new housing development", "the vote passed unanimously"), 0.3, vec![]),
            (article("b", "Local bakery wins national pastry award", "the chef celebrated the win"), 0.9, vec![]),
        ];
        let clusters = cluster(ranked, &ClusterOptions::default());
        assert!(clusters[0].score >= clusters[1].score);
    }
}
