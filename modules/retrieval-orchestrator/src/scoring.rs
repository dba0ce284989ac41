//! Candidate aggregation (spec §4.6.3-4.6.4): cross-provider URL dedupe,
//! per-candidate scoring, and round-robin queue construction so no single
//! provider can starve the others of extraction budget.

use std::collections::HashSet;

use retrieval_common::{Candidate, ProviderMetrics};

/// Token-overlap + length + recency-presence score used to order each
/// provider's candidates before they're interleaved into the extraction
/// queue (spec §4.6.4). Independent of the ranker's post-extraction score.
pub fn candidate_score(candidate: &Candidate, query_tokens: &[String]) -> f64 {
    let haystack = format!("{} {}", candidate.title, candidate.snippet.as_deref().unwrap_or("")).to_lowercase();
    let overlap = if query_tokens.is_empty() {
        0.0
    } else {
        let hits = query_tokens.iter().filter(|t| haystack.contains(t.to_lowercase().as_str())).count();
        hits as f64 / query_tokens.len() as f64
    };

    let text_len = haystack.chars().count();
    let length_bonus = (text_len as f64 / 240.0).min(1.0) * 0.15;
    let date_bonus = if candidate.published_at.is_some() { 0.05 } else { 0.0 };

    overlap + length_bonus + date_bonus
}

/// Collapse candidates that resolve to the same URL across providers,
/// keeping the first-seen occurrence and crediting each subsequent
/// provider's metrics with a `deduped` count (spec §4.6.3).
pub fn dedupe_across_providers(
    candidates: Vec<Candidate>,
    per_provider: &mut std::collections::HashMap<retrieval_common::Provider, ProviderMetrics>,
) -> Vec<Candidate> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(candidates.len());

    for candidate in candidates {
        let key = candidate.url.trim().to_lowercase();
        if seen.insert(key) {
            out.push(candidate);
        } else {
            per_provider.entry(candidate.provider).or_default().deduped += 1;
        }
    }

    out
}

/// Build the round-robin extraction queue (spec §4.6.4): group by
/// provider, sort each group descending by `candidate_score`, then
/// interleave one candidate per provider per round until every group is
/// drained. Deterministic given deterministic input ordering.
pub fn round_robin_queue(candidates: Vec<Candidate>, query_tokens: &[String]) -> Vec<Candidate> {
    use retrieval_common::Provider;

    let mut by_provider: std::collections::HashMap<Provider, Vec<Candidate>> = std::collections::HashMap::new();
    for candidate in candidates {
        by_provider.entry(candidate.provider).or_default().push(candidate);
    }

    for group in by_provider.values_mut() {
        group.sort_by(|a, b| {
            candidate_score(b, query_tokens)
                .partial_cmp(&candidate_score(a, query_tokens))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    let mut groups: Vec<Vec<Candidate>> =
        Provider::ALL.iter().filter_map(|p| by_provider.remove(p)).collect();

    let mut queue = Vec::new();
    loop {
        let mut drained_any = false;
        for group in groups.iter_mut() {
            if let Some(candidate) = group.first() {
                let _ = candidate;
                queue.push(group.remove(0));
                drained_any = true;
            }
        }
        if !drained_any {
            break;
        }
    }

    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use retrieval_common::Provider;

    fn candidate(provider: Provider, url: &str, title: &str) -> Candidate {
        let mut c = Candidate::new(provider, title, url);
        c.snippet = Some("a reasonably long snippet with some useful detail".to_string());
        c
    }

    #[test]
    fn overlapping_query_tokens_raise_the_score() {
        let tokens = vec!["housing".to_string(), "crisis".to_string()];
        let on_topic = candidate(Provider::WebSearch, "https://example.com/a", "Housing crisis worsens across the city");
        let off_topic = candidate(Provider::WebSearch, "https://example.com/b", "Local bakery wins an award");
        assert!(candidate_score(&on_topic, &tokens) > candidate_score(&off_topic, &tokens));
    }

    #[test]
    fn duplicate_urls_across_providers_are_deduped_with_metrics_credit() {
        let candidates = vec![
            candidate(Provider::WebSearch, "https://example.com/story", "First title here today"),
            candidate(Provider::NewsApi, "https://example.com/story", "Second title variant"),
        ];
        let mut metrics = std::collections::HashMap::new();
        let out = dedupe_across_providers(candidates, &mut metrics);
        assert_eq!(out.len(), 1);
        assert_eq!(metrics.get(&Provider::NewsApi).map(|m| m.deduped), Some(1));
    }

    #[test]
    fn round_robin_interleaves_providers_instead_of_draining_one_first() {
        let candidates = vec![
            candidate(Provider::WebSearch, "https://example.com/ws1", "Web search story one today"),
            candidate(Provider::WebSearch, "https://example.com/ws2", "Web search story two today"),
            candidate(Provider::NewsApi, "https://example.com/na1", "News api story one today"),
        ];
        let queue = round_robin_queue(candidates, &[]);
        assert_eq!(queue[0].provider, Provider::WebSearch);
        assert_eq!(queue[1].provider, Provider::NewsApi);
        assert_eq!(queue[2].provider, Provider::WebSearch);
    }
}
