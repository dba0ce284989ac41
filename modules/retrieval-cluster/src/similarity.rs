//! Stable symmetric similarity over a title+excerpt prefix (spec §4.5, §9:
//! "any stable similarity with the stated thresholds" — this is a
//! token-shingle Jaccard over the 600-char prefix).

use retrieval_common::NormalizedArticle;
use std::collections::HashSet;

const PREFIX_LEN: usize = 600;
const SHINGLE_SIZE: usize = 3;

/// The comparison text for clustering/dedupe: `title + " " + excerpt`,
/// truncated to 600 characters (spec §4.5).
pub fn text_for_similarity(article: &NormalizedArticle) -> String {
    let combined = format!("{} {}", article.title, article.excerpt);
    combined.chars().take(PREFIX_LEN).collect()
}

fn shingles(text: &str) -> HashSet<String> {
    let tokens: Vec<String> = text.to_lowercase().split_whitespace().map(|s| s.to_string()).collect();
    if tokens.len() < SHINGLE_SIZE {
        return tokens.into_iter().collect();
    }
    tokens.windows(SHINGLE_SIZE).map(|w| w.join(" ")).collect()
}

/// Jaccard similarity between the token-shingle sets of two texts, in `[0, 1]`.
pub fn jaccard(a: &str, b: &str) -> f64 {
    let sa = shingles(a);
    let sb = shingles(b);
    if sa.is_empty() && sb.is_empty() {
        return 1.0;
    }
    let intersection = sa.intersection(&sb).count();
    let union = sa.union(&sb).count();
    if union == 0 { 0.0 } else { intersection as f64 / union as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_text_has_similarity_one() {
        assert_eq!(jaccard("the city council met today", "the city council met today"), 1.0);
    }

    #[test]
    fn disjoint_text_has_similarity_zero() {
        assert_eq!(jaccard("the city council met today", "a recipe for banana bread here"), 0.0);
    }

    #[test]
    fn overlapping_text_is_between_zero_and_one() {
        let a = "the city council met today to discuss the budget";
        let b = "the city council met yesterday to discuss the budget";
        let sim = jaccard(a, b);
        assert!(sim > 0.0 && sim < 1.0);
    }

    #[test]
    fn is_symmetric() {
        let a = "housing costs rise across the metro area this year";
        let b = "across the metro area housing costs keep rising fast";
        assert_eq!(jaccard(a, b), jaccard(b, a));
    }
}
