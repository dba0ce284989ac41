//! Event Registry keyword dialect (spec §4.1): an ordered keyword list
//! capped at 15 entries and a 15-token total budget, preferring quoted
//! phrases, compressing unquoted phrases by dropping stopwords and
//! truncating to at most 5 tokens each, and discarding degenerate
//! keywords (bare conjunctions, pure punctuation, empty strings).

use crate::tokens::is_stopword;

const MAX_KEYWORDS: usize = 15;
const MAX_TOKEN_BUDGET: usize = 15;
const MAX_TOKENS_PER_KEYWORD: usize = 5;

fn is_degenerate(keyword: &str) -> bool {
    let trimmed = keyword.trim();
    if trimmed.is_empty() {
        return true;
    }
    let lower = trimmed.to_lowercase();
    if lower == "or" || lower == "and" || lower == "the" {
        return true;
    }
    !trimmed.chars().any(|c| c.is_alphanumeric())
}

/// Compress a segment into at most [`MAX_TOKENS_PER_KEYWORD`] content
/// tokens by dropping stopwords, falling back to the raw token set if
/// stopword removal would empty it entirely.
fn compress(segment: &str) -> String {
    let words: Vec<&str> = segment.split_whitespace().collect();
    let filtered: Vec<&str> = words.iter().copied().filter(|w| !is_stopword(&w.to_lowercase())).collect();
    let chosen = if filtered.is_empty() { words } else { filtered };
    chosen.into_iter().take(MAX_TOKENS_PER_KEYWORD).collect::<Vec<_>>().join(" ")
}

fn is_quoted_phrase(segment: &str) -> bool {
    segment.split_whitespace().count() >= 2
        && segment.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
}

/// Build the Event Registry keyword list from query segments.
pub fn build(segments: &[String]) -> Vec<String> {
    let mut ordered: Vec<&String> = segments.iter().collect();
    ordered.sort_by_key(|s| !is_quoted_phrase(s));

    let mut keywords = Vec::new();
    let mut token_budget_used = 0usize;

    for segment in ordered {
        if keywords.len() >= MAX_KEYWORDS {
            break;
        }
        let compressed = compress(segment);
        if is_degenerate(&compressed) {
            continue;
        }
        let token_count = compressed.split_whitespace().count();
        if token_budget_used + token_count > MAX_TOKEN_BUDGET && !keywords.is_empty() {
            continue;
        }
        token_budget_used += token_count;
        keywords.push(compressed);
    }

    keywords
}
