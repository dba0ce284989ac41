//! Relevance tokenization (spec §4.1 tokenization contract). Shared by the
//! query normalizer itself (to produce `query_tokens`) and by the extractor
//! and filter for relevance scoring, so all three speak the same token
//! vocabulary.

/// Stopwords dropped from the relevance token set. Closed list, not meant
/// to be exhaustive — just enough to keep short function words from
/// diluting overlap scoring.
const STOPWORDS: &[&str] = &[
    "a", "an", "the", "and", "or", "but", "nor", "so", "yet", "for", "of", "in", "on", "at",
    "to", "from", "by", "with", "about", "against", "between", "into", "through", "during",
    "before", "after", "above", "below", "up", "down", "out", "off", "over", "under", "again",
    "further", "then", "once", "is", "are", "was", "were", "be", "been", "being", "has", "have",
    "had", "do", "does", "did", "will", "would", "shall", "should", "can", "could", "may",
    "might", "must", "this", "that", "these", "those", "it", "its", "as", "not", "no",
];

const MAX_TOKENS: usize = 24;

pub(crate) fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Split a raw string into lowercase, punctuation-stripped tokens, expanding
/// hyphenated words into both their joined and split forms so queries like
/// "co-op" match both "coop" and ["co", "op"] vocabularies downstream.
pub(crate) fn raw_tokens(input: &str) -> Vec<String> {
    let lowered = input.to_lowercase();
    let cleaned: String = lowered
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' { c } else { ' ' })
        .collect();

    let mut out = Vec::new();
    for word in cleaned.split_whitespace() {
        if word.contains('-') {
            let joined: String = word.chars().filter(|c| *c != '-').collect();
            if !joined.is_empty() {
                out.push(joined);
            }
            for part in word.split('-') {
                if !part.is_empty() {
                    out.push(part.to_string());
                }
            }
        } else {
            out.push(word.to_string());
        }
    }
    out
}

/// Tokenize for relevance scoring: lowercase, alnum+hyphen only,
/// hyphen-expanded, stopwords dropped, deduped, capped at
/// [`MAX_TOKENS`]. Falls back to the unfiltered token set if stopword
/// removal would empty the result (spec §4.1 edge case: all-stopword
/// input).
pub fn tokenize_for_relevance(input: &str) -> Vec<String> {
    let raw = raw_tokens(input);

    let mut seen = std::collections::HashSet::new();
    let mut filtered = Vec::new();
    for tok in &raw {
        if is_stopword(tok) {
            continue;
        }
        if seen.insert(tok.clone()) {
            filtered.push(tok.clone());
        }
    }

    let chosen = if filtered.is_empty() {
        let mut seen = std::collections::HashSet::new();
        let mut unfiltered = Vec::new();
        for tok in &raw {
            if seen.insert(tok.clone()) {
                unfiltered.push(tok.clone());
            }
        }
        unfiltered
    } else {
        filtered
    };

    chosen.into_iter().take(MAX_TOKENS).collect()
}

/// Tokenize a body of text with the same rules as [`tokenize_for_relevance`]
/// (lowercase, alnum+hyphen, hyphen-expanded, stopwords dropped) but without
/// the 24-token cap or dedupe — used by the extractor's quality signals
/// (spec §4.3.8), where `wordCount` needs the full token count and
/// `uniqueWordCount` needs the distinct count over that same set.
pub fn tokenize_body(input: &str) -> Vec<String> {
    raw_tokens(input).into_iter().filter(|t| !is_stopword(t)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_strips_punctuation() {
        let toks = tokenize_for_relevance("Minneapolis, Housing Crisis!!!");
        assert_eq!(toks, vec!["minneapolis", "housing", "crisis"]);
    }

    #[test]
    fn expands_hyphenated_words() {
        let toks = tokenize_for_relevance("co-op housing");
        assert!(toks.contains(&"coop".to_string()));
        assert!(toks.contains(&"co".to_string()));
        assert!(toks.contains(&"op".to_string()));
        assert!(toks.contains(&"housing".to_string()));
    }

    #[test]
    fn drops_stopwords_and_dedupes() {
        let toks = tokenize_for_relevance("the housing and the crisis and the housing");
        assert_eq!(toks, vec!["housing", "crisis"]);
    }

    #[test]
    fn falls_back_to_unfiltered_when_all_stopwords() {
        let toks = tokenize_for_relevance("the and of");
        assert_eq!(toks, vec!["the", "and", "of"]);
    }

    #[test]
    fn caps_at_24_tokens() {
        let words: Vec<String> = (0..40).map(|i| format!("word{i}")).collect();
        let toks = tokenize_for_relevance(&words.join(" "));
        assert_eq!(toks.len(), 24);
    }
}
