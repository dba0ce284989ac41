//! Splits a raw topic string into independent query "segments" — the unit
//! that the web-search and News-API builders OR/AND together. A segment is
//! a comma/conjunction-delimited phrase, trimmed and deduplicated, so a
//! topic like "Minneapolis housing, rent control, and eviction filings"
//! yields three segments rather than one long phrase.

fn split_on_boundary(input: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let words: Vec<&str> = input.split_whitespace().collect();
    let mut i = 0;
    while i < words.len() {
        let word = words[i];
        let lower = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        let is_conjunction = (lower == "and" || lower == "or") && !current.trim().is_empty();
        if is_conjunction {
            segments.push(current.trim().to_string());
            current.clear();
        } else {
            if word.ends_with(',') || word.ends_with(';') {
                current.push_str(word.trim_end_matches([',', ';']));
                segments.push(current.trim().to_string());
                current.clear();
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            }
        }
        i += 1;
    }
    if !current.trim().is_empty() {
        segments.push(current.trim().to_string());
    }
    segments
}

/// Produce the ordered, deduplicated list of query segments for a topic.
pub fn segments(topic: &str) -> Vec<String> {
    let trimmed = topic.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::new();
    for seg in split_on_boundary(trimmed) {
        let cleaned = seg
            .trim_matches(|c: char| c.is_whitespace() || c == ',' || c == ';')
            .to_string();
        if cleaned.is_empty() {
            continue;
        }
        let key = cleaned.to_lowercase();
        if seen.insert(key) {
            out.push(cleaned);
        }
    }

    if out.is_empty() {
        out.push(trimmed.to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_phrase_topic_is_one_segment() {
        assert_eq!(segments("Minneapolis housing crisis"), vec!["Minneapolis housing crisis"]);
    }

    #[test]
    fn comma_and_conjunction_delimited_topic_splits() {
        let segs = segments("Minneapolis housing, rent control, and eviction filings");
        assert_eq!(
            segs,
            vec![
                "Minneapolis housing".to_string(),
                "rent control".to_string(),
                "eviction filings".to_string(),
            ]
        );
    }

    #[test]
    fn empty_topic_yields_no_segments() {
        assert!(segments("   ").is_empty());
    }

    #[test]
    fn duplicate_segments_are_deduped_case_insensitively() {
        let segs = segments("rent control and Rent Control");
        assert_eq!(segs, vec!["rent control".to_string()]);
    }
}
