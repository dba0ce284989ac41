//! Web-search query dialect (spec §4.1): an OR-joined list of segments,
//! quoting only the ones that look like a proper noun or an acronym so the
//! search engine treats them as an exact phrase rather than loose terms.

const MAX_SEGMENTS: usize = 6;

fn looks_like_proper_noun_or_acronym(segment: &str) -> bool {
    let words: Vec<&str> = segment.split_whitespace().collect();
    if words.len() < 2 {
        return false;
    }

    let all_titlecase = words.iter().all(|w| {
        w.chars()
            .next()
            .map(|c| c.is_uppercase())
            .unwrap_or(false)
    });

    let has_acronym = words.iter().any(|w| {
        let letters: Vec<char> = w.chars().filter(|c| c.is_alphabetic()).collect();
        letters.len() >= 2 && letters.iter().all(|c| c.is_uppercase())
    });

    all_titlecase || has_acronym
}

fn quote_if_needed(segment: &str) -> String {
    if looks_like_proper_noun_or_acronym(segment) {
        format!("\"{segment}\"")
    } else {
        segment.to_string()
    }
}

/// Build the OR-joined, selectively quoted web-search query.
pub fn build(segments: &[String]) -> String {
    segments
        .iter()
        .take(MAX_SEGMENTS)
        .map(|s| quote_if_needed(s))
        .collect::<Vec<_>>()
        .join(" OR ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_titlecase_multiword_segment() {
        assert_eq!(build(&["Minneapolis Housing".to_string()]), "\"Minneapolis Housing\"");
    }

    #[test]
    fn does_not_quote_lowercase_multiword_segment() {
        assert_eq!(build(&["rent control".to_string()]), "rent control");
    }

    #[test]
    fn does_not_quote_single_word_segment() {
        assert_eq!(build(&["Minneapolis".to_string()]), "Minneapolis");
    }

    #[test]
    fn quotes_segment_containing_acronym() {
        assert_eq!(build(&["FEMA response".to_string()]), "\"FEMA response\"");
    }

    #[test]
    fn joins_with_or_and_caps_at_six_segments() {
        let segs: Vec<String> = (0..10).map(|i| format!("segment{i}")).collect();
        let out = build(&segs);
        assert_eq!(out.split(" OR ").count(), 6);
    }
}
