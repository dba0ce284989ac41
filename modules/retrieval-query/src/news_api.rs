//! News-API query dialect (spec §4.1): every multi-word segment is quoted
//! (News API's boolean parser is stricter than a web search engine's), plus
//! a bag-of-tokens fallback for when the provider rejects an OR-heavy
//! boolean query as malformed (spec §4.2 News API retry behavior). The
//! fallback replaces OR with *implicit* AND, i.e. plain space-separated
//! terms with no boolean keyword at all, since the provider that rejected
//! the boolean form would just as readily reject a literal `AND`.

const MAX_SEGMENTS: usize = 6;
const FALLBACK_SEGMENT_COUNT: usize = 3;

fn quote_multiword(segment: &str) -> String {
    if segment.split_whitespace().count() >= 2 {
        format!("\"{segment}\"")
    } else {
        segment.to_string()
    }
}

/// Primary News API query: OR-joined, every multi-word segment quoted.
pub fn build(segments: &[String]) -> String {
    segments
        .iter()
        .take(MAX_SEGMENTS)
        .map(|s| quote_multiword(s))
        .collect::<Vec<_>>()
        .join(" OR ")
}

/// Fallback variant used after a "malformed query" rejection: a bag of
/// tokens over the first three segments, space-separated with no boolean
/// operator, relying on the provider's own implicit-AND term matching.
pub fn build_fallback(segments: &[String]) -> String {
    segments.iter().take(FALLBACK_SEGMENT_COUNT).cloned().collect::<Vec<_>>().join(" ")
}
