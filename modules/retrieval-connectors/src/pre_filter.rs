//! Cheap URL/title/snippet heuristics applied inside connectors before a
//! candidate is ever queued for extraction (spec §4.2.x). Grounded on
//! `rootsignal-archive::router`'s URL-pattern classification style — plain
//! `str::contains`/`ends_with` checks over a closed list, no regex needed
//! for the path/fragment checks.

/// Closed list of non-article path segments (spec §4.2.x).
const BANNED_PATH_SEGMENTS: &[&str] = &[
    "/about", "/contact", "/pricing", "/careers", "/docs", "/login", "/signup", "/cart",
    "/search", "/account", "/settings", "/privacy", "/terms", "/subscribe", "/newsletter",
    "/jobs", "/advertise", "/sitemap",
];

/// Closed list of banned fragments anywhere in the URL (spec §4.2.x).
const BANNED_FRAGMENTS: &[&str] = &["utm_", "#comment", "/feed", "/tag/", "/category/", "?replytocom="];

const MIN_TITLE_LEN: usize = 15;
const MIN_SNIPPET_LEN: usize = 30;
const MIN_RELEVANCE: f64 = 0.10;

/// A pre-filter decision (spec §4.2.x): pass, or reject with a reason drawn
/// from the closed set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreFilterDecision {
    Pass,
    Reject(PreFilterReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreFilterReason {
    EmptyUrl,
    BannedPath,
    BannedFragment,
    TitleTooShort,
    SnippetTooShort,
    LowRelevance,
}

impl PreFilterReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            PreFilterReason::EmptyUrl => "empty_url",
            PreFilterReason::BannedPath => "banned_path",
            PreFilterReason::BannedFragment => "banned_fragment",
            PreFilterReason::TitleTooShort => "title_too_short",
            PreFilterReason::SnippetTooShort => "snippet_too_short",
            PreFilterReason::LowRelevance => "low_relevance",
        }
    }
}

impl PreFilterDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, PreFilterDecision::Pass)
    }
}

/// Quick relevance signal: fraction of query tokens present as substrings
/// of `title + " " + snippet`. Skipped (returns `1.0`, i.e. never the
/// rejecting factor) when the query has fewer than 2 tokens longer than 2
/// chars — the overlap signal is too noisy on very short queries (spec
/// §4.2.x).
fn quick_relevance(title: &str, snippet: &str, query_tokens: &[String]) -> f64 {
    let meaningful: Vec<&String> = query_tokens.iter().filter(|t| t.len() > 2).collect();
    if meaningful.len() < 2 {
        return 1.0;
    }
    let haystack = format!("{title} {snippet}").to_lowercase();
    let hits = meaningful.iter().filter(|t| haystack.contains(t.as_str())).count();
    hits as f64 / meaningful.len() as f64
}

/// Apply the pre-filter to a candidate's URL, title, and snippet against
/// the originating raw query's tokens (spec §4.2.x `applyPreFilter`).
pub fn apply_pre_filter(url: &str, title: &str, snippet: &str, query_tokens: &[String]) -> PreFilterDecision {
    if url.trim().is_empty() {
        return PreFilterDecision::Reject(PreFilterReason::EmptyUrl);
    }

    let lower_url = url.to_lowercase();
    if BANNED_PATH_SEGMENTS.iter().any(|seg| lower_url.contains(seg)) {
        return PreFilterDecision::Reject(PreFilterReason::BannedPath);
    }
    if BANNED_FRAGMENTS.iter().any(|frag| lower_url.contains(frag)) {
        return PreFilterDecision::Reject(PreFilterReason::BannedFragment);
    }
    if title.trim().chars().count() < MIN_TITLE_LEN {
        return PreFilterDecision::Reject(PreFilterReason::TitleTooShort);
    }
    if snippet.trim().chars().count() < MIN_SNIPPET_LEN {
        return PreFilterDecision::Reject(PreFilterReason::SnippetTooShort);
    }
    if quick_relevance(title, snippet, query_tokens) < MIN_RELEVANCE {
        return PreFilterDecision::Reject(PreFilterReason::LowRelevance);
    }

    PreFilterDecision::Pass
}
