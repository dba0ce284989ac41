//! Query Normalizer (spec §4.1). Concentrates every upstream provider's
//! query dialect in one place so connectors stay thin and unit-testable
//! without mocking this module (spec §9).

mod event_registry;
mod news_api;
mod segments;
mod tokens;
mod web_search;

pub use tokens::{tokenize_body, tokenize_for_relevance};

use serde::{Deserialize, Serialize};

/// Either a raw topic string, or a pre-split query map (spec §4.1).
#[derive(Debug, Clone)]
pub enum QueryInput {
    Topic(String),
    Map(QueryMap),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryMap {
    pub main: Option<String>,
    pub web_search: Option<String>,
    pub news_api: Option<String>,
    pub event_registry: Option<Vec<String>>,
}

/// The normalized, provider-shaped query (spec §4.1 Output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedQuery {
    pub main_query_string: String,
    pub web_search_query: String,
    pub news_api_query: String,
    pub event_registry_keywords: Vec<String>,
    pub query_tokens: Vec<String>,
}

/// Derive provider-specific query shapes from a raw topic or query map.
pub fn normalize(input: &QueryInput) -> NormalizedQuery {
    let main_query_string = match input {
        QueryInput::Topic(t) => t.trim().to_string(),
        QueryInput::Map(m) => m.main.clone().unwrap_or_default(),
    };

    let query_tokens = tokens::tokenize_for_relevance(&main_query_string);
    let segs = segments::segments(&main_query_string);

    let web_search_query = match input {
        QueryInput::Map(m) if m.web_search.is_some() => m.web_search.clone().unwrap(),
        _ => web_search::build(&segs),
    };

    let news_api_query = match input {
        QueryInput::Map(m) if m.news_api.is_some() => m.news_api.clone().unwrap(),
        _ => news_api::build(&segs),
    };

    let event_registry_keywords = match input {
        QueryInput::Map(m) if m.event_registry.is_some() => m.event_registry.clone().unwrap(),
        _ => event_registry::build(&segs),
    };

    NormalizedQuery {
        main_query_string,
        web_search_query,
        news_api_query,
        event_registry_keywords,
        query_tokens,
    }
}

/// News-API fallback variant: a bag of tokens (implicit AND, no operator)
/// over the first 3 segments, for providers that reject boolean/OR syntax
/// (spec §4.1, §4.2 News API).
pub fn news_api_fallback(main_query_string: &str) -> String {
    let segs = segments::segments(main_query_string);
    news_api::build_fallback(&segs)
}

/// Web-search fallback: same segments, but never quoted — used when the
/// quoted-OR form returns zero results upstream.
pub fn web_search_fallback(main_query_string: &str) -> String {
    let segs = segments::segments(main_query_string);
    segs.iter().take(6).cloned().collect::<Vec<_>>().join(" OR ")
}
