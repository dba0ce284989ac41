//! Recognized configuration keys (spec §6), collected into one
//! serde-deserializable tree so a binary can load it from JSON/TOML in one
//! shot, matching the teacher's plain-struct config style (see
//! `rootsignal-scout`'s per-stage config structs) rather than reaching for a
//! dedicated config-layer crate.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub recency_hours: u32,
    pub retrieval: RetrievalTuning,
    pub connectors: ConnectorsConfig,
    pub persistence: PersistenceConfig,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            recency_hours: 48,
            retrieval: RetrievalTuning::default(),
            connectors: ConnectorsConfig::default(),
            persistence: PersistenceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalTuning {
    pub min_accepted: u32,
    pub max_attempts: u32,
    pub global_concurrency: usize,
    pub per_host_concurrency: usize,
    pub fetch_timeout_ms: u64,
    pub total_budget_ms: u64,
    pub cache_ttl_ms: u64,
    pub user_agent: String,
    pub cluster_threshold: f64,
    pub attach_threshold: f64,
    pub max_clusters: usize,
    pub max_candidates: usize,
    pub min_word_count: usize,
    pub min_unique_word_count: usize,
    pub min_relevance: f64,
    pub max_promo_phrase_matches: usize,
    pub heartbeat_interval_ms: u64,
    pub banned_sources: Vec<String>,
}

impl Default for RetrievalTuning {
    fn default() -> Self {
        Self {
            min_accepted: 8,
            max_attempts: 30,
            global_concurrency: 6,
            per_host_concurrency: 2,
            fetch_timeout_ms: 10_000,
            total_budget_ms: 25_000,
            cache_ttl_ms: 15 * 60_000,
            user_agent: "Mozilla/5.0 (compatible; RetrievalCore/1.0)".to_string(),
            cluster_threshold: 0.65,
            attach_threshold: 0.55,
            max_clusters: 5,
            max_candidates: 40,
            min_word_count: 150,
            min_unique_word_count: 60,
            min_relevance: 0.05,
            max_promo_phrase_matches: 2,
            heartbeat_interval_ms: 15_000,
            banned_sources: vec!["lowcredibility.example".to_string()],
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectorsConfig {
    pub web_search: WebSearchConfig,
    pub web_news_rss: WebNewsRssConfig,
    pub news_api: NewsApiConfig,
    pub event_registry: EventRegistryConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSearchConfig {
    pub api_key: Option<String>,
    pub search_engine_id: Option<String>,
    pub enabled: bool,
    pub news_only: bool,
    pub allowed_hosts: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebNewsRssConfig {
    pub enabled: bool,
    pub feed_url: Option<String>,
    pub hl: String,
    pub gl: String,
    pub ceid: String,
    pub max_results: u32,
}

impl Default for WebNewsRssConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            feed_url: None,
            hl: "en".to_string(),
            gl: "US".to_string(),
            ceid: "US:en".to_string(),
            max_results: 50,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsApiConfig {
    pub api_key: Option<String>,
    pub page_size: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EventRegistryConfig {
    pub api_key: Option<String>,
    pub lookback_hours: Option<u32>,
    pub max_events: u32,
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistenceConfig {
    pub mode: PersistenceMode,
    pub root_dir: String,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            mode: PersistenceMode::Filesystem,
            root_dir: "./artifacts".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistenceMode {
    #[default]
    Filesystem,
    Null,
}

impl RetrievalConfig {
    /// Load from a JSON file, falling back to defaults when `path` is
    /// `None` or unreadable. API keys are layered in separately from the
    /// environment by [`RetrievalConfig::apply_env_overrides`] so they
    /// never need to sit in a checked-in config file.
    pub fn from_file_or_default(path: Option<&str>) -> Self {
        let Some(path) = path else { return Self::default() };
        match std::fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!(error = %e, path, "failed to parse config file, using defaults");
                Self::default()
            }),
            Err(e) => {
                tracing::warn!(error = %e, path, "failed to read config file, using defaults");
                Self::default()
            }
        }
    }

    /// Layer API keys in from the environment (spec §6): these are never
    /// read from a config file on disk.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("WEB_SEARCH_API_KEY") {
            self.connectors.web_search.api_key = Some(key);
        }
        if let Ok(id) = std::env::var("WEB_SEARCH_ENGINE_ID") {
            self.connectors.web_search.search_engine_id = Some(id);
        }
        if let Ok(key) = std::env::var("NEWS_API_KEY") {
            self.connectors.news_api.api_key = Some(key);
        }
        if let Ok(key) = std::env::var("EVENT_REGISTRY_API_KEY") {
            self.connectors.event_registry.api_key = Some(key);
        }
    }

    /// Log the config at startup with API keys redacted (spec's ambient
    /// logging stack — never log a secret even at debug level).
    pub fn log_redacted(&self) {
        tracing::info!(
            recency_hours = self.recency_hours,
            min_accepted = self.retrieval.min_accepted,
            global_concurrency = self.retrieval.global_concurrency,
            persistence_mode = ?self.persistence.mode,
            web_search_enabled = self.connectors.web_search.enabled,
            web_search_has_key = self.connectors.web_search.api_key.is_some(),
            news_api_enabled = self.connectors.news_api.enabled,
            news_api_has_key = self.connectors.news_api.api_key.is_some(),
            event_registry_enabled = self.connectors.event_registry.enabled,
            event_registry_has_key = self.connectors.event_registry.api_key.is_some(),
            "loaded retrieval config"
        );
    }
}
