//! HTTP fetch abstraction (spec §4.3.3). A trait rather than a bare
//! `reqwest::Client` call so orchestrator/extractor tests can swap in a
//! `MockFetcher` with no network, mirroring
//! `rootsignal-scout::traits::ContentFetcher`.

use async_trait::async_trait;
use retrieval_common::RetrievalError;

/// The result of a raw HTTP GET, stripped down to what the extractor needs:
/// final URL after redirects, content-type, and body bytes.
#[derive(Debug, Clone)]
pub struct FetchedHttp {
    pub status: u16,
    pub content_type: Option<String>,
    pub final_url: String,
    pub body: Vec<u8>,
}

impl FetchedHttp {
    pub fn is_html(&self) -> bool {
        self.content_type.as_deref().map(|ct| ct.to_lowercase().contains("text/html")).unwrap_or(false)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn get(&self, url: &str, user_agent: &str, timeout_ms: u64) -> Result<FetchedHttp, RetrievalError>;
    async fn post_form(&self, url: &str, body: &str, user_agent: &str, timeout_ms: u64) -> Result<FetchedHttp, RetrievalError>;
}

pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new() -> Self {
        Self { client: reqwest::Client::builder().build().expect("failed to build extractor HTTP client") }
    }
}

impl Default for ReqwestFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    async fn get(&self, url: &str, user_agent: &str, timeout_ms: u64) -> Result<FetchedHttp, RetrievalError> {
        let resp = self
            .client
            .get(url)
            .header("User-Agent", user_agent)
            .header("Accept", "text/html,application/xhtml+xml")
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .send()
            .await
            .map_err(|e| RetrievalError::network(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp.headers().get("content-type").and_then(|v| v.to_str().ok()).map(|s| s.to_string());
        let final_url = resp.url().to_string();
        let body = resp.bytes().await.map_err(|e| RetrievalError::network(e.to_string()))?.to_vec();

        Ok(FetchedHttp { status, content_type, final_url, body })
    }

    async fn post_form(&self, url: &str, body: &str, user_agent: &str, timeout_ms: u64) -> Result<FetchedHttp, RetrievalError> {
        let resp = self
            .client
            .post(url)
            .header("User-Agent", user_agent)
            .header("Content-Type", "application/x-www-form-urlencoded;charset=UTF-8")
            .timeout(std::time::Duration::from_millis(timeout_ms))
            .body(body.to_string())
            .send()
            .await
            .map_err(|e| RetrievalError::network(e.to_string()))?;

        let status = resp.status().as_u16();
        let content_type = resp.headers().get("content-type").and_then(|v| v.to_str().ok()).map(|s| s.to_string());
        let final_url = resp.url().to_string();
        let body = resp.bytes().await.map_err(|e| RetrievalError::network(e.to_string()))?.to_vec();

        Ok(FetchedHttp { status, content_type, final_url, body })
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// A canned-response fetcher keyed by exact URL, for extractor/orchestrator
    /// tests that need deterministic HTTP without a network.
    #[derive(Default)]
    pub struct MockFetcher {
        responses: Mutex<HashMap<String, Result<FetchedHttp, String>>>,
    }

    impl MockFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(&self, url: impl Into<String>, response: FetchedHttp) {
            self.responses.lock().unwrap().insert(url.into(), Ok(response));
        }

        pub fn fail(&self, url: impl Into<String>, error: impl Into<String>) {
            self.responses.lock().unwrap().insert(url.into(), Err(error.into()));
        }
    }

    #[async_trait]
    impl Fetcher for MockFetcher {
        async fn get(&self, url: &str, _user_agent: &str, _timeout_ms: u64) -> Result<FetchedHttp, RetrievalError> {
            match self.responses.lock().unwrap().get(url) {
                Some(Ok(r)) => Ok(r.clone()),
                Some(Err(e)) => Err(RetrievalError::network(e.clone())),
                None => Err(RetrievalError::network(format!("no mock response for {url}"))),
            }
        }

        async fn post_form(&self, url: &str, _body: &str, _user_agent: &str, _timeout_ms: u64) -> Result<FetchedHttp, RetrievalError> {
            self.get(url, "", 0).await
        }
    }
}
