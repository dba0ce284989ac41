//! The `safeFetchConnector` guard (spec §4.2.4, §4.6.2): a connector must
//! never be allowed to take the whole run down. Its call is isolated in a
//! task so a panic becomes a `ConnectorResult` with `metrics.failed = true`
//! instead of propagating.

use std::sync::Arc;
use std::time::Duration;

use retrieval_connectors::{Connector, ConnectorOptions, ConnectorResult};
use retrieval_query::NormalizedQuery;

/// Run a connector's `fetch`, converting a panic or a timeout into a
/// failed `ConnectorResult` rather than letting either escape.
pub async fn safe_fetch(
    connector: Arc<dyn Connector>,
    query: NormalizedQuery,
    options: ConnectorOptions,
    timeout: Duration,
) -> ConnectorResult {
    let provider = connector.provider();
    let query_text = query.main_query_string.clone();

    let task = tokio::spawn(async move { connector.fetch(&query, &options).await });

    match tokio::time::timeout(timeout, task).await {
        Ok(Ok(result)) => result,
        Ok(Err(join_err)) => {
            let message = if join_err.is_panic() {
                "connector panicked".to_string()
            } else {
                format!("connector task failed: {join_err}")
            };
            ConnectorResult::failed(provider, query_text, message)
        }
        Err(_) => ConnectorResult::failed(provider, query_text, "connector fetch timed out"),
    }
}
