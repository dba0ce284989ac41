use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use retrieval_common::RetrievalConfig;
use retrieval_connectors::{Connector, EventRegistryConnector, NewsApiConnector, WebNewsRssConnector, WebSearchConnector};
use retrieval_extractor::Extractor;
use retrieval_orchestrator::artifact_store::{ArtifactStore, FilesystemArtifactStore, NullArtifactStore};
use retrieval_orchestrator::emitter::{format_stage_event, Emitter, NullEmitter, StageEvent};
use retrieval_orchestrator::Orchestrator;

/// Run one retrieval pass for a topic and print the resulting ranked
/// articles, clusters, and metrics as a stage-event stream.
#[derive(Parser, Debug)]
#[command(name = "retrieval-cli")]
struct Args {
    /// Topic to research, e.g. "Minneapolis housing crisis".
    topic: String,

    /// Path to a JSON config file (see `RetrievalConfig`); defaults are used
    /// when omitted.
    #[arg(long)]
    config: Option<String>,

    /// Run identifier; a random one is used when omitted.
    #[arg(long)]
    run_id: Option<String>,
}

struct StdoutEmitter;

#[async_trait::async_trait]
impl Emitter for StdoutEmitter {
    async fn emit(&self, event: StageEvent) {
        print!("{}", format_stage_event(&event));
    }

    async fn fatal(&self, error: String) {
        print!("{}", retrieval_orchestrator::emitter::format_fatal(&error));
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("retrieval=info".parse()?))
        .init();

    let args = Args::parse();

    let mut config = RetrievalConfig::from_file_or_default(args.config.as_deref());
    config.apply_env_overrides();
    config.log_redacted();

    let connectors: Vec<Arc<dyn Connector>> = vec![
        Arc::new(WebSearchConnector::new(config.connectors.web_search.clone())),
        Arc::new(WebNewsRssConnector::new(config.connectors.web_news_rss.clone())),
        Arc::new(NewsApiConnector::new(config.connectors.news_api.clone())),
        Arc::new(EventRegistryConnector::new(config.connectors.event_registry.clone())),
    ];

    let extractor = Arc::new(Extractor::new(2048, config.retrieval.cache_ttl_ms));

    let artifact_store: Arc<dyn ArtifactStore> = match config.persistence.mode {
        retrieval_common::config::PersistenceMode::Filesystem => {
            Arc::new(FilesystemArtifactStore::new(config.persistence.root_dir.clone()))
        }
        retrieval_common::config::PersistenceMode::Null => Arc::new(NullArtifactStore),
    };

    let emitter: Arc<dyn Emitter> = if std::io::IsTerminal::is_terminal(&std::io::stdout()) {
        Arc::new(NullEmitter)
    } else {
        Arc::new(StdoutEmitter)
    };

    let orchestrator = Orchestrator::new(connectors, extractor, artifact_store, emitter, config);

    let run_id = args.run_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    info!(run_id, topic = %args.topic, "starting retrieval run");

    let output = orchestrator.run(run_id, args.topic).await;

    info!(
        accepted = output.metrics.accepted,
        clusters = output.clusters.len(),
        "retrieval run complete"
    );
    println!("{}", serde_json::to_string_pretty(&output.metrics)?);

    Ok(())
}
