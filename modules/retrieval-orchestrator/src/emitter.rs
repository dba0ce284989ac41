//! Stage event stream (spec §6): a unidirectional sequence of JSON stage
//! events, framed as Server-Sent Events. The emitter is an injected
//! capability (spec §9 "Event emission is an interface capability (sink)
//! injected into the orchestrator; tests use an in-memory recorder").

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    Retrieval,
    Ranking,
    Outline,
    TargetedResearch,
    Synthesis,
    ImagePrompt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Start,
    Progress,
    Success,
    Failure,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub run_id: String,
    pub stage: Stage,
    pub status: Status,
    pub message: Option<String>,
    pub data: Option<serde_json::Value>,
    pub ts: DateTime<Utc>,
}

impl StageEvent {
    pub fn new(run_id: impl Into<String>, stage: Stage, status: Status) -> Self {
        Self { run_id: run_id.into(), stage, status, message: None, data: None, ts: Utc::now() }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Render a stage event as an SSE frame (spec §6: `event: stage-event` /
/// `data: <json>`, blank-line delimited).
pub fn format_stage_event(event: &StageEvent) -> String {
    let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
    format!("event: stage-event\ndata: {json}\n\n")
}

/// Render a fatal event: `event: fatal` / `data: {"error": ...}`.
pub fn format_fatal(error: &str) -> String {
    let json = serde_json::json!({ "error": error });
    format!("event: fatal\ndata: {json}\n\n")
}

/// A `: heartbeat` comment line, sent every `heartbeatIntervalMs` to keep
/// the connection alive (spec §6).
pub fn format_heartbeat() -> String {
    ": heartbeat\n\n".to_string()
}

#[async_trait]
pub trait Emitter: Send + Sync {
    async fn emit(&self, event: StageEvent);
    async fn fatal(&self, error: String);
}

/// No-op emitter for callers that don't need progress events.
pub struct NullEmitter;

#[async_trait]
impl Emitter for NullEmitter {
    async fn emit(&self, _event: StageEvent) {}
    async fn fatal(&self, _error: String) {}
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use std::sync::Mutex;

    /// In-memory recorder (spec §9), for asserting on emitted events
    /// without a real stream.
    #[derive(Default)]
    pub struct RecordingEmitter {
        pub events: Mutex<Vec<StageEvent>>,
        pub fatal_errors: Mutex<Vec<String>>,
    }

    impl RecordingEmitter {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl Emitter for RecordingEmitter {
        async fn emit(&self, event: StageEvent) {
            self.events.lock().unwrap().push(event);
        }

        async fn fatal(&self, error: String) {
            self.fatal_errors.lock().unwrap().push(error);
        }
    }
}
