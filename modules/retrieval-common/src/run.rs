//! `RunContext` (spec §3): created on run entry, destroyed on run exit.
//! Every component receives this or a narrower view; no module-level
//! mutable state is permitted outside the bounded extraction cache
//! (`retrieval-extractor`).

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

/// Per-run context threaded through every component. Cheap to clone: the
/// cancellation token is an `Arc` internally (tokio-util), everything else
/// is plain data.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub topic: String,
    pub recency_hours: u32,
    pub deadline_at: DateTime<Utc>,
    pub cancellation: CancellationToken,
}

impl RunContext {
    pub fn new(run_id: impl Into<String>, topic: impl Into<String>, recency_hours: u32, deadline_at: DateTime<Utc>) -> Self {
        Self {
            run_id: run_id.into(),
            topic: topic.into(),
            recency_hours,
            deadline_at,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    pub fn deadline_passed(&self) -> bool {
        Utc::now() >= self.deadline_at
    }

    /// Composite stop condition: cancelled or past deadline. Does not
    /// include the acceptance-threshold stop, which is run-state the
    /// orchestrator tracks separately (spec §4.6.1, §9).
    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.deadline_passed()
    }
}
