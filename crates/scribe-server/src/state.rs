//! Shared server state and request/response types

use scribe_core::{ProgressSink, RunOutcome};
use scribe_orchestrator::Orchestrator;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared application state
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub progress: ProgressSink,
    /// Most recently finished run
    pub last_result: RwLock<Option<RunOutcome>>,
}

impl AppState {
    /// Shares the orchestrator's progress channel with SSE listeners
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let progress = orchestrator.progress().clone();
        Self {
            orchestrator,
            progress,
            last_result: RwLock::new(None),
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Body of `POST /api/generate-documentation`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub project_path: String,
    /// Revision cap for this run, defaults to the configured one
    #[serde(default)]
    pub max_iterations: Option<usize>,
    /// Respond with the finished run instead of 202
    #[serde(default)]
    pub wait: bool,
}

/// Acknowledgement of a background run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MissionAccepted {
    pub message: String,
    pub run_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
