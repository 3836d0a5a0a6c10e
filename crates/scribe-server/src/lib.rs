//! # scribe-server
//!
//! HTTP surface for Scribe: submit documentation missions, fetch the last
//! result and follow the live progress feed over server-sent events.

mod server;
mod sse;
mod state;

pub use server::router;
pub use state::{AppState, ErrorBody, GenerateRequest, MissionAccepted, SharedState};

use scribe_core::ServerSettings;
use scribe_orchestrator::Orchestrator;
use std::sync::Arc;
use tracing::info;

/// Run the HTTP server until the process is stopped
pub async fn run(settings: ServerSettings, orchestrator: Arc<Orchestrator>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", settings.host, settings.port);
    let url = format!("http://localhost:{}", settings.port);

    info!("Starting scribe server on {}", addr);
    println!("Scribe running at {}", url);
    println!("Live feed: {}/api/events", url);
    println!("Press Ctrl+C to stop");

    server::serve(AppState::new(orchestrator), &addr).await
}
