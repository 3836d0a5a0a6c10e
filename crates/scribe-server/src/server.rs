//! Axum web server for mission submission and results

use crate::sse;
use crate::state::{AppState, ErrorBody, GenerateRequest, MissionAccepted, SharedState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

const MISSION_STARTED: &str = "Agent mission started. See live feed for progress.";

/// Build the router over shared state
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/generate-documentation", post(generate_documentation))
        .route("/api/result", get(get_result))
        .route("/api/events", get(sse::sse_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve until the process is stopped
pub async fn serve(state: AppState, addr: &str) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// GET /api/health
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "scribe"
    }))
}

/// POST /api/generate-documentation
async fn generate_documentation(
    State(app): State<SharedState>,
    Json(request): Json<GenerateRequest>,
) -> Response {
    let project_path = request.project_path.trim();
    if project_path.is_empty() {
        app.progress
            .error("Rejected mission: project_path must not be empty");
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "project_path must not be empty".to_string(),
            }),
        )
            .into_response();
    }

    let root = PathBuf::from(project_path);
    let max_revisions = request
        .max_iterations
        .unwrap_or(app.orchestrator.config().max_revisions);

    if request.wait {
        let outcome = app
            .orchestrator
            .run_with_revisions(&root, max_revisions)
            .await;
        *app.last_result.write().await = Some(outcome.clone());
        return (StatusCode::OK, Json(outcome)).into_response();
    }

    let run_id = uuid::Uuid::new_v4().to_string();
    app.progress.info(format!(
        "Mission {} accepted for {}",
        run_id,
        root.display()
    ));

    let background = Arc::clone(&app);
    tokio::spawn(async move {
        let outcome = background
            .orchestrator
            .run_with_revisions(&root, max_revisions)
            .await;
        *background.last_result.write().await = Some(outcome);
    });

    (
        StatusCode::ACCEPTED,
        Json(MissionAccepted {
            message: MISSION_STARTED.to_string(),
            run_id,
        }),
    )
        .into_response()
}

/// GET /api/result - last finished run
async fn get_result(State(app): State<SharedState>) -> Response {
    match app.last_result.read().await.as_ref() {
        Some(outcome) => Json(outcome.clone()).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorBody {
                error: "No documentation run has finished yet".to_string(),
            }),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{header, Request};
    use futures::StreamExt;
    use scribe_agent::{GenerationRequest, Generator, Role};
    use scribe_core::{ProgressSink, Result};
    use scribe_memory::MemoryStore;
    use scribe_orchestrator::{Orchestrator, OrchestratorConfig};
    use std::time::Duration;
    use tempfile::TempDir;
    use tower::ServiceExt;

    struct Approving;

    #[async_trait]
    impl Generator for Approving {
        async fn generate(&self, request: GenerationRequest<'_>) -> Result<String> {
            Ok(match request.role.role {
                Role::Writer => "Docs".to_string(),
                Role::Reviewer => "APPROVED".to_string(),
                Role::Publisher => "# Final".to_string(),
            })
        }
    }

    fn make_state() -> SharedState {
        let orchestrator = Orchestrator::new(
            OrchestratorConfig::default().with_inter_file_delay(Duration::ZERO),
            Arc::new(Approving),
            Arc::new(MemoryStore::default()),
            ProgressSink::new(),
        );
        Arc::new(AppState::new(Arc::new(orchestrator)))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(resp: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), 1_000_000)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("A.java"), "class A {}").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_health() {
        let req = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let resp = router(make_state()).oneshot(req).await.unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "scribe");
    }

    #[tokio::test]
    async fn test_empty_project_path_is_rejected() {
        let state = make_state();
        let mut rx = state.progress.subscribe();

        let resp = router(state)
            .oneshot(post_json(
                "/api/generate-documentation",
                serde_json::json!({"project_path": "  "}),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(rx.try_recv().unwrap().level, scribe_core::LogLevel::Error);
    }

    #[tokio::test]
    async fn test_wait_returns_documentation_and_report() {
        let dir = project();
        let state = make_state();

        let resp = router(Arc::clone(&state))
            .oneshot(post_json(
                "/api/generate-documentation",
                serde_json::json!({
                    "project_path": dir.path().to_string_lossy(),
                    "wait": true
                }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body["documentation"], "# Final");
        assert_eq!(body["report"]["status"], "complete");
        assert_eq!(body["report"]["files_processed"], 1);

        let stored = state.last_result.read().await;
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_background_run_is_accepted_then_stored() {
        let dir = project();
        let state = make_state();

        let resp = router(Arc::clone(&state))
            .oneshot(post_json(
                "/api/generate-documentation",
                serde_json::json!({
                    "project_path": dir.path().to_string_lossy(),
                    "max_iterations": 1
                }),
            ))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let body = json_body(resp).await;
        assert_eq!(body["message"], MISSION_STARTED);
        assert!(body["run_id"].is_string());

        let mut finished = false;
        for _ in 0..100 {
            if state.last_result.read().await.is_some() {
                finished = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(finished);

        let req = Request::builder()
            .uri("/api/result")
            .body(Body::empty())
            .unwrap();
        let resp = router(state).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await["documentation"], "# Final");
    }

    #[tokio::test]
    async fn test_result_before_any_run_is_404() {
        let req = Request::builder()
            .uri("/api/result")
            .body(Body::empty())
            .unwrap();
        let resp = router(make_state()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_events_stream_log_events() {
        let state = make_state();
        let req = Request::builder()
            .uri("/api/events")
            .body(Body::empty())
            .unwrap();

        let resp = router(Arc::clone(&state)).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/event-stream"));

        state.progress.info("hello listeners");

        let mut body = resp.into_body().into_data_stream();
        let frame = tokio::time::timeout(Duration::from_secs(5), body.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let text = String::from_utf8(frame.to_vec()).unwrap();
        assert!(text.contains("event: log"));
        assert!(text.contains("hello listeners"));
        assert!(text.contains("\"level\":\"INFO\""));
    }
}
