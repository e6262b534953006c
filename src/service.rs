//! HTTP analysis service: the processing side of the upload-and-analyze
//! flow. Accepts a recorded landmark stream plus the session schedule in
//! one request and returns the filtered statistics, optionally scored
//! against a named workout plan.

use crate::config::ServiceConfig;
use crate::error::{Result, ServiceError};
use crate::landmark::LandmarkFrame;
use crate::schedule::{ExerciseInterval, SessionPlan};
use crate::scoring::{score_session, WorkoutScore};
use crate::session::{SessionReport, SessionTracker};
use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

/// One full analysis request: the session schedule plus the estimator's
/// per-frame output in video order (`null` for frames with no detection).
#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub fps: f64,
    #[serde(default)]
    pub intervals: Vec<ExerciseInterval>,
    #[serde(default)]
    pub plan: Option<String>,
    pub frames: Vec<Option<LandmarkFrame>>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    #[serde(flatten)]
    pub report: SessionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<WorkoutScore>,
}

/// HTTP server wrapping the session engine.
pub struct AnalyzeServer {
    config: ServiceConfig,
}

impl AnalyzeServer {
    pub fn new(config: ServiceConfig) -> Self {
        Self { config }
    }

    pub fn router() -> Router {
        Router::new()
            .route("/analyze", post(analyze_handler))
            .route("/health", get(health_handler))
    }

    /// Bind and serve until the process is stopped.
    pub async fn start(&self) -> Result<()> {
        let app = Self::router();
        let addr = format!("{}:{}", self.config.ip, self.config.port);

        info!("Starting analysis server on {}", addr);

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|source| ServiceError::BindFailed {
                address: addr.clone(),
                source,
            })?;

        info!("Analysis server listening on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| ServiceError::Startup {
                details: format!("Server error: {}", e),
            })?;

        Ok(())
    }
}

async fn analyze_handler(
    Json(request): Json<AnalyzeRequest>,
) -> std::result::Result<Json<AnalyzeResponse>, (StatusCode, String)> {
    info!(
        "Analysis request: {} frames, {} intervals at {} fps",
        request.frames.len(),
        request.intervals.len(),
        request.fps
    );

    let plan = SessionPlan::new(request.fps, request.intervals);
    let mut tracker = SessionTracker::new(&plan).map_err(|e| {
        warn!("Rejected analysis request: {}", e);
        (StatusCode::BAD_REQUEST, e.to_string())
    })?;

    for frame in &request.frames {
        tracker.process_frame(frame.as_ref());
    }
    let report = tracker.finish();

    let score = match request.plan.as_deref() {
        Some(name) => Some(score_session(name, &report).map_err(|e| {
            warn!("Rejected scoring request: {}", e);
            (StatusCode::BAD_REQUEST, e.to_string())
        })?),
        None => None,
    };

    Ok(Json(AnalyzeResponse { report, score }))
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}
