//! HTTP server module

mod assessment;
mod profile;
mod scenario;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router, extract::State};
use gauge_core::{AssessmentError, ProviderError};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::AppState;

pub use assessment::{AnswerRequest, FamiliarityRequest, StartRequest};
pub use profile::ProfileResponse;

/// Create the HTTP router with all routes configured
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/assessments/start", post(assessment::start))
        .route(
            "/api/assessments/:id/familiarity",
            post(assessment::submit_familiarity),
        )
        .route(
            "/api/assessments/:id/answer",
            post(assessment::submit_answer),
        )
        .route("/api/assessments/status", get(assessment::status))
        .route("/api/assessments/delta", get(assessment::delta))
        .route("/api/profiles/:user_id", get(profile::get_profile))
        .route(
            "/api/scenarios",
            post(scenario::create_scenario).get(scenario::list_scenarios),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Error body shared by all endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

/// Map an engine error onto an HTTP status and error body
pub(crate) fn error_response(err: &AssessmentError) -> (StatusCode, Json<ErrorResponse>) {
    let (status, code) = match err {
        AssessmentError::SessionNotFound(_) | AssessmentError::ScenarioNotFound(_) => {
            (StatusCode::NOT_FOUND, "NOT_FOUND")
        }
        AssessmentError::InvalidState(_) => (StatusCode::CONFLICT, "INVALID_STATE"),
        AssessmentError::Validation(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        AssessmentError::Upstream(ProviderError::Timeout(_)) => {
            (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_TIMEOUT")
        }
        AssessmentError::Upstream(_) => (StatusCode::GATEWAY_TIMEOUT, "UPSTREAM_FAILED"),
        AssessmentError::Database(_) | AssessmentError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: code.to_string(),
        }),
    )
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: i64,
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    })
}
