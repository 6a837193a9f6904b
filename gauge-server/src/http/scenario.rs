//! Scenario catalog REST API endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use gauge_core::{Scenario, SessionStore};

use super::{ErrorResponse, error_response};
use crate::AppState;

/// POST /api/scenarios
///
/// Upserts by scenario id.
pub async fn create_scenario(
    State(state): State<Arc<AppState>>,
    Json(scenario): Json<Scenario>,
) -> impl IntoResponse {
    if scenario.id.trim().is_empty() || scenario.title.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "scenario id and title must not be empty".into(),
                code: "INVALID_REQUEST".into(),
            }),
        )
            .into_response();
    }

    match state.store.put_scenario(&scenario) {
        Ok(()) => (StatusCode::CREATED, Json(scenario)).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// GET /api/scenarios
pub async fn list_scenarios(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.list_scenarios() {
        Ok(scenarios) => Json(scenarios).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}
