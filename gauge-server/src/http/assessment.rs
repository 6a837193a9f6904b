//! Assessment REST API endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use gauge_core::{Mode, PersonalizedOptions, SessionId};
use serde::{Deserialize, Serialize};

use super::{ErrorResponse, error_response};
use crate::AppState;

/// Body for POST /api/assessments/start
#[derive(Debug, Deserialize)]
pub struct StartRequest {
    pub user_id: String,
    pub scenario_id: String,
    pub mode: Mode,
    /// Required when mode is personalized
    pub options: Option<PersonalizedOptions>,
}

/// POST /api/assessments/start
pub async fn start(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> impl IntoResponse {
    match state
        .engine
        .start(
            &request.user_id,
            &request.scenario_id,
            request.mode,
            request.options,
        )
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Body for POST /api/assessments/:id/familiarity
#[derive(Debug, Deserialize)]
pub struct FamiliarityRequest {
    pub familiar: bool,
}

/// POST /api/assessments/:id/familiarity
pub async fn submit_familiarity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<FamiliarityRequest>,
) -> impl IntoResponse {
    let Some(session_id) = SessionId::parse(&id) else {
        return bad_session_id(&id);
    };

    match state
        .engine
        .submit_familiarity(&session_id, request.familiar)
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Body for POST /api/assessments/:id/answer
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: Option<String>,
    #[serde(default)]
    pub skipped: bool,
}

/// POST /api/assessments/:id/answer
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(request): Json<AnswerRequest>,
) -> impl IntoResponse {
    let Some(session_id) = SessionId::parse(&id) else {
        return bad_session_id(&id);
    };

    match state
        .engine
        .submit_answer(&session_id, request.answer.as_deref(), request.skipped)
        .await
    {
        Ok(view) => Json(view).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Query params for GET /api/assessments/status
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub user_id: String,
    pub scenario_id: String,
    pub mode: Mode,
}

/// GET /api/assessments/status
pub async fn status(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatusQuery>,
) -> impl IntoResponse {
    match state
        .engine
        .status(&query.user_id, &query.scenario_id, query.mode)
    {
        Ok(status) => Json(status).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

/// Query params for GET /api/assessments/delta
#[derive(Debug, Deserialize)]
pub struct DeltaQuery {
    pub user_id: String,
    pub scenario_id: String,
}

/// Training-effectiveness response: post score minus pre score
#[derive(Debug, Serialize, Deserialize)]
pub struct DeltaResponse {
    /// Present once both pre and post assessments have completed
    pub delta: Option<i16>,
}

/// GET /api/assessments/delta
pub async fn delta(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DeltaQuery>,
) -> impl IntoResponse {
    match state
        .engine
        .training_delta(&query.user_id, &query.scenario_id)
    {
        Ok(delta) => Json(DeltaResponse { delta }).into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

fn bad_session_id(id: &str) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: format!("invalid session id: {id}"),
            code: "INVALID_REQUEST".into(),
        }),
    )
        .into_response()
}
