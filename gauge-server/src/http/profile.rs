//! Skill profile REST API endpoints

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use gauge_core::{ProfileStore, SkillProfile};
use serde::{Deserialize, Serialize};

use super::error_response;
use crate::AppState;

/// Profile response: per-skill rounded means plus the rating
#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub skills: SkillProfile,
    pub elo: i32,
    pub points: u32,
}

/// GET /api/profiles/:user_id
///
/// Unknown users get the default profile rather than a 404; a user who has
/// never completed an assessment simply has no skills yet.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> impl IntoResponse {
    match state.store.get_profile(&user_id) {
        Ok((skills, rating)) => Json(ProfileResponse {
            user_id,
            skills,
            elo: rating.elo,
            points: rating.points,
        })
        .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}
