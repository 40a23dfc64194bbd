use axum::extract::State;
use axum::routing::{get, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::models::ProfileSnapshot;
use crate::error::AppResult;
use crate::extractors::{ApiJson, ApiQuery, BearerUser};
use crate::profile::{ProfileDiff, ProfileUpdate};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub profile: ProfileSnapshot,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub success: bool,
    pub message: &'static str,
    pub changed: ProfileDiff,
    pub profile: ProfileSnapshot,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/profile", get(get_profile))
        .route("/api/updateProfile", put(update_profile))
}

async fn get_profile(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProfileQuery>,
) -> AppResult<Json<ProfileResponse>> {
    let email = query.email.unwrap_or_default();
    let profile = state.profiles.get_profile(&email).await?;
    Ok(Json(ProfileResponse { profile }))
}

async fn update_profile(
    State(state): State<AppState>,
    user: BearerUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> AppResult<Json<UpdateResponse>> {
    let outcome = state.profiles.update_profile(&user.user_id, update).await?;
    Ok(Json(UpdateResponse {
        success: true,
        message: "Profile updated successfully",
        changed: outcome.changed,
        profile: outcome.profile,
    }))
}
