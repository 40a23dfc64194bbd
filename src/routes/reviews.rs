use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::db::models::ReviewWithAuthor;
use crate::error::AppResult;
use crate::extractors::ApiJson;
use crate::reviews::ReviewSubmission;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub review_id: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/reviews", get(list_reviews).post(submit_review))
}

async fn submit_review(
    State(state): State<AppState>,
    ApiJson(submission): ApiJson<ReviewSubmission>,
) -> AppResult<(StatusCode, Json<SubmitResponse>)> {
    let review_id = state.reviews.submit_review(submission).await?;
    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            success: true,
            review_id,
        }),
    ))
}

async fn list_reviews(State(state): State<AppState>) -> AppResult<Json<Vec<ReviewWithAuthor>>> {
    Ok(Json(state.reviews.list_reviews().await?))
}
