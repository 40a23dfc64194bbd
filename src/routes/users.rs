use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::models::UserSummary;
use crate::error::AppResult;
use crate::extractors::ApiQuery;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct UsersQuery {
    #[serde(default)]
    pub exclude: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub users: Vec<UserSummary>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/users", get(list_users))
}

async fn list_users(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UsersQuery>,
) -> AppResult<Json<UsersResponse>> {
    let exclude = query.exclude.as_deref().filter(|e| !e.is_empty());
    let users = state.directory.list_users(exclude, query.limit).await?;
    Ok(Json(UsersResponse { users }))
}
