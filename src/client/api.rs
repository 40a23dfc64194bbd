use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::auth::{Login, LoginRequest, RegisterRequest, Registration};
use crate::client::validation::FieldError;
use crate::db::models::{ProfileSnapshot, ReviewWithAuthor, UserSummary};
use crate::error::ErrorResponse;
use crate::profile::{ProfileDiff, ProfileUpdate};
use crate::reviews::ReviewSubmission;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never got an answer, or the answer was unreadable.
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error body.
    #[error("{message}")]
    Api { status: StatusCode, message: String },

    #[error("Session storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session data error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Please fix the highlighted fields")]
    Invalid(Vec<FieldError>),

    #[error("Not logged in")]
    NotLoggedIn,
}

impl ClientError {
    /// The server was unreachable, as opposed to reachable and refusing.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http(e) if e.is_connect() || e.is_timeout() || e.is_request())
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateReply {
    pub success: bool,
    pub message: String,
    pub changed: ProfileDiff,
    pub profile: ProfileSnapshot,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Health {
    pub status: String,
    pub version: String,
}

#[derive(Deserialize)]
struct ProfileReply {
    profile: ProfileSnapshot,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitReply {
    review_id: String,
}

#[derive(Deserialize)]
struct UsersReply {
    users: Vec<UserSummary>,
}

#[derive(Serialize)]
struct UsersParams<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    exclude: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit: Option<u32>,
}

/// Typed HTTP calls against a running server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<Health, ClientError> {
        read(self.http.get(self.url("/health")).send().await?).await
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        confirm_password: &str,
    ) -> Result<Registration, ClientError> {
        let body = RegisterRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
            confirm_password: Some(confirm_password.to_string()),
        };
        let resp = self
            .http
            .post(self.url("/api/register"))
            .json(&body)
            .send()
            .await?;
        read(resp).await
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Login, ClientError> {
        let body = LoginRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        };
        let resp = self
            .http
            .post(self.url("/api/login"))
            .json(&body)
            .send()
            .await?;
        read(resp).await
    }

    pub async fn get_profile(&self, email: &str) -> Result<ProfileSnapshot, ClientError> {
        let resp = self
            .http
            .get(self.url("/api/profile"))
            .query(&[("email", email)])
            .send()
            .await?;
        Ok(read::<ProfileReply>(resp).await?.profile)
    }

    pub async fn update_profile(
        &self,
        token: &str,
        update: &ProfileUpdate,
    ) -> Result<UpdateReply, ClientError> {
        let resp = self
            .http
            .put(self.url("/api/updateProfile"))
            .bearer_auth(token)
            .json(update)
            .send()
            .await?;
        read(resp).await
    }

    pub async fn submit_review(&self, submission: &ReviewSubmission) -> Result<String, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/reviews"))
            .json(submission)
            .send()
            .await?;
        Ok(read::<SubmitReply>(resp).await?.review_id)
    }

    pub async fn list_reviews(&self) -> Result<Vec<ReviewWithAuthor>, ClientError> {
        read(self.http.get(self.url("/api/reviews")).send().await?).await
    }

    pub async fn list_users(
        &self,
        exclude: Option<&str>,
        limit: Option<u32>,
    ) -> Result<Vec<UserSummary>, ClientError> {
        let resp = self
            .http
            .get(self.url("/api/users"))
            .query(&UsersParams { exclude, limit })
            .send()
            .await?;
        Ok(read::<UsersReply>(resp).await?.users)
    }
}

/// Decode a success body, or turn an error body into [`ClientError::Api`].
async fn read<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }

    let text = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorResponse>(&text)
        .map(|body| body.message)
        .unwrap_or_else(|_| {
            if text.is_empty() {
                status.to_string()
            } else {
                text
            }
        });
    tracing::debug!(%status, %message, "API call failed");
    Err(ClientError::Api { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let api = ApiClient::new("http://localhost:5000/");
        assert_eq!(api.url("/api/reviews"), "http://localhost:5000/api/reviews");
    }

    #[test]
    fn api_error_shows_server_message() {
        let err = ClientError::Api {
            status: StatusCode::CONFLICT,
            message: "Email already registered".into(),
        };
        assert_eq!(err.to_string(), "Email already registered");
        assert_eq!(err.status(), Some(StatusCode::CONFLICT));
        assert!(!err.is_transport());
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let api = ApiClient::new("http://127.0.0.1:1");
        let err = api.health().await.unwrap_err();
        assert!(err.is_transport(), "{:?}", err);
    }
}
