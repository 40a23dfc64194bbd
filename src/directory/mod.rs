//! Suggested accounts: recently joined users other than the caller.

use std::sync::Arc;

use crate::config::DirectoryConfig;
use crate::db::models::UserSummary;
use crate::error::AppResult;
use crate::users::repository::UserRepository;

/// Human-readable name for a user: the nickname when posting anonymously,
/// then the first name, then the part of the email before `@`. Empty strings
/// count as missing.
pub fn display_name(
    is_anonymous: bool,
    nickname: Option<&str>,
    first_name: Option<&str>,
    email: &str,
) -> String {
    let nickname = nickname.filter(|n| !n.is_empty());
    let first_name = first_name.filter(|n| !n.is_empty());

    match (is_anonymous, nickname, first_name) {
        (true, Some(nick), _) => nick.to_string(),
        (_, _, Some(first)) => first.to_string(),
        _ => email.split('@').next().unwrap_or(email).to_string(),
    }
}

#[derive(Clone)]
pub struct Directory {
    users: Arc<dyn UserRepository>,
    config: DirectoryConfig,
}

impl Directory {
    pub fn new(users: Arc<dyn UserRepository>, config: DirectoryConfig) -> Self {
        Self { users, config }
    }

    /// Up to `limit` newest users, never including `exclude_email`.
    pub async fn list_users(
        &self,
        exclude_email: Option<&str>,
        limit: Option<u32>,
    ) -> AppResult<Vec<UserSummary>> {
        let limit = limit
            .unwrap_or(self.config.default_limit)
            .min(self.config.max_limit);
        let users = self.users.list_recent(exclude_email, limit).await?;
        Ok(users.into_iter().map(UserSummary::from).collect())
    }
}
