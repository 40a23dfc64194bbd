use std::sync::{Arc, OnceLock};

use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::password::{hash_password, verify_against_dummy, verify_password, MIN_PASSWORD_LEN};
use crate::auth::token::TokenIssuer;
use crate::db::models::ProfileSnapshot;
use crate::db::repository::RepositoryError;
use crate::error::{AppError, AppResult};
use crate::users::repository::{NewUser, UserRepository};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub token: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Login {
    pub token: String,
    pub user_id: String,
    pub profile: ProfileSnapshot,
}

pub fn is_valid_email(email: &str) -> bool {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX
        .get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex"))
        .is_match(email)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Email/password accounts and the tokens that prove them.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenIssuer>,
    bcrypt_cost: u32,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenIssuer>, bcrypt_cost: u32) -> Self {
        Self {
            users,
            tokens,
            bcrypt_cost,
        }
    }

    /// Create an account. Uniqueness is left to the `users.email` constraint,
    /// so two racing registrations resolve to one row and one conflict.
    pub async fn register(&self, req: RegisterRequest) -> AppResult<Registration> {
        let (Some(email), Some(password), Some(confirm)) = (
            non_empty(req.email),
            non_empty(req.password),
            non_empty(req.confirm_password),
        ) else {
            return Err(AppError::Validation("All fields are required".into()));
        };

        if !is_valid_email(&email) {
            return Err(AppError::Validation("Please enter a valid email".into()));
        }
        if password != confirm {
            return Err(AppError::Validation("Passwords do not match".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let password_hash = hash_password(password, self.bcrypt_cost).await?;
        let user_id = uuid::Uuid::now_v7().to_string();

        self.users
            .insert(NewUser {
                id: user_id.clone(),
                email: email.clone(),
                password_hash,
                created_at: Utc::now(),
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    AppError::Conflict("Email already registered".into())
                }
                other => other.into(),
            })?;

        tracing::info!(user_id = %user_id, "Registered new user");

        let token = self.tokens.issue(&user_id, &email)?;
        Ok(Registration { token, user_id })
    }

    /// Check credentials and hand back a token plus the current profile.
    pub async fn authenticate(&self, req: LoginRequest) -> AppResult<Login> {
        let (Some(email), Some(password)) = (
            non_empty(req.email),
            non_empty(req.password),
        ) else {
            return Err(AppError::Validation(
                "Email and password are required".into(),
            ));
        };

        let Some(user) = self.users.find_by_email(&email).await? else {
            verify_against_dummy(password, self.bcrypt_cost).await?;
            tracing::debug!("Login rejected");
            return Err(AppError::InvalidCredentials);
        };

        // A corrupt stored hash is treated like a mismatch.
        let verified = verify_password(password, user.password_hash.clone())
            .await
            .unwrap_or(false);
        if !verified {
            tracing::debug!("Login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user.id, &user.email)?;
        Ok(Login {
            token,
            user_id: user.id.clone(),
            profile: user.profile(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::users::repository::SqliteUserRepository;

    fn store() -> (CredentialStore, Arc<TokenIssuer>, Arc<SqliteUserRepository>) {
        let users = Arc::new(SqliteUserRepository::new(test_pool()));
        let tokens = Arc::new(TokenIssuer::new(b"test-secret", 7));
        (
            CredentialStore::new(users.clone(), tokens.clone(), 4),
            tokens,
            users,
        )
    }

    fn register_req(email: &str, password: &str, confirm: &str) -> RegisterRequest {
        RegisterRequest {
            email: Some(email.into()),
            password: Some(password.into()),
            confirm_password: Some(confirm.into()),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn email_format() {
        assert!(is_valid_email("ana@example.com"));
        assert!(!is_valid_email("ana@example"));
        assert!(!is_valid_email("ana example@x.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[tokio::test]
    async fn register_issues_token_for_new_user() {
        let (store, tokens, users) = store();
        let reg = store
            .register(register_req("ana@example.com", "secret1", "secret1"))
            .await
            .unwrap();

        let claims = tokens.verify(&reg.token).unwrap();
        assert_eq!(claims.sub, reg.user_id);
        assert_eq!(claims.email, "ana@example.com");

        let stored = users.find_by_email("ana@example.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "secret1");
        assert!(stored.first_name.is_none());
    }

    #[tokio::test]
    async fn register_validates_input() {
        let (store, _, _) = store();
        for req in [
            RegisterRequest::default(),
            register_req("ana@example.com", "", ""),
            register_req("ana@example.com", "secret1", "secret2"),
            register_req("ana@example.com", "short", "short"),
            register_req("not-an-email", "secret1", "secret1"),
        ] {
            let result = store.register(req).await;
            assert!(matches!(result, Err(AppError::Validation(_))), "{:?}", result);
        }
    }

    #[tokio::test]
    async fn duplicate_email_conflicts_case_sensitively() {
        let (store, _, _) = store();
        store
            .register(register_req("ana@example.com", "secret1", "secret1"))
            .await
            .unwrap();

        let again = store
            .register(register_req("ana@example.com", "secret9", "secret9"))
            .await;
        assert!(matches!(again, Err(AppError::Conflict(_))));

        store
            .register(register_req("Ana@example.com", "secret1", "secret1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn authenticate_returns_profile_snapshot() {
        let (store, _, _) = store();
        let reg = store
            .register(register_req("ana@example.com", "secret1", "secret1"))
            .await
            .unwrap();

        let login = store
            .authenticate(login_req("ana@example.com", "secret1"))
            .await
            .unwrap();
        assert_eq!(login.user_id, reg.user_id);
        assert_eq!(login.profile.email, "ana@example.com");
        assert_eq!(login.profile.id, reg.user_id);
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_the_same() {
        let (store, _, _) = store();
        store
            .register(register_req("ana@example.com", "secret1", "secret1"))
            .await
            .unwrap();

        let wrong = store
            .authenticate(login_req("ana@example.com", "secret2"))
            .await
            .unwrap_err();
        let unknown = store
            .authenticate(login_req("bob@example.com", "secret1"))
            .await
            .unwrap_err();

        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn emails_are_matched_exactly() {
        let (store, _, _) = store();
        let padded = store
            .register(register_req(" ana@example.com ", "secret1", "secret1"))
            .await;
        assert!(matches!(padded, Err(AppError::Validation(_))));

        store
            .register(register_req("ana@example.com", "secret1", "secret1"))
            .await
            .unwrap();
        let login = store
            .authenticate(login_req("ana@example.com ", "secret1"))
            .await;
        assert!(matches!(login, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn authenticate_requires_both_fields() {
        let (store, _, _) = store();
        let result = store.authenticate(LoginRequest::default()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
