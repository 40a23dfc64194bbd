use std::sync::Arc;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::auth::credentials::CredentialStore;
use crate::auth::token::{generate_secret, TokenIssuer};
use crate::config::Config;
use crate::directory::Directory;
use crate::profile::reconciler::ProfileReconciler;
use crate::reviews::ledger::ReviewLedger;
use crate::reviews::repository::SqliteReviewRepository;
use crate::users::repository::{SqliteUserRepository, UserRepository};

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
    pub tokens: Arc<TokenIssuer>,
    pub credentials: CredentialStore,
    pub profiles: ProfileReconciler,
    pub reviews: ReviewLedger,
    pub directory: Directory,
}

impl AppState {
    /// Wire every service onto the shared pool.
    pub fn new(db: DbPool, config: Config) -> Self {
        let secret = match config.auth.jwt_secret.as_deref() {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                tracing::warn!(
                    "No JWT secret configured; using a random one. Tokens will not survive a restart."
                );
                generate_secret()
            }
        };
        let tokens = Arc::new(TokenIssuer::new(secret.as_bytes(), config.auth.token_days));

        let users: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db.clone()));
        let review_repo = Arc::new(SqliteReviewRepository::new(db.clone()));

        Self {
            credentials: CredentialStore::new(
                users.clone(),
                tokens.clone(),
                config.auth.bcrypt_cost,
            ),
            profiles: ProfileReconciler::new(users.clone(), config.auth.bcrypt_cost),
            reviews: ReviewLedger::new(review_repo),
            directory: Directory::new(users, config.directory.clone()),
            tokens,
            db,
            config,
        }
    }
}
