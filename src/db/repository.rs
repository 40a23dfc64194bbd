// Shared plumbing for the SQLite repositories
use rusqlite::{Connection, ErrorCode};
use thiserror::Error;

use crate::error::AppError;
use crate::state::DbPool;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    Database(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// A UNIQUE constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A FOREIGN KEY constraint rejected the write.
    #[error("Missing referenced row: {0}")]
    ForeignKey(String),

    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl RepositoryError {
    /// Classify constraint failures so callers can answer 409/400 instead of 500.
    pub fn classify(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref code, ref msg) = err {
            if code.code == ErrorCode::ConstraintViolation {
                let detail = msg.clone().unwrap_or_default();
                match code.extended_code {
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        return RepositoryError::Conflict(detail)
                    }
                    rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                        return RepositoryError::ForeignKey(detail)
                    }
                    _ => {}
                }
            }
        }
        RepositoryError::Sql(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => AppError::Pool(e),
            RepositoryError::Sql(e) => AppError::Database(e),
            RepositoryError::Conflict(detail) => AppError::Conflict(detail),
            RepositoryError::ForeignKey(detail) => AppError::Validation(detail),
            RepositoryError::Task(e) => AppError::from(e),
        }
    }
}

/// Run `f` with a pooled connection on the blocking thread pool.
pub async fn with_conn<T, F>(pool: &DbPool, f: F) -> Result<T, RepositoryError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, RepositoryError> + Send + 'static,
{
    let pool = pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get()?;
        f(&conn)
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn unique_violation_classifies_as_conflict() {
        let pool = test_pool();
        let result = with_conn(&pool, |conn| {
            let insert = "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, 'a@b.co', 'x', '2024-01-01')";
            conn.execute(insert, ["u1"])?;
            conn.execute(insert, ["u2"])
                .map_err(RepositoryError::classify)?;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn foreign_key_violation_classifies_as_foreign_key() {
        let pool = test_pool();
        let result = with_conn(&pool, |conn| {
            conn.execute(
                "INSERT INTO reviews (id, user_id, review_type, image, created_at) VALUES ('r1', 'ghost', 'food', 'img', '2024-01-01')",
                [],
            )
            .map_err(RepositoryError::classify)?;
            Ok(())
        })
        .await;
        assert!(matches!(result, Err(RepositoryError::ForeignKey(_))));
    }

    #[test]
    fn foreign_key_maps_to_validation() {
        let err: AppError = RepositoryError::ForeignKey("user".into()).into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
