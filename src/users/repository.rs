// Repository pattern - all user-table side effects live here
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension};

use crate::db::models::User;
use crate::db::repository::{with_conn, RepositoryError};
use crate::profile::patch::ProfileChanges;
use crate::state::DbPool;

/// Row written at registration. Everything else starts out empty.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a fresh user. A taken email surfaces as [`RepositoryError::Conflict`].
    async fn insert(&self, user: NewUser) -> Result<(), RepositoryError>;

    /// Exact, case-sensitive email lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError>;

    /// Write the present fields of `changes` in one statement. Returns false
    /// when no row matched.
    async fn apply_changes(&self, id: &str, changes: &ProfileChanges)
        -> Result<bool, RepositoryError>;

    /// Most recently created users first, optionally skipping one email.
    async fn list_recent(
        &self,
        exclude_email: Option<&str>,
        limit: u32,
    ) -> Result<Vec<User>, RepositoryError>;
}

pub struct SqliteUserRepository {
    pool: DbPool,
}

impl SqliteUserRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn insert(&self, user: NewUser) -> Result<(), RepositoryError> {
        with_conn(&self.pool, move |conn| {
            conn.execute(
                "INSERT INTO users (id, email, password_hash, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![user.id, user.email, user.password_hash, user.created_at],
            )
            .map_err(RepositoryError::classify)?;
            Ok(())
        })
        .await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepositoryError> {
        let email = email.to_string();
        with_conn(&self.pool, move |conn| {
            let sql = format!("SELECT {} FROM users WHERE email = ?1", User::COLUMNS);
            Ok(conn
                .query_row(&sql, params![email], User::from_row)
                .optional()?)
        })
        .await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<User>, RepositoryError> {
        let id = id.to_string();
        with_conn(&self.pool, move |conn| {
            let sql = format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS);
            Ok(conn.query_row(&sql, params![id], User::from_row).optional()?)
        })
        .await
    }

    async fn apply_changes(
        &self,
        id: &str,
        changes: &ProfileChanges,
    ) -> Result<bool, RepositoryError> {
        let assignments = changes.assignments();
        let id = id.to_string();
        with_conn(&self.pool, move |conn| {
            if assignments.is_empty() {
                let exists: bool = conn.query_row(
                    "SELECT COUNT(*) > 0 FROM users WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )?;
                return Ok(exists);
            }

            let set_clause = assignments
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{} = ?{}", column, i + 1))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE users SET {} WHERE id = ?{}",
                set_clause,
                assignments.len() + 1
            );

            let values = assignments
                .into_iter()
                .map(|(_, value)| value)
                .chain(std::iter::once(rusqlite::types::Value::Text(id)));
            let rows = conn
                .execute(&sql, params_from_iter(values))
                .map_err(RepositoryError::classify)?;
            Ok(rows > 0)
        })
        .await
    }

    async fn list_recent(
        &self,
        exclude_email: Option<&str>,
        limit: u32,
    ) -> Result<Vec<User>, RepositoryError> {
        let exclude_email = exclude_email.map(str::to_string);
        with_conn(&self.pool, move |conn| {
            // A NULL exclusion matches nothing, so the filter drops out.
            let sql = format!(
                "SELECT {} FROM users
                 WHERE ?1 IS NULL OR email <> ?1
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT ?2",
                User::COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let users = stmt
                .query_map(params![exclude_email, limit], User::from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(users)
        })
        .await
    }
}
