use std::sync::OnceLock;

use crate::error::AppResult;

pub const MIN_PASSWORD_LEN: usize = 6;

/// bcrypt-hash a password on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Check a password against a stored bcrypt hash.
pub async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    let ok = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await??;
    Ok(ok)
}

/// Spend about as long as a real verification so that unknown emails are not
/// distinguishable from wrong passwords by response time.
pub async fn verify_against_dummy(password: String, cost: u32) -> AppResult<()> {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();

    tokio::task::spawn_blocking(move || {
        let hash = DUMMY_HASH.get_or_init(|| {
            bcrypt::hash("instrevi-timing-placeholder", cost).unwrap_or_default()
        });
        let _ = bcrypt::verify(password, hash);
    })
    .await?;
    Ok(())
}
