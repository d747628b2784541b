use log::*;
use tokio::task::spawn_blocking;

use crate::AuthApiError;

pub const DEFAULT_BCRYPT_COST: u32 = 12;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AuthApiError> {
    bcrypt::hash(password, cost).map_err(|e| AuthApiError::PasswordHashError(e.to_string()))
}

/// Compares a plaintext password with a stored bcrypt hash. A malformed hash counts as a mismatch.
pub fn password_matches(password: &str, hash: &str) -> bool {
    bcrypt::verify(password, hash).unwrap_or(false)
}

/// [`hash_password`] on the blocking thread pool, so that the hash does not stall the calling async worker.
pub async fn hash_password_async(password: &str, cost: u32) -> Result<String, AuthApiError> {
    let password = password.to_string();
    spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| AuthApiError::PasswordHashError(format!("The hashing task failed. {e}")))?
}

/// [`password_matches`] on the blocking thread pool. A failed task counts as a mismatch.
pub async fn password_matches_async(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();
    match spawn_blocking(move || password_matches(&password, &hash)).await {
        Ok(matches) => matches,
        Err(e) => {
            error!("🔐️ The password check task failed. {e}");
            false
        },
    }
}
