use chrono::{DateTime, Utc};
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewToken, User},
    traits::StoreError,
};

pub async fn delete_tokens_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<u64, StoreError> {
    let result = sqlx::query("DELETE FROM tokens WHERE user_id = $1").bind(user_id).execute(conn).await?;
    trace!("🗃️ Removed {} tokens for user #{user_id}", result.rows_affected());
    Ok(result.rows_affected())
}

pub async fn insert_token(token: NewToken, conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO tokens (user_id, name, email, token_hash, expiry, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
        "#,
    )
    .bind(token.user_id)
    .bind(token.name)
    .bind(token.email)
    .bind(token.hash)
    .bind(token.expiry)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(id)
}

/// Returns the user that owns the token with the given hash, as long as the token expires after `now`.
pub async fn fetch_user_for_token(
    token_hash: &[u8],
    now: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Option<User>, StoreError> {
    let user = sqlx::query_as::<_, User>(
        r#"
            SELECT u.id, u.first_name, u.last_name, u.email, u.password, u.created_at, u.updated_at
            FROM users u JOIN tokens t ON u.id = t.user_id
            WHERE t.token_hash = $1 AND t.expiry > $2
        "#,
    )
    .bind(token_hash)
    .bind(now)
    .fetch_optional(conn)
    .await?;
    Ok(user)
}
