use chrono::Utc;
use log::{debug, trace};
use sqlx::SqliteConnection;

use crate::{
    db_types::{User, UserUpdate},
    traits::StoreError,
};

const USER_COLUMNS: &str = "id, first_name, last_name, email, password, created_at, updated_at";

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, StoreError> {
    let email = email.trim().to_lowercase();
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
    let user = sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, StoreError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_all_users(conn: &mut SqliteConnection) -> Result<Vec<User>, StoreError> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY last_name, first_name");
    let users = sqlx::query_as::<_, User>(&sql).fetch_all(conn).await?;
    Ok(users)
}

pub async fn insert_user(user: UserUpdate, password_hash: &str, conn: &mut SqliteConnection) -> Result<User, StoreError> {
    let now = Utc::now();
    let sql = format!(
        "INSERT INTO users (first_name, last_name, email, password, created_at, updated_at) VALUES ($1, $2, $3, $4, \
         $5, $6) RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(user.first_name)
        .bind(user.last_name)
        .bind(user.email.trim().to_lowercase())
        .bind(password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await?;
    debug!("🗃️ User #{} created", user.id);
    Ok(user)
}

pub async fn update_user(
    id: i64,
    update: UserUpdate,
    password_hash: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<User, StoreError> {
    let sql = format!(
        "UPDATE users SET first_name = $1, last_name = $2, email = $3, password = COALESCE($4, password), updated_at \
         = $5 WHERE id = $6 RETURNING {USER_COLUMNS}"
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(update.first_name)
        .bind(update.last_name)
        .bind(update.email.trim().to_lowercase())
        .bind(password_hash)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(conn)
        .await?;
    trace!("🗃️ Update for user #{id} complete: {}", user.is_some());
    user.ok_or_else(|| StoreError::NotFound(format!("user #{id}")))
}

pub async fn update_password_for_email(
    email: &str,
    password_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<(), StoreError> {
    let email = email.trim().to_lowercase();
    let result = sqlx::query("UPDATE users SET password = $1, updated_at = $2 WHERE email = $3")
        .bind(password_hash)
        .bind(Utc::now())
        .bind(email.as_str())
        .execute(conn)
        .await?;
    match result.rows_affected() {
        0 => Err(StoreError::NotFound(format!("user with email {email}"))),
        _ => Ok(()),
    }
}

/// Deletes the user row. Returns true if a row was deleted.
pub async fn delete_user(id: i64, conn: &mut SqliteConnection) -> Result<bool, StoreError> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
