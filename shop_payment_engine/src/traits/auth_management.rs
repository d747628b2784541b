use chrono::{DateTime, Utc};

use crate::{
    db_types::{NewToken, User, UserUpdate},
    traits::StoreError,
};

/// The `AuthManagement` trait defines behaviour for managing admin users and their bearer tokens.
///
/// Token plaintexts never reach the backend. Only their SHA-256 hashes are stored and looked up.
#[allow(async_fn_in_trait)]
pub trait AuthManagement {
    /// Fetches a user by email address. The address is compared case-insensitively.
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError>;

    async fn fetch_all_users(&self) -> Result<Vec<User>, StoreError>;

    /// Creates a new user with the given (already hashed) password.
    async fn insert_user(&self, user: UserUpdate, password_hash: &str) -> Result<User, StoreError>;

    /// Updates the profile fields of the user. If `password_hash` is provided, the password is replaced as well.
    async fn update_user(
        &self,
        user_id: i64,
        update: UserUpdate,
        password_hash: Option<&str>,
    ) -> Result<User, StoreError>;

    async fn update_password_for_email(&self, email: &str, password_hash: &str) -> Result<(), StoreError>;

    /// Deletes the user and all of their tokens. Returns `false` if the user did not exist.
    async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError>;

    /// Stores a token for a user, replacing any token previously issued to them. This must be atomic.
    async fn replace_token(&self, token: NewToken) -> Result<(), StoreError>;

    /// Returns the owner of the token with the given hash, provided the token expires after `now`.
    async fn fetch_user_for_token(&self, token_hash: &[u8], now: DateTime<Utc>) -> Result<Option<User>, StoreError>;
}
