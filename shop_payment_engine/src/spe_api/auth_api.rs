use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use shop_common::Secret;

use crate::{
    db_types::{NewToken, Token, TokenScope, User, UserUpdate},
    helpers::{
        generate_token_plaintext,
        hash_password_async,
        hash_token,
        password_matches_async,
        EmailCipher,
        Mailer,
        UrlSigner,
        DEFAULT_BCRYPT_COST,
        TOKEN_LENGTH,
    },
    notifications::{HubEvent, HubHandle},
    spe_api::errors::AuthApiError,
    traits::{AuthManagement, StoreError},
};

/// Authentication tokens are valid for this many hours after they are issued.
pub const AUTH_TOKEN_TTL_HOURS: i64 = 24;
/// Password reset links are honoured for this many minutes.
pub const DEFAULT_RESET_LINK_MINUTES: i64 = 60;
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:4000";

const BEARER_PREFIX: &str = "Bearer ";

/// `AuthApi` is the admin token authority. It checks credentials, issues and validates opaque bearer tokens, manages
/// admin users, and runs the password reset flow.
///
/// Password reset links are signed with [`UrlSigner`] and the email address that comes back from a verified link is
/// encrypted with [`EmailCipher`]. Both derive their keys from the same server secret.
pub struct AuthApi<B> {
    db: B,
    signer: UrlSigner,
    cipher: EmailCipher,
    frontend_url: String,
    reset_link_minutes: i64,
    token_ttl: Duration,
    bcrypt_cost: u32,
    hub: Option<HubHandle>,
}

impl<B: Debug> Debug for AuthApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AuthApi ({:?})", self.db)
    }
}

impl<B> AuthApi<B> {
    pub fn new(db: B, secret: Secret<String>) -> Self {
        let cipher = EmailCipher::new(&secret);
        let signer = UrlSigner::new(secret);
        Self {
            db,
            signer,
            cipher,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            reset_link_minutes: DEFAULT_RESET_LINK_MINUTES,
            token_ttl: Duration::hours(AUTH_TOKEN_TTL_HOURS),
            bcrypt_cost: DEFAULT_BCRYPT_COST,
            hub: None,
        }
    }

    pub fn with_frontend_url<S: Into<String>>(mut self, url: S) -> Self {
        self.frontend_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_reset_link_minutes(mut self, minutes: i64) -> Self {
        self.reset_link_minutes = minutes;
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    /// Account deletions are announced on this hub so that the deleted user's open sessions are logged out.
    pub fn with_hub(mut self, hub: HubHandle) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }
}

impl<B> AuthApi<B>
where
    B: AuthManagement,
{
    /// Checks an email and password pair. An unknown email and a wrong password are indistinguishable to the caller.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AuthApiError> {
        let email = email.trim().to_lowercase();
        let user = match self.db.fetch_user_by_email(&email).await? {
            Some(user) => user,
            None => {
                info!("🔐️ Login attempt for unknown user {email}");
                return Err(AuthApiError::InvalidCredentials);
            },
        };
        if !password_matches_async(password, &user.password).await {
            info!("🔐️ Login attempt for {email} with the wrong password");
            return Err(AuthApiError::InvalidCredentials);
        }
        debug!("🔐️ User #{} authenticated", user.id);
        Ok(user)
    }

    /// Checks the credentials and issues an authentication token for the user.
    pub async fn login(&self, email: &str, password: &str) -> Result<Token, AuthApiError> {
        let user = self.authenticate(email, password).await?;
        self.issue_token(user.id, self.token_ttl, TokenScope::Authentication).await
    }

    /// Issues a new token for the user, replacing any token they held before. The plaintext is only available in the
    /// returned value; storage keeps its hash.
    pub async fn issue_token(&self, user_id: i64, ttl: Duration, scope: TokenScope) -> Result<Token, AuthApiError> {
        let user = self.db.fetch_user_by_id(user_id).await?.ok_or(AuthApiError::UserNotFound(user_id))?;
        let plaintext = generate_token_plaintext();
        let expiry = Utc::now() + ttl;
        let new_token = NewToken {
            user_id,
            name: user.first_name,
            email: user.email,
            hash: hash_token(&plaintext),
            expiry,
        };
        self.db.replace_token(new_token).await?;
        info!("🔐️ Issued {scope} token for user #{user_id}, valid until {expiry}");
        Ok(Token { plaintext, user_id, expiry, scope })
    }

    /// Validates an `Authorization` header value of the form `Bearer <token>` and returns the token's owner.
    pub async fn validate_request(&self, authorization: Option<&str>) -> Result<User, AuthApiError> {
        let header = authorization.ok_or(AuthApiError::MissingAuthHeader)?;
        let plaintext = header
            .strip_prefix(BEARER_PREFIX)
            .ok_or_else(|| AuthApiError::MalformedAuthHeader("Expected 'Bearer <token>'".into()))?;
        self.validate_token(plaintext).await
    }

    /// Validates a token plaintext. Tokens of the wrong length are rejected without touching storage.
    pub async fn validate_token(&self, plaintext: &str) -> Result<User, AuthApiError> {
        if plaintext.len() != TOKEN_LENGTH {
            debug!("🔐️ Rejecting token of length {}", plaintext.len());
            return Err(AuthApiError::MalformedAuthHeader(format!("Tokens must be {TOKEN_LENGTH} characters long")));
        }
        let hash = hash_token(plaintext);
        match self.db.fetch_user_for_token(&hash, Utc::now()).await? {
            Some(user) => {
                trace!("🔐️ Token belongs to user #{}", user.id);
                Ok(user)
            },
            None => {
                debug!("🔐️ Token is unknown or has expired");
                Err(AuthApiError::InvalidToken)
            },
        }
    }

    //--------------------------------------   User management   -----------------------------------------------------

    pub async fn all_users(&self) -> Result<Vec<User>, AuthApiError> {
        let users = self.db.fetch_all_users().await?;
        Ok(users)
    }

    pub async fn get_user(&self, user_id: i64) -> Result<User, AuthApiError> {
        self.db.fetch_user_by_id(user_id).await?.ok_or(AuthApiError::UserNotFound(user_id))
    }

    /// Creates a user when `user_id` is 0, and updates user `user_id` otherwise. A new user must have a password. For
    /// an existing user, the password is only changed if one is given.
    pub async fn save_user(
        &self,
        user_id: i64,
        update: UserUpdate,
        password: Option<&str>,
    ) -> Result<User, AuthApiError> {
        validate_user_update(&update)?;
        let password = password.filter(|p| !p.is_empty());
        let password_hash = match password {
            Some(p) => Some(hash_password_async(p, self.bcrypt_cost).await?),
            None => None,
        };
        let user = if user_id == 0 {
            let hash = password_hash
                .ok_or_else(|| AuthApiError::ValidationError("A new user must have a password".into()))?;
            self.db.insert_user(update, &hash).await?
        } else {
            self.db.update_user(user_id, update, password_hash.as_deref()).await.map_err(|e| match e {
                StoreError::NotFound(_) => AuthApiError::UserNotFound(user_id),
                e => e.into(),
            })?
        };
        info!("🔐️ Saved user #{}", user.id);
        Ok(user)
    }

    /// Deletes the user and their tokens, then tells every connected session that the account is gone.
    pub async fn delete_user(&self, user_id: i64) -> Result<(), AuthApiError> {
        if !self.db.delete_user(user_id).await? {
            return Err(AuthApiError::UserNotFound(user_id));
        }
        info!("🔐️ Deleted user #{user_id}");
        if let Some(hub) = &self.hub {
            if let Err(e) = hub.publish(HubEvent::delete_user(user_id)) {
                warn!("🔐️ Could not announce the deletion of user #{user_id}. {e}");
            }
        }
        Ok(())
    }

    //--------------------------------------   Password reset   ------------------------------------------------------

    /// Mails a signed password reset link to `email`. Unknown addresses are logged and otherwise ignored, so the
    /// caller cannot use this to discover which addresses have accounts.
    pub async fn forgot_password<M: Mailer>(&self, email: &str, mailer: &M) -> Result<(), AuthApiError> {
        let email = email.trim().to_lowercase();
        if self.db.fetch_user_by_email(&email).await?.is_none() {
            info!("🔐️ Password reset requested for unknown address {email}");
            return Ok(());
        }
        let link = self.reset_link(&email)?;
        mailer.send_password_reset(&email, &link).await.map_err(|e| AuthApiError::MailerError(e.to_string()))?;
        info!("🔐️ Password reset link sent to {email}");
        Ok(())
    }

    /// The signed reset link for `email`.
    pub fn reset_link(&self, email: &str) -> Result<String, AuthApiError> {
        let url = format!("{}/reset-password?email={email}", self.frontend_url);
        let link = self.signer.sign(&url)?;
        Ok(link)
    }

    /// Checks the signature and age of a reset link, and that it was issued for `email`. Returns the email address,
    /// encrypted, for the final [`Self::reset_password`] step.
    pub async fn verify_reset_link(&self, link: &str, email: &str) -> Result<String, AuthApiError> {
        self.signer.check(link, self.reset_link_minutes)?;
        let email = email.trim().to_lowercase();
        match link_email(link) {
            Some(linked) if linked.to_lowercase() == email => {},
            _ => {
                warn!("🔐️ A valid reset link was presented for a different address ({email})");
                return Err(AuthApiError::ValidationError("The link was not issued for this address".into()));
            },
        }
        let encrypted = self.cipher.encrypt(&email)?;
        Ok(encrypted)
    }

    /// Sets a new password for the owner of the encrypted email address handed out by [`Self::verify_reset_link`].
    pub async fn reset_password(&self, encrypted_email: &str, password: &str) -> Result<(), AuthApiError> {
        if password.is_empty() {
            return Err(AuthApiError::ValidationError("The password cannot be empty".into()));
        }
        let email = self.cipher.decrypt(encrypted_email)?;
        let hash = hash_password_async(password, self.bcrypt_cost).await?;
        self.db.update_password_for_email(&email, &hash).await.map_err(|e| match e {
            StoreError::NotFound(_) => AuthApiError::ValidationError("No account matches the reset request".into()),
            e => e.into(),
        })?;
        info!("🔐️ Password reset for {email}");
        Ok(())
    }
}

fn validate_user_update(update: &UserUpdate) -> Result<(), AuthApiError> {
    if update.first_name.trim().is_empty() || update.last_name.trim().is_empty() {
        return Err(AuthApiError::ValidationError("First and last name are required".into()));
    }
    if !update.email.contains('@') {
        return Err(AuthApiError::ValidationError(format!("'{}' is not an email address", update.email)));
    }
    Ok(())
}

/// The value of the `email` query parameter of a reset link.
fn link_email(link: &str) -> Option<&str> {
    let (_, query) = link.split_once('?')?;
    query.split('&').find_map(|pair| pair.strip_prefix("email="))
}
