use thiserror::Error;

use crate::{
    db_types::OrderStatusType,
    gateway::GatewayError,
    helpers::{CipherError, SignerError},
    traits::StoreError,
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("The payment gateway refused the request. {0}")]
    Gateway(#[from] GatewayError),
    #[error("Could not save the order. {0}")]
    Store(#[from] StoreError),
    #[error("Item #{0} does not exist")]
    ItemNotFound(i64),
    #[error("Invalid checkout request: {0}")]
    ValidationError(String),
}

#[derive(Debug, Clone, Error)]
pub enum OrderStatusError {
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Order #{order_id} is already {status} and cannot be changed")]
    AlreadyTerminal { order_id: i64, status: OrderStatusType },
    #[error("Order #{0} is already being updated")]
    TransitionInProgress(i64),
    #[error("Order #{order_id} does not match the request. {reason}")]
    ChargeMismatch { order_id: i64, reason: String },
    #[error("The payment gateway refused the request. {0}")]
    Gateway(#[from] GatewayError),
    #[error("Could not read or write the order. {0}")]
    Store(#[from] StoreError),
    #[error("The gateway applied the change to order #{order_id}, but the order could not be updated. {reason}")]
    ReconciliationRequired { order_id: i64, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ReportingError {
    #[error("Invalid pagination request: {0}")]
    InvalidPagination(String),
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Could not fetch orders. {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Invalid auth credentials")]
    InvalidCredentials,
    #[error("No authorization header was provided")]
    MissingAuthHeader,
    #[error("The authorization header is malformed: {0}")]
    MalformedAuthHeader(String),
    #[error("The token is unknown or has expired")]
    InvalidToken,
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("Invalid request: {0}")]
    ValidationError(String),
    #[error("The password reset link is not valid. {0}")]
    InvalidResetLink(#[from] SignerError),
    #[error("Could not process the email address. {0}")]
    Cipher(#[from] CipherError),
    #[error("Could not hash the password. {0}")]
    PasswordHashError(String),
    #[error("Could not send the email. {0}")]
    MailerError(String),
    #[error("Database error: {0}")]
    Store(#[from] StoreError),
}

impl AuthApiError {
    /// True for every failure that should be reported to the client as a plain authentication failure.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials | Self::MissingAuthHeader | Self::MalformedAuthHeader(_) | Self::InvalidToken
        )
    }
}
