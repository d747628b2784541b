use std::fmt::Display;

use serde::{Deserialize, Serialize};
use shop_common::{Cents, DEFAULT_CURRENCY};
use shop_payment_engine::db_types::{Token, UserUpdate};

/// The envelope for mutations that have nothing else to return.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { error: false, message: message.to_string(), id: None }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { error: true, message: message.to_string(), id: None }
    }

    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    pub amount: Cents,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentResponse {
    pub id: String,
    pub client_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticationResponse {
    pub error: bool,
    pub message: String,
    pub authentication_token: Token,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResetLinkRequest {
    /// The full signed link, as the customer received it
    pub url: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResetLinkResponse {
    pub error: bool,
    pub message: String,
    /// The customer's email address, encrypted, to be sent back with the new password
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    /// The encrypted email address from the reset link verification
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_page")]
    pub page: i64,
}

fn default_page_size() -> i64 {
    10
}

fn default_page() -> i64 {
    1
}

/// A request to refund an order's charge, or to cancel the subscription behind it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangeRequest {
    pub id: i64,
    /// The payment intent for refunds, the subscription id for cancellations
    pub payment_intent: String,
    #[serde(default)]
    pub amount: Cents,
    #[serde(default = "default_currency")]
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEditRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl UserEditRequest {
    pub fn into_parts(self) -> (UserUpdate, Option<String>) {
        let update = UserUpdate { first_name: self.first_name, last_name: self.last_name, email: self.email };
        let password = Some(self.password).filter(|p| !p.is_empty());
        (update, password)
    }
}
