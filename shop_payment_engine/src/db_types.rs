use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::Cents;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(String);

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The lifecycle state of an order. Every order starts out `Cleared`. `Refunded` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[repr(i64)]
#[serde(into = "i64", try_from = "i64")]
pub enum OrderStatusType {
    /// The charge has gone through and the order is live.
    Cleared = 1,
    /// The charge was refunded through the gateway.
    Refunded = 2,
    /// The subscription backing this order was cancelled through the gateway.
    Cancelled = 3,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Refunded | Self::Cancelled)
    }

    /// Only `Cleared` orders may move, and only to a terminal state.
    pub fn can_transition_to(&self, target: OrderStatusType) -> bool {
        matches!((self, target), (Self::Cleared, Self::Refunded) | (Self::Cleared, Self::Cancelled))
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Cleared => write!(f, "Cleared"),
            OrderStatusType::Refunded => write!(f, "Refunded"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl From<OrderStatusType> for i64 {
    fn from(value: OrderStatusType) -> Self {
        value as i64
    }
}

impl TryFrom<i64> for OrderStatusType {
    type Error = ConversionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Cleared),
            2 => Ok(Self::Refunded),
            3 => Ok(Self::Cancelled),
            v => Err(ConversionError(format!("{v} is not a valid order status id"))),
        }
    }
}

//-------------------------------------- TransactionStatusType ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[repr(i64)]
#[serde(into = "i64", try_from = "i64")]
pub enum TransactionStatusType {
    Pending = 1,
    Cleared = 2,
}

impl From<TransactionStatusType> for i64 {
    fn from(value: TransactionStatusType) -> Self {
        value as i64
    }
}

impl TryFrom<i64> for TransactionStatusType {
    type Error = ConversionError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Pending),
            2 => Ok(Self::Cleared),
            v => Err(ConversionError(format!("{v} is not a valid transaction status id"))),
        }
    }
}

//--------------------------------------        Item         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub inventory_level: i64,
    pub price: Cents,
    pub image: String,
    pub is_recurring: bool,
    pub plan_id: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Customer       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl NewCustomer {
    pub fn new<S: Into<String>>(first_name: S, last_name: S, email: S) -> Self {
        Self { first_name: first_name.into(), last_name: last_name.into(), email: email.into() }
    }
}

//--------------------------------------     Transaction     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub amount: Cents,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i64,
    pub expiry_year: i64,
    pub payment_intent: String,
    pub payment_method: String,
    pub bank_return_code: String,
    pub transaction_status_id: TransactionStatusType,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// A card transaction as reported back by the gateway. The status is not part of this type: storage always records
/// new transactions as cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub amount: Cents,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i64,
    pub expiry_year: i64,
    /// The payment intent id for one-off charges, or the subscription id for subscriptions
    pub payment_intent: String,
    pub payment_method: String,
    /// The gateway's charge id
    pub bank_return_code: String,
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub item_id: i64,
    pub transaction_id: i64,
    pub customer_id: i64,
    pub status_id: OrderStatusType,
    pub quantity: i64,
    pub amount: Cents,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// The order-specific part of a checkout. The customer and transaction ids are filled in during assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub item_id: i64,
    pub quantity: i64,
    pub amount: Cents,
}

impl NewOrder {
    pub fn new(item_id: i64, quantity: i64, amount: Cents) -> Self {
        Self { item_id, quantity, amount }
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// The bcrypt hash of the password. It is never sent over the wire.
    #[serde(skip)]
    pub password: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserUpdate {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

//--------------------------------------       Token         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TokenScope {
    #[default]
    Authentication,
}

impl Display for TokenScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenScope::Authentication => write!(f, "authentication"),
        }
    }
}

/// A freshly issued bearer token. `plaintext` is only ever available here; storage keeps the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(rename = "token")]
    pub plaintext: String,
    #[serde(skip)]
    pub user_id: i64,
    pub expiry: DateTime<Utc>,
    #[serde(skip)]
    pub scope: TokenScope,
}

#[derive(Debug, Clone)]
pub struct NewToken {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub hash: Vec<u8>,
    pub expiry: DateTime<Utc>,
}
