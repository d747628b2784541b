use serde::{Deserialize, Serialize};
use shop_common::Cents;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub amount: Cents,
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub status: String,
    /// The id of the most recent charge. This is recorded as the bank return code.
    #[serde(default)]
    pub latest_charge: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardDetails {
    #[serde(default)]
    pub brand: String,
    pub last4: String,
    pub exp_month: i64,
    pub exp_year: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodDetails {
    pub id: String,
    #[serde(default)]
    pub card: Option<CardDetails>,
}

impl PaymentMethodDetails {
    pub fn last_four(&self) -> String {
        self.card.as_ref().map(|c| c.last4.clone()).unwrap_or_default()
    }

    pub fn expiry(&self) -> (i64, i64) {
        self.card.as_ref().map(|c| (c.exp_month, c.exp_year)).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayCustomer {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    #[serde(default)]
    pub status: String,
}
