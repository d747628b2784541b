use serde::{Deserialize, Serialize};
use shop_common::{Cents, DEFAULT_CURRENCY};

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_quantity() -> i64 {
    1
}

/// A one-off card payment that the client has already confirmed with the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardCheckout {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub payment_intent: String,
    pub payment_method: String,
    pub amount: Cents,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub item_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

/// A request to create a gateway customer and subscribe them to the plan behind `item_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionCheckout {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub payment_method: String,
    /// Overrides the plan configured on the item when not empty
    #[serde(default)]
    pub plan: String,
    pub item_id: i64,
    pub amount: Cents,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub last_four: String,
    #[serde(default)]
    pub expiry_month: i64,
    #[serde(default)]
    pub expiry_year: i64,
    #[serde(default)]
    pub coupon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionReceipt {
    pub order_id: i64,
    pub subscription_id: String,
}

/// A card payment taken by an admin through the virtual terminal. Only a transaction is recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualTerminalPayment {
    pub amount: Cents,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    pub payment_intent: String,
    pub payment_method: String,
}
