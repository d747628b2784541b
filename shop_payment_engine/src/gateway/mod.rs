//! # Payment gateway adapter
//!
//! [`PaymentGateway`] is the engine's only view of the card processor. Every call is a single attempt; nothing is
//! retried. [`StripeGateway`] talks to a Stripe-compatible REST API.
mod errors;
mod gateway_objects;
mod stripe;

pub use errors::{card_error_message, GatewayError, GENERIC_DECLINE_MESSAGE};
pub use gateway_objects::{CardDetails, GatewayCustomer, PaymentIntent, PaymentMethodDetails, Subscription};
use shop_common::Cents;
pub use stripe::{StripeGateway, DEFAULT_STRIPE_API_URL};

#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Creates a payment intent for `amount` minor units of `currency`.
    async fn charge(&self, currency: &str, amount: Cents) -> Result<PaymentIntent, GatewayError>;

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, GatewayError>;

    /// Looks up the card behind a payment method, for its last four digits and expiry date.
    async fn get_payment_method(&self, id: &str) -> Result<PaymentMethodDetails, GatewayError>;

    async fn create_customer(&self, payment_method: &str, email: &str) -> Result<GatewayCustomer, GatewayError>;

    async fn subscribe_to_plan(
        &self,
        customer_ref: &str,
        plan_ref: &str,
        email: &str,
        last_four: &str,
        coupon: Option<&str>,
    ) -> Result<Subscription, GatewayError>;

    /// Refunds `amount` minor units of the charge behind `payment_intent`.
    async fn refund(&self, payment_intent: &str, amount: Cents) -> Result<(), GatewayError>;

    /// Cancels the subscription at the end of the current billing period.
    async fn cancel_subscription(&self, subscription_ref: &str) -> Result<(), GatewayError>;
}
