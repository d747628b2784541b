use std::time::Duration;

use log::*;
use reqwest::{Client, RequestBuilder};
use serde::{de::DeserializeOwned, Deserialize};
use shop_common::{Cents, Secret};

use super::{
    GatewayCustomer,
    GatewayError,
    PaymentGateway,
    PaymentIntent,
    PaymentMethodDetails,
    Subscription,
};

pub const DEFAULT_STRIPE_API_URL: &str = "https://api.stripe.com";

#[derive(Debug, Default, Deserialize)]
struct StripeErrorBody {
    #[serde(default)]
    r#type: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    decline_code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

/// A [`PaymentGateway`] backed by the Stripe REST API (or anything that speaks it).
#[derive(Clone)]
pub struct StripeGateway {
    client: Client,
    api_url: String,
    secret: Secret<String>,
}

impl StripeGateway {
    pub fn new(api_url: &str, secret: Secret<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| GatewayError::Transport(e.to_string()))?;
        let api_url = api_url.trim_end_matches('/').to_string();
        Ok(Self { client, api_url, secret })
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(format!("{}{path}", self.api_url)).bearer_auth(self.secret.reveal())
    }

    fn post(&self, path: &str, params: &[(&str, String)]) -> RequestBuilder {
        self.client.post(format!("{}{path}", self.api_url)).bearer_auth(self.secret.reveal()).form(params)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GatewayError> {
        let response = request.send().await.map_err(|e| {
            warn!("💳️ Gateway request failed: {e}");
            GatewayError::Transport(e.to_string())
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !status.is_success() {
            let err = error_from_response(status.as_u16(), &body);
            warn!("💳️ Gateway returned an error. {err}. Body: {body}");
            return Err(err);
        }
        serde_json::from_str::<T>(&body).map_err(|e| GatewayError::InvalidResponse(format!("{e}; body={body}")))
    }
}

/// Turns a non-2xx gateway response into a [`GatewayError`]. Card errors become declines with a customer-facing
/// message. Everything else is a rejection.
fn error_from_response(status: u16, body: &str) -> GatewayError {
    let error = serde_json::from_str::<StripeErrorEnvelope>(body).map(|e| e.error).unwrap_or_default();
    if error.r#type == "card_error" {
        let code = error.decline_code.or(error.code).unwrap_or_default();
        return GatewayError::declined(code);
    }
    let message = error.message.unwrap_or_else(|| format!("HTTP status {status}"));
    GatewayError::Rejected { status, message }
}

impl PaymentGateway for StripeGateway {
    async fn charge(&self, currency: &str, amount: Cents) -> Result<PaymentIntent, GatewayError> {
        debug!("💳️ Creating payment intent for {amount} {currency}");
        let params = [
            ("amount", amount.value().to_string()),
            ("currency", currency.to_string()),
            ("payment_method_types[]", "card".to_string()),
        ];
        self.send(self.post("/v1/payment_intents", &params)).await
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, GatewayError> {
        trace!("💳️ Fetching payment intent {id}");
        self.send(self.get(&format!("/v1/payment_intents/{id}"))).await
    }

    async fn get_payment_method(&self, id: &str) -> Result<PaymentMethodDetails, GatewayError> {
        trace!("💳️ Fetching payment method {id}");
        self.send(self.get(&format!("/v1/payment_methods/{id}"))).await
    }

    async fn create_customer(&self, payment_method: &str, email: &str) -> Result<GatewayCustomer, GatewayError> {
        debug!("💳️ Creating customer for {email}");
        let params = [
            ("payment_method", payment_method.to_string()),
            ("email", email.to_string()),
            ("invoice_settings[default_payment_method]", payment_method.to_string()),
        ];
        self.send(self.post("/v1/customers", &params)).await
    }

    async fn subscribe_to_plan(
        &self,
        customer_ref: &str,
        plan_ref: &str,
        email: &str,
        last_four: &str,
        coupon: Option<&str>,
    ) -> Result<Subscription, GatewayError> {
        debug!("💳️ Subscribing customer {customer_ref} to plan {plan_ref}");
        let mut params = vec![
            ("customer", customer_ref.to_string()),
            ("items[0][price]", plan_ref.to_string()),
            ("metadata[last_four]", last_four.to_string()),
            ("metadata[email]", email.to_string()),
            ("expand[]", "latest_invoice.payment_intent".to_string()),
        ];
        if let Some(coupon) = coupon.filter(|c| !c.is_empty()) {
            params.push(("coupon", coupon.to_string()));
        }
        self.send(self.post("/v1/subscriptions", &params)).await
    }

    async fn refund(&self, payment_intent: &str, amount: Cents) -> Result<(), GatewayError> {
        debug!("💳️ Refunding {amount} on {payment_intent}");
        let params = [("payment_intent", payment_intent.to_string()), ("amount", amount.value().to_string())];
        let _: serde_json::Value = self.send(self.post("/v1/refunds", &params)).await?;
        Ok(())
    }

    async fn cancel_subscription(&self, subscription_ref: &str) -> Result<(), GatewayError> {
        debug!("💳️ Cancelling subscription {subscription_ref} at period end");
        let params = [("cancel_at_period_end", "true".to_string())];
        let _: serde_json::Value = self.send(self.post(&format!("/v1/subscriptions/{subscription_ref}"), &params)).await?;
        Ok(())
    }
}
