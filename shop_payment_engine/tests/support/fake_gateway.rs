use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use shop_common::Cents;
use shop_payment_engine::gateway::{
    CardDetails,
    GatewayCustomer,
    GatewayError,
    PaymentGateway,
    PaymentIntent,
    PaymentMethodDetails,
    Subscription,
};

/// An in-memory gateway that approves everything unless told otherwise, and counts the calls that move money.
#[derive(Clone, Default)]
pub struct FakeGateway {
    pub refunds: Arc<AtomicUsize>,
    pub cancellations: Arc<AtomicUsize>,
    pub charges: Arc<AtomicUsize>,
    pub decline_refunds: Arc<AtomicBool>,
    pub decline_charges: Arc<AtomicBool>,
    pub refund_delay_ms: Arc<AtomicU64>,
}

impl FakeGateway {
    pub fn refund_count(&self) -> usize {
        self.refunds.load(Ordering::SeqCst)
    }

    pub fn cancellation_count(&self) -> usize {
        self.cancellations.load(Ordering::SeqCst)
    }

    pub fn decline_refunds(&self, decline: bool) {
        self.decline_refunds.store(decline, Ordering::SeqCst);
    }

    /// Makes every refund take `delay` before it answers.
    pub fn delay_refunds(&self, delay: Duration) {
        self.refund_delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn decline_charges(&self, decline: bool) {
        self.decline_charges.store(decline, Ordering::SeqCst);
    }
}

impl PaymentGateway for FakeGateway {
    async fn charge(&self, currency: &str, amount: Cents) -> Result<PaymentIntent, GatewayError> {
        if self.decline_charges.load(Ordering::SeqCst) {
            return Err(GatewayError::declined("card_declined"));
        }
        let n = self.charges.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentIntent {
            id: format!("pi_{n}"),
            client_secret: Some(format!("pi_{n}_secret")),
            amount,
            currency: currency.to_string(),
            status: "requires_confirmation".to_string(),
            latest_charge: None,
            payment_method: None,
        })
    }

    async fn retrieve_payment_intent(&self, id: &str) -> Result<PaymentIntent, GatewayError> {
        Ok(PaymentIntent {
            id: id.to_string(),
            client_secret: Some(format!("{id}_secret")),
            amount: Cents::from(2000),
            currency: "usd".to_string(),
            status: "succeeded".to_string(),
            latest_charge: Some(format!("ch_{id}")),
            payment_method: Some("pm_card_visa".to_string()),
        })
    }

    async fn get_payment_method(&self, id: &str) -> Result<PaymentMethodDetails, GatewayError> {
        Ok(PaymentMethodDetails {
            id: id.to_string(),
            card: Some(CardDetails { brand: "visa".to_string(), last4: "4242".to_string(), exp_month: 12, exp_year: 2030 }),
        })
    }

    async fn create_customer(&self, _payment_method: &str, email: &str) -> Result<GatewayCustomer, GatewayError> {
        Ok(GatewayCustomer { id: "cus_1".to_string(), email: Some(email.to_string()) })
    }

    async fn subscribe_to_plan(
        &self,
        customer_ref: &str,
        plan_ref: &str,
        _email: &str,
        _last_four: &str,
        _coupon: Option<&str>,
    ) -> Result<Subscription, GatewayError> {
        Ok(Subscription { id: format!("sub_{customer_ref}_{plan_ref}"), status: "active".to_string() })
    }

    async fn refund(&self, _payment_intent: &str, _amount: Cents) -> Result<(), GatewayError> {
        let delay = self.refund_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.decline_refunds.load(Ordering::SeqCst) {
            return Err(GatewayError::Rejected { status: 400, message: "charge_already_refunded".to_string() });
        }
        self.refunds.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn cancel_subscription(&self, _subscription_ref: &str) -> Result<(), GatewayError> {
        self.cancellations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
