use std::fmt::Debug;

use log::*;
use shop_common::Cents;

use crate::{
    db_types::{Item, NewCustomer, NewOrder, NewTransaction, Order, Transaction},
    events::{EventProducers, OrderCreatedEvent},
    gateway::{PaymentGateway, PaymentIntent},
    spe_api::{
        checkout_objects::{CardCheckout, SubscriptionCheckout, SubscriptionReceipt, VirtualTerminalPayment},
        errors::CheckoutError,
    },
    traits::{CheckoutManagement, StoreError},
};

/// `CheckoutApi` turns payments that the gateway has accepted into persisted customers, transactions and orders.
///
/// Card-present checkouts and subscription checkouts both end up in [`CheckoutApi::assemble`], which writes all three
/// records atomically.
pub struct CheckoutApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
}

impl<B, G> Debug for CheckoutApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckoutApi")
    }
}

impl<B, G> CheckoutApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

impl<B, G> CheckoutApi<B, G>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    pub async fn fetch_item(&self, item_id: i64) -> Result<Item, CheckoutError> {
        self.db.fetch_item(item_id).await?.ok_or(CheckoutError::ItemNotFound(item_id))
    }

    /// Asks the gateway for a payment intent that the client can then confirm with the customer's card.
    pub async fn create_payment_intent(&self, currency: &str, amount: Cents) -> Result<PaymentIntent, CheckoutError> {
        if !amount.is_positive() {
            return Err(CheckoutError::ValidationError(format!("Cannot charge {amount}")));
        }
        self.gateway.charge(currency, amount).await.map_err(|e| {
            warn!("🔄️💳️ Could not create a payment intent for {amount}. {e}");
            CheckoutError::from(e)
        })
    }

    /// Stores a customer, a cleared transaction and a cleared order referencing both, all or nothing. Subscribers to
    /// the order-created hook are notified afterwards.
    ///
    /// Returns the id of the new order.
    pub async fn assemble(
        &self,
        customer: NewCustomer,
        transaction: NewTransaction,
        order: NewOrder,
    ) -> Result<i64, StoreError> {
        let email = customer.email.clone();
        let order = self.db.assemble_order(customer, transaction, order).await.map_err(|e| {
            error!("🔄️📦️ Could not save the order for {email}. Nothing was stored. {e}");
            e
        })?;
        info!("🔄️📦️ Order #{} assembled for {email}", order.id);
        let id = order.id;
        self.call_order_created_hook(order, email).await;
        Ok(id)
    }

    async fn call_order_created_hook(&self, order: Order, email: String) {
        for emitter in &self.producers.order_created_producer {
            debug!("🔄️📦️ Notifying order created hook subscribers");
            emitter.publish_event(OrderCreatedEvent::new(order.clone(), email.clone())).await;
        }
    }

    /// Records a card payment the client confirmed with the gateway. The card's last four digits, expiry and the
    /// charge id are looked up from the gateway rather than trusted from the request.
    pub async fn card_checkout(&self, checkout: CardCheckout) -> Result<i64, CheckoutError> {
        validate_amount_and_quantity(checkout.amount, checkout.quantity)?;
        self.fetch_item(checkout.item_id).await?;
        let transaction = self
            .recover_card_transaction(&checkout.payment_intent, &checkout.payment_method, checkout.amount, &checkout.currency)
            .await?;
        let customer = NewCustomer::new(checkout.first_name, checkout.last_name, checkout.email);
        let order = NewOrder::new(checkout.item_id, checkout.quantity, checkout.amount);
        let id = self.assemble(customer, transaction, order).await?;
        Ok(id)
    }

    /// Creates a gateway customer, subscribes them to the item's plan, and records the subscription as an order. The
    /// subscription id is stored as the transaction's payment intent so it can be cancelled later.
    pub async fn subscription_checkout(
        &self,
        checkout: SubscriptionCheckout,
    ) -> Result<SubscriptionReceipt, CheckoutError> {
        validate_amount_and_quantity(checkout.amount, 1)?;
        let item = self.fetch_item(checkout.item_id).await?;
        let plan = if checkout.plan.is_empty() { item.plan_id } else { checkout.plan.clone() };
        if plan.is_empty() {
            return Err(CheckoutError::ValidationError(format!("Item #{} is not a subscription plan", item.id)));
        }
        let customer_ref =
            self.gateway.create_customer(&checkout.payment_method, &checkout.email).await.map_err(|e| {
                warn!("🔄️💳️ Could not create gateway customer for {}. {e}", checkout.email);
                CheckoutError::from(e)
            })?;
        let subscription = self
            .gateway
            .subscribe_to_plan(
                &customer_ref.id,
                &plan,
                &checkout.email,
                &checkout.last_four,
                checkout.coupon.as_deref(),
            )
            .await
            .map_err(|e| {
                warn!("🔄️💳️ Could not subscribe {} to plan {plan}. {e}", customer_ref.id);
                CheckoutError::from(e)
            })?;
        debug!("🔄️💳️ Subscription {} created for {}", subscription.id, checkout.email);
        let transaction = NewTransaction {
            amount: checkout.amount,
            currency: checkout.currency,
            last_four: checkout.last_four,
            expiry_month: checkout.expiry_month,
            expiry_year: checkout.expiry_year,
            payment_intent: subscription.id.clone(),
            payment_method: checkout.payment_method,
            bank_return_code: String::new(),
        };
        let customer = NewCustomer::new(checkout.first_name, checkout.last_name, checkout.email);
        let order = NewOrder::new(checkout.item_id, 1, checkout.amount);
        let order_id = self.assemble(customer, transaction, order).await?;
        Ok(SubscriptionReceipt { order_id, subscription_id: subscription.id })
    }

    /// Records a payment taken through the admin virtual terminal as a stand-alone transaction.
    pub async fn virtual_terminal_payment(&self, payment: VirtualTerminalPayment) -> Result<Transaction, CheckoutError> {
        validate_amount_and_quantity(payment.amount, 1)?;
        let transaction = self
            .recover_card_transaction(&payment.payment_intent, &payment.payment_method, payment.amount, &payment.currency)
            .await?;
        let transaction = self.db.insert_transaction(transaction).await.map_err(|e| {
            error!("🔄️💳️ Virtual terminal payment {} went through, but could not be saved. {e}", payment.payment_intent);
            CheckoutError::from(e)
        })?;
        info!("🔄️💳️ Virtual terminal payment saved as transaction #{}", transaction.id);
        Ok(transaction)
    }

    async fn recover_card_transaction(
        &self,
        payment_intent: &str,
        payment_method: &str,
        amount: Cents,
        currency: &str,
    ) -> Result<NewTransaction, CheckoutError> {
        let intent = self.gateway.retrieve_payment_intent(payment_intent).await.map_err(|e| {
            warn!("🔄️💳️ Could not retrieve payment intent {payment_intent}. {e}");
            CheckoutError::from(e)
        })?;
        let method = self.gateway.get_payment_method(payment_method).await.map_err(|e| {
            warn!("🔄️💳️ Could not retrieve payment method {payment_method}. {e}");
            CheckoutError::from(e)
        })?;
        let (expiry_month, expiry_year) = method.expiry();
        Ok(NewTransaction {
            amount,
            currency: currency.to_string(),
            last_four: method.last_four(),
            expiry_month,
            expiry_year,
            payment_intent: intent.id,
            payment_method: method.id,
            bank_return_code: intent.latest_charge.unwrap_or_default(),
        })
    }
}

fn validate_amount_and_quantity(amount: Cents, quantity: i64) -> Result<(), CheckoutError> {
    if !amount.is_positive() {
        return Err(CheckoutError::ValidationError(format!("The amount must be positive, not {amount}")));
    }
    if quantity < 1 {
        return Err(CheckoutError::ValidationError(format!("The quantity must be at least 1, not {quantity}")));
    }
    Ok(())
}
