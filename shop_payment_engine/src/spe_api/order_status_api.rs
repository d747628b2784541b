use std::{
    collections::HashSet,
    fmt::Debug,
    sync::{Arc, Mutex, PoisonError},
};

use log::*;
use shop_common::Cents;

use crate::{
    db_types::{Order, OrderStatusType},
    events::{EventProducers, OrderAnnulledEvent},
    gateway::PaymentGateway,
    spe_api::{
        errors::OrderStatusError,
        order_objects::{OrderDetail, TransitionOutcome},
    },
    traits::OrderManagement,
};

/// `OrderStatusApi` drives the order state machine: `Cleared` orders can be refunded or cancelled, and nothing else.
///
/// Both transitions are two-phase. The gateway is asked first, and only when it agrees is the order row updated. The
/// phases cannot be made atomic, so a gateway success followed by a failed update is reported as a reconciliation
/// failure in the returned [`TransitionOutcome`]. It is never retried.
///
/// Only one transition per order may be in flight at a time. Clones of the API share the set of in-flight orders, so
/// build one instance and clone it into each worker.
#[derive(Clone)]
pub struct OrderStatusApi<B, G> {
    db: B,
    gateway: G,
    producers: EventProducers,
    in_flight: InFlightOrders,
}

impl<B, G> Debug for OrderStatusApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderStatusApi")
    }
}

impl<B, G> OrderStatusApi<B, G> {
    pub fn new(db: B, gateway: G, producers: EventProducers) -> Self {
        Self { db, gateway, producers, in_flight: InFlightOrders::default() }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> OrderStatusApi<B, G>
where
    B: OrderManagement,
    G: PaymentGateway,
{
    /// Refunds `amount` of the charge behind `payment_intent` and marks the order as `Refunded`.
    pub async fn refund_charge(
        &self,
        order_id: i64,
        payment_intent: &str,
        amount: Cents,
        currency: &str,
    ) -> TransitionOutcome {
        let target = OrderStatusType::Refunded;
        let Some(_claim) = self.in_flight.claim(order_id) else {
            return TransitionOutcome::rejected(order_id, target, OrderStatusError::TransitionInProgress(order_id));
        };
        let order = match self.check_transition(order_id, target, payment_intent).await {
            Ok(order) => order,
            Err(e) => return TransitionOutcome::rejected(order_id, target, e),
        };
        if amount > order.transaction.amount {
            let reason = format!("A refund of {amount} is more than the {} that was charged", order.transaction.amount);
            warn!("🔄️ Refusing to refund order #{order_id}. {reason}");
            return TransitionOutcome::rejected(order_id, target, OrderStatusError::ChargeMismatch { order_id, reason });
        }
        debug!("🔄️💳️ Refunding {amount} {currency} of {payment_intent} for order #{order_id}");
        if let Err(e) = self.gateway.refund(payment_intent, amount).await {
            warn!("🔄️💳️ Refund of {payment_intent} for order #{order_id} was refused. {e}");
            return TransitionOutcome::rejected(order_id, target, e.into());
        }
        self.record_transition(order_id, target).await
    }

    /// Cancels the subscription (at the end of its billing period) and marks the order as `Cancelled`.
    pub async fn cancel_subscription(&self, order_id: i64, subscription_ref: &str) -> TransitionOutcome {
        let target = OrderStatusType::Cancelled;
        let Some(_claim) = self.in_flight.claim(order_id) else {
            return TransitionOutcome::rejected(order_id, target, OrderStatusError::TransitionInProgress(order_id));
        };
        if let Err(e) = self.check_transition(order_id, target, subscription_ref).await {
            return TransitionOutcome::rejected(order_id, target, e);
        }
        debug!("🔄️💳️ Cancelling subscription {subscription_ref} for order #{order_id}");
        if let Err(e) = self.gateway.cancel_subscription(subscription_ref).await {
            warn!("🔄️💳️ Cancellation of {subscription_ref} for order #{order_id} was refused. {e}");
            return TransitionOutcome::rejected(order_id, target, e.into());
        }
        self.record_transition(order_id, target).await
    }

    /// Loads the order and makes sure it may move to `target`. Terminal orders are rejected here, before the gateway
    /// is involved, so that repeated requests cannot refund or cancel twice. `reference` must be the payment intent
    /// (or subscription) that the order was paid with.
    async fn check_transition(
        &self,
        order_id: i64,
        target: OrderStatusType,
        reference: &str,
    ) -> Result<OrderDetail, OrderStatusError> {
        let order = self.db.fetch_order_detail(order_id).await?.ok_or(OrderStatusError::OrderNotFound(order_id))?;
        if !order.status_id.can_transition_to(target) {
            info!("🔄️ Order #{order_id} is already {}. Not moving it to {target}", order.status_id);
            return Err(OrderStatusError::AlreadyTerminal { order_id, status: order.status_id });
        }
        if order.transaction.payment_intent != reference {
            warn!(
                "🔄️ Order #{order_id} was paid with {}, but the request names {reference}",
                order.transaction.payment_intent
            );
            let reason = format!("It was not paid with {reference}");
            return Err(OrderStatusError::ChargeMismatch { order_id, reason });
        }
        Ok(order)
    }

    async fn record_transition(&self, order_id: i64, target: OrderStatusType) -> TransitionOutcome {
        match self.db.update_order_status(order_id, target).await {
            Ok(order) => {
                info!("🔄️ Order #{order_id} is now {target}");
                self.call_order_annulled_hook(order).await;
                TransitionOutcome::completed(order_id, target)
            },
            Err(e) => {
                error!(
                    "🔄️🚨️ RECONCILIATION REQUIRED. The gateway accepted the change of order #{order_id} to {target}, \
                     but the order could not be updated. Fix this record by hand. {e}"
                );
                let error = OrderStatusError::ReconciliationRequired { order_id, reason: e.to_string() };
                TransitionOutcome::unreconciled(order_id, target, error)
            },
        }
    }

    async fn call_order_annulled_hook(&self, order: Order) {
        for emitter in &self.producers.order_annulled_producer {
            debug!("🔄️📦️ Notifying order annulled hook subscribers");
            emitter.publish_event(OrderAnnulledEvent::new(order.clone())).await;
        }
    }
}

/// The ids of orders that have a transition under way.
#[derive(Debug, Clone, Default)]
struct InFlightOrders(Arc<Mutex<HashSet<i64>>>);

impl InFlightOrders {
    /// Returns `None` if another transition of this order already holds the claim.
    fn claim(&self, order_id: i64) -> Option<InFlightClaim> {
        let mut orders = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if !orders.insert(order_id) {
            info!("🔄️ A transition of order #{order_id} is already under way");
            return None;
        }
        Some(InFlightClaim { orders: Arc::clone(&self.0), order_id })
    }
}

/// Releases the order when dropped.
struct InFlightClaim {
    orders: Arc<Mutex<HashSet<i64>>>,
    order_id: i64,
}

impl Drop for InFlightClaim {
    fn drop(&mut self) {
        self.orders.lock().unwrap_or_else(PoisonError::into_inner).remove(&self.order_id);
    }
}
