use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType};

/// Published after a checkout has been assembled into a customer, transaction and order. Invoicing hangs off this.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
    pub email: String,
}

impl OrderCreatedEvent {
    pub fn new(order: Order, email: String) -> Self {
        Self { order, email }
    }
}

/// Published after an order has been refunded or cancelled, both at the gateway and locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAnnulledEvent {
    pub order: Order,
    pub status: OrderStatusType,
}

impl OrderAnnulledEvent {
    pub fn new(order: Order) -> Self {
        let status = order.status_id;
        Self { order, status }
    }
}
