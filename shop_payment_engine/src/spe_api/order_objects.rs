use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shop_common::Cents;

use crate::{
    db_types::OrderStatusType,
    spe_api::errors::{OrderStatusError, ReportingError},
};

//--------------------------------------     OrderDetail     ---------------------------------------------------------
/// An order joined with the item, transaction and customer it refers to. This is what the admin console displays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub id: i64,
    pub item_id: i64,
    pub transaction_id: i64,
    pub customer_id: i64,
    pub status_id: OrderStatusType,
    pub quantity: i64,
    pub amount: Cents,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub item: ItemSummary,
    pub transaction: TransactionSummary,
    pub customer: CustomerSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    pub id: i64,
    pub amount: Cents,
    pub currency: String,
    pub last_four: String,
    pub expiry_month: i64,
    pub expiry_year: i64,
    pub payment_intent: String,
    pub bank_return_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerSummary {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

//--------------------------------------   OrderQueryFilter   ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderQueryFilter {
    pub is_recurring: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl OrderQueryFilter {
    pub fn with_recurring(mut self, is_recurring: bool) -> Self {
        self.is_recurring = Some(is_recurring);
        self
    }

    /// Restricts the query to the given 1-based page. Both arguments must be at least 1.
    pub fn with_page(mut self, page_size: i64, page: i64) -> Result<Self, ReportingError> {
        if page_size < 1 {
            return Err(ReportingError::InvalidPagination(format!("page_size must be at least 1, not {page_size}")));
        }
        if page < 1 {
            return Err(ReportingError::InvalidPagination(format!("page must be at least 1, not {page}")));
        }
        let offset = (page - 1).checked_mul(page_size).ok_or_else(|| {
            ReportingError::InvalidPagination(format!("page {page} of size {page_size} is out of range"))
        })?;
        self.limit = Some(page_size);
        self.offset = Some(offset);
        Ok(self)
    }
}

//--------------------------------------       OrderPage      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPage {
    pub current_page: i64,
    pub page_size: i64,
    pub last_page: i64,
    pub total_records: i64,
    pub orders: Vec<OrderDetail>,
}

impl OrderPage {
    pub fn new(orders: Vec<OrderDetail>, total_records: i64, page_size: i64, current_page: i64) -> Self {
        let last_page = last_page(total_records, page_size);
        Self { current_page, page_size, last_page, total_records, orders }
    }
}

/// The number of the last page needed to show `total` records, `page_size` at a time. An empty result still has one
/// (empty) page.
pub fn last_page(total: i64, page_size: i64) -> i64 {
    if total <= 0 || page_size <= 0 {
        return 1;
    }
    total / page_size + i64::from(total % page_size != 0)
}

//--------------------------------------   TransitionOutcome  ---------------------------------------------------------
/// The result of a gateway-backed status change. The gateway call and the local update are separate steps, and this
/// type records how far the change got.
#[derive(Debug, Clone)]
pub struct TransitionOutcome {
    pub order_id: i64,
    pub target: OrderStatusType,
    pub gateway_succeeded: bool,
    pub local_update_succeeded: bool,
    pub error: Option<OrderStatusError>,
}

impl TransitionOutcome {
    pub fn completed(order_id: i64, target: OrderStatusType) -> Self {
        Self { order_id, target, gateway_succeeded: true, local_update_succeeded: true, error: None }
    }

    /// Nothing happened. Either the request was rejected up front or the gateway refused it.
    pub fn rejected(order_id: i64, target: OrderStatusType, error: OrderStatusError) -> Self {
        Self { order_id, target, gateway_succeeded: false, local_update_succeeded: false, error: Some(error) }
    }

    /// The gateway applied the change but the order row could not be updated to match.
    pub fn unreconciled(order_id: i64, target: OrderStatusType, error: OrderStatusError) -> Self {
        Self { order_id, target, gateway_succeeded: true, local_update_succeeded: false, error: Some(error) }
    }

    pub fn is_complete(&self) -> bool {
        self.gateway_succeeded && self.local_update_succeeded
    }

    pub fn requires_reconciliation(&self) -> bool {
        self.gateway_succeeded && !self.local_update_succeeded
    }

    pub fn into_result(self) -> Result<OrderStatusType, OrderStatusError> {
        match self.error {
            None => Ok(self.target),
            Some(e) => Err(e),
        }
    }
}
