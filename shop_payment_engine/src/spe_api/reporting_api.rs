use std::fmt::Debug;

use log::*;

use crate::{
    spe_api::{
        errors::ReportingError,
        order_objects::{OrderDetail, OrderPage, OrderQueryFilter},
    },
    traits::OrderManagement,
};

/// Read-only, paginated views over orders for the admin console.
pub struct ReportingApi<B> {
    db: B,
}

impl<B: Debug> Debug for ReportingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReportingApi ({:?})", self.db)
    }
}

impl<B> ReportingApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> ReportingApi<B>
where
    B: OrderManagement,
{
    /// Fetches one page of orders whose item is (or is not) a recurring plan, newest first. Pages start at 1.
    pub async fn list_orders(
        &self,
        is_recurring: bool,
        page_size: i64,
        page: i64,
    ) -> Result<OrderPage, ReportingError> {
        let filter = OrderQueryFilter::default().with_recurring(is_recurring).with_page(page_size, page)?;
        let (orders, total) = self.db.fetch_orders_page(filter).await?;
        trace!("🗃️ Page {page} of orders (recurring: {is_recurring}) has {} of {total} orders", orders.len());
        Ok(OrderPage::new(orders, total, page_size, page))
    }

    pub async fn get_order(&self, order_id: i64) -> Result<OrderDetail, ReportingError> {
        self.db.fetch_order_detail(order_id).await?.ok_or(ReportingError::OrderNotFound(order_id))
    }
}
