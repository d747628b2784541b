use crate::{
    db_types::{Order, OrderStatusType},
    order_objects::{OrderDetail, OrderQueryFilter},
    traits::StoreError,
};

/// The `OrderManagement` trait defines the behaviour for querying and updating persisted orders.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreError>;

    /// Fetches the order together with its item, transaction and customer.
    async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, StoreError>;

    /// Moves a `Cleared` order to `status` and bumps its `updated_at` timestamp. An order that is no longer `Cleared`
    /// is left alone and reported as [`StoreError::Conflict`].
    async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, StoreError>;

    /// Returns one page of orders matching the filter, newest first, along with the total number of matching orders.
    async fn fetch_orders_page(&self, filter: OrderQueryFilter) -> Result<(Vec<OrderDetail>, i64), StoreError>;
}
