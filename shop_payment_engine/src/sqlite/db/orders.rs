use chrono::{DateTime, Utc};
use log::trace;
use shop_common::Cents;
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    order_objects::{CustomerSummary, ItemSummary, OrderDetail, OrderQueryFilter, TransactionSummary},
    traits::StoreError,
};

const ORDER_COLUMNS: &str =
    "id, item_id, transaction_id, customer_id, status_id, quantity, amount, created_at, updated_at";

const DETAIL_SELECT: &str = r#"
    SELECT
        o.id, o.item_id, o.transaction_id, o.customer_id, o.status_id, o.quantity, o.amount,
        o.created_at, o.updated_at,
        i.name as item_name,
        t.amount as txn_amount, t.currency, t.last_four, t.expiry_month, t.expiry_year, t.payment_intent,
        t.bank_return_code,
        c.first_name, c.last_name, c.email
    FROM orders o
        JOIN items i ON o.item_id = i.id
        JOIN transactions t ON o.transaction_id = t.id
        JOIN customers c ON o.customer_id = c.id
"#;

#[derive(Debug, FromRow)]
struct OrderDetailRow {
    id: i64,
    item_id: i64,
    transaction_id: i64,
    customer_id: i64,
    status_id: OrderStatusType,
    quantity: i64,
    amount: Cents,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    item_name: String,
    txn_amount: Cents,
    currency: String,
    last_four: String,
    expiry_month: i64,
    expiry_year: i64,
    payment_intent: String,
    bank_return_code: String,
    first_name: String,
    last_name: String,
    email: String,
}

impl From<OrderDetailRow> for OrderDetail {
    fn from(row: OrderDetailRow) -> Self {
        Self {
            id: row.id,
            item_id: row.item_id,
            transaction_id: row.transaction_id,
            customer_id: row.customer_id,
            status_id: row.status_id,
            quantity: row.quantity,
            amount: row.amount,
            created_at: row.created_at,
            updated_at: row.updated_at,
            item: ItemSummary { id: row.item_id, name: row.item_name },
            transaction: TransactionSummary {
                id: row.transaction_id,
                amount: row.txn_amount,
                currency: row.currency,
                last_four: row.last_four,
                expiry_month: row.expiry_month,
                expiry_year: row.expiry_year,
                payment_intent: row.payment_intent,
                bank_return_code: row.bank_return_code,
            },
            customer: CustomerSummary {
                id: row.customer_id,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
            },
        }
    }
}

/// Inserts a new, cleared order that refers to the given customer and transaction. This is not atomic. Embed it in a
/// transaction (passing `&mut *tx`) along with the customer and transaction inserts.
pub async fn insert_order(
    order: NewOrder,
    customer_id: i64,
    transaction_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Order, StoreError> {
    let now = Utc::now();
    let sql = format!(
        r#"
            INSERT INTO orders (item_id, transaction_id, customer_id, status_id, quantity, amount, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {ORDER_COLUMNS}
        "#
    );
    let order = sqlx::query_as::<_, Order>(&sql)
        .bind(order.item_id)
        .bind(transaction_id)
        .bind(customer_id)
        .bind(OrderStatusType::Cleared)
        .bind(order.quantity)
        .bind(order.amount)
        .bind(now)
        .bind(now)
        .fetch_one(conn)
        .await?;
    trace!("🗃️ Order #{} inserted", order.id);
    Ok(order)
}

pub async fn fetch_order_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, StoreError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_detail(id: i64, conn: &mut SqliteConnection) -> Result<Option<OrderDetail>, StoreError> {
    let sql = format!("{DETAIL_SELECT} WHERE o.id = $1");
    let row = sqlx::query_as::<_, OrderDetailRow>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(row.map(OrderDetail::from))
}

/// Moves a `Cleared` order to `status`. The update only applies while the order is still `Cleared`, so an order that
/// has already moved yields [`StoreError::Conflict`] rather than being overwritten.
pub async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, StoreError> {
    let sql = format!(
        "UPDATE orders SET status_id = $1, updated_at = $2 WHERE id = $3 AND status_id = $4 RETURNING {ORDER_COLUMNS}"
    );
    let result = sqlx::query_as::<_, Order>(&sql)
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .bind(OrderStatusType::Cleared)
        .fetch_optional(&mut *conn)
        .await?;
    if let Some(order) = result {
        return Ok(order);
    }
    match fetch_order_by_id(id, conn).await? {
        Some(order) => Err(StoreError::Conflict(format!("order #{id} is already {}", order.status_id))),
        None => Err(StoreError::NotFound(format!("order #{id}"))),
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderQueryFilter) {
    if let Some(recurring) = filter.is_recurring {
        builder.push(" WHERE i.is_recurring = ");
        builder.push_bind(recurring);
    }
}

/// Fetches a page of orders matching the filter, newest first.
pub async fn fetch_orders(
    filter: &OrderQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderDetail>, StoreError> {
    let mut builder = QueryBuilder::new(DETAIL_SELECT);
    push_filter(&mut builder, filter);
    builder.push(" ORDER BY o.created_at DESC, o.id DESC");
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(filter.offset.unwrap_or(0));
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<OrderDetailRow>().fetch_all(conn).await?;
    trace!("🗃️ Result of fetch_orders: {}", rows.len());
    Ok(rows.into_iter().map(OrderDetail::from).collect())
}

/// Counts all orders matching the filter, ignoring any paging.
pub async fn count_orders(filter: &OrderQueryFilter, conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    let mut builder = QueryBuilder::new("SELECT count(o.id) FROM orders o JOIN items i ON o.item_id = i.id");
    push_filter(&mut builder, filter);
    let (count,) = builder.build_query_as::<(i64,)>().fetch_one(conn).await?;
    Ok(count)
}
