use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{db_types::NewCustomer, traits::StoreError};

/// Inserts a new customer and returns its id. This is not atomic on its own; pass `&mut *tx` to include it in a
/// transaction.
pub async fn insert_customer(customer: NewCustomer, conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO customers (first_name, last_name, email, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
        "#,
    )
    .bind(customer.first_name)
    .bind(customer.last_name)
    .bind(customer.email)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Customer #{id} inserted");
    Ok(id)
}
