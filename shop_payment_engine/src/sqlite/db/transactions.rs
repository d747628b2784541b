use chrono::Utc;
use log::trace;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewTransaction, Transaction, TransactionStatusType},
    traits::StoreError,
};

/// Inserts a new transaction and returns its id. The status is always recorded as cleared, whatever the caller
/// believes.
pub async fn insert_transaction(txn: NewTransaction, conn: &mut SqliteConnection) -> Result<i64, StoreError> {
    let now = Utc::now();
    let id: i64 = sqlx::query_scalar(
        r#"
            INSERT INTO transactions (
                amount,
                currency,
                last_four,
                expiry_month,
                expiry_year,
                payment_intent,
                payment_method,
                bank_return_code,
                transaction_status_id,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
        "#,
    )
    .bind(txn.amount)
    .bind(txn.currency)
    .bind(txn.last_four)
    .bind(txn.expiry_month)
    .bind(txn.expiry_year)
    .bind(txn.payment_intent)
    .bind(txn.payment_method)
    .bind(txn.bank_return_code)
    .bind(TransactionStatusType::Cleared)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    trace!("🗃️ Transaction #{id} inserted");
    Ok(id)
}

pub async fn fetch_transaction(id: i64, conn: &mut SqliteConnection) -> Result<Option<Transaction>, StoreError> {
    let txn = sqlx::query_as::<_, Transaction>(
        r#"
            SELECT id, amount, currency, last_four, expiry_month, expiry_year, payment_intent, payment_method,
                   bank_return_code, transaction_status_id, created_at, updated_at
            FROM transactions
            WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await?;
    Ok(txn)
}
