//! `SqliteDatabase` is a concrete implementation of a storefront payment engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module. Every call is bounded by [`STORAGE_TIMEOUT`].
use std::{fmt::Debug, future::Future};

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::db::{auth, customers, db_url, items, new_pool, orders, transactions, users, STORAGE_TIMEOUT};
use crate::{
    db_types::{Item, NewCustomer, NewOrder, NewToken, NewTransaction, Order, OrderStatusType, Transaction, User, UserUpdate},
    order_objects::{OrderDetail, OrderQueryFilter},
    traits::{AuthManagement, CheckoutManagement, OrderManagement, StoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

/// Runs a storage future, turning an overrun of [`STORAGE_TIMEOUT`] into [`StoreError::Timeout`].
async fn bounded<T, F>(fut: F) -> Result<T, StoreError>
where F: Future<Output = Result<T, StoreError>> {
    match tokio::time::timeout(STORAGE_TIMEOUT, fut).await {
        Ok(result) => result,
        Err(_) => {
            warn!("🗃️ Storage call timed out after {STORAGE_TIMEOUT:?}");
            Err(StoreError::Timeout(STORAGE_TIMEOUT))
        },
    }
}

impl CheckoutManagement for SqliteDatabase {
    async fn fetch_item(&self, item_id: i64) -> Result<Option<Item>, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            items::fetch_item(item_id, &mut conn).await
        })
        .await
    }

    /// Inserts the customer, the transaction and the order in a single database transaction. If any insert fails, the
    /// transaction is dropped without committing, which rolls back the earlier inserts.
    async fn assemble_order(
        &self,
        customer: NewCustomer,
        transaction: NewTransaction,
        order: NewOrder,
    ) -> Result<Order, StoreError> {
        bounded(async {
            let mut tx = self.pool.begin().await?;
            let customer_id = customers::insert_customer(customer, &mut tx).await?;
            let transaction_id = transactions::insert_transaction(transaction, &mut tx).await?;
            let order = orders::insert_order(order, customer_id, transaction_id, &mut tx).await?;
            tx.commit().await?;
            debug!(
                "🗃️ Order #{} saved with customer #{customer_id} and transaction #{transaction_id}",
                order.id
            );
            Ok(order)
        })
        .await
    }

    async fn insert_transaction(&self, transaction: NewTransaction) -> Result<Transaction, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            let id = transactions::insert_transaction(transaction, &mut conn).await?;
            transactions::fetch_transaction(id, &mut conn)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("transaction #{id}")))
        })
        .await
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            orders::fetch_order_by_id(order_id, &mut conn).await
        })
        .await
    }

    async fn fetch_order_detail(&self, order_id: i64) -> Result<Option<OrderDetail>, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            orders::fetch_order_detail(order_id, &mut conn).await
        })
        .await
    }

    async fn update_order_status(&self, order_id: i64, status: OrderStatusType) -> Result<Order, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            orders::update_order_status(order_id, status, &mut conn).await
        })
        .await
    }

    async fn fetch_orders_page(&self, filter: OrderQueryFilter) -> Result<(Vec<OrderDetail>, i64), StoreError> {
        bounded(async {
            let mut tx = self.pool.begin().await?;
            let total = orders::count_orders(&filter, &mut tx).await?;
            let page = orders::fetch_orders(&filter, &mut tx).await?;
            tx.commit().await?;
            Ok((page, total))
        })
        .await
    }
}

impl AuthManagement for SqliteDatabase {
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            users::fetch_user_by_email(email, &mut conn).await
        })
        .await
    }

    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            users::fetch_user_by_id(user_id, &mut conn).await
        })
        .await
    }

    async fn fetch_all_users(&self) -> Result<Vec<User>, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            users::fetch_all_users(&mut conn).await
        })
        .await
    }

    async fn insert_user(&self, user: UserUpdate, password_hash: &str) -> Result<User, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            users::insert_user(user, password_hash, &mut conn).await
        })
        .await
    }

    async fn update_user(
        &self,
        user_id: i64,
        update: UserUpdate,
        password_hash: Option<&str>,
    ) -> Result<User, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            users::update_user(user_id, update, password_hash, &mut conn).await
        })
        .await
    }

    async fn update_password_for_email(&self, email: &str, password_hash: &str) -> Result<(), StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            users::update_password_for_email(email, password_hash, &mut conn).await
        })
        .await
    }

    async fn delete_user(&self, user_id: i64) -> Result<bool, StoreError> {
        bounded(async {
            let mut tx = self.pool.begin().await?;
            auth::delete_tokens_for_user(user_id, &mut tx).await?;
            let deleted = users::delete_user(user_id, &mut tx).await?;
            tx.commit().await?;
            Ok(deleted)
        })
        .await
    }

    async fn replace_token(&self, token: NewToken) -> Result<(), StoreError> {
        bounded(async {
            let mut tx = self.pool.begin().await?;
            let user_id = token.user_id;
            auth::delete_tokens_for_user(user_id, &mut tx).await?;
            auth::insert_token(token, &mut tx).await?;
            tx.commit().await?;
            trace!("🗃️ Token for user #{user_id} replaced");
            Ok(())
        })
        .await
    }

    async fn fetch_user_for_token(&self, token_hash: &[u8], now: DateTime<Utc>) -> Result<Option<User>, StoreError> {
        bounded(async {
            let mut conn = self.pool.acquire().await?;
            auth::fetch_user_for_token(token_hash, now, &mut conn).await
        })
        .await
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `SHOP_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date with the migrations embedded in this crate.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./src/sqlite/migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::DatabaseError(format!("Migration failed. {e}")))?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) {
        self.pool.close().await;
    }
}
