//! # Storefront payment engine public API
//!
//! The `spe_api` module exposes the programmatic API of the payment engine. Each API is generic over the storage
//! traits it needs (and, where money moves, over a [`crate::gateway::PaymentGateway`]), so clients pick the
//! functionality they want and the backend that provides it.
//!
//! * [`checkout_api`] turns gateway-confirmed payments into customers, transactions and orders.
//! * [`order_status_api`] refunds charges and cancels subscriptions, moving orders out of `Cleared`.
//! * [`auth_api`] is the admin token authority, and also manages admin users and password resets.
//! * [`reporting_api`] serves paginated order listings to the admin console.
//!
//! # API usage
//!
//! An API instance is created by supplying a backend that implements the traits the API requires.
//!
//! ```rust,ignore
//! use shop_payment_engine::{ReportingApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements OrderManagement
//! let api = ReportingApi::new(db);
//! let page = api.list_orders(false, 10, 1).await?;
//! ```
pub mod auth_api;
pub mod checkout_api;
pub mod checkout_objects;
pub mod errors;
pub mod order_objects;
pub mod order_status_api;
pub mod reporting_api;
