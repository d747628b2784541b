//! Storefront Payment Engine
//!
//! The engine holds the core logic of the storefront payment server: it accepts card payments through a payment
//! gateway, records customers, transactions and orders, refunds and cancels orders, authenticates admin users and
//! reports on sales. It knows nothing about HTTP.
//!
//! The library is divided into these sections:
//! 1. Storage ([`mod@traits`] and, with the `sqlite` feature, [`SqliteDatabase`]). The APIs are generic over the
//!    traits, and the data types they exchange live in [`mod@db_types`].
//! 2. The payment gateway adapter ([`mod@gateway`]).
//! 3. The public API: [`CheckoutApi`], [`OrderStatusApi`], [`AuthApi`] and [`ReportingApi`].
//! 4. The notification hub ([`mod@notifications`]), which fans events out to connected admin sessions.
//!
//! The engine also emits events when orders are created or annulled. A simple actor framework ([`mod@events`]) lets
//! you hook into them, e.g. to send invoices.
pub mod db_types;
pub mod events;
pub mod gateway;
pub mod helpers;
pub mod notifications;
mod spe_api;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
pub use spe_api::{
    auth_api::{AuthApi, AUTH_TOKEN_TTL_HOURS, DEFAULT_FRONTEND_URL, DEFAULT_RESET_LINK_MINUTES},
    checkout_api::CheckoutApi,
    checkout_objects,
    errors::{AuthApiError, CheckoutError, OrderStatusError, ReportingError},
    order_objects,
    order_status_api::OrderStatusApi,
    reporting_api::ReportingApi,
};
pub use traits::{AuthManagement, CheckoutManagement, OrderManagement, StoreError};
