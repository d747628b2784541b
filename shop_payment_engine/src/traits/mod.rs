//! # Storage backends
//!
//! This module defines the interface contracts of the payment engine storage *backends*. The public APIs in
//! [`crate::spe_api`] are generic over these traits, so any backend that implements them can power the server.
//!
//! * [`CheckoutManagement`] turns gateway-confirmed charges into customer, transaction and order records.
//! * [`OrderManagement`] reads orders and moves them between statuses.
//! * [`AuthManagement`] manages admin users and their bearer tokens.
//!
//! All of them report failures as [`StoreError`].
mod auth_management;
mod checkout_management;
mod order_management;
mod store_error;

pub use auth_management::AuthManagement;
pub use checkout_management::CheckoutManagement;
pub use order_management::OrderManagement;
pub use store_error::StoreError;
