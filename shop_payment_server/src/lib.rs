//! # Storefront payment server
//! This crate hosts the HTTP server for the storefront payment engine. It is responsible for:
//! Taking card and subscription checkouts from the storefront and recording them as orders.
//! Authenticating admin users with opaque bearer tokens and running the password reset flow.
//! Serving the admin console: sales reports, refunds, subscription cancellations and user management.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/item/{id}`: A catalogue item.
//! * `/api/payment-intent`: Creates a payment intent at the gateway.
//! * `/api/payment-succeeded`: Records a confirmed card payment as an order.
//! * `/api/create-customer-and-subscribe-to-plan`: Subscribes a new customer to a plan and records the order.
//! * `/api/authenticate`, `/api/is-authenticated`: Bearer token issue and check.
//! * `/api/forgot-password`, `/api/verify-reset-link`, `/api/reset-password`: The password reset flow.
//!
//! Everything under `/api/admin` needs an `Authorization: Bearer <token>` header:
//! * `/api/admin/virtual-terminal-succeeded`
//! * `/api/admin/all-sales`, `/api/admin/all-subscriptions`, `/api/admin/get-sale/{id}`
//! * `/api/admin/refund`, `/api/admin/cancel-subscription`
//! * `/api/admin/all-users`, `/api/admin/all-users/{id}`, `/api/admin/all-users/edit/{id}`,
//!   `/api/admin/all-users/delete/{id}`
//! * `/api/admin/notifications`: A server-sent event stream of hub broadcasts.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
