mod auth;
mod checkout;
mod helpers;
mod mocks;
mod orders;
mod users;
