mod bearer;

pub use bearer::{AdminUser, BearerAuthMiddlewareFactory, BearerAuthMiddlewareService};
