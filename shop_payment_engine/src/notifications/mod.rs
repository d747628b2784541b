//! # Notification hub
//!
//! Fans side-channel events (such as "this admin account was deleted") out to every connected admin session. The hub
//! is a single task that owns the connection table and is driven by an unbounded command queue, so publishers never
//! wait on slow connections.
mod hub;
mod messages;
mod sink;

pub use hub::{ConnectionId, HubClosed, HubHandle, NotificationHub};
pub use messages::{HubBroadcast, HubEvent, DELETE_USER_ACTION, LOGOUT_ACTION};
pub use sink::{ChannelSink, NotificationSink, SinkClosed};
