use serde::{Deserialize, Serialize};

pub const DELETE_USER_ACTION: &str = "deleteUser";
pub const LOGOUT_ACTION: &str = "logout";
const ACCOUNT_DELETED_MESSAGE: &str = "Your account has been deleted.";

/// An event submitted to the hub by the rest of the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubEvent {
    pub action: String,
    #[serde(default)]
    pub user_id: i64,
}

impl HubEvent {
    pub fn delete_user(user_id: i64) -> Self {
        Self { action: DELETE_USER_ACTION.to_string(), user_id }
    }

    /// The message this event fans out to connected sessions, if any.
    pub fn broadcast(&self) -> Option<HubBroadcast> {
        match self.action.as_str() {
            DELETE_USER_ACTION => Some(HubBroadcast {
                action: LOGOUT_ACTION.to_string(),
                message: ACCOUNT_DELETED_MESSAGE.to_string(),
                user_id: self.user_id,
            }),
            _ => None,
        }
    }
}

/// The payload delivered to every connected admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubBroadcast {
    pub action: String,
    pub message: String,
    pub user_id: i64,
}
