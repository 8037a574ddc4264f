//! Thông báo in-app của user (append-only).

use crate::id::new_id;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub message: String,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

impl Notification {
    pub fn new(user_id: &str, message: &str) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            message: message.to_string(),
            created_at: Utc::now(),
            read: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_notification_is_unread() {
        let n = Notification::new("USR_1", "Welcome");
        assert!(!n.read);
        assert_eq!(n.message, "Welcome");
    }
}
