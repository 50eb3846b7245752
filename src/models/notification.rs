use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::wire;

/// One entry of `GET /notifications/user`, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidentNotification {
    #[serde(deserialize_with = "wire::id")]
    pub id: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
}

pub fn unread_count(notifications: &[ResidentNotification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_notification_list() {
        let list: Vec<ResidentNotification> = serde_json::from_str(
            r#"[
                {"id": 3, "message": "Your laundry booking is in progress", "created_at": "2025-03-10T08:05:00.123456Z", "read": false},
                {"id": 1, "message": "Welcome", "created_at": "2025-03-01T09:00:00+00:00", "read": true}
            ]"#,
        )
        .unwrap();
        assert_eq!(list[0].id, "3");
        assert_eq!(list[1].created_at.to_rfc3339(), "2025-03-01T09:00:00+00:00");
        assert_eq!(unread_count(&list), 1);
    }
}
