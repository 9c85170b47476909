use crate::utils::time::{now, time_ago};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{json, Value};

/// Stored notification row, written inside the same transaction as the
/// change it announces.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub kind: String,
    pub data: Option<Value>,
    pub is_seen: bool,
    pub reference_id: i64,
    pub reference_type: String,
    pub created_at: NaiveDateTime,
}

/// Wire shape handed to the realtime delivery layer after commit.
/// Building it is infallible and never touches the store again.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastPayload {
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub data: Option<Value>,
    pub is_seen: bool,
    pub created_at: String,
    pub reference: Value,
}

impl BroadcastPayload {
    pub fn from_notification(notification: &Notification) -> Self {
        Self {
            id: notification.id,
            title: notification.title.clone(),
            content: notification.content.clone(),
            kind: notification.kind.clone(),
            data: notification.data.clone(),
            is_seen: notification.is_seen,
            created_at: time_ago(notification.created_at, now()),
            reference: json!({
                "id": notification.reference_id,
                "type": notification.reference_type,
            }),
        }
    }
}
