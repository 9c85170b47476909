use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::Value;

/// Subject-type tags stored in `logs.loggable_type` and
/// `activities.subject_type`.
pub mod subject {
    pub const TASK: &str = "task";
    pub const TIME_ENTRY: &str = "time_entry";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LogAction {
    Create,
    Update,
    Delete,
}

impl LogAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogAction::Create => "create",
            LogAction::Update => "update",
            LogAction::Delete => "delete",
        }
    }

    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(LogAction::Create),
            "update" => Some(LogAction::Update),
            "delete" => Some(LogAction::Delete),
            _ => None,
        }
    }
}

/// Append-only audit record: one row per mutating operation on a tracked
/// entity. `old_data` holds the full prior state, `new_data` the full new
/// state on create and only the changed attributes on update.
#[derive(Debug, Clone, Serialize)]
pub struct LogRecord {
    pub id: i64,
    pub loggable_type: String,
    pub loggable_id: i64,
    pub user_id: Option<i64>,
    pub action: LogAction,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
    pub task_id: i64,
    pub container_id: i64,
    pub created_at: NaiveDateTime,
}
