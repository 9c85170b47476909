use crate::models::time_entry::TimeEntry;
use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Task {
    pub id: i64,
    pub board_id: i64,
    pub name: String,
    /// Human-facing task number within the container, shown as `Task #N`.
    pub sequence_id: i64,
    pub deleted_at: Option<NaiveDateTime>,
}

/// Assignment of a user to a task, with permissions and rate snapshotted
/// from the container member at assignment time.
#[derive(Debug, Clone, Serialize)]
pub struct TaskMember {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub can_timing: bool,
    pub billable: bool,
    pub billable_rate: f64,
}

/// A task together with its time entries, the shape mutating operations
/// hand back to the HTTP boundary.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    pub task: Task,
    pub entries: Vec<TimeEntry>,
}
