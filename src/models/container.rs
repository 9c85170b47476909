use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Container {
    pub id: i64,
    pub name: String,
}

/// A user's participation record in a container. Carries the billable rate
/// that gets snapshotted onto time entries and task assignments.
#[derive(Debug, Clone, Serialize)]
pub struct Member {
    pub id: i64,
    pub container_id: i64,
    pub user_id: i64,
    pub billable: bool,
    pub billable_rate: f64,
    pub can_timing: bool,
}
