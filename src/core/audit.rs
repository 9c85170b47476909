//! Audit log writer.
//!
//! Called explicitly by the timer state machine, the timesheet reconciler
//! and the payment processor, inside the same transaction as the mutation.
//! A failed write fails the whole operation.

use crate::db::{self, NewLog};
use crate::errors::AppResult;
use crate::models::log::subject;
use crate::models::{LogAction, TimeEntry};
use rusqlite::Connection;
use serde_json::{Map, Value};

/// Attributes of `new` whose values differ from `old`. Update records keep
/// only the delta, mirroring what the entry actually changed.
fn changed_attributes(old: &Value, new: &Value) -> Value {
    let empty = Map::new();
    let old_map = old.as_object().unwrap_or(&empty);
    let new_map = new.as_object().unwrap_or(&empty);

    let changed: Map<String, Value> = new_map
        .iter()
        .filter(|(key, value)| old_map.get(*key) != Some(value))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Value::Object(changed)
}

pub fn record_created(
    conn: &Connection,
    actor: Option<i64>,
    entry: &TimeEntry,
) -> AppResult<i64> {
    let new_data = entry.snapshot();
    db::insert_log(
        conn,
        &NewLog {
            loggable_type: subject::TIME_ENTRY,
            loggable_id: entry.id,
            user_id: actor,
            action: LogAction::Create,
            old_data: None,
            new_data: Some(&new_data),
            task_id: entry.task_id,
            container_id: entry.container_id,
        },
    )
}

pub fn record_updated(
    conn: &Connection,
    actor: Option<i64>,
    old: &TimeEntry,
    new: &TimeEntry,
) -> AppResult<i64> {
    let old_data = old.snapshot();
    let new_data = changed_attributes(&old_data, &new.snapshot());
    db::insert_log(
        conn,
        &NewLog {
            loggable_type: subject::TIME_ENTRY,
            loggable_id: new.id,
            user_id: actor,
            action: LogAction::Update,
            old_data: Some(&old_data),
            new_data: Some(&new_data),
            task_id: new.task_id,
            container_id: new.container_id,
        },
    )
}

pub fn record_deleted(
    conn: &Connection,
    actor: Option<i64>,
    entry: &TimeEntry,
) -> AppResult<i64> {
    let old_data = entry.snapshot();
    db::insert_log(
        conn,
        &NewLog {
            loggable_type: subject::TIME_ENTRY,
            loggable_id: entry.id,
            user_id: actor,
            action: LogAction::Delete,
            old_data: Some(&old_data),
            new_data: None,
            task_id: entry.task_id,
            container_id: entry.container_id,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn diff_keeps_only_changed_keys() {
        let old = json!({"end": null, "stopped_by_system": false, "user_id": 3});
        let new = json!({"end": "2025-06-01 10:00:00", "stopped_by_system": false, "user_id": 3});
        let diff = changed_attributes(&old, &new);
        assert_eq!(diff, json!({"end": "2025-06-01 10:00:00"}));
    }

    #[test]
    fn diff_of_identical_snapshots_is_empty() {
        let snap = json!({"a": 1, "b": "x"});
        assert_eq!(changed_attributes(&snap, &snap), json!({}));
    }
}
