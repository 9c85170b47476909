//! Manual timer reconciler: applies a client-submitted list of timer
//! patches to a task's entries in one all-or-nothing transaction.

use crate::core::{activity, audit};
use crate::db::{self, NewTimeEntry};
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityKind, Task, TaskDetail};
use crate::utils::time::parse_optional_dt;
use chrono::NaiveDateTime;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use serde::Deserialize;

/// One timer descriptor from the client. Three shapes are accepted:
/// `{id, deleted: true}` deletes, `{id, start, end?}` updates, and
/// `{start, end?, user_id, member_id?}` creates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimerPatch {
    pub id: Option<i64>,
    #[serde(default)]
    pub deleted: bool,
    pub start: Option<String>,
    pub end: Option<String>,
    pub user_id: Option<i64>,
    pub member_id: Option<i64>,
}

fn check_order(start: NaiveDateTime, end: Option<NaiveDateTime>) -> AppResult<()> {
    if let Some(end) = end {
        if end < start {
            return Err(AppError::Validation(format!(
                "end {end} precedes start {start}"
            )));
        }
    }
    Ok(())
}

/// Apply every patch or none. An update referencing an unknown entry id
/// aborts the whole batch with NotFound; deletes of already-gone ids and
/// creates with an empty start are skipped silently (both preserved from
/// the upstream behavior).
pub fn update_timers(
    conn: &mut Connection,
    task_id: i64,
    patches: &[TimerPatch],
    actor: Option<i64>,
) -> AppResult<TaskDetail> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let task = db::get_task(&tx, task_id)?;
    let container_id = db::task_container_id(&tx, task_id)?;

    for patch in patches {
        if patch.deleted {
            if let Some(id) = patch.id {
                apply_delete(&tx, container_id, &task, id, actor)?;
            }
            continue;
        }

        match patch.id {
            Some(id) => apply_update(&tx, container_id, &task, id, patch, actor)?,
            None => apply_create(&tx, container_id, &task, patch, actor)?,
        }
    }

    tx.commit()?;
    db::task_detail(conn, task_id)
}

fn apply_delete(
    tx: &Transaction<'_>,
    container_id: i64,
    task: &Task,
    id: i64,
    actor: Option<i64>,
) -> AppResult<()> {
    let Some(entry) = db::get_entry(tx, id)? else {
        return Ok(());
    };
    db::soft_delete_entry(tx, id)?;
    audit::record_deleted(tx, actor, &entry)?;
    activity::record(
        tx,
        container_id,
        actor,
        task,
        &ActivityKind::TimeEntryDeleted {
            duration: entry.tracked_time(),
            user_id: Some(entry.user_id),
        },
    )?;
    Ok(())
}

fn apply_update(
    tx: &Transaction<'_>,
    container_id: i64,
    task: &Task,
    id: i64,
    patch: &TimerPatch,
    actor: Option<i64>,
) -> AppResult<()> {
    let old = db::get_entry(tx, id)?
        .ok_or_else(|| AppError::not_found("time entry", id))?;

    let start = parse_optional_dt(patch.start.as_deref())?
        .ok_or_else(|| AppError::Validation(format!("start is required to update entry {id}")))?;
    let end = parse_optional_dt(patch.end.as_deref())?;
    check_order(start, end)?;

    db::update_entry_times(tx, id, start, end)?;
    let new = db::get_entry(tx, id)?
        .ok_or_else(|| AppError::not_found("time entry", id))?;

    audit::record_updated(tx, actor, &old, &new)?;
    activity::record(
        tx,
        container_id,
        actor,
        task,
        &ActivityKind::TimeEntryUpdated {
            old_duration: old.tracked_time(),
            new_duration: new.tracked_time(),
            user_id: Some(old.user_id),
        },
    )?;
    Ok(())
}

fn apply_create(
    tx: &Transaction<'_>,
    container_id: i64,
    task: &Task,
    patch: &TimerPatch,
    actor: Option<i64>,
) -> AppResult<()> {
    // Creates without a start are dropped without error; the client sends
    // blank rows for empty form lines.
    let Some(start) = parse_optional_dt(patch.start.as_deref())? else {
        return Ok(());
    };
    let end = parse_optional_dt(patch.end.as_deref())?;
    check_order(start, end)?;

    let user_id = patch
        .user_id
        .ok_or_else(|| AppError::Validation("user_id is required to create a timer".into()))?;

    // Billing is resolved from the container member at write time, never
    // cached from the task.
    let member = db::find_container_member(tx, container_id, user_id)?
        .ok_or_else(|| AppError::not_found("container member", user_id))?;

    let entry = db::insert_entry(
        tx,
        &NewTimeEntry {
            task_id: task.id,
            user_id,
            container_id,
            member_id: patch.member_id,
            start,
            end,
            billable: member.billable,
            billable_rate: member.billable_rate,
            added_manually: true,
        },
    )?;
    audit::record_created(tx, actor, &entry)?;

    if entry.end.is_some() {
        activity::record(
            tx,
            container_id,
            actor,
            task,
            &ActivityKind::TimeEntryCompleted {
                duration: entry.tracked_time(),
                added_manually: true,
            },
        )?;
    }
    Ok(())
}

/// Parse a JSON array of timer patches, the wire format of the HTTP layer.
pub fn parse_patches(raw: &str) -> AppResult<Vec<TimerPatch>> {
    let patches: Vec<TimerPatch> = serde_json::from_str(raw)?;
    Ok(patches)
}
