//! Task assignment: sync and unassign members, snapshotting billing terms
//! from the container member record at assignment time.

use crate::core::activity;
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityKind, TaskDetail};
use rusqlite::{Connection, TransactionBehavior};

/// Remove a user's assignment from a task.
pub fn unassign_member(
    conn: &mut Connection,
    task_id: i64,
    user_id: i64,
    actor: Option<i64>,
) -> AppResult<TaskDetail> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let task = db::get_task(&tx, task_id)?;
    let container_id = db::task_container_id(&tx, task_id)?;

    let removed = db::delete_task_members(&tx, task_id, user_id)?;
    if removed > 0 {
        activity::record(
            &tx,
            container_id,
            actor,
            &task,
            &ActivityKind::MemberRemoved { user_id: Some(user_id) },
        )?;
    }

    tx.commit()?;
    db::task_detail(conn, task_id)
}

/// Reconcile a task's assignments against the requested user-id set:
/// missing users are added (with permissions and rate copied from their
/// container member record), surplus users are removed.
pub fn sync_members(
    conn: &mut Connection,
    task_id: i64,
    member_ids: &[i64],
    actor: Option<i64>,
) -> AppResult<TaskDetail> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let task = db::get_task(&tx, task_id)?;
    let container_id = db::task_container_id(&tx, task_id)?;
    let existing = db::task_member_user_ids(&tx, task_id)?;

    for user_id in &existing {
        if !member_ids.contains(user_id) {
            db::delete_task_members(&tx, task_id, *user_id)?;
            activity::record(
                &tx,
                container_id,
                actor,
                &task,
                &ActivityKind::MemberRemoved { user_id: Some(*user_id) },
            )?;
        }
    }

    for user_id in member_ids {
        if existing.contains(user_id) {
            continue;
        }
        let member = db::find_container_member(&tx, container_id, *user_id)?
            .ok_or_else(|| AppError::not_found("container member", *user_id))?;
        db::insert_task_member(&tx, task_id, &member)?;
        activity::record(
            &tx,
            container_id,
            actor,
            &task,
            &ActivityKind::MemberAdded { user_id: Some(*user_id) },
        )?;
    }

    tx.commit()?;
    db::task_detail(conn, task_id)
}
