//! Timer state machine: at most one running timer per (task, user) pair.
//!
//! A toggle either opens a new entry (STOPPED → RUNNING) or closes the one
//! running entry (RUNNING → STOPPED). The whole transition runs inside a
//! single `BEGIN IMMEDIATE` transaction so two concurrent starts for the
//! same pair serialize instead of both inserting; the partial unique index
//! on open timers backstops the invariant.

use crate::core::{activity, audit};
use crate::db::{self, NewTimeEntry};
use crate::errors::{AppError, AppResult};
use crate::models::{ActivityKind, TaskDetail};
use crate::utils::time::now;
use rusqlite::{Connection, TransactionBehavior};

/// Caller-supplied toggle input. `billable`/`billable_rate` are snapshotted
/// onto the entry when a timer starts; they are ignored on stop.
#[derive(Debug, Clone)]
pub struct TimerToggle {
    pub user_id: i64,
    pub billable: bool,
    pub billable_rate: f64,
    pub stopped_by_system: bool,
}

/// Start or stop the timer of `input.user_id` on a task.
///
/// A system-initiated stop that finds no running timer is a no-op, not an
/// error: the transaction is abandoned and the unchanged task is returned.
/// Any failure rolls the transaction back and propagates unchanged.
pub fn toggle_timer(
    conn: &mut Connection,
    task_id: i64,
    input: &TimerToggle,
    actor: Option<i64>,
) -> AppResult<TaskDetail> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let task = db::get_task(&tx, task_id)?;
    let container_id = db::task_container_id(&tx, task_id)?;

    match db::find_open_entry(&tx, task_id, input.user_id)? {
        Some(open) => {
            db::close_entry(&tx, open.id, now(), input.stopped_by_system)?;
            let closed = db::get_entry(&tx, open.id)?
                .ok_or_else(|| AppError::not_found("time entry", open.id))?;
            audit::record_updated(&tx, actor, &open, &closed)?;
            activity::record(
                &tx,
                container_id,
                actor,
                &task,
                &ActivityKind::TimeEntryCompleted {
                    duration: closed.tracked_time(),
                    added_manually: closed.added_manually,
                },
            )?;
        }
        None => {
            if input.stopped_by_system {
                // Nothing was running; dropping the transaction rolls it back.
                drop(tx);
                return db::task_detail(conn, task_id);
            }
            let entry = db::insert_entry(
                &tx,
                &NewTimeEntry {
                    task_id,
                    user_id: input.user_id,
                    container_id,
                    member_id: None,
                    start: now(),
                    end: None,
                    billable: input.billable,
                    billable_rate: input.billable_rate,
                    added_manually: false,
                },
            )?;
            audit::record_created(&tx, actor, &entry)?;
        }
    }

    tx.commit()?;
    db::task_detail(conn, task_id)
}
