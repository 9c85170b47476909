//! Payment aggregation and processing for one (container, user) pair.
//!
//! Aggregation is read-only: entries grouped by task with tracked seconds,
//! paid and pending amounts. Processing marks pending work as paid in one
//! transaction and hands back a broadcast payload built after commit.

use crate::core::audit;
use crate::db::{self, EntryFilter, NewNotification};
use crate::errors::{AppError, AppResult};
use crate::models::{BroadcastPayload, Task, TimeEntry};
use crate::utils::date::DateRange;
use crate::utils::time::{fmt_dt_iso, format_duration, parse_dt};
use chrono::NaiveDateTime;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentFilter {
    #[default]
    All,
    Paid,
    Pending,
}

impl PaymentFilter {
    fn as_paid_flag(self) -> Option<bool> {
        match self {
            PaymentFilter::All => None,
            PaymentFilter::Paid => Some(true),
            PaymentFilter::Pending => Some(false),
        }
    }
}

impl FromStr for PaymentFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PaymentFilter::All),
            "paid" => Ok(PaymentFilter::Paid),
            "pending" => Ok(PaymentFilter::Pending),
            other => Err(AppError::Validation(format!(
                "unknown payment status '{other}' (expected all, paid or pending)"
            ))),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// One listed entry. Soft-deleted rows keep their `deleted_at` marker and
/// carry no duration; they are shown but never summed.
#[derive(Debug, Clone, Serialize)]
pub struct EntryLine {
    pub id: i64,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub duration: Option<String>,
    pub is_paid: bool,
    pub amount_paid: Option<f64>,
    pub paid_rate: Option<f64>,
    pub added_manually: bool,
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LogLine {
    pub id: i64,
    pub action: String,
    pub user: Option<String>,
    pub old_data: Option<Value>,
    pub new_data: Option<Value>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskPayment {
    pub task: Option<Task>,
    pub tracked_time: i64,
    pub tracked_time_display: String,
    pub paid_amount: f64,
    pub pending_amount: f64,
    pub entries: Vec<EntryLine>,
    pub logs: Vec<LogLine>,
}

/// Entry timestamps inside audit payloads are normalized to ISO 8601 for
/// consumers; other attributes pass through untouched.
fn normalize_log_data(data: Option<Value>) -> Option<Value> {
    let mut value = data?;
    if let Value::Object(map) = &mut value {
        for key in ["start", "end"] {
            if let Some(Value::String(raw)) = map.get(key) {
                if let Ok(parsed) = parse_dt(raw) {
                    map.insert(key.to_string(), json!(fmt_dt_iso(&parsed)));
                }
            }
        }
    }
    Some(value)
}

fn entry_line(entry: &TimeEntry) -> EntryLine {
    let duration = match (entry.end, entry.deleted_at) {
        (Some(_), None) => Some(format_duration(entry.tracked_time())),
        _ => None,
    };
    EntryLine {
        id: entry.id,
        start: entry.start,
        end: entry.end,
        duration,
        is_paid: entry.is_paid,
        amount_paid: entry.amount_paid,
        paid_rate: entry.paid_rate,
        added_manually: entry.added_manually,
        deleted_at: entry.deleted_at,
    }
}

/// Per-task payment breakdown for one user in a container.
///
/// Open timers are excluded entirely; soft-deleted entries appear in the
/// listing but contribute to no totals.
pub fn payment_details(
    conn: &Connection,
    container_id: i64,
    user_id: i64,
    range: Option<&DateRange>,
    filter: PaymentFilter,
) -> AppResult<Vec<TaskPayment>> {
    db::get_container(conn, container_id)?;
    let member = db::find_container_member(conn, container_id, user_id)?
        .ok_or_else(|| AppError::not_found("container member", user_id))?;

    let entries = db::list_container_entries(
        conn,
        &EntryFilter {
            container_id,
            user_id,
            range: range.copied(),
            paid: filter.as_paid_flag(),
        },
    )?;

    // Group closed entries by task, keeping first-seen task order.
    let mut order: Vec<i64> = Vec::new();
    let mut groups: HashMap<i64, Vec<&TimeEntry>> = HashMap::new();
    for entry in entries.iter().filter(|e| e.end.is_some()) {
        if !groups.contains_key(&entry.task_id) {
            order.push(entry.task_id);
        }
        groups.entry(entry.task_id).or_default().push(entry);
    }

    let users = db::user_directory(conn)?;
    let mut details = Vec::with_capacity(order.len());

    for task_id in order {
        let group = &groups[&task_id];

        let tracked_time: i64 = group
            .iter()
            .filter(|e| e.deleted_at.is_none())
            .map(|e| e.tracked_time())
            .sum();

        let paid_amount: f64 = group
            .iter()
            .filter(|e| e.is_paid && e.deleted_at.is_none())
            .map(|e| e.amount_paid.unwrap_or(0.0))
            .sum();

        let pending_amount: f64 = group
            .iter()
            .filter(|e| !e.is_paid && e.deleted_at.is_none())
            .map(|e| e.tracked_time() as f64 / 3600.0 * member.billable_rate)
            .sum();

        let task = db::get_task_any(conn, task_id)?;
        let logs = match &task {
            Some(task) => db::list_entry_logs_for_task(conn, task.id, user_id)?
                .into_iter()
                .map(|log| LogLine {
                    id: log.id,
                    action: log.action.as_str().to_string(),
                    user: log.user_id.and_then(|id| users.name_of(id).map(String::from)),
                    old_data: log.old_data,
                    new_data: normalize_log_data(log.new_data),
                    created_at: fmt_dt_iso(&log.created_at),
                })
                .collect(),
            None => Vec::new(),
        };

        details.push(TaskPayment {
            task,
            tracked_time,
            tracked_time_display: format_duration(tracked_time),
            paid_amount: round2(paid_amount),
            pending_amount: round2(pending_amount),
            entries: group.iter().map(|e| entry_line(e)).collect(),
            logs,
        });
    }

    Ok(details)
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentReceipt {
    pub payment_id: Option<i64>,
    pub amount: f64,
    pub entries_paid: usize,
    pub notification: Option<BroadcastPayload>,
}

/// Mark every pending closed entry of the user as paid at the member's
/// current rate, record one payment row for the total, and notify the user.
/// The broadcast payload is assembled only after the transaction commits.
pub fn process_payment(
    conn: &mut Connection,
    container_id: i64,
    user_id: i64,
    range: Option<&DateRange>,
    actor: Option<i64>,
) -> AppResult<PaymentReceipt> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let container = db::get_container(&tx, container_id)?;
    let member = db::find_container_member(&tx, container_id, user_id)?
        .ok_or_else(|| AppError::not_found("container member", user_id))?;

    let pending: Vec<TimeEntry> = db::list_container_entries(
        &tx,
        &EntryFilter {
            container_id,
            user_id,
            range: range.copied(),
            paid: Some(false),
        },
    )?
    .into_iter()
    .filter(|e| e.end.is_some() && e.deleted_at.is_none())
    .collect();

    if pending.is_empty() {
        drop(tx);
        return Ok(PaymentReceipt {
            payment_id: None,
            amount: 0.0,
            entries_paid: 0,
            notification: None,
        });
    }

    let mut total = 0.0;
    for entry in &pending {
        let amount = round2(entry.tracked_time() as f64 / 3600.0 * member.billable_rate);
        db::mark_entry_paid(&tx, entry.id, amount, member.billable_rate)?;
        let updated = db::get_entry(&tx, entry.id)?
            .ok_or_else(|| AppError::not_found("time entry", entry.id))?;
        audit::record_updated(&tx, actor, entry, &updated)?;
        total += amount;
    }
    let total = round2(total);

    let payment_id = db::insert_payment(&tx, container_id, user_id, total)?;
    let data = json!({
        "amount": total,
        "container_id": container_id,
        "entries": pending.len(),
    });
    let notification = db::insert_notification(
        &tx,
        &NewNotification {
            user_id,
            title: "Payment processed",
            content: &format!(
                "You have been paid {:.2} for tracked time in {}",
                total, container.name
            ),
            kind: "payment_processed",
            data: Some(&data),
            reference_id: payment_id,
            reference_type: "payment",
        },
    )?;

    tx.commit()?;

    Ok(PaymentReceipt {
        payment_id: Some(payment_id),
        amount: total,
        entries_paid: pending.len(),
        notification: Some(BroadcastPayload::from_notification(&notification)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_is_two_decimals() {
        assert_eq!(round2(10.004), 10.0);
        assert_eq!(round2(10.005), 10.01);
        assert_eq!(round2(0.5 * 20.0), 10.0);
    }

    #[test]
    fn filter_parses_known_values() {
        assert_eq!("all".parse::<PaymentFilter>().unwrap(), PaymentFilter::All);
        assert_eq!("paid".parse::<PaymentFilter>().unwrap(), PaymentFilter::Paid);
        assert_eq!(
            "pending".parse::<PaymentFilter>().unwrap(),
            PaymentFilter::Pending
        );
        assert!("overdue".parse::<PaymentFilter>().is_err());
    }

    #[test]
    fn log_data_normalizes_entry_timestamps() {
        let data = json!({"end": "2025-06-01 10:00:00", "stopped_by_system": false});
        let normalized = normalize_log_data(Some(data)).unwrap();
        assert_eq!(normalized["end"], "2025-06-01T10:00:00+00:00");
        assert_eq!(normalized["stopped_by_system"], false);
    }
}
