use crate::utils::time::{format_tracked_hours, DATETIME_FMT};
use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{json, Value};

/// One tracked span of work on a task. An open timer is a row with
/// `end = None`; at most one open row may exist per (task, user).
#[derive(Debug, Clone, Serialize)]
pub struct TimeEntry {
    pub id: i64,
    pub task_id: i64,
    pub user_id: i64,
    pub container_id: i64,
    pub member_id: Option<i64>,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub billable: bool,
    pub billable_rate: f64,
    pub added_manually: bool,
    pub stopped_by_system: bool,
    pub is_paid: bool,
    pub amount_paid: Option<f64>,
    pub paid_rate: Option<f64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub deleted_at: Option<NaiveDateTime>,
}

impl TimeEntry {
    /// Elapsed seconds; zero while the timer is still running.
    pub fn tracked_time(&self) -> i64 {
        match self.end {
            Some(end) => (end - self.start).num_seconds(),
            None => 0,
        }
    }

    pub fn tracked_time_display(&self) -> String {
        format_tracked_hours(self.tracked_time())
    }

    /// Full-state snapshot for the audit log. Timestamps use the canonical
    /// storage format so log data round-trips byte-identically.
    pub fn snapshot(&self) -> Value {
        json!({
            "id": self.id,
            "task_id": self.task_id,
            "user_id": self.user_id,
            "container_id": self.container_id,
            "member_id": self.member_id,
            "start": self.start.format(DATETIME_FMT).to_string(),
            "end": self.end.map(|e| e.format(DATETIME_FMT).to_string()),
            "billable": self.billable,
            "billable_rate": self.billable_rate,
            "added_manually": self.added_manually,
            "stopped_by_system": self.stopped_by_system,
            "is_paid": self.is_paid,
            "amount_paid": self.amount_paid,
            "paid_rate": self.paid_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(start: &str, end: Option<&str>) -> TimeEntry {
        let parse = |s: &str| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
        };
        let created = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TimeEntry {
            id: 1,
            task_id: 1,
            user_id: 1,
            container_id: 1,
            member_id: None,
            start: parse(start),
            end: end.map(parse),
            billable: true,
            billable_rate: 20.0,
            added_manually: false,
            stopped_by_system: false,
            is_paid: false,
            amount_paid: None,
            paid_rate: None,
            created_at: created,
            updated_at: created,
            deleted_at: None,
        }
    }

    #[test]
    fn open_entry_tracks_zero() {
        assert_eq!(entry("2025-06-01 09:00:00", None).tracked_time(), 0);
    }

    #[test]
    fn closed_entry_tracks_elapsed_seconds() {
        let e = entry("2025-06-01 09:00:00", Some("2025-06-01 10:30:00"));
        assert_eq!(e.tracked_time(), 5400);
        assert_eq!(e.tracked_time_display(), "1h 30m");
    }

    #[test]
    fn snapshot_uses_canonical_timestamps() {
        let e = entry("2025-06-01 09:00:00", Some("2025-06-01 10:00:00"));
        let snap = e.snapshot();
        assert_eq!(snap["start"], "2025-06-01 09:00:00");
        assert_eq!(snap["end"], "2025-06-01 10:00:00");
        assert_eq!(snap["is_paid"], false);
    }
}
