use crate::core::payments::TaskPayment;
use crate::errors::AppResult;
use crate::models::User;
use crate::utils::time::fmt_dt;
use csv::Writer;
use std::path::Path;

/// One row per time entry, with the owning task repeated on each row.
pub fn write_csv(path: &Path, user: &User, details: &[TaskPayment]) -> AppResult<()> {
    let mut wtr = Writer::from_path(path)?;

    wtr.write_record([
        "user",
        "task",
        "entry_id",
        "start",
        "end",
        "duration",
        "is_paid",
        "amount_paid",
        "paid_rate",
        "added_manually",
        "deleted_at",
    ])?;

    let user_name = user.full_name();
    for detail in details {
        let task_name = detail
            .task
            .as_ref()
            .map(|t| t.name.clone())
            .unwrap_or_default();
        for entry in &detail.entries {
            wtr.write_record([
                user_name.clone(),
                task_name.clone(),
                entry.id.to_string(),
                fmt_dt(&entry.start),
                entry.end.as_ref().map(fmt_dt).unwrap_or_default(),
                entry.duration.clone().unwrap_or_default(),
                entry.is_paid.to_string(),
                entry
                    .amount_paid
                    .map(|a| format!("{a:.2}"))
                    .unwrap_or_default(),
                entry
                    .paid_rate
                    .map(|r| format!("{r:.2}"))
                    .unwrap_or_default(),
                entry.added_manually.to_string(),
                entry.deleted_at.as_ref().map(fmt_dt).unwrap_or_default(),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
