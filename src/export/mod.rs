//! Export of payment details to CSV or JSON files.

mod csv;
mod json;

use crate::core::payments::{PaymentFilter, TaskPayment};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::utils::date::DateRange;
use rusqlite::Connection;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl FromStr for ExportFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            other => Err(AppError::InvalidExportFormat(other.to_string())),
        }
    }
}

fn ensure_writable(path: &Path, force: bool) -> AppResult<()> {
    if path.exists() && !force {
        return Err(AppError::Export(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(AppError::Export(format!(
                "directory {} does not exist",
                parent.display()
            )));
        }
    }
    Ok(())
}

/// Export a user's per-task payment breakdown.
pub fn export_payment_details(
    conn: &Connection,
    container_id: i64,
    user_id: i64,
    range: Option<&DateRange>,
    filter: PaymentFilter,
    format: ExportFormat,
    file: &str,
    force: bool,
) -> AppResult<usize> {
    let path = Path::new(file);
    ensure_writable(path, force)?;

    let details: Vec<TaskPayment> =
        crate::core::payments::payment_details(conn, container_id, user_id, range, filter)?;
    let user = db::get_user(conn, user_id)?
        .ok_or_else(|| AppError::not_found("user", user_id))?;

    match format {
        ExportFormat::Csv => csv::write_csv(path, &user, &details)?,
        ExportFormat::Json => json::write_json(path, &details)?,
    }

    Ok(details.len())
}
