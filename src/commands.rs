//! CLI command handlers: thin glue between the parsed arguments and the
//! core services, with table/ANSI presentation.

use crate::cli::Cli;
use crate::config::Config;
use crate::core::payments::{self, PaymentFilter};
use crate::core::timer::{self, TimerToggle};
use crate::core::{activity, members, timesheet};
use crate::db;
use crate::errors::{AppError, AppResult};
use crate::export::{self, ExportFormat};
use crate::models::{LogAction, TaskDetail};
use crate::ui::messages::{info, success, warning};
use crate::utils::date::{parse_date_range, DateRange};
use crate::utils::table::Table;
use crate::utils::time::fmt_dt;
use ansi_term::Colour;
use regex::Regex;
use rusqlite::Connection;
use std::fs;

fn open_db(cli: &Cli, cfg: &Config) -> AppResult<Connection> {
    let path = cli.db.clone().unwrap_or_else(|| cfg.database.clone());
    db::open(&path)
}

fn parse_range_arg(range: &Option<String>) -> AppResult<Option<DateRange>> {
    range.as_deref().map(parse_date_range).transpose()
}

fn parse_status_arg(status: &Option<String>, cfg: &Config) -> AppResult<PaymentFilter> {
    status
        .as_deref()
        .unwrap_or(&cfg.default_payment_status)
        .parse()
}

fn print_entries(detail: &TaskDetail) {
    if detail.entries.is_empty() {
        info("No time entries on this task.");
        return;
    }
    let mut table = Table::new(&["Id", "User", "Start", "End", "Duration", "Billable", "Rate"]);
    for entry in &detail.entries {
        table.add_row(vec![
            entry.id.to_string(),
            entry.user_id.to_string(),
            fmt_dt(&entry.start),
            entry.end.as_ref().map(fmt_dt).unwrap_or_else(|| "-".into()),
            if entry.end.is_some() {
                crate::utils::time::format_duration(entry.tracked_time())
            } else {
                "running".into()
            },
            entry.billable.to_string(),
            format!("{:.2}", entry.billable_rate),
        ]);
    }
    print!("{}", table.render());
}

pub fn handle_init(cli: &Cli) -> AppResult<()> {
    let db_path = Config::init_all(cli.db.clone(), cli.test)?;
    let conn = db::open(&db_path.to_string_lossy())?;
    db::init_db(&conn)?;
    if !cli.test {
        success(format!("Config file: {:?}", Config::config_file()));
    }
    success(format!("Database:    {:?}", db_path));
    Ok(())
}

/// Create a small demo workspace so every other command has data to act on.
pub fn handle_seed(cli: &Cli, cfg: &Config) -> AppResult<()> {
    let mut conn = open_db(cli, cfg)?;
    db::init_db(&conn)?;

    let alice = db::insert_user(&conn, "Alice", "Johnson", "alice@example.com")?;
    let bob = db::insert_user(&conn, "Bob", "Smith", "bob@example.com")?;
    let container = db::insert_container(&conn, "Acme Workspace")?;
    db::insert_member(&conn, container, alice, true, 50.0, true)?;
    db::insert_member(&conn, container, bob, true, 20.0, true)?;
    let board = db::insert_board(&conn, container, "Sprint Board")?;
    let design = db::insert_task(&conn, board, "Design homepage", 1)?;
    let login = db::insert_task(&conn, board, "Fix login flow", 2)?;

    members::sync_members(&mut conn, design, &[alice, bob], cli.actor)?;
    members::sync_members(&mut conn, login, &[bob], cli.actor)?;

    let mut table = Table::new(&["Entity", "Id", "Name"]);
    table.add_row(vec!["user".into(), alice.to_string(), "Alice Johnson".into()]);
    table.add_row(vec!["user".into(), bob.to_string(), "Bob Smith".into()]);
    table.add_row(vec!["container".into(), container.to_string(), "Acme Workspace".into()]);
    table.add_row(vec!["board".into(), board.to_string(), "Sprint Board".into()]);
    table.add_row(vec!["task".into(), design.to_string(), "Design homepage".into()]);
    table.add_row(vec!["task".into(), login.to_string(), "Fix login flow".into()]);
    print!("{}", table.render());

    success("Demo workspace created.");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_timer(
    cli: &Cli,
    cfg: &Config,
    task_id: i64,
    user_id: i64,
    billable: bool,
    rate: f64,
    system_stop: bool,
) -> AppResult<()> {
    let mut conn = open_db(cli, cfg)?;
    let input = TimerToggle {
        user_id,
        billable,
        billable_rate: rate,
        stopped_by_system: system_stop,
    };
    let detail = timer::toggle_timer(&mut conn, task_id, &input, cli.actor)?;

    let running = detail
        .entries
        .iter()
        .any(|e| e.user_id == user_id && e.end.is_none());
    if running {
        success(format!("Timer started on '{}'.", detail.task.name));
    } else {
        success(format!("No timer running on '{}'.", detail.task.name));
    }
    print_entries(&detail);
    Ok(())
}

pub fn handle_timers(
    cli: &Cli,
    cfg: &Config,
    task_id: i64,
    file: &Option<String>,
    json: &Option<String>,
) -> AppResult<()> {
    let raw = match (file, json) {
        (Some(path), _) => fs::read_to_string(path)?,
        (None, Some(inline)) => inline.clone(),
        (None, None) => {
            return Err(AppError::Validation(
                "provide the patch array via --file or --json".into(),
            ));
        }
    };
    let patches = timesheet::parse_patches(&raw)?;

    let mut conn = open_db(cli, cfg)?;
    let detail = timesheet::update_timers(&mut conn, task_id, &patches, cli.actor)?;

    success(format!(
        "Applied {} patch(es) to '{}'.",
        patches.len(),
        detail.task.name
    ));
    print_entries(&detail);
    Ok(())
}

pub fn handle_members(
    cli: &Cli,
    cfg: &Config,
    task_id: i64,
    remove: &Option<i64>,
    set: &Option<Vec<i64>>,
) -> AppResult<()> {
    let mut conn = open_db(cli, cfg)?;

    let detail = match (remove, set) {
        (Some(user_id), _) => {
            let detail = members::unassign_member(&mut conn, task_id, *user_id, cli.actor)?;
            success(format!("Removed user {user_id} from '{}'.", detail.task.name));
            detail
        }
        (None, Some(ids)) => {
            let detail = members::sync_members(&mut conn, task_id, ids, cli.actor)?;
            success(format!(
                "'{}' is now assigned to {} member(s).",
                detail.task.name,
                ids.len()
            ));
            detail
        }
        (None, None) => {
            warning("Nothing to do: pass --remove or --set.");
            return Ok(());
        }
    };
    print_entries(&detail);
    Ok(())
}

pub fn handle_activities(
    cli: &Cli,
    cfg: &Config,
    container_id: i64,
    page: usize,
) -> AppResult<()> {
    let conn = open_db(cli, cfg)?;
    let feed =
        activity::container_activities(&conn, container_id, page, cfg.activities_per_page)?;

    if feed.activities.is_empty() {
        info("No activity on this page.");
        return Ok(());
    }
    for item in &feed.activities {
        println!("{:>5}: {} ({})", item.id, item.description, item.created_at_human);
    }
    if feed.has_more {
        info(format!(
            "{} total; use --page {} for more.",
            feed.total, feed.next_page
        ));
    }
    Ok(())
}

pub fn handle_payments(
    cli: &Cli,
    cfg: &Config,
    container_id: i64,
    user_id: i64,
    range: &Option<String>,
    status: &Option<String>,
) -> AppResult<()> {
    let conn = open_db(cli, cfg)?;
    let range = parse_range_arg(range)?;
    let filter = parse_status_arg(status, cfg)?;
    let details =
        payments::payment_details(&conn, container_id, user_id, range.as_ref(), filter)?;

    if details.is_empty() {
        info("No completed time entries match the filter.");
        return Ok(());
    }

    for detail in &details {
        let task_name = detail
            .task
            .as_ref()
            .map(|t| {
                if t.deleted_at.is_some() {
                    format!("{} (deleted)", t.name)
                } else {
                    t.name.clone()
                }
            })
            .unwrap_or_else(|| "(unknown task)".into());
        println!(
            "\n{}  tracked {}  paid {:.2}  pending {:.2}",
            Colour::Blue.bold().paint(task_name),
            detail.tracked_time_display,
            detail.paid_amount,
            detail.pending_amount
        );

        let mut table = Table::new(&["Id", "Start", "End", "Duration", "Paid", "Amount", "Deleted"]);
        for entry in &detail.entries {
            table.add_row(vec![
                entry.id.to_string(),
                fmt_dt(&entry.start),
                entry.end.as_ref().map(fmt_dt).unwrap_or_else(|| "-".into()),
                entry.duration.clone().unwrap_or_else(|| "-".into()),
                entry.is_paid.to_string(),
                entry
                    .amount_paid
                    .map(|a| format!("{a:.2}"))
                    .unwrap_or_else(|| "-".into()),
                entry.deleted_at.as_ref().map(fmt_dt).unwrap_or_default(),
            ]);
        }
        print!("{}", table.render());
    }
    Ok(())
}

pub fn handle_pay(
    cli: &Cli,
    cfg: &Config,
    container_id: i64,
    user_id: i64,
    range: &Option<String>,
) -> AppResult<()> {
    let mut conn = open_db(cli, cfg)?;
    let range = parse_range_arg(range)?;
    let receipt =
        payments::process_payment(&mut conn, container_id, user_id, range.as_ref(), cli.actor)?;

    match receipt.payment_id {
        Some(id) => {
            success(format!(
                "Payment {} processed: {:.2} across {} entries.",
                id, receipt.amount, receipt.entries_paid
            ));
            if let Some(payload) = &receipt.notification {
                println!("{}", serde_json::to_string_pretty(payload)?);
            }
        }
        None => info("No pending entries to pay."),
    }
    Ok(())
}

fn action_colour(action: LogAction) -> Colour {
    match action {
        LogAction::Create => Colour::Green,
        LogAction::Update => Colour::Yellow,
        LogAction::Delete => Colour::Red,
    }
}

fn strip_ansi(s: &str) -> String {
    let re = Regex::new(r"\x1B\[[0-9;]*[mK]").unwrap();
    re.replace_all(s, "").into_owned()
}

pub fn handle_log(cli: &Cli, cfg: &Config, task: &Option<i64>) -> AppResult<()> {
    let conn = open_db(cli, cfg)?;
    let logs = db::list_logs(&conn, *task)?;

    if logs.is_empty() {
        info("Audit log is empty.");
        return Ok(());
    }

    println!("📜 Audit log:\n");
    for log in &logs {
        let colored = action_colour(log.action)
            .paint(log.action.as_str())
            .to_string();
        let padding = " ".repeat(7usize.saturating_sub(strip_ansi(&colored).len()));

        let data = log
            .new_data
            .as_ref()
            .or(log.old_data.as_ref())
            .map(|v| v.to_string())
            .unwrap_or_default();
        let summary: String = if data.len() > 60 {
            let mut s = data.chars().take(57).collect::<String>();
            s.push_str("...");
            s
        } else {
            data
        };

        println!(
            "{:>4}: {} | {}{} {}#{} => {}",
            log.id,
            fmt_dt(&log.created_at),
            colored,
            padding,
            log.loggable_type,
            log.loggable_id,
            summary
        );
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_export(
    cli: &Cli,
    cfg: &Config,
    container_id: i64,
    user_id: i64,
    format: &str,
    file: &str,
    range: &Option<String>,
    status: &Option<String>,
    force: bool,
) -> AppResult<()> {
    let conn = open_db(cli, cfg)?;
    let range = parse_range_arg(range)?;
    let filter = parse_status_arg(status, cfg)?;
    let format: ExportFormat = format.parse()?;

    let groups = export::export_payment_details(
        &conn,
        container_id,
        user_id,
        range.as_ref(),
        filter,
        format,
        file,
        force,
    )?;

    success(format!("Exported {groups} task group(s) to {file}."));
    Ok(())
}
