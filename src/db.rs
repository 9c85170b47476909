//! SQLite persistence layer: schema, row mappers and query helpers.
//!
//! Every helper takes `&Connection`, so the same functions run inside a
//! transaction (via deref from `Transaction`) or standalone. Mutating
//! services are expected to open `BEGIN IMMEDIATE` transactions themselves;
//! see the `core` modules.

use crate::errors::{AppError, AppResult};
use crate::models::{
    Activity, Container, LogAction, LogRecord, Member, Notification, Task, TaskDetail, TimeEntry,
    User, UserDirectory,
};
use crate::utils::date::DateRange;
use crate::utils::time::{fmt_dt, now, DATETIME_FMT};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::Value;

/// Open a database connection with foreign keys enforced.
pub fn open(path: &str) -> AppResult<Connection> {
    let conn = Connection::open(path)?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// Initialize the database schema. Idempotent.
///
/// The partial unique index on open timers backstops the at-most-one-open
/// invariant even if two writers race past the application-level check.
pub fn init_db(conn: &Connection) -> AppResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            first_name  TEXT NOT NULL,
            last_name   TEXT NOT NULL,
            email       TEXT NOT NULL UNIQUE
        );

        CREATE TABLE IF NOT EXISTS containers (
            id    INTEGER PRIMARY KEY AUTOINCREMENT,
            name  TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS members (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id   INTEGER NOT NULL REFERENCES containers(id),
            user_id        INTEGER NOT NULL REFERENCES users(id),
            billable       INTEGER NOT NULL DEFAULT 0,
            billable_rate  REAL NOT NULL DEFAULT 0,
            can_timing     INTEGER NOT NULL DEFAULT 1,
            UNIQUE (container_id, user_id)
        );

        CREATE TABLE IF NOT EXISTS boards (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id  INTEGER NOT NULL REFERENCES containers(id),
            name          TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            board_id     INTEGER NOT NULL REFERENCES boards(id),
            name         TEXT NOT NULL,
            sequence_id  INTEGER NOT NULL DEFAULT 0,
            deleted_at   TEXT
        );

        CREATE TABLE IF NOT EXISTS task_members (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id        INTEGER NOT NULL REFERENCES tasks(id),
            user_id        INTEGER NOT NULL REFERENCES users(id),
            can_timing     INTEGER NOT NULL DEFAULT 1,
            billable       INTEGER NOT NULL DEFAULT 0,
            billable_rate  REAL NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS time_entries (
            id                 INTEGER PRIMARY KEY AUTOINCREMENT,
            task_id            INTEGER NOT NULL REFERENCES tasks(id),
            user_id            INTEGER NOT NULL REFERENCES users(id),
            container_id       INTEGER NOT NULL REFERENCES containers(id),
            member_id          INTEGER,
            "start"            TEXT NOT NULL,       -- YYYY-MM-DD HH:MM:SS
            "end"              TEXT,                -- NULL while running
            billable           INTEGER NOT NULL DEFAULT 0,
            billable_rate      REAL NOT NULL DEFAULT 0,
            added_manually     INTEGER NOT NULL DEFAULT 0,
            stopped_by_system  INTEGER NOT NULL DEFAULT 0,
            is_paid            INTEGER NOT NULL DEFAULT 0,
            amount_paid        REAL,
            paid_rate          REAL,
            created_at         TEXT NOT NULL,
            updated_at         TEXT NOT NULL,
            deleted_at         TEXT
        );

        CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_open
            ON time_entries(task_id, user_id)
            WHERE "end" IS NULL AND deleted_at IS NULL;

        CREATE INDEX IF NOT EXISTS idx_time_entries_container_user
            ON time_entries(container_id, user_id);

        CREATE TABLE IF NOT EXISTS logs (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            loggable_type  TEXT NOT NULL,
            loggable_id    INTEGER NOT NULL,
            user_id        INTEGER,
            action         TEXT NOT NULL CHECK (action IN ('create','update','delete')),
            old_data       TEXT,
            new_data       TEXT,
            task_id        INTEGER NOT NULL,
            container_id   INTEGER NOT NULL,
            created_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_logs_task ON logs(task_id);

        CREATE TABLE IF NOT EXISTS activities (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id  INTEGER NOT NULL REFERENCES containers(id),
            user_id       INTEGER,
            subject_type  TEXT NOT NULL,
            subject_id    INTEGER NOT NULL,
            event         TEXT NOT NULL,
            properties    TEXT,
            created_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_activities_subject
            ON activities(subject_type, subject_id);

        CREATE TABLE IF NOT EXISTS payments (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            container_id  INTEGER NOT NULL REFERENCES containers(id),
            user_id       INTEGER NOT NULL REFERENCES users(id),
            amount        REAL NOT NULL,
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS notifications (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id         INTEGER NOT NULL REFERENCES users(id),
            title           TEXT NOT NULL,
            content         TEXT NOT NULL,
            type            TEXT NOT NULL,
            data            TEXT,
            is_seen         INTEGER NOT NULL DEFAULT 0,
            reference_id    INTEGER NOT NULL,
            reference_type  TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );
        "#,
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping helpers
// ---------------------------------------------------------------------------

fn bad_text(idx: usize, err: impl std::error::Error + Send + Sync + 'static) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
}

fn dt_col(row: &Row, name: &str) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(name)?;
    NaiveDateTime::parse_from_str(&raw, DATETIME_FMT).map_err(|e| bad_text(0, e))
}

fn opt_dt_col(row: &Row, name: &str) -> rusqlite::Result<Option<NaiveDateTime>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|s| NaiveDateTime::parse_from_str(&s, DATETIME_FMT).map_err(|e| bad_text(0, e)))
        .transpose()
}

fn json_col(row: &Row, name: &str) -> rusqlite::Result<Option<Value>> {
    let raw: Option<String> = row.get(name)?;
    raw.map(|s| serde_json::from_str(&s).map_err(|e| bad_text(0, e)))
        .transpose()
}

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        last_name: row.get("last_name")?,
        email: row.get("email")?,
    })
}

fn row_to_member(row: &Row) -> rusqlite::Result<Member> {
    Ok(Member {
        id: row.get("id")?,
        container_id: row.get("container_id")?,
        user_id: row.get("user_id")?,
        billable: row.get("billable")?,
        billable_rate: row.get("billable_rate")?,
        can_timing: row.get("can_timing")?,
    })
}

fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row.get("id")?,
        board_id: row.get("board_id")?,
        name: row.get("name")?,
        sequence_id: row.get("sequence_id")?,
        deleted_at: opt_dt_col(row, "deleted_at")?,
    })
}

fn row_to_entry(row: &Row) -> rusqlite::Result<TimeEntry> {
    Ok(TimeEntry {
        id: row.get("id")?,
        task_id: row.get("task_id")?,
        user_id: row.get("user_id")?,
        container_id: row.get("container_id")?,
        member_id: row.get("member_id")?,
        start: dt_col(row, "start")?,
        end: opt_dt_col(row, "end")?,
        billable: row.get("billable")?,
        billable_rate: row.get("billable_rate")?,
        added_manually: row.get("added_manually")?,
        stopped_by_system: row.get("stopped_by_system")?,
        is_paid: row.get("is_paid")?,
        amount_paid: row.get("amount_paid")?,
        paid_rate: row.get("paid_rate")?,
        created_at: dt_col(row, "created_at")?,
        updated_at: dt_col(row, "updated_at")?,
        deleted_at: opt_dt_col(row, "deleted_at")?,
    })
}

fn row_to_log(row: &Row) -> rusqlite::Result<LogRecord> {
    let action_raw: String = row.get("action")?;
    let action = LogAction::from_db_str(&action_raw).ok_or_else(|| {
        bad_text(
            0,
            std::io::Error::other(format!("unknown log action '{action_raw}'")),
        )
    })?;
    Ok(LogRecord {
        id: row.get("id")?,
        loggable_type: row.get("loggable_type")?,
        loggable_id: row.get("loggable_id")?,
        user_id: row.get("user_id")?,
        action,
        old_data: json_col(row, "old_data")?,
        new_data: json_col(row, "new_data")?,
        task_id: row.get("task_id")?,
        container_id: row.get("container_id")?,
        created_at: dt_col(row, "created_at")?,
    })
}

fn row_to_activity(row: &Row) -> rusqlite::Result<Activity> {
    Ok(Activity {
        id: row.get("id")?,
        container_id: row.get("container_id")?,
        user_id: row.get("user_id")?,
        subject_type: row.get("subject_type")?,
        subject_id: row.get("subject_id")?,
        event: row.get("event")?,
        properties: json_col(row, "properties")?,
        created_at: dt_col(row, "created_at")?,
    })
}

const ENTRY_COLUMNS: &str = r#"id, task_id, user_id, container_id, member_id, "start", "end",
    billable, billable_rate, added_manually, stopped_by_system, is_paid,
    amount_paid, paid_rate, created_at, updated_at, deleted_at"#;

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

pub fn insert_user(conn: &Connection, first: &str, last: &str, email: &str) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO users (first_name, last_name, email) VALUES (?1, ?2, ?3)",
        params![first, last, email],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_user(conn: &Connection, id: i64) -> AppResult<Option<User>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, first_name, last_name, email FROM users WHERE id = ?1",
    )?;
    Ok(stmt.query_row([id], row_to_user).optional()?)
}

pub fn user_directory(conn: &Connection) -> AppResult<UserDirectory> {
    let mut stmt = conn.prepare_cached("SELECT id, first_name, last_name, email FROM users")?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(UserDirectory::new(&users))
}

// ---------------------------------------------------------------------------
// Containers, members, boards
// ---------------------------------------------------------------------------

pub fn insert_container(conn: &Connection, name: &str) -> AppResult<i64> {
    conn.execute("INSERT INTO containers (name) VALUES (?1)", params![name])?;
    Ok(conn.last_insert_rowid())
}

pub fn get_container(conn: &Connection, id: i64) -> AppResult<Container> {
    let mut stmt = conn.prepare_cached("SELECT id, name FROM containers WHERE id = ?1")?;
    stmt.query_row([id], |row| {
        Ok(Container {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    })
    .optional()?
    .ok_or_else(|| AppError::not_found("container", id))
}

pub fn insert_member(
    conn: &Connection,
    container_id: i64,
    user_id: i64,
    billable: bool,
    billable_rate: f64,
    can_timing: bool,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO members (container_id, user_id, billable, billable_rate, can_timing)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![container_id, user_id, billable, billable_rate, can_timing],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Container member record for a user; billing snapshots are resolved from
/// this row at write time, never cached from the task.
pub fn find_container_member(
    conn: &Connection,
    container_id: i64,
    user_id: i64,
) -> AppResult<Option<Member>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, container_id, user_id, billable, billable_rate, can_timing
         FROM members
         WHERE container_id = ?1 AND user_id = ?2",
    )?;
    Ok(stmt
        .query_row(params![container_id, user_id], row_to_member)
        .optional()?)
}

pub fn insert_board(conn: &Connection, container_id: i64, name: &str) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO boards (container_id, name) VALUES (?1, ?2)",
        params![container_id, name],
    )?;
    Ok(conn.last_insert_rowid())
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

pub fn insert_task(conn: &Connection, board_id: i64, name: &str, sequence_id: i64) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO tasks (board_id, name, sequence_id) VALUES (?1, ?2, ?3)",
        params![board_id, name, sequence_id],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Fetch a live (non-deleted) task, or NotFound.
pub fn get_task(conn: &Connection, id: i64) -> AppResult<Task> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, board_id, name, sequence_id, deleted_at
         FROM tasks WHERE id = ?1 AND deleted_at IS NULL",
    )?;
    stmt.query_row([id], row_to_task)
        .optional()?
        .ok_or_else(|| AppError::not_found("task", id))
}

/// Fetch a task including soft-deleted ones; payment listings keep showing
/// entries of removed tasks.
pub fn get_task_any(conn: &Connection, id: i64) -> AppResult<Option<Task>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, board_id, name, sequence_id, deleted_at FROM tasks WHERE id = ?1",
    )?;
    Ok(stmt.query_row([id], row_to_task).optional()?)
}

/// Container owning a task, resolved through its board.
pub fn task_container_id(conn: &Connection, task_id: i64) -> AppResult<i64> {
    let mut stmt = conn.prepare_cached(
        "SELECT b.container_id FROM tasks t JOIN boards b ON b.id = t.board_id WHERE t.id = ?1",
    )?;
    stmt.query_row([task_id], |row| row.get::<_, i64>(0))
        .optional()?
        .ok_or_else(|| AppError::not_found("task", task_id))
}

/// Task plus its live time entries, the return shape of every mutating call.
pub fn task_detail(conn: &Connection, task_id: i64) -> AppResult<TaskDetail> {
    let task = get_task(conn, task_id)?;
    let entries = list_entries_for_task(conn, task_id)?;
    Ok(TaskDetail { task, entries })
}

// ---------------------------------------------------------------------------
// Task members
// ---------------------------------------------------------------------------

pub fn task_member_user_ids(conn: &Connection, task_id: i64) -> AppResult<Vec<i64>> {
    let mut stmt =
        conn.prepare_cached("SELECT user_id FROM task_members WHERE task_id = ?1")?;
    let ids = stmt
        .query_map([task_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(ids)
}

pub fn insert_task_member(conn: &Connection, task_id: i64, member: &Member) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO task_members (task_id, user_id, can_timing, billable, billable_rate)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            task_id,
            member.user_id,
            member.can_timing,
            member.billable,
            member.billable_rate
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn delete_task_members(conn: &Connection, task_id: i64, user_id: i64) -> AppResult<usize> {
    let deleted = conn.execute(
        "DELETE FROM task_members WHERE task_id = ?1 AND user_id = ?2",
        params![task_id, user_id],
    )?;
    Ok(deleted)
}

// ---------------------------------------------------------------------------
// Time entries
// ---------------------------------------------------------------------------

pub struct NewTimeEntry {
    pub task_id: i64,
    pub user_id: i64,
    pub container_id: i64,
    pub member_id: Option<i64>,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub billable: bool,
    pub billable_rate: f64,
    pub added_manually: bool,
}

pub fn insert_entry(conn: &Connection, new: &NewTimeEntry) -> AppResult<TimeEntry> {
    let stamp = fmt_dt(&now());
    conn.execute(
        r#"INSERT INTO time_entries
            (task_id, user_id, container_id, member_id, "start", "end",
             billable, billable_rate, added_manually, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)"#,
        params![
            new.task_id,
            new.user_id,
            new.container_id,
            new.member_id,
            fmt_dt(&new.start),
            new.end.as_ref().map(fmt_dt),
            new.billable,
            new.billable_rate,
            new.added_manually,
            stamp,
        ],
    )?;
    let id = conn.last_insert_rowid();
    get_entry_any(conn, id)?.ok_or_else(|| AppError::not_found("time entry", id))
}

/// Live (non-deleted) entry by id.
pub fn get_entry(conn: &Connection, id: i64) -> AppResult<Option<TimeEntry>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?1 AND deleted_at IS NULL"
    ))?;
    Ok(stmt.query_row([id], row_to_entry).optional()?)
}

pub fn get_entry_any(conn: &Connection, id: i64) -> AppResult<Option<TimeEntry>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {ENTRY_COLUMNS} FROM time_entries WHERE id = ?1"
    ))?;
    Ok(stmt.query_row([id], row_to_entry).optional()?)
}

/// The running timer for a (task, user) pair, if any.
pub fn find_open_entry(
    conn: &Connection,
    task_id: i64,
    user_id: i64,
) -> AppResult<Option<TimeEntry>> {
    let mut stmt = conn.prepare_cached(&format!(
        r#"SELECT {ENTRY_COLUMNS} FROM time_entries
           WHERE task_id = ?1 AND user_id = ?2 AND "end" IS NULL AND deleted_at IS NULL"#
    ))?;
    Ok(stmt
        .query_row(params![task_id, user_id], row_to_entry)
        .optional()?)
}

pub fn close_entry(
    conn: &Connection,
    id: i64,
    end: NaiveDateTime,
    stopped_by_system: bool,
) -> AppResult<()> {
    conn.execute(
        r#"UPDATE time_entries
           SET "end" = ?1, stopped_by_system = ?2, updated_at = ?3
           WHERE id = ?4"#,
        params![fmt_dt(&end), stopped_by_system, fmt_dt(&now()), id],
    )?;
    Ok(())
}

pub fn update_entry_times(
    conn: &Connection,
    id: i64,
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
) -> AppResult<()> {
    conn.execute(
        r#"UPDATE time_entries
           SET "start" = ?1, "end" = ?2, updated_at = ?3
           WHERE id = ?4"#,
        params![fmt_dt(&start), end.as_ref().map(fmt_dt), fmt_dt(&now()), id],
    )?;
    Ok(())
}

/// Soft-delete; returns false when the row was already gone.
pub fn soft_delete_entry(conn: &Connection, id: i64) -> AppResult<bool> {
    let stamp = fmt_dt(&now());
    let changed = conn.execute(
        "UPDATE time_entries SET deleted_at = ?1, updated_at = ?1
         WHERE id = ?2 AND deleted_at IS NULL",
        params![stamp, id],
    )?;
    Ok(changed > 0)
}

pub fn mark_entry_paid(
    conn: &Connection,
    id: i64,
    amount_paid: f64,
    paid_rate: f64,
) -> AppResult<()> {
    conn.execute(
        "UPDATE time_entries
         SET is_paid = 1, amount_paid = ?1, paid_rate = ?2, updated_at = ?3
         WHERE id = ?4",
        params![amount_paid, paid_rate, fmt_dt(&now()), id],
    )?;
    Ok(())
}

/// Live entries of a task, oldest first.
pub fn list_entries_for_task(conn: &Connection, task_id: i64) -> AppResult<Vec<TimeEntry>> {
    let mut stmt = conn.prepare_cached(&format!(
        r#"SELECT {ENTRY_COLUMNS} FROM time_entries
           WHERE task_id = ?1 AND deleted_at IS NULL
           ORDER BY "start" ASC, id ASC"#
    ))?;
    let entries = stmt
        .query_map([task_id], row_to_entry)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(entries)
}

pub struct EntryFilter {
    pub container_id: i64,
    pub user_id: i64,
    pub range: Option<DateRange>,
    /// None = all, Some(true) = paid only, Some(false) = pending only.
    pub paid: Option<bool>,
}

/// Entries of one user in a container for payment aggregation. Soft-deleted
/// rows are included; the aggregator keeps them in listings and skips them
/// in sums.
pub fn list_container_entries(conn: &Connection, filter: &EntryFilter) -> AppResult<Vec<TimeEntry>> {
    let mut sql = format!(
        r#"SELECT {ENTRY_COLUMNS} FROM time_entries
           WHERE container_id = ?1 AND user_id = ?2"#
    );
    let mut owned: Vec<String> = Vec::new();
    if let Some(range) = &filter.range {
        sql.push_str(r#" AND "start" >= ?3 AND "end" <= ?4"#);
        owned.push(fmt_dt(&range.start));
        owned.push(fmt_dt(&range.end));
    }
    if let Some(paid) = filter.paid {
        sql.push_str(&format!(" AND is_paid = {}", if paid { 1 } else { 0 }));
    }
    sql.push_str(r#" ORDER BY "start" ASC, id ASC"#);

    let mut stmt = conn.prepare(&sql)?;
    let entries = match owned.as_slice() {
        [start, end] => stmt
            .query_map(
                params![filter.container_id, filter.user_id, start, end],
                row_to_entry,
            )?
            .collect::<rusqlite::Result<Vec<_>>>()?,
        _ => stmt
            .query_map(params![filter.container_id, filter.user_id], row_to_entry)?
            .collect::<rusqlite::Result<Vec<_>>>()?,
    };
    Ok(entries)
}

// ---------------------------------------------------------------------------
// Audit logs
// ---------------------------------------------------------------------------

pub struct NewLog<'a> {
    pub loggable_type: &'a str,
    pub loggable_id: i64,
    pub user_id: Option<i64>,
    pub action: LogAction,
    pub old_data: Option<&'a Value>,
    pub new_data: Option<&'a Value>,
    pub task_id: i64,
    pub container_id: i64,
}

pub fn insert_log(conn: &Connection, log: &NewLog) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO logs
            (loggable_type, loggable_id, user_id, action, old_data, new_data,
             task_id, container_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            log.loggable_type,
            log.loggable_id,
            log.user_id,
            log.action.as_str(),
            log.old_data.map(|v| v.to_string()),
            log.new_data.map(|v| v.to_string()),
            log.task_id,
            log.container_id,
            fmt_dt(&now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Time-entry audit trail of one task, restricted to entries owned by the
/// given user, newest first.
pub fn list_entry_logs_for_task(
    conn: &Connection,
    task_id: i64,
    user_id: i64,
) -> AppResult<Vec<LogRecord>> {
    let mut stmt = conn.prepare_cached(
        "SELECT l.id, l.loggable_type, l.loggable_id, l.user_id, l.action,
                l.old_data, l.new_data, l.task_id, l.container_id, l.created_at
         FROM logs l
         JOIN time_entries te ON te.id = l.loggable_id
         WHERE l.loggable_type = 'time_entry' AND l.task_id = ?1 AND te.user_id = ?2
         ORDER BY l.created_at DESC, l.id DESC",
    )?;
    let logs = stmt
        .query_map(params![task_id, user_id], row_to_log)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(logs)
}

pub fn list_logs(conn: &Connection, task_id: Option<i64>) -> AppResult<Vec<LogRecord>> {
    let base = "SELECT id, loggable_type, loggable_id, user_id, action, old_data,
                       new_data, task_id, container_id, created_at
                FROM logs";
    let logs = match task_id {
        Some(task_id) => {
            let mut stmt =
                conn.prepare(&format!("{base} WHERE task_id = ?1 ORDER BY id ASC"))?;
            stmt.query_map([task_id], row_to_log)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
        None => {
            let mut stmt = conn.prepare(&format!("{base} ORDER BY id ASC"))?;
            stmt.query_map([], row_to_log)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        }
    };
    Ok(logs)
}

// ---------------------------------------------------------------------------
// Activities
// ---------------------------------------------------------------------------

pub fn insert_activity(
    conn: &Connection,
    container_id: i64,
    user_id: Option<i64>,
    subject_type: &str,
    subject_id: i64,
    event: &str,
    properties: &Value,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO activities
            (container_id, user_id, subject_type, subject_id, event, properties, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            container_id,
            user_id,
            subject_type,
            subject_id,
            event,
            properties.to_string(),
            fmt_dt(&now()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_activities(
    conn: &Connection,
    container_id: i64,
    limit: usize,
    offset: usize,
) -> AppResult<Vec<Activity>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, container_id, user_id, subject_type, subject_id, event,
                properties, created_at
         FROM activities
         WHERE container_id = ?1
         ORDER BY created_at DESC, id DESC
         LIMIT ?2 OFFSET ?3",
    )?;
    let activities = stmt
        .query_map(
            params![container_id, limit as i64, offset as i64],
            row_to_activity,
        )?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(activities)
}

pub fn count_activities(conn: &Connection, container_id: i64) -> AppResult<i64> {
    let mut stmt =
        conn.prepare_cached("SELECT COUNT(*) FROM activities WHERE container_id = ?1")?;
    let count = stmt.query_row([container_id], |row| row.get(0))?;
    Ok(count)
}

// ---------------------------------------------------------------------------
// Payments and notifications
// ---------------------------------------------------------------------------

pub fn insert_payment(
    conn: &Connection,
    container_id: i64,
    user_id: i64,
    amount: f64,
) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO payments (container_id, user_id, amount, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![container_id, user_id, amount, fmt_dt(&now())],
    )?;
    Ok(conn.last_insert_rowid())
}

pub struct NewNotification<'a> {
    pub user_id: i64,
    pub title: &'a str,
    pub content: &'a str,
    pub kind: &'a str,
    pub data: Option<&'a Value>,
    pub reference_id: i64,
    pub reference_type: &'a str,
}

pub fn insert_notification(conn: &Connection, new: &NewNotification) -> AppResult<Notification> {
    let created_at = now();
    conn.execute(
        "INSERT INTO notifications
            (user_id, title, content, type, data, is_seen, reference_id,
             reference_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7, ?8)",
        params![
            new.user_id,
            new.title,
            new.content,
            new.kind,
            new.data.map(|v| v.to_string()),
            new.reference_id,
            new.reference_type,
            fmt_dt(&created_at),
        ],
    )?;
    Ok(Notification {
        id: conn.last_insert_rowid(),
        user_id: new.user_id,
        title: new.title.to_string(),
        content: new.content.to_string(),
        kind: new.kind.to_string(),
        data: new.data.cloned(),
        is_seen: false,
        reference_id: new.reference_id,
        reference_type: new.reference_type.to_string(),
        created_at,
    })
}
