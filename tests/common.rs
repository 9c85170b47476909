#![allow(dead_code)]

use assert_cmd::Command;
use rusqlite::Connection;
use timecard::core::timesheet::{self, TimerPatch};
use timecard::db;

/// CLI under test.
pub fn timecard_cmd() -> Command {
    Command::cargo_bin("timecard").expect("binary builds")
}

/// Create a unique test DB path inside the system temp dir.
pub fn setup_test_db(name: &str) -> String {
    let mut path = std::env::temp_dir();
    path.push(format!("{name}_timecard.sqlite"));
    let db_path = path.to_string_lossy().to_string();
    std::fs::remove_file(&db_path).ok();
    db_path
}

pub struct Fixture {
    pub alice: i64,
    pub bob: i64,
    pub container: i64,
    pub board: i64,
    pub design_task: i64,
    pub login_task: i64,
}

/// In-memory workspace with two members and two tasks.
/// Alice bills at 50/h, Bob at 20/h.
pub fn setup_workspace() -> (Connection, Fixture) {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.pragma_update(None, "foreign_keys", "ON").expect("pragma");
    db::init_db(&conn).expect("schema");

    let alice = db::insert_user(&conn, "Alice", "Johnson", "alice@example.com").unwrap();
    let bob = db::insert_user(&conn, "Bob", "Smith", "bob@example.com").unwrap();
    let container = db::insert_container(&conn, "Acme Workspace").unwrap();
    db::insert_member(&conn, container, alice, true, 50.0, true).unwrap();
    db::insert_member(&conn, container, bob, true, 20.0, true).unwrap();
    let board = db::insert_board(&conn, container, "Sprint Board").unwrap();
    let design_task = db::insert_task(&conn, board, "Design homepage", 1).unwrap();
    let login_task = db::insert_task(&conn, board, "Fix login flow", 2).unwrap();

    (
        conn,
        Fixture {
            alice,
            bob,
            container,
            board,
            design_task,
            login_task,
        },
    )
}

/// Add one manual closed entry through the reconciler and return its id.
pub fn add_manual_entry(
    conn: &mut Connection,
    task_id: i64,
    user_id: i64,
    start: &str,
    end: &str,
) -> i64 {
    let patch = TimerPatch {
        user_id: Some(user_id),
        start: Some(start.to_string()),
        end: Some(end.to_string()),
        ..TimerPatch::default()
    };
    let detail = timesheet::update_timers(conn, task_id, &[patch], Some(user_id)).unwrap();
    detail
        .entries
        .iter()
        .map(|e| e.id)
        .max()
        .expect("entry created")
}

pub fn count(conn: &Connection, sql: &str) -> i64 {
    conn.query_row(sql, [], |row| row.get(0)).unwrap()
}
