mod common;

use common::{add_manual_entry, setup_workspace};
use timecard::core::activity::container_activities;
use timecard::core::members::{sync_members, unassign_member};
use timecard::core::timer::{toggle_timer, TimerToggle};
use timecard::errors::AppError;

#[test]
fn feed_renders_member_and_timer_events() {
    let (mut conn, fx) = setup_workspace();

    sync_members(&mut conn, fx.design_task, &[fx.alice, fx.bob], Some(fx.alice)).unwrap();
    add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 09:00:00",
        "2025-06-02 10:00:00",
    );

    let feed = container_activities(&conn, fx.container, 1, 15).unwrap();
    let descriptions: Vec<&str> = feed
        .activities
        .iter()
        .map(|a| a.description.as_str())
        .collect();

    assert!(descriptions
        .iter()
        .any(|d| d.contains("added Bob Smith to Task #1")));
    assert!(descriptions
        .iter()
        .any(|d| *d == "Bob Smith tracked manually 01:00:00 on Task #1"));
    assert!(!feed.has_more);
    assert_eq!(feed.total, 3);
}

#[test]
fn unassign_renders_removed_member() {
    let (mut conn, fx) = setup_workspace();

    sync_members(&mut conn, fx.login_task, &[fx.bob], Some(fx.alice)).unwrap();
    unassign_member(&mut conn, fx.login_task, fx.bob, Some(fx.alice)).unwrap();

    let feed = container_activities(&conn, fx.container, 1, 15).unwrap();
    assert!(feed
        .activities
        .iter()
        .any(|a| a.description == "Alice Johnson removed Bob Smith from Task #2"));
}

#[test]
fn feed_pages_newest_first() {
    let (mut conn, fx) = setup_workspace();

    for hour in 9..12 {
        let start = format!("2025-06-02 {hour:02}:00:00");
        let end = format!("2025-06-02 {hour:02}:30:00");
        add_manual_entry(&mut conn, fx.design_task, fx.bob, &start, &end);
    }

    let first = container_activities(&conn, fx.container, 1, 2).unwrap();
    assert_eq!(first.activities.len(), 2);
    assert!(first.has_more);
    assert_eq!(first.next_page, 2);
    assert_eq!(first.total, 3);

    let second = container_activities(&conn, fx.container, 2, 2).unwrap();
    assert_eq!(second.activities.len(), 1);
    assert!(!second.has_more);

    // Newest activity leads the first page.
    assert!(first.activities[0].id > second.activities[0].id);
}

#[test]
fn system_actor_renders_without_a_name() {
    let (mut conn, fx) = setup_workspace();

    // Start and system-stop with no acting user.
    toggle_timer(
        &mut conn,
        fx.design_task,
        &TimerToggle {
            user_id: fx.bob,
            billable: false,
            billable_rate: 0.0,
            stopped_by_system: false,
        },
        None,
    )
    .unwrap();
    toggle_timer(
        &mut conn,
        fx.design_task,
        &TimerToggle {
            user_id: fx.bob,
            billable: false,
            billable_rate: 0.0,
            stopped_by_system: true,
        },
        None,
    )
    .unwrap();

    let feed = container_activities(&conn, fx.container, 1, 15).unwrap();
    let completed = feed
        .activities
        .iter()
        .find(|a| a.event == "time_entry_completed")
        .expect("completion activity");

    assert!(completed.user.is_none());
    assert!(completed.description.contains("tracked"));
    assert!(completed.description.contains("Task #1"));
}

#[test]
fn unknown_container_is_not_found() {
    let (conn, _fx) = setup_workspace();
    let err = container_activities(&conn, 404, 1, 15).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
