mod common;

use common::{add_manual_entry, count, setup_workspace};
use timecard::core::payments::{payment_details, process_payment, PaymentFilter};
use timecard::core::timer::{toggle_timer, TimerToggle};
use timecard::core::timesheet::{update_timers, TimerPatch};
use timecard::db;
use timecard::errors::AppError;
use timecard::utils::date::parse_date_range;

#[test]
fn paid_and_pending_amounts_per_task() {
    let (mut conn, fx) = setup_workspace();

    // One paid hour (amount 50) and one pending half hour at 20/h.
    let paid_id = add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 09:00:00",
        "2025-06-02 10:00:00",
    );
    db::mark_entry_paid(&conn, paid_id, 50.0, 50.0).unwrap();
    add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 11:00:00",
        "2025-06-02 11:30:00",
    );

    let details =
        payment_details(&conn, fx.container, fx.bob, None, PaymentFilter::All).unwrap();

    assert_eq!(details.len(), 1);
    let task = &details[0];
    assert_eq!(task.paid_amount, 50.0);
    assert_eq!(task.pending_amount, 10.0);
    assert_eq!(task.tracked_time, 5400);
    assert_eq!(task.tracked_time_display, "01:30:00");
    assert_eq!(task.entries.len(), 2);
}

#[test]
fn soft_deleted_entries_are_listed_but_never_summed() {
    let (mut conn, fx) = setup_workspace();

    add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 09:00:00",
        "2025-06-02 10:00:00",
    );
    let doomed = add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 11:00:00",
        "2025-06-02 12:00:00",
    );
    update_timers(
        &mut conn,
        fx.design_task,
        &[TimerPatch {
            id: Some(doomed),
            deleted: true,
            ..TimerPatch::default()
        }],
        None,
    )
    .unwrap();

    let details =
        payment_details(&conn, fx.container, fx.bob, None, PaymentFilter::All).unwrap();
    let task = &details[0];

    assert_eq!(task.tracked_time, 3600);
    assert_eq!(task.pending_amount, 20.0);
    assert_eq!(task.entries.len(), 2, "deleted entry stays in the listing");

    let deleted_line = task
        .entries
        .iter()
        .find(|e| e.id == doomed)
        .expect("deleted entry listed");
    assert!(deleted_line.deleted_at.is_some());
    assert!(deleted_line.duration.is_none());
}

#[test]
fn open_timers_are_excluded_entirely() {
    let (mut conn, fx) = setup_workspace();

    toggle_timer(
        &mut conn,
        fx.design_task,
        &TimerToggle {
            user_id: fx.bob,
            billable: true,
            billable_rate: 20.0,
            stopped_by_system: false,
        },
        Some(fx.bob),
    )
    .unwrap();

    let details =
        payment_details(&conn, fx.container, fx.bob, None, PaymentFilter::All).unwrap();
    assert!(details.is_empty());
}

#[test]
fn status_and_range_filters_narrow_the_listing() {
    let (mut conn, fx) = setup_workspace();

    let paid_id = add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 09:00:00",
        "2025-06-02 10:00:00",
    );
    db::mark_entry_paid(&conn, paid_id, 20.0, 20.0).unwrap();
    add_manual_entry(
        &mut conn,
        fx.login_task,
        fx.bob,
        "2025-07-10 09:00:00",
        "2025-07-10 10:00:00",
    );

    let paid_only =
        payment_details(&conn, fx.container, fx.bob, None, PaymentFilter::Paid).unwrap();
    assert_eq!(paid_only.len(), 1);
    assert_eq!(paid_only[0].entries[0].id, paid_id);

    let june = parse_date_range("2025-06-01 to 2025-06-30").unwrap();
    let june_only =
        payment_details(&conn, fx.container, fx.bob, Some(&june), PaymentFilter::All).unwrap();
    assert_eq!(june_only.len(), 1);
    assert_eq!(june_only[0].entries.len(), 1);
}

#[test]
fn entries_group_by_task_in_first_seen_order() {
    let (mut conn, fx) = setup_workspace();

    add_manual_entry(
        &mut conn,
        fx.login_task,
        fx.bob,
        "2025-06-01 09:00:00",
        "2025-06-01 10:00:00",
    );
    add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 09:00:00",
        "2025-06-02 10:00:00",
    );

    let details =
        payment_details(&conn, fx.container, fx.bob, None, PaymentFilter::All).unwrap();
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].task.as_ref().unwrap().id, fx.login_task);
    assert_eq!(details[1].task.as_ref().unwrap().id, fx.design_task);
}

#[test]
fn task_logs_ride_along_with_iso_timestamps() {
    let (mut conn, fx) = setup_workspace();

    let id = add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 09:00:00",
        "2025-06-02 10:00:00",
    );
    update_timers(
        &mut conn,
        fx.design_task,
        &[TimerPatch {
            id: Some(id),
            start: Some("2025-06-02 09:00:00".into()),
            end: Some("2025-06-02 11:00:00".into()),
            ..TimerPatch::default()
        }],
        Some(fx.alice),
    )
    .unwrap();

    let details =
        payment_details(&conn, fx.container, fx.bob, None, PaymentFilter::All).unwrap();
    let logs = &details[0].logs;

    assert_eq!(logs.len(), 2);
    // Newest first: the update precedes the create in the listing.
    assert_eq!(logs[0].action, "update");
    assert_eq!(logs[1].action, "create");
    assert_eq!(logs[0].user.as_deref(), Some("Alice Johnson"));

    let end = logs[0].new_data.as_ref().unwrap()["end"].as_str().unwrap();
    assert_eq!(end, "2025-06-02T11:00:00+00:00");
}

#[test]
fn processing_a_payment_settles_pending_entries() {
    let (mut conn, fx) = setup_workspace();

    add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 09:00:00",
        "2025-06-02 09:30:00",
    );

    let receipt = process_payment(&mut conn, fx.container, fx.bob, None, Some(fx.alice)).unwrap();

    assert_eq!(receipt.amount, 10.0);
    assert_eq!(receipt.entries_paid, 1);
    assert!(receipt.payment_id.is_some());

    let payload = receipt.notification.expect("broadcast payload");
    assert_eq!(payload.title, "Payment processed");
    assert_eq!(payload.kind, "payment_processed");
    assert_eq!(payload.reference["type"], "payment");
    assert!(payload.created_at.ends_with("ago"));

    assert_eq!(count(&conn, "SELECT COUNT(*) FROM payments"), 1);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM time_entries WHERE is_paid = 1"),
        1
    );
    let paid_rate: f64 = conn
        .query_row("SELECT paid_rate FROM time_entries WHERE is_paid = 1", [], |r| r.get(0))
        .unwrap();
    assert_eq!(paid_rate, 20.0);

    // Settling is audited like any other entry mutation.
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM logs WHERE action = 'update'"), 1);

    // Nothing left to pay.
    let again = process_payment(&mut conn, fx.container, fx.bob, None, None).unwrap();
    assert!(again.payment_id.is_none());
    assert_eq!(again.entries_paid, 0);
}

#[test]
fn missing_member_is_not_found() {
    let (conn, fx) = setup_workspace();
    let outsider = db::insert_user(&conn, "Oscar", "Wilde", "oscar@example.com").unwrap();

    let err =
        payment_details(&conn, fx.container, outsider, None, PaymentFilter::All).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}
