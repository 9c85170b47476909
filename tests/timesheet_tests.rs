mod common;

use common::{add_manual_entry, count, setup_workspace};
use timecard::core::timesheet::{update_timers, TimerPatch};
use timecard::db;
use timecard::errors::AppError;

#[test]
fn create_patch_snapshots_member_billing() {
    let (mut conn, fx) = setup_workspace();

    let patch = TimerPatch {
        user_id: Some(fx.bob),
        start: Some("2025-06-02 09:00:00".into()),
        end: Some("2025-06-02 10:30:00".into()),
        ..TimerPatch::default()
    };
    let detail = update_timers(&mut conn, fx.design_task, &[patch], Some(fx.alice)).unwrap();

    assert_eq!(detail.entries.len(), 1);
    let entry = &detail.entries[0];
    assert!(entry.added_manually);
    assert!(entry.billable);
    assert_eq!(entry.billable_rate, 20.0);
    assert_eq!(entry.tracked_time(), 5400);

    // A closed manual entry is announced as tracked manually.
    let props: String = conn
        .query_row(
            "SELECT properties FROM activities WHERE event = 'time_entry_completed'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(props.contains("added_manually"));
}

#[test]
fn create_without_start_is_silently_skipped() {
    let (mut conn, fx) = setup_workspace();

    let patches = [
        TimerPatch {
            user_id: Some(fx.bob),
            start: Some("".into()),
            ..TimerPatch::default()
        },
        TimerPatch {
            user_id: Some(fx.bob),
            ..TimerPatch::default()
        },
    ];
    let detail = update_timers(&mut conn, fx.design_task, &patches, None).unwrap();

    assert!(detail.entries.is_empty());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM logs"), 0);
}

#[test]
fn unknown_update_id_rolls_back_the_whole_batch() {
    let (mut conn, fx) = setup_workspace();

    let patches = [
        TimerPatch {
            user_id: Some(fx.bob),
            start: Some("2025-06-02 09:00:00".into()),
            end: Some("2025-06-02 10:00:00".into()),
            ..TimerPatch::default()
        },
        TimerPatch {
            id: Some(9999),
            start: Some("2025-06-02 11:00:00".into()),
            ..TimerPatch::default()
        },
    ];
    let err = update_timers(&mut conn, fx.design_task, &patches, None).unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    // Nothing from the batch survives, including the valid first patch.
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM time_entries"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM logs"), 0);
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM activities"), 0);
}

#[test]
fn update_patch_rewrites_times_and_logs_the_delta() {
    let (mut conn, fx) = setup_workspace();
    let id = add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 09:00:00",
        "2025-06-02 10:00:00",
    );

    let patch = TimerPatch {
        id: Some(id),
        start: Some("2025-06-02 09:00:00".into()),
        end: Some("2025-06-02 11:00:00".into()),
        ..TimerPatch::default()
    };
    update_timers(&mut conn, fx.design_task, &[patch], Some(fx.alice)).unwrap();

    let entry = db::get_entry(&conn, id).unwrap().unwrap();
    assert_eq!(entry.tracked_time(), 7200);

    let new_data: String = conn
        .query_row(
            "SELECT new_data FROM logs WHERE action = 'update'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(new_data.contains("2025-06-02 11:00:00"));
    assert!(!new_data.contains("09:00:00"), "unchanged start must not be logged");

    let props: String = conn
        .query_row(
            "SELECT properties FROM activities WHERE event = 'time_entry_updated'",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert!(props.contains("\"old_duration\":3600"));
    assert!(props.contains("\"new_duration\":7200"));
}

#[test]
fn delete_patch_soft_deletes_and_audits() {
    let (mut conn, fx) = setup_workspace();
    let id = add_manual_entry(
        &mut conn,
        fx.design_task,
        fx.bob,
        "2025-06-02 09:00:00",
        "2025-06-02 10:00:00",
    );

    let patch = TimerPatch {
        id: Some(id),
        deleted: true,
        ..TimerPatch::default()
    };
    let detail = update_timers(&mut conn, fx.design_task, &[patch], Some(fx.alice)).unwrap();

    // Gone from the live listing, retained in the table for audit.
    assert!(detail.entries.is_empty());
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM time_entries WHERE deleted_at IS NOT NULL"),
        1
    );
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM logs WHERE action = 'delete'"), 1);
    assert_eq!(
        count(&conn, "SELECT COUNT(*) FROM activities WHERE event = 'time_entry_deleted'"),
        1
    );
}

#[test]
fn deleting_an_unknown_id_is_skipped() {
    let (mut conn, fx) = setup_workspace();

    let patch = TimerPatch {
        id: Some(424242),
        deleted: true,
        ..TimerPatch::default()
    };
    let detail = update_timers(&mut conn, fx.design_task, &[patch], None).unwrap();
    assert!(detail.entries.is_empty());
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM logs"), 0);
}

#[test]
fn end_before_start_fails_validation() {
    let (mut conn, fx) = setup_workspace();

    let patch = TimerPatch {
        user_id: Some(fx.bob),
        start: Some("2025-06-02 10:00:00".into()),
        end: Some("2025-06-02 09:00:00".into()),
        ..TimerPatch::default()
    };
    let err = update_timers(&mut conn, fx.design_task, &[patch], None).unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM time_entries"), 0);
}

#[test]
fn create_for_non_member_aborts_the_batch() {
    let (mut conn, fx) = setup_workspace();
    let outsider = db::insert_user(&conn, "Oscar", "Wilde", "oscar@example.com").unwrap();

    let patch = TimerPatch {
        user_id: Some(outsider),
        start: Some("2025-06-02 09:00:00".into()),
        end: Some("2025-06-02 10:00:00".into()),
        ..TimerPatch::default()
    };
    let err = update_timers(&mut conn, fx.design_task, &[patch], None).unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM time_entries"), 0);
}

#[test]
fn malformed_datetime_aborts_the_batch() {
    let (mut conn, fx) = setup_workspace();

    let patches = [
        TimerPatch {
            user_id: Some(fx.bob),
            start: Some("2025-06-02 09:00:00".into()),
            end: Some("2025-06-02 10:00:00".into()),
            ..TimerPatch::default()
        },
        TimerPatch {
            user_id: Some(fx.bob),
            start: Some("not-a-date".into()),
            ..TimerPatch::default()
        },
    ];
    let err = update_timers(&mut conn, fx.design_task, &patches, None).unwrap_err();
    assert!(matches!(err, AppError::InvalidDate(_)));
    assert_eq!(count(&conn, "SELECT COUNT(*) FROM time_entries"), 0);
}
