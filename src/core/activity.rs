//! Activity trail: the writer that appends human-facing audit entries and
//! the renderer that turns them into feed sentences.

use crate::db;
use crate::errors::AppResult;
use crate::models::log::subject;
use crate::models::{Activity, ActivityKind, Task, UserDirectory};
use crate::utils::time::{format_duration, now, time_ago};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde_json::{json, Value};

/// Append one activity for a task-scoped event. The task's sequence number
/// is folded into the properties so the feed can render its badge without
/// another lookup.
pub fn record(
    conn: &Connection,
    container_id: i64,
    actor: Option<i64>,
    task: &Task,
    kind: &ActivityKind,
) -> AppResult<i64> {
    let mut properties = kind.to_properties();
    if let Value::Object(map) = &mut properties {
        map.insert("sequence_id".to_string(), json!(task.sequence_id));
    }
    db::insert_activity(
        conn,
        container_id,
        actor,
        subject::TASK,
        task.id,
        kind.event_tag(),
        &properties,
    )
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Render one activity into a display sentence.
///
/// Total by construction: every event tag produces a string, missing
/// properties degrade to empty durations or "unknown" names, and nothing
/// here can fail or touch the store.
pub fn describe_activity(activity: &Activity, actor_name: &str, users: &UserDirectory) -> String {
    let badge = match activity.sequence_id() {
        Some(seq) if activity.subject_type == subject::TASK => format!(" Task #{seq}"),
        _ => String::new(),
    };
    let subject_label = activity.subject_type.replace('_', " ");

    match activity.kind() {
        ActivityKind::Created => {
            format!("{actor_name} created {subject_label}{badge}")
        }
        ActivityKind::Deleted => {
            format!("{actor_name} deleted {subject_label}{badge}")
        }
        ActivityKind::Updated { attributes } => {
            let changes = attributes
                .iter()
                .map(|name| capitalize(name))
                .collect::<Vec<_>>()
                .join(", ");
            format!("{actor_name} updated {changes} in{badge}")
        }
        ActivityKind::MemberAdded { user_id } => {
            let member = users.resolve(user_id);
            format!("{actor_name} added {member} to{badge}")
        }
        ActivityKind::MemberRemoved { user_id } => {
            let member = users.resolve(user_id);
            format!("{actor_name} removed {member} from{badge}")
        }
        ActivityKind::TimeEntryCompleted { duration, added_manually } => {
            let manually = if added_manually { " manually" } else { "" };
            format!(
                "{actor_name} tracked{manually} {} on{badge}",
                format_duration(duration)
            )
        }
        ActivityKind::TimeEntryDeleted { duration, user_id } => {
            let owner = users.resolve(user_id);
            format!(
                "{actor_name} deleted {owner}'s time entry of {} from{badge}",
                format_duration(duration)
            )
        }
        ActivityKind::TimeEntryUpdated { old_duration, new_duration, user_id } => {
            let owner = users.resolve(user_id);
            format!(
                "{actor_name} updated {owner}'s time entry from {} to {} on{badge}",
                format_duration(old_duration),
                format_duration(new_duration)
            )
        }
        ActivityKind::Other { event } => {
            format!("{actor_name} performed {event} on{badge}")
        }
    }
}

/// One feed row, already rendered for display.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RenderedActivity {
    pub id: i64,
    pub description: String,
    pub user: Option<String>,
    pub event: String,
    pub created_at: NaiveDateTime,
    pub created_at_human: String,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ActivityPage {
    pub activities: Vec<RenderedActivity>,
    pub has_more: bool,
    pub next_page: usize,
    pub total: i64,
}

/// Paged activity feed for a container, newest first.
pub fn container_activities(
    conn: &Connection,
    container_id: i64,
    page: usize,
    per_page: usize,
) -> AppResult<ActivityPage> {
    db::get_container(conn, container_id)?;

    let page = page.max(1);
    let users = db::user_directory(conn)?;
    let total = db::count_activities(conn, container_id)?;
    let offset = (page - 1) * per_page;
    let records = db::list_activities(conn, container_id, per_page, offset)?;

    let current_time = now();
    let activities = records
        .iter()
        .map(|activity| {
            let actor = users.actor(activity.user_id);
            RenderedActivity {
                id: activity.id,
                description: describe_activity(activity, &actor, &users),
                user: activity.user_id.map(|id| users.resolve(Some(id))),
                event: activity.event.clone(),
                created_at: activity.created_at,
                created_at_human: time_ago(activity.created_at, current_time),
            }
        })
        .collect();

    Ok(ActivityPage {
        activities,
        has_more: (offset + records.len()) < total as usize,
        next_page: page + 1,
        total,
    })
}
