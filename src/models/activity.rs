use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{json, Value};

/// Human-facing audit entry, distinct from the raw `logs` record. The
/// `event` tag and the shape of `properties` are tied together by
/// [`ActivityKind`].
#[derive(Debug, Clone, Serialize)]
pub struct Activity {
    pub id: i64,
    pub container_id: i64,
    pub user_id: Option<i64>,
    pub subject_type: String,
    pub subject_id: i64,
    pub event: String,
    pub properties: Option<Value>,
    pub created_at: NaiveDateTime,
}

impl Activity {
    pub fn kind(&self) -> ActivityKind {
        ActivityKind::parse(&self.event, self.properties.as_ref())
    }

    /// Task sequence number for the `Task #N` badge. Generic CRUD events
    /// nest it under `attributes`; timer events store it at the top level.
    pub fn sequence_id(&self) -> Option<i64> {
        let props = self.properties.as_ref()?;
        props
            .get("attributes")
            .and_then(|a| a.get("sequence_id"))
            .or_else(|| props.get("sequence_id"))
            .and_then(Value::as_i64)
    }
}

/// Typed event model for the activity feed. Parsing is lenient: missing
/// properties fall back to zero/None so the renderer stays total.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityKind {
    Created,
    Updated { attributes: Vec<String> },
    Deleted,
    MemberAdded { user_id: Option<i64> },
    MemberRemoved { user_id: Option<i64> },
    TimeEntryCompleted { duration: i64, added_manually: bool },
    TimeEntryDeleted { duration: i64, user_id: Option<i64> },
    TimeEntryUpdated { old_duration: i64, new_duration: i64, user_id: Option<i64> },
    Other { event: String },
}

fn get_i64(props: Option<&Value>, key: &str) -> Option<i64> {
    props.and_then(|p| p.get(key)).and_then(Value::as_i64)
}

impl ActivityKind {
    pub fn parse(event: &str, properties: Option<&Value>) -> Self {
        match event {
            "created" => ActivityKind::Created,
            "deleted" => ActivityKind::Deleted,
            "updated" => {
                let attributes = properties
                    .and_then(|p| p.get("attributes"))
                    .and_then(Value::as_object)
                    .map(|map| map.keys().cloned().collect())
                    .unwrap_or_default();
                ActivityKind::Updated { attributes }
            }
            "member_added" => ActivityKind::MemberAdded {
                user_id: get_i64(properties, "user_id"),
            },
            "member_removed" => ActivityKind::MemberRemoved {
                user_id: get_i64(properties, "user_id"),
            },
            "time_entry_completed" => ActivityKind::TimeEntryCompleted {
                duration: get_i64(properties, "duration").unwrap_or(0),
                added_manually: properties
                    .and_then(|p| p.get("added_manually"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            "time_entry_deleted" => ActivityKind::TimeEntryDeleted {
                duration: get_i64(properties, "duration").unwrap_or(0),
                user_id: get_i64(properties, "user_id"),
            },
            "time_entry_updated" => ActivityKind::TimeEntryUpdated {
                old_duration: get_i64(properties, "old_duration").unwrap_or(0),
                new_duration: get_i64(properties, "new_duration").unwrap_or(0),
                user_id: get_i64(properties, "user_id"),
            },
            other => ActivityKind::Other {
                event: other.to_string(),
            },
        }
    }

    pub fn event_tag(&self) -> &str {
        match self {
            ActivityKind::Created => "created",
            ActivityKind::Updated { .. } => "updated",
            ActivityKind::Deleted => "deleted",
            ActivityKind::MemberAdded { .. } => "member_added",
            ActivityKind::MemberRemoved { .. } => "member_removed",
            ActivityKind::TimeEntryCompleted { .. } => "time_entry_completed",
            ActivityKind::TimeEntryDeleted { .. } => "time_entry_deleted",
            ActivityKind::TimeEntryUpdated { .. } => "time_entry_updated",
            ActivityKind::Other { event } => event,
        }
    }

    /// Properties payload persisted alongside the event tag. The writer
    /// merges in the task `sequence_id` for badge rendering.
    pub fn to_properties(&self) -> Value {
        match self {
            ActivityKind::Created | ActivityKind::Deleted | ActivityKind::Other { .. } => {
                json!({})
            }
            ActivityKind::Updated { attributes } => {
                let map: serde_json::Map<String, Value> = attributes
                    .iter()
                    .map(|name| (name.clone(), Value::Null))
                    .collect();
                json!({ "attributes": map })
            }
            ActivityKind::MemberAdded { user_id } | ActivityKind::MemberRemoved { user_id } => {
                json!({ "user_id": user_id })
            }
            ActivityKind::TimeEntryCompleted { duration, added_manually } => {
                if *added_manually {
                    json!({ "duration": duration, "added_manually": true })
                } else {
                    json!({ "duration": duration })
                }
            }
            ActivityKind::TimeEntryDeleted { duration, user_id } => {
                json!({ "duration": duration, "user_id": user_id })
            }
            ActivityKind::TimeEntryUpdated { old_duration, new_duration, user_id } => {
                json!({
                    "old_duration": old_duration,
                    "new_duration": new_duration,
                    "user_id": user_id,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_lenient_about_missing_properties() {
        assert_eq!(
            ActivityKind::parse("time_entry_completed", None),
            ActivityKind::TimeEntryCompleted { duration: 0, added_manually: false }
        );
        assert_eq!(
            ActivityKind::parse("member_added", Some(&json!({}))),
            ActivityKind::MemberAdded { user_id: None }
        );
    }

    #[test]
    fn unknown_tags_fall_back_to_other() {
        let kind = ActivityKind::parse("archived", None);
        assert_eq!(kind, ActivityKind::Other { event: "archived".into() });
        assert_eq!(kind.event_tag(), "archived");
    }

    #[test]
    fn round_trips_through_properties() {
        let kind = ActivityKind::TimeEntryUpdated {
            old_duration: 3600,
            new_duration: 7200,
            user_id: Some(5),
        };
        let props = kind.to_properties();
        assert_eq!(ActivityKind::parse("time_entry_updated", Some(&props)), kind);
    }
}
