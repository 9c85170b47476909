use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// In-memory id → display-name lookup used by the activity renderer, so
/// rendering stays a pure function over preloaded data.
#[derive(Debug, Default)]
pub struct UserDirectory {
    names: HashMap<i64, String>,
}

impl UserDirectory {
    pub fn new(users: &[User]) -> Self {
        Self {
            names: users
                .iter()
                .map(|u| (u.id, u.full_name()))
                .collect(),
        }
    }

    pub fn name_of(&self, id: i64) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Display name for a possibly-missing user reference. Unknown ids
    /// render as "unknown" instead of failing the feed.
    pub fn resolve(&self, id: Option<i64>) -> String {
        id.and_then(|id| self.names.get(&id).cloned())
            .unwrap_or_else(|| "unknown".to_string())
    }

    /// Actor attribution falls back to the empty string, not "unknown":
    /// a system-triggered activity simply has no actor prefix.
    pub fn actor(&self, id: Option<i64>) -> String {
        id.and_then(|id| self.names.get(&id).cloned())
            .unwrap_or_default()
    }
}
