use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type PlayerId = Uuid;

/// A participant whose credits are tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    /// Matches either the exact id or the name, ignoring case.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        self.id.to_string() == query || self.name.eq_ignore_ascii_case(query)
    }
}
