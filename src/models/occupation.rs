use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Immovable interval on the user's calendar. The scheduler never moves or
/// resizes one; it only routes work around it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Occupation {
    pub id: String,
    pub title: String,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub context_tags: Vec<String>,
}

impl Occupation {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start_at: DateTime<FixedOffset>,
        end_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            start_at,
            end_at,
            location: None,
            context_tags: Vec::new(),
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_context_tags(mut self, context_tags: Vec<String>) -> Self {
        self.context_tags = context_tags;
        self
    }

    pub fn duration_minutes(&self) -> i64 {
        self.end_at.signed_duration_since(self.start_at).num_minutes()
    }
}
