use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PriorityTier {
    Critical,
    #[default]
    Core,
    Backlog,
}

impl PriorityTier {
    pub fn as_str(&self) -> &str {
        match self {
            PriorityTier::Critical => "critical",
            PriorityTier::Core => "core",
            PriorityTier::Backlog => "backlog",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "critical" => Ok(PriorityTier::Critical),
            "core" => Ok(PriorityTier::Core),
            "backlog" => Ok(PriorityTier::Backlog),
            _ => Err(format!("Invalid priority tier: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl ItemStatus {
    pub fn as_str(&self) -> &str {
        match self {
            ItemStatus::Todo => "todo",
            ItemStatus::InProgress => "in_progress",
            ItemStatus::Completed => "completed",
        }
    }

    pub fn from_str(s: &str) -> Result<Self, String> {
        match s {
            "todo" => Ok(ItemStatus::Todo),
            "in_progress" => Ok(ItemStatus::InProgress),
            "completed" => Ok(ItemStatus::Completed),
            _ => Err(format!("Invalid item status: {}", s)),
        }
    }
}

/// A unit of schedulable work. Instances materialized from a recurrence
/// template arrive here like any other item, carrying their template id in
/// `recurrence_parent_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: String,
    #[serde(default)]
    pub goal_id: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub title: String,
    pub duration_minutes: i64,
    #[serde(default)]
    pub deadline: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub priority_tier: PriorityTier,
    #[serde(default)]
    pub is_assignment: bool,
    #[serde(default)]
    pub can_split: bool,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default)]
    pub pinned_start: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub status: ItemStatus,
    #[serde(default)]
    pub recurrence_parent_id: Option<String>,
}

impl Item {
    pub fn new(id: impl Into<String>, title: impl Into<String>, duration_minutes: i64) -> Self {
        Self {
            id: id.into(),
            goal_id: None,
            category: None,
            title: title.into(),
            duration_minutes,
            deadline: None,
            priority_tier: PriorityTier::default(),
            is_assignment: false,
            can_split: false,
            depends_on: Vec::new(),
            pinned_start: None,
            status: ItemStatus::default(),
            recurrence_parent_id: None,
        }
    }

    pub fn with_goal(mut self, goal_id: impl Into<String>) -> Self {
        self.goal_id = Some(goal_id.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_deadline(mut self, deadline: DateTime<FixedOffset>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_tier(mut self, priority_tier: PriorityTier) -> Self {
        self.priority_tier = priority_tier;
        self
    }

    pub fn with_status(mut self, status: ItemStatus) -> Self {
        self.status = status;
        self
    }

    pub fn as_assignment(mut self) -> Self {
        self.is_assignment = true;
        self
    }

    pub fn splittable(mut self) -> Self {
        self.can_split = true;
        self
    }

    pub fn with_dependency(mut self, item_id: impl Into<String>) -> Self {
        self.depends_on.push(item_id.into());
        self
    }

    pub fn pinned_at(mut self, pinned_start: DateTime<FixedOffset>) -> Self {
        self.pinned_start = Some(pinned_start);
        self
    }

    pub fn from_recurrence(mut self, parent_id: impl Into<String>) -> Self {
        self.recurrence_parent_id = Some(parent_id.into());
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status == ItemStatus::Completed
    }

    /// Category normalized for energy matching: trimmed, lowercased, empty
    /// strings treated as absent.
    pub fn effective_category(&self) -> Option<String> {
        self.category
            .as_ref()
            .map(|category| category.trim().to_ascii_lowercase())
            .filter(|category| !category.is_empty())
    }
}
