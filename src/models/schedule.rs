use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::models::item::PriorityTier;
use crate::services::schedule_utils;

/// One concrete assignment of time to (a chunk of) an item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlacedBlock {
    pub id: String,
    pub item_id: String,
    pub title: String,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    pub duration_minutes: i64,
    pub priority_tier: PriorityTier,
    pub chunk_index: u32,
    pub total_chunks: u32,
    pub is_virtual: bool,
    pub is_completed: bool,
}

impl PlacedBlock {
    /// Block identifiers are a pure function of the item and chunk so that
    /// identical inputs always produce identical output.
    pub fn block_id(item_id: &str, chunk_index: u32) -> String {
        format!("{item_id}#{chunk_index}")
    }
}

/// Ephemeral gap in a workday, half-open `[start_at, end_at)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FreeSlot {
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
}

impl FreeSlot {
    pub fn duration_minutes(&self) -> i64 {
        self.end_at.signed_duration_since(self.start_at).num_minutes()
    }

    pub fn start_hour(&self) -> f64 {
        schedule_utils::decimal_hour(self.start_at)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    FamilyTimeCompromised,
    Overloaded,
    DeadlineAtRisk,
    AntiCrammingViolated,
}

impl WarningKind {
    pub fn as_str(&self) -> &str {
        match self {
            WarningKind::FamilyTimeCompromised => "family_time_compromised",
            WarningKind::Overloaded => "overloaded",
            WarningKind::DeadlineAtRisk => "deadline_at_risk",
            WarningKind::AntiCrammingViolated => "anti_cramming_violated",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWarning {
    pub kind: WarningKind,
    pub message: String,
    #[serde(default)]
    pub item_id: Option<String>,
}

impl ScheduleWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>, item_id: Option<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            item_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResult {
    pub blocks: Vec<PlacedBlock>,
    pub overloaded: Vec<String>,
    pub warnings: Vec<ScheduleWarning>,
}

impl ScheduleResult {
    pub fn warnings_for_item(&self, item_id: &str) -> Vec<&ScheduleWarning> {
        self.warnings
            .iter()
            .filter(|warning| warning.item_id.as_deref() == Some(item_id))
            .collect()
    }

    pub fn has_warning(&self, kind: WarningKind, item_id: &str) -> bool {
        self.warnings
            .iter()
            .any(|warning| warning.kind == kind && warning.item_id.as_deref() == Some(item_id))
    }
}
