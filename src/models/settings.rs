use serde::{Deserialize, Serialize};

fn default_day_start_hour() -> u32 {
    8
}

fn default_day_end_hour() -> u32 {
    22
}

fn default_family_time_start_hour() -> f64 {
    17.5
}

fn default_deep_work_start_hour() -> u32 {
    8
}

fn default_deep_work_end_hour() -> u32 {
    12
}

fn default_shallow_start_hour() -> u32 {
    13
}

fn default_shallow_end_hour() -> u32 {
    15
}

fn default_planning_horizon_days() -> i64 {
    7
}

fn default_max_items_per_goal_per_day() -> usize {
    3
}

/// Tunable scheduling knobs. The Friday early close (17:00) and the Sunday
/// block are policy, not configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerConfig {
    #[serde(default = "default_day_start_hour")]
    pub day_start_hour: u32,
    #[serde(default = "default_day_end_hour")]
    pub day_end_hour: u32,
    /// Decimal hour; 17.5 means 17:30.
    #[serde(default = "default_family_time_start_hour")]
    pub family_time_start_hour: f64,
    #[serde(default = "default_deep_work_start_hour")]
    pub deep_work_start_hour: u32,
    #[serde(default = "default_deep_work_end_hour")]
    pub deep_work_end_hour: u32,
    #[serde(default = "default_shallow_start_hour")]
    pub shallow_start_hour: u32,
    #[serde(default = "default_shallow_end_hour")]
    pub shallow_end_hour: u32,
    #[serde(default = "default_planning_horizon_days")]
    pub planning_horizon_days: i64,
    #[serde(default = "default_max_items_per_goal_per_day")]
    pub max_items_per_goal_per_day: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            day_start_hour: default_day_start_hour(),
            day_end_hour: default_day_end_hour(),
            family_time_start_hour: default_family_time_start_hour(),
            deep_work_start_hour: default_deep_work_start_hour(),
            deep_work_end_hour: default_deep_work_end_hour(),
            shallow_start_hour: default_shallow_start_hour(),
            shallow_end_hour: default_shallow_end_hour(),
            planning_horizon_days: default_planning_horizon_days(),
            max_items_per_goal_per_day: default_max_items_per_goal_per_day(),
        }
    }
}

impl SchedulerConfig {
    /// Clamp nonsensical values back to defaults. The scheduler must stay
    /// total, so a broken config degrades instead of failing.
    pub fn normalize(mut self) -> Self {
        if self.day_end_hour <= self.day_start_hour || self.day_end_hour > 24 {
            self.day_start_hour = default_day_start_hour();
            self.day_end_hour = default_day_end_hour();
        }
        if !(0.0..=24.0).contains(&self.family_time_start_hour) {
            self.family_time_start_hour = default_family_time_start_hour();
        }
        if self.deep_work_end_hour <= self.deep_work_start_hour {
            self.deep_work_start_hour = default_deep_work_start_hour();
            self.deep_work_end_hour = default_deep_work_end_hour();
        }
        if self.shallow_end_hour <= self.shallow_start_hour {
            self.shallow_start_hour = default_shallow_start_hour();
            self.shallow_end_hour = default_shallow_end_hour();
        }
        if self.planning_horizon_days < 1 {
            self.planning_horizon_days = default_planning_horizon_days();
        }
        if self.max_items_per_goal_per_day == 0 {
            self.max_items_per_goal_per_day = default_max_items_per_goal_per_day();
        }
        self
    }
}
