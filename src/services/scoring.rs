use chrono::{DateTime, FixedOffset};

use crate::models::item::{Item, PriorityTier};
use crate::models::schedule::FreeSlot;
use crate::models::settings::SchedulerConfig;
use crate::services::schedule_utils;

/// Categories that want the morning deep-work window.
const DEEP_WORK_CATEGORIES: [&str; 3] = ["business", "work", "career"];

/// Light categories that fit the early-afternoon shallow window.
const SHALLOW_CATEGORIES: [&str; 4] = ["admin", "errand", "chore", "email"];

const BASE_SLOT_SCORE: i64 = 100;

/// Score a (free slot, item) pair; higher is better. Additions only: the
/// scorer chooses among slots that are already eligible, it never vetoes.
pub fn score_slot(
    slot: &FreeSlot,
    item: &Item,
    chunk_minutes: i64,
    config: &SchedulerConfig,
) -> i64 {
    let mut score = BASE_SLOT_SCORE;

    if let Some(category) = item.effective_category() {
        let start_hour = slot.start_hour();
        if DEEP_WORK_CATEGORIES.contains(&category.as_str())
            && start_hour >= config.deep_work_start_hour as f64
            && start_hour < config.deep_work_end_hour as f64
        {
            score += 50;
        } else if SHALLOW_CATEGORIES.contains(&category.as_str())
            && start_hour >= config.shallow_start_hour as f64
            && start_hour < config.shallow_end_hour as f64
        {
            score += 20;
        }
    }

    score += match item.priority_tier {
        PriorityTier::Critical => 40,
        PriorityTier::Core => 15,
        PriorityTier::Backlog => 0,
    };

    if slot.duration_minutes() >= chunk_minutes {
        score += 25;
    }

    score
}

/// Urgency score used to order items before placement. Tier dominates,
/// deadline proximity second, shorter items ahead on equal urgency.
pub fn calculate_item_score(item: &Item, now: DateTime<FixedOffset>) -> i64 {
    let mut score = match item.priority_tier {
        PriorityTier::Critical => 3000,
        PriorityTier::Core => 1000,
        PriorityTier::Backlog => 0,
    };

    match item.deadline {
        Some(deadline) => {
            let days = schedule_utils::days_until(deadline, now);
            if days <= 0 {
                score += 500;
            } else if days <= 3 {
                score += 300;
            } else if days <= 7 {
                score += 100;
            }
            score -= days;
        }
        None => score -= 100,
    }

    score - item.duration_minutes / 10
}

/// Stable priority order: descending score, ascending id on ties so the
/// ordering is identical on every run.
pub fn sort_by_priority(items: &mut [&Item], now: DateTime<FixedOffset>) {
    items.sort_by(|a, b| {
        calculate_item_score(b, now)
            .cmp(&calculate_item_score(a, now))
            .then_with(|| a.id.cmp(&b.id))
    });
}
