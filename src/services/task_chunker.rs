use std::collections::BTreeMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};

use crate::models::item::Item;
use crate::services::schedule_utils;

pub const MIN_CHUNK_MINUTES: i64 = 30;
pub const MAX_CHUNK_MINUTES: i64 = 120;
pub const TARGET_CHUNK_MINUTES: i64 = 90;

/// One segment of a split item, with the day the chunker wants it on. The
/// placement engine treats `preferred_day` as a starting point, not a
/// guarantee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub duration_minutes: i64,
    pub preferred_day: NaiveDate,
    pub chunk_index: u32,
    pub total_chunks: u32,
}

/// Split `item` into chunks spread over the days remaining before its
/// deadline (or the horizon), keeping at most `⌊duration/2⌋` minutes on the
/// deadline day itself.
pub fn chunk_item(item: &Item, now: DateTime<FixedOffset>, horizon_days: i64) -> Vec<Chunk> {
    let planning_start = now.date_naive();
    let deadline_day = item.deadline.map(|deadline| deadline.date_naive());

    // Instances materialized from a recurrence template land on their
    // intended day instead of drifting earlier in the week.
    let anchored_day = match (&item.recurrence_parent_id, deadline_day) {
        (Some(_), Some(day)) => day,
        _ => planning_start,
    };

    if item.duration_minutes <= MAX_CHUNK_MINUTES || !item.can_split {
        return vec![Chunk {
            duration_minutes: item.duration_minutes,
            preferred_day: anchored_day,
            chunk_index: 0,
            total_chunks: 1,
        }];
    }

    let durations = chunk_durations(item.duration_minutes);
    let total_chunks = durations.len() as u32;

    let horizon_last_day = planning_start + Duration::days(horizon_days.max(1) - 1);
    let end_day = deadline_day.unwrap_or(horizon_last_day).min(horizon_last_day);

    let days_available = item
        .deadline
        .map(|deadline| schedule_utils::days_until(deadline, now))
        .unwrap_or(horizon_days)
        .min(horizon_days)
        .max(1);
    let chunks_per_day = (total_chunks as i64 + days_available - 1) / days_available;
    let due_date_cap = item.duration_minutes / 2;

    let mut day = anchored_day;
    let mut emitted_on_day: i64 = 0;
    let mut minutes_by_day: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    let mut chunks = Vec::with_capacity(durations.len());

    for (index, duration) in durations.into_iter().enumerate() {
        if index > 0 && Some(day) == deadline_day && day > planning_start {
            let scheduled = minutes_by_day.get(&day).copied().unwrap_or(0);
            if scheduled + duration > due_date_cap {
                day = day - Duration::days(1);
                emitted_on_day = 0;
            }
        }

        chunks.push(Chunk {
            duration_minutes: duration,
            preferred_day: day,
            chunk_index: index as u32,
            total_chunks,
        });
        *minutes_by_day.entry(day).or_insert(0) += duration;
        emitted_on_day += 1;

        if emitted_on_day >= chunks_per_day {
            let next = day + Duration::days(1);
            if next <= end_day {
                day = next;
                emitted_on_day = 0;
            }
        }
    }

    chunks
}

/// Chunk sizes for an oversized splittable duration. Target-sized chunks
/// until the remainder fits in one; a remainder above the maximum always
/// leaves more than the minimum behind, so no tail ever falls under 30
/// minutes.
fn chunk_durations(total_minutes: i64) -> Vec<i64> {
    let mut durations = Vec::new();
    let mut remaining = total_minutes;
    while remaining > 0 {
        if remaining <= MAX_CHUNK_MINUTES {
            durations.push(remaining);
            break;
        }
        durations.push(TARGET_CHUNK_MINUTES);
        remaining -= TARGET_CHUNK_MINUTES;
    }
    durations
}
