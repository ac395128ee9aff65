use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::models::item::Item;
use crate::models::schedule::{PlacedBlock, ScheduleResult};

/// Blocks whose start falls on `date`, in start order (the result is
/// already globally ordered by start).
pub fn blocks_for_day<'a>(result: &'a ScheduleResult, date: NaiveDate) -> Vec<&'a PlacedBlock> {
    result
        .blocks
        .iter()
        .filter(|block| block.start_at.date_naive() == date)
        .collect()
}

pub fn total_scheduled_minutes(result: &ScheduleResult, date: NaiveDate) -> i64 {
    result
        .blocks
        .iter()
        .filter(|block| block.start_at.date_naive() == date)
        .map(|block| block.duration_minutes)
        .sum()
}

pub fn is_item_scheduled(result: &ScheduleResult, item_id: &str) -> bool {
    result.blocks.iter().any(|block| block.item_id == item_id)
}

/// Minutes of `item` not yet covered by placed blocks; never negative.
pub fn remaining_duration(result: &ScheduleResult, item: &Item) -> i64 {
    let placed: i64 = result
        .blocks
        .iter()
        .filter(|block| block.item_id == item.id)
        .map(|block| block.duration_minutes)
        .sum();
    (item.duration_minutes - placed).max(0)
}

/// Promote soft plans to real bookings: a copy of the result with
/// `is_virtual` cleared on every block starting within `within_days` of
/// `now`. Used at the boundary when a plan is written out to the calendar.
pub fn convert_to_hard_bookings(
    result: &ScheduleResult,
    now: DateTime<FixedOffset>,
    within_days: i64,
) -> ScheduleResult {
    let today = now.date_naive();
    let mut promoted = result.clone();
    for block in &mut promoted.blocks {
        if (block.start_at.date_naive() - today).num_days() <= within_days {
            block.is_virtual = false;
        }
    }
    promoted
}
