use chrono::{DateTime, FixedOffset, NaiveDate};
use tracing::trace;

use crate::models::occupation::Occupation;
use crate::models::schedule::{FreeSlot, PlacedBlock};
use crate::models::settings::SchedulerConfig;
use crate::services::schedule_utils;

/// Fridays close early regardless of the configured workday end.
pub const FRIDAY_CLOSE_HOUR: f64 = 17.0;

/// Gaps narrower than this are useless to the placement engine.
pub const MIN_SLOT_MINUTES: i64 = 30;

/// Ordered free intervals of `date`, bounded by the workday. Busy regions
/// are occupations and already-placed blocks whose start falls on `date`;
/// overlapping regions collapse during the sweep.
pub fn free_slots_in_day(
    date: NaiveDate,
    offset: FixedOffset,
    occupations: &[Occupation],
    already_placed: &[PlacedBlock],
    config: &SchedulerConfig,
) -> Vec<FreeSlot> {
    if schedule_utils::is_sunday(date) {
        return Vec::new();
    }

    let workday_start = schedule_utils::at_hour(date, offset, config.day_start_hour as f64);
    let end_hour = if schedule_utils::is_friday(date) {
        FRIDAY_CLOSE_HOUR.min(config.day_end_hour as f64)
    } else {
        config.day_end_hour as f64
    };
    let workday_end = schedule_utils::at_hour(date, offset, end_hour);
    if workday_end <= workday_start {
        return Vec::new();
    }

    let mut busy: Vec<(DateTime<FixedOffset>, DateTime<FixedOffset>)> = Vec::new();
    for occupation in occupations {
        if occupation.start_at.date_naive() == date {
            busy.push((occupation.start_at, occupation.end_at));
        }
    }
    for block in already_placed {
        if block.start_at.date_naive() == date {
            busy.push((block.start_at, block.end_at));
        }
    }
    busy.sort();

    let mut slots = Vec::new();
    let mut cursor = workday_start;
    for (busy_start, busy_end) in busy {
        if busy_start > cursor {
            let slot_end = busy_start.min(workday_end);
            if slot_end > cursor {
                slots.push(FreeSlot {
                    start_at: cursor,
                    end_at: slot_end,
                });
            }
        }
        if busy_end > cursor {
            cursor = busy_end;
        }
        if cursor >= workday_end {
            break;
        }
    }
    if cursor < workday_end {
        slots.push(FreeSlot {
            start_at: cursor,
            end_at: workday_end,
        });
    }

    trace!(%date, slots = slots.len(), "synthesized free slots");
    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn offset() -> FixedOffset {
        FixedOffset::east_opt(0).expect("offset")
    }

    fn dt(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .expect("valid date")
            .and_hms_opt(hour, minute, 0)
            .expect("valid time");
        offset()
            .from_local_datetime(&naive)
            .single()
            .expect("valid datetime")
    }

    fn occupation(id: &str, start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Occupation {
        Occupation::new(id, id, start, end)
    }

    // 2025-06-02 is a Monday, 06-06 a Friday, 06-08 a Sunday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 2).expect("date")
    }

    #[test]
    fn empty_day_yields_one_full_workday_slot() {
        let slots = free_slots_in_day(monday(), offset(), &[], &[], &SchedulerConfig::default());
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_at, dt(2025, 6, 2, 8, 0));
        assert_eq!(slots[0].end_at, dt(2025, 6, 2, 22, 0));
        assert_eq!(slots[0].duration_minutes(), 14 * 60);
    }

    #[test]
    fn busy_interval_splits_the_day() {
        let busy = [occupation(
            "class",
            dt(2025, 6, 2, 10, 0),
            dt(2025, 6, 2, 12, 0),
        )];
        let slots = free_slots_in_day(monday(), offset(), &busy, &[], &SchedulerConfig::default());
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].start_at, dt(2025, 6, 2, 8, 0));
        assert_eq!(slots[0].end_at, dt(2025, 6, 2, 10, 0));
        assert_eq!(slots[1].start_at, dt(2025, 6, 2, 12, 0));
        assert_eq!(slots[1].end_at, dt(2025, 6, 2, 22, 0));
    }

    #[test]
    fn overlapping_busy_intervals_collapse() {
        let busy = [
            occupation("a", dt(2025, 6, 2, 9, 0), dt(2025, 6, 2, 11, 0)),
            occupation("b", dt(2025, 6, 2, 10, 0), dt(2025, 6, 2, 12, 0)),
            occupation("c", dt(2025, 6, 2, 10, 30), dt(2025, 6, 2, 11, 30)),
        ];
        let slots = free_slots_in_day(monday(), offset(), &busy, &[], &SchedulerConfig::default());
        assert_eq!(slots.len(), 2);
        assert_eq!(slots[0].end_at, dt(2025, 6, 2, 9, 0));
        assert_eq!(slots[1].start_at, dt(2025, 6, 2, 12, 0));
    }

    #[test]
    fn busy_outside_the_workday_shrinks_naturally() {
        let busy = [
            occupation("early", dt(2025, 6, 2, 5, 0), dt(2025, 6, 2, 9, 0)),
            occupation("late", dt(2025, 6, 2, 21, 0), dt(2025, 6, 2, 23, 30)),
        ];
        let slots = free_slots_in_day(monday(), offset(), &busy, &[], &SchedulerConfig::default());
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_at, dt(2025, 6, 2, 9, 0));
        assert_eq!(slots[0].end_at, dt(2025, 6, 2, 21, 0));
    }

    #[test]
    fn friday_closes_at_seventeen() {
        let friday = NaiveDate::from_ymd_opt(2025, 6, 6).expect("date");
        let slots = free_slots_in_day(friday, offset(), &[], &[], &SchedulerConfig::default());
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].end_at, dt(2025, 6, 6, 17, 0));
    }

    #[test]
    fn sunday_has_no_slots() {
        let sunday = NaiveDate::from_ymd_opt(2025, 6, 8).expect("date");
        let slots = free_slots_in_day(sunday, offset(), &[], &[], &SchedulerConfig::default());
        assert!(slots.is_empty());
    }

    #[test]
    fn placed_blocks_count_as_busy() {
        let block = PlacedBlock {
            id: PlacedBlock::block_id("item-1", 0),
            item_id: "item-1".to_string(),
            title: "Deep work".to_string(),
            start_at: dt(2025, 6, 2, 8, 0),
            end_at: dt(2025, 6, 2, 9, 30),
            duration_minutes: 90,
            priority_tier: crate::models::item::PriorityTier::Core,
            chunk_index: 0,
            total_chunks: 1,
            is_virtual: false,
            is_completed: false,
        };
        let slots =
            free_slots_in_day(monday(), offset(), &[], &[block], &SchedulerConfig::default());
        assert_eq!(slots.len(), 1);
        assert_eq!(slots[0].start_at, dt(2025, 6, 2, 9, 30));
    }

    #[test]
    fn day_fully_occupied_yields_nothing() {
        let busy = [occupation(
            "all-day",
            dt(2025, 6, 2, 7, 0),
            dt(2025, 6, 2, 22, 0),
        )];
        let slots = free_slots_in_day(monday(), offset(), &busy, &[], &SchedulerConfig::default());
        assert!(slots.is_empty());
    }
}
