use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, FixedOffset, NaiveDate};
use tracing::{debug, info, warn};

use crate::models::item::Item;
use crate::models::occupation::Occupation;
use crate::models::schedule::{
    FreeSlot, PlacedBlock, ScheduleResult, ScheduleWarning, WarningKind,
};
use crate::models::settings::SchedulerConfig;
use crate::services::schedule_utils;
use crate::services::scoring;
use crate::services::slot_finder::{self, MIN_SLOT_MINUTES};
use crate::services::task_chunker::{self, Chunk};

/// Assignments may spill into family time only when the deadline falls
/// within this many minutes of the day being searched.
const FAMILY_OVERRIDE_WINDOW_MINUTES: i64 = 24 * 60;

type VelocityKey = (NaiveDate, String);

struct PlacementContext<'a> {
    now: DateTime<FixedOffset>,
    today: NaiveDate,
    offset: FixedOffset,
    occupations: &'a [Occupation],
    config: &'a SchedulerConfig,
}

/// Produce a concrete schedule for `items` around `occupations`. Pure and
/// total: identical inputs always yield identical output, and malformed
/// inputs degrade to identity instead of failing.
pub fn generate_schedule(
    now: DateTime<FixedOffset>,
    occupations: &[Occupation],
    items: &[Item],
    config: &SchedulerConfig,
) -> ScheduleResult {
    let config = config.clone().normalize();
    let offset = *now.offset();
    let today = now.date_naive();

    let occupations: Vec<Occupation> = occupations
        .iter()
        .filter(|occupation| {
            if occupation.end_at <= occupation.start_at {
                warn!(occupation_id = %occupation.id, "skipping occupation with non-positive interval");
                false
            } else {
                true
            }
        })
        .cloned()
        .collect();

    let items: Vec<Item> = items
        .iter()
        .filter(|item| {
            if item.duration_minutes <= 0 {
                warn!(item_id = %item.id, "skipping item with non-positive duration");
                false
            } else {
                true
            }
        })
        .cloned()
        .collect();

    info!(
        items = items.len(),
        occupations = occupations.len(),
        %today,
        "generating schedule"
    );

    let ctx = PlacementContext {
        now,
        today,
        offset,
        occupations: &occupations,
        config: &config,
    };

    let mut blocks: Vec<PlacedBlock> = Vec::new();
    let mut warnings: Vec<ScheduleWarning> = Vec::new();
    let mut overloaded: Vec<String> = Vec::new();
    let mut placed_ids: BTreeSet<String> = BTreeSet::new();
    let mut velocity: BTreeMap<VelocityKey, usize> = BTreeMap::new();

    // Pass 1: pinned items land first, exactly where the user put them.
    // Pinning is a user assertion, so no collision checks; the pinned block
    // simply becomes a busy region for everything that follows.
    let mut pinned: Vec<&Item> = items
        .iter()
        .filter(|item| item.pinned_start.is_some())
        .collect();
    pinned.sort_by(|a, b| {
        a.pinned_start
            .cmp(&b.pinned_start)
            .then_with(|| a.id.cmp(&b.id))
    });
    for item in pinned {
        let Some(start_at) = item.pinned_start else {
            continue;
        };
        let end_at = schedule_utils::add_minutes(start_at, item.duration_minutes);
        blocks.push(make_block(item, 0, 1, start_at, end_at, today, &config));
        if let Some(goal_id) = &item.goal_id {
            *velocity
                .entry((start_at.date_naive(), goal_id.clone()))
                .or_insert(0) += 1;
        }
        placed_ids.insert(item.id.clone());
        debug!(item_id = %item.id, start = %start_at, "pinned block laid down");
    }

    // Pass 2: floating items in priority order.
    let mut floating: Vec<&Item> = items
        .iter()
        .filter(|item| item.pinned_start.is_none())
        .collect();
    scoring::sort_by_priority(&mut floating, now);

    for item in floating {
        if !item.depends_on.iter().all(|dep| placed_ids.contains(dep)) {
            debug!(item_id = %item.id, "dependencies unplaced, skipping");
            continue;
        }
        // An item never starts before the last block of anything it
        // depends on has finished.
        let earliest_start = item
            .depends_on
            .iter()
            .flat_map(|dep| blocks.iter().filter(move |block| &block.item_id == dep))
            .map(|block| block.end_at)
            .max();

        let chunks = task_chunker::chunk_item(item, now, config.planning_horizon_days);

        let mut staged_blocks: Vec<PlacedBlock> = Vec::new();
        let mut staged_velocity: BTreeMap<VelocityKey, usize> = BTreeMap::new();
        let mut staged_warnings: Vec<ScheduleWarning> = Vec::new();
        let mut all_placed = true;

        for chunk in &chunks {
            let mut placed_view = blocks.clone();
            placed_view.extend(staged_blocks.iter().cloned());
            match place_chunk(
                &ctx,
                item,
                chunk,
                earliest_start,
                &placed_view,
                &velocity,
                &staged_velocity,
                &mut staged_warnings,
            ) {
                Some(block) => {
                    if let Some(goal_id) = &item.goal_id {
                        *staged_velocity
                            .entry((block.start_at.date_naive(), goal_id.clone()))
                            .or_insert(0) += 1;
                    }
                    staged_blocks.push(block);
                }
                None => {
                    all_placed = false;
                    break;
                }
            }
        }

        if all_placed {
            if let Some(deadline) = item.deadline {
                if staged_blocks.iter().any(|block| block.end_at > deadline) {
                    staged_warnings.push(ScheduleWarning::new(
                        WarningKind::DeadlineAtRisk,
                        format!("\"{}\" runs past its deadline", item.title),
                        Some(item.id.clone()),
                    ));
                }
            }
            debug!(item_id = %item.id, chunks = staged_blocks.len(), "item placed");
            for (key, count) in staged_velocity {
                *velocity.entry(key).or_insert(0) += count;
            }
            blocks.extend(staged_blocks);
            warnings.extend(staged_warnings);
            placed_ids.insert(item.id.clone());
        } else {
            // All-or-nothing: a partially placeable item emits no blocks,
            // it is reported instead.
            debug!(item_id = %item.id, "item overloaded");
            overloaded.push(item.id.clone());
            warnings.push(ScheduleWarning::new(
                WarningKind::Overloaded,
                format!(
                    "\"{}\" could not be fully placed before its deadline or the horizon",
                    item.title
                ),
                Some(item.id.clone()),
            ));
        }
    }

    audit_anti_cramming(&items, &placed_ids, &blocks, &mut warnings);

    blocks.sort_by(|a, b| a.start_at.cmp(&b.start_at).then_with(|| a.id.cmp(&b.id)));

    debug!(
        blocks = blocks.len(),
        overloaded = overloaded.len(),
        warnings = warnings.len(),
        "schedule generated"
    );

    ScheduleResult {
        blocks,
        overloaded,
        warnings,
    }
}

/// Search for a home for one chunk: day by day from its preferred day,
/// regular slots by score, family slots only under the override.
#[allow(clippy::too_many_arguments)]
fn place_chunk(
    ctx: &PlacementContext,
    item: &Item,
    chunk: &Chunk,
    earliest_start: Option<DateTime<FixedOffset>>,
    placed_view: &[PlacedBlock],
    committed_velocity: &BTreeMap<VelocityKey, usize>,
    staged_velocity: &BTreeMap<VelocityKey, usize>,
    staged_warnings: &mut Vec<ScheduleWarning>,
) -> Option<PlacedBlock> {
    let mut day = chunk.preferred_day.max(ctx.today);
    if let Some(earliest) = earliest_start {
        day = day.max(earliest.date_naive());
    }

    let horizon_last_day = ctx.today + Duration::days(ctx.config.planning_horizon_days - 1);
    let last_day = item
        .deadline
        .map(|deadline| deadline.date_naive())
        .unwrap_or(horizon_last_day)
        .min(horizon_last_day);

    while day <= last_day {
        if schedule_utils::is_sunday(day) {
            day = day + Duration::days(1);
            continue;
        }
        if let Some(goal_id) = &item.goal_id {
            let key = (day, goal_id.clone());
            let used = committed_velocity.get(&key).copied().unwrap_or(0)
                + staged_velocity.get(&key).copied().unwrap_or(0);
            if used >= ctx.config.max_items_per_goal_per_day {
                debug!(item_id = %item.id, goal_id = %goal_id, %day, "velocity cap reached");
                day = day + Duration::days(1);
                continue;
            }
        }

        // Clamp slots to `now` on the first day and to the dependency
        // finish line, then drop anything too narrow to hold real work.
        let mut slots: Vec<FreeSlot> = Vec::new();
        for slot in slot_finder::free_slots_in_day(
            day,
            ctx.offset,
            ctx.occupations,
            placed_view,
            ctx.config,
        ) {
            let mut start_at = slot.start_at;
            if day == ctx.today && start_at < ctx.now {
                start_at = ctx.now;
            }
            if let Some(earliest) = earliest_start {
                if start_at < earliest {
                    start_at = earliest;
                }
            }
            if schedule_utils::minutes_between(start_at, slot.end_at) < MIN_SLOT_MINUTES {
                continue;
            }
            slots.push(FreeSlot {
                start_at,
                end_at: slot.end_at,
            });
        }

        let (mut regular, family): (Vec<FreeSlot>, Vec<FreeSlot>) = slots
            .into_iter()
            .partition(|slot| slot.start_hour() < ctx.config.family_time_start_hour);

        regular.sort_by(|a, b| {
            scoring::score_slot(b, item, chunk.duration_minutes, ctx.config)
                .cmp(&scoring::score_slot(a, item, chunk.duration_minutes, ctx.config))
                .then_with(|| a.start_at.cmp(&b.start_at))
        });

        for slot in &regular {
            if slot.duration_minutes() >= chunk.duration_minutes {
                let end_at = schedule_utils::add_minutes(slot.start_at, chunk.duration_minutes);
                return Some(make_block(
                    item,
                    chunk.chunk_index,
                    chunk.total_chunks,
                    slot.start_at,
                    end_at,
                    ctx.today,
                    ctx.config,
                ));
            }
        }

        // Family-Time override: an assignment due within a day may borrow
        // protected time, but only when the day offered no regular slot at
        // all, and always with a warning.
        if regular.is_empty() && item.is_assignment {
            if let Some(deadline) = item.deadline {
                let day_start = schedule_utils::at_hour(day, ctx.offset, 0.0);
                if schedule_utils::minutes_between(day_start, deadline)
                    <= FAMILY_OVERRIDE_WINDOW_MINUTES
                {
                    for slot in &family {
                        if slot.duration_minutes() >= chunk.duration_minutes {
                            let end_at =
                                schedule_utils::add_minutes(slot.start_at, chunk.duration_minutes);
                            warn!(item_id = %item.id, %day, "assignment placed into family time");
                            staged_warnings.push(ScheduleWarning::new(
                                WarningKind::FamilyTimeCompromised,
                                format!(
                                    "\"{}\" was placed into family time to meet its deadline",
                                    item.title
                                ),
                                Some(item.id.clone()),
                            ));
                            return Some(make_block(
                                item,
                                chunk.chunk_index,
                                chunk.total_chunks,
                                slot.start_at,
                                end_at,
                                ctx.today,
                                ctx.config,
                            ));
                        }
                    }
                }
            }
        }

        day = day + Duration::days(1);
    }

    None
}

fn make_block(
    item: &Item,
    chunk_index: u32,
    total_chunks: u32,
    start_at: DateTime<FixedOffset>,
    end_at: DateTime<FixedOffset>,
    today: NaiveDate,
    config: &SchedulerConfig,
) -> PlacedBlock {
    let is_virtual =
        (start_at.date_naive() - today).num_days() > config.planning_horizon_days;
    PlacedBlock {
        id: PlacedBlock::block_id(&item.id, chunk_index),
        item_id: item.id.clone(),
        title: item.title.clone(),
        start_at,
        end_at,
        duration_minutes: schedule_utils::minutes_between(start_at, end_at),
        priority_tier: item.priority_tier,
        chunk_index,
        total_chunks,
        is_virtual,
        is_completed: item.is_completed(),
    }
}

/// The chunker's deadline-day cap is advisory per chunk; this audit
/// guarantees the warning surface whenever more than half of a split item
/// still lands on its deadline day.
fn audit_anti_cramming(
    items: &[Item],
    placed_ids: &BTreeSet<String>,
    blocks: &[PlacedBlock],
    warnings: &mut Vec<ScheduleWarning>,
) {
    for item in items {
        let Some(deadline) = item.deadline else {
            continue;
        };
        if !placed_ids.contains(&item.id) {
            continue;
        }
        let item_blocks: Vec<&PlacedBlock> = blocks
            .iter()
            .filter(|block| block.item_id == item.id)
            .collect();
        if item_blocks.iter().all(|block| block.total_chunks <= 1) {
            continue;
        }
        let deadline_day = deadline.date_naive();
        let total: i64 = item_blocks.iter().map(|block| block.duration_minutes).sum();
        let on_deadline_day: i64 = item_blocks
            .iter()
            .filter(|block| block.start_at.date_naive() == deadline_day)
            .map(|block| block.duration_minutes)
            .sum();
        if total > 0 && on_deadline_day * 2 > total {
            warnings.push(ScheduleWarning::new(
                WarningKind::AntiCrammingViolated,
                format!(
                    "more than half of \"{}\" landed on its deadline day",
                    item.title
                ),
                Some(item.id.clone()),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::item::{ItemStatus, PriorityTier};
    use chrono::{NaiveDate, TimeZone};

    fn dt(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<FixedOffset> {
        let offset = FixedOffset::east_opt(0).expect("offset");
        let naive = NaiveDate::from_ymd_opt(year, month, day)
            .expect("valid date")
            .and_hms_opt(hour, minute, 0)
            .expect("valid time");
        offset
            .from_local_datetime(&naive)
            .single()
            .expect("valid datetime")
    }

    // 2025-06-02 is a Monday.
    fn monday_midnight() -> DateTime<FixedOffset> {
        dt(2025, 6, 2, 0, 0)
    }

    #[test]
    fn single_item_lands_at_the_start_of_the_workday() {
        let items = [Item::new("item-1", "Write summary", 60)];
        let result = generate_schedule(
            monday_midnight(),
            &[],
            &items,
            &SchedulerConfig::default(),
        );
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks[0].start_at, dt(2025, 6, 2, 8, 0));
        assert_eq!(result.blocks[0].end_at, dt(2025, 6, 2, 9, 0));
        assert_eq!(result.blocks[0].id, "item-1#0");
        assert!(result.overloaded.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn completed_items_pass_through_flagged() {
        let items = [
            Item::new("done-1", "Already done", 30).with_status(ItemStatus::Completed),
            Item::new("todo-1", "Still open", 30),
        ];
        let result = generate_schedule(
            monday_midnight(),
            &[],
            &items,
            &SchedulerConfig::default(),
        );
        assert_eq!(result.blocks.len(), 2);
        let done = result
            .blocks
            .iter()
            .find(|block| block.item_id == "done-1")
            .expect("completed block");
        assert!(done.is_completed);
        let open = result
            .blocks
            .iter()
            .find(|block| block.item_id == "todo-1")
            .expect("open block");
        assert!(!open.is_completed);
    }

    #[test]
    fn velocity_cap_pushes_goal_work_to_the_next_day() {
        let items: Vec<Item> = (1..=4)
            .map(|i| Item::new(format!("item-{i}"), format!("Goal work {i}"), 30).with_goal("goal-1"))
            .collect();
        let result = generate_schedule(
            monday_midnight(),
            &[],
            &items,
            &SchedulerConfig::default(),
        );
        assert_eq!(result.blocks.len(), 4);
        let monday = NaiveDate::from_ymd_opt(2025, 6, 2).expect("date");
        let tuesday = NaiveDate::from_ymd_opt(2025, 6, 3).expect("date");
        let on_monday = result
            .blocks
            .iter()
            .filter(|block| block.start_at.date_naive() == monday)
            .count();
        let on_tuesday = result
            .blocks
            .iter()
            .filter(|block| block.start_at.date_naive() == tuesday)
            .count();
        assert_eq!(on_monday, 3);
        assert_eq!(on_tuesday, 1);
    }

    #[test]
    fn pinned_blocks_seed_the_velocity_counter() {
        let mut items: Vec<Item> = (1..=3)
            .map(|i| {
                Item::new(format!("pinned-{i}"), format!("Standup {i}"), 30)
                    .with_goal("goal-1")
                    .pinned_at(dt(2025, 6, 2, 8 + i, 0))
            })
            .collect();
        items.push(Item::new("floating-1", "Goal overflow", 30).with_goal("goal-1"));

        let result = generate_schedule(
            monday_midnight(),
            &[],
            &items,
            &SchedulerConfig::default(),
        );
        let floating = result
            .blocks
            .iter()
            .find(|block| block.item_id == "floating-1")
            .expect("floating block");
        assert_eq!(
            floating.start_at.date_naive(),
            NaiveDate::from_ymd_opt(2025, 6, 3).expect("date")
        );
    }

    #[test]
    fn unmet_dependency_skips_the_item_silently() {
        let items = [Item::new("item-1", "Blocked", 30).with_dependency("missing")];
        let result = generate_schedule(
            monday_midnight(),
            &[],
            &items,
            &SchedulerConfig::default(),
        );
        assert!(result.blocks.is_empty());
        assert!(result.overloaded.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn deadline_at_risk_is_reported_when_a_block_runs_past_it() {
        // The workday opens at 08:00; a one-hour block cannot end by 08:30.
        let items = [Item::new("item-1", "Early submission", 60)
            .with_deadline(dt(2025, 6, 2, 8, 30))];
        let result = generate_schedule(
            monday_midnight(),
            &[],
            &items,
            &SchedulerConfig::default(),
        );
        assert_eq!(result.blocks.len(), 1);
        assert!(result.has_warning(WarningKind::DeadlineAtRisk, "item-1"));
    }

    #[test]
    fn invalid_inputs_degrade_to_identity() {
        let occupations = [Occupation::new(
            "broken",
            "Ends before it starts",
            dt(2025, 6, 2, 12, 0),
            dt(2025, 6, 2, 10, 0),
        )];
        let items = [
            Item::new("zero", "No duration", 0),
            Item::new("fine", "Real work", 30),
        ];
        let result = generate_schedule(
            monday_midnight(),
            &occupations,
            &items,
            &SchedulerConfig::default(),
        );
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks[0].item_id, "fine");
    }

    #[test]
    fn cramming_on_the_deadline_day_is_audited() {
        // Deadline on the planning day itself: the chunker cannot spread,
        // everything lands today and the audit fires.
        let items = [Item::new("item-1", "Last minute", 240)
            .splittable()
            .with_deadline(dt(2025, 6, 2, 23, 59))];
        let result = generate_schedule(
            monday_midnight(),
            &[],
            &items,
            &SchedulerConfig::default(),
        );
        assert_eq!(result.blocks.len(), 3);
        assert!(result.has_warning(WarningKind::AntiCrammingViolated, "item-1"));
    }

    #[test]
    fn pinned_block_beyond_the_horizon_is_virtual() {
        let items = [
            Item::new("far", "Future review", 60).pinned_at(dt(2025, 6, 12, 10, 0)),
            Item::new("near", "This week", 60).pinned_at(dt(2025, 6, 4, 10, 0)),
        ];
        let result = generate_schedule(
            monday_midnight(),
            &[],
            &items,
            &SchedulerConfig::default(),
        );
        let far = result
            .blocks
            .iter()
            .find(|block| block.item_id == "far")
            .expect("far block");
        let near = result
            .blocks
            .iter()
            .find(|block| block.item_id == "near")
            .expect("near block");
        assert!(far.is_virtual);
        assert!(!near.is_virtual);
    }

    #[test]
    fn backlog_items_yield_to_critical_ones_under_contention() {
        // One three-hour window; only one of the two items fits.
        let occupations = [Occupation::new(
            "wall",
            "Meetings",
            dt(2025, 6, 2, 11, 0),
            dt(2025, 6, 2, 22, 0),
        )];
        let items = [
            Item::new("b-backlog", "Someday", 180)
                .with_tier(PriorityTier::Backlog)
                .with_deadline(dt(2025, 6, 2, 23, 59)),
            Item::new("a-critical", "Now", 180)
                .with_tier(PriorityTier::Critical)
                .with_deadline(dt(2025, 6, 2, 23, 59)),
        ];
        let result = generate_schedule(
            monday_midnight(),
            &occupations,
            &items,
            &SchedulerConfig::default(),
        );
        assert_eq!(result.blocks.len(), 1);
        assert_eq!(result.blocks[0].item_id, "a-critical");
        assert_eq!(result.overloaded, vec!["b-backlog".to_string()]);
        assert!(result.has_warning(WarningKind::Overloaded, "b-backlog"));
    }
}
