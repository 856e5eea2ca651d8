use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::NaiveDate;
use log::{info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::resolver::{find_fixed, resolve_on_weekday, ResolveOptions};
use super::rotation::{RotationCursor, GLOBAL_KEY};
use super::types::{CaptainId, EligibleCaptain, FixedAssignment, Strategy, TimeSlot};
use super::weekday::{dates_between, weekday_of};
use crate::error::Result;

/// Whether each weekday + slot pair keeps its own rotation or all slots share one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationScope {
    #[default]
    PerSlot,
    Global,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions {
    pub strategy: Strategy,
    pub rotation_scope: RotationScope,
    /// Nobody leads two outings on the same date (fixed assignments excepted)
    pub one_outing_per_day: bool,
}

/// One cell of the schedule grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub date: NaiveDate,
    pub time_slot_id: String,
    pub captain_id: Option<CaptainId>,
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    pub date: NaiveDate,
    pub time_slot_id: String,
}

/// Schedule for a period, ordered by date and then by slot configuration order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodSchedule {
    pub entries: Vec<ScheduleEntry>,
    pub gaps: Vec<Gap>, // cells no captain could be found for
}

impl PeriodSchedule {
    /// Empty grid with one cell per date and slot running on that date
    pub fn empty_grid(from: NaiveDate, to: NaiveDate, slots: &[TimeSlot]) -> Result<PeriodSchedule> {
        let mut entries = Vec::new();
        for date in dates_between(from, to)? {
            let weekday = weekday_of(date);
            for slot in slots.iter().filter(|s| s.runs_on(weekday)) {
                entries.push(ScheduleEntry {
                    date,
                    time_slot_id: slot.id.clone(),
                    captain_id: None,
                    fixed: false,
                });
            }
        }
        Ok(PeriodSchedule {
            entries,
            gaps: Vec::new(),
        })
    }

    pub fn filled_count(&self) -> usize {
        self.entries.iter().filter(|e| e.captain_id.is_some()).count()
    }

    /// Number of outings per captain, sorted by captain id
    pub fn captain_counts(&self) -> BTreeMap<CaptainId, u32> {
        let mut counts = BTreeMap::new();
        for id in self.entries.iter().filter_map(|e| e.captain_id.as_ref()) {
            *counts.entry(id.clone()).or_insert(0) += 1;
        }
        counts
    }
}

/// Builds the grid for `from..=to` and fills every cell
pub fn generate_period<R: Rng + ?Sized>(
    from: NaiveDate,
    to: NaiveDate,
    slots: &[TimeSlot],
    fixed_assignments: &[FixedAssignment],
    captains: &[EligibleCaptain],
    options: GenerateOptions,
    cursor: &mut RotationCursor,
    rng: &mut R,
) -> Result<PeriodSchedule> {
    let mut schedule = PeriodSchedule::empty_grid(from, to, slots)?;
    fill_schedule(&mut schedule, fixed_assignments, captains, options, cursor, rng);
    info!(
        "generated {} to {}: {} outings, {} filled, {} gaps",
        from,
        to,
        schedule.entries.len(),
        schedule.filled_count(),
        schedule.gaps.len()
    );
    Ok(schedule)
}

/// Fills the empty cells of an existing schedule; cells that already have a captain stay as they are.
///
/// Cells are visited in grid order so that rotation results are reproducible for the same cursor.
pub fn fill_schedule<R: Rng + ?Sized>(
    schedule: &mut PeriodSchedule,
    fixed_assignments: &[FixedAssignment],
    captains: &[EligibleCaptain],
    options: GenerateOptions,
    cursor: &mut RotationCursor,
    rng: &mut R,
) {
    // Captains already busy per date: existing cells plus that day's fixed assignments
    let mut taken: HashMap<NaiveDate, HashSet<CaptainId>> = HashMap::new();
    for entry in &schedule.entries {
        let weekday = weekday_of(entry.date);
        let day = taken.entry(entry.date).or_default();
        if let Some(id) = &entry.captain_id {
            day.insert(id.clone());
        } else if let Some(fixed) = find_fixed(fixed_assignments, weekday, &entry.time_slot_id) {
            day.insert(fixed.captain_id.clone());
        }
    }

    let rotation_key = match options.rotation_scope {
        RotationScope::Global => Some(GLOBAL_KEY),
        RotationScope::PerSlot => None,
    };

    schedule.gaps.clear();
    for entry in schedule.entries.iter_mut() {
        if entry.captain_id.is_some() {
            continue;
        }
        let weekday = weekday_of(entry.date);
        let day_taken = taken.entry(entry.date).or_default();
        let exclude = if options.one_outing_per_day {
            Some(&*day_taken)
        } else {
            None
        };

        let picked = resolve_on_weekday(
            weekday,
            &entry.time_slot_id,
            fixed_assignments,
            captains,
            ResolveOptions {
                strategy: options.strategy,
                rotation: Some(&mut *cursor),
                exclude,
                rotation_key,
            },
            rng,
        );

        match picked {
            Some(id) => {
                entry.fixed = find_fixed(fixed_assignments, weekday, &entry.time_slot_id)
                    .map_or(false, |f| f.captain_id == id);
                day_taken.insert(id.clone());
                entry.captain_id = Some(id);
            }
            None => {
                warn!("no captain available for {} slot {}", entry.date, entry.time_slot_id);
                schedule.gaps.push(Gap {
                    date: entry.date,
                    time_slot_id: entry.time_slot_id.clone(),
                });
            }
        }
    }
}
