pub mod types;
pub mod weekday;
pub mod slot_utils;
pub mod rotation;
pub mod resolver;
pub mod generate;

pub use types::{CaptainId, EligibleCaptain, FixedAssignment, Restriction, Strategy, TimeSlot, WeekdaySet};
pub use weekday::{dates_between, parse_date, weekday_name, weekday_of};
pub use slot_utils::{find_slot, slot_display, validate_time_slots};
pub use rotation::{RotationCursor, GLOBAL_KEY};
pub use resolver::{find_fixed, resolve, resolve_on_weekday, resolve_with_rng, ResolveOptions};
pub use generate::{fill_schedule, generate_period, Gap, GenerateOptions, PeriodSchedule, RotationScope, ScheduleEntry};
