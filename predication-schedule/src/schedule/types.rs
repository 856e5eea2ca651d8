use serde::{Deserialize, Serialize};

pub type CaptainId = String;

/// Set of weekdays as a bitmask, bit `d` set for weekday `d` (0 = Sunday .. 6 = Saturday)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const ALL: WeekdaySet = WeekdaySet(0b111_1111);

    pub fn from_days(days: &[u8]) -> WeekdaySet {
        WeekdaySet(days.iter().filter(|&&d| d < 7).fold(0, |mask, &d| mask | (1 << d)))
    }

    pub fn contains(self, weekday: u8) -> bool {
        weekday < 7 && self.0 & (1 << weekday) != 0
    }
}

/// Which weekdays a captain may lead an outing on.
///
/// Any value not recognised on the wire falls back to `Unrestricted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Restriction {
    #[serde(rename = "solo_fines_semana")]
    WeekendsOnly,
    #[serde(rename = "solo_entre_semana")]
    WeekdaysOnly,
    #[serde(rename = "solo_sabados")]
    SaturdaysOnly,
    #[serde(rename = "solo_domingos")]
    SundaysOnly,
    #[default]
    #[serde(rename = "sin_restriccion")]
    #[serde(other)]
    Unrestricted,
}

impl Restriction {
    pub fn allowed_days(self) -> WeekdaySet {
        match self {
            Restriction::Unrestricted => WeekdaySet::ALL,
            Restriction::WeekendsOnly => WeekdaySet::from_days(&[0, 6]),
            Restriction::WeekdaysOnly => WeekdaySet::from_days(&[1, 2, 3, 4, 5]),
            Restriction::SaturdaysOnly => WeekdaySet::from_days(&[6]),
            Restriction::SundaysOnly => WeekdaySet::from_days(&[0]),
        }
    }

    pub fn allows(self, weekday: u8) -> bool {
        self.allowed_days().contains(weekday)
    }

    /// Parses a stored restriction value, treating anything unknown as unrestricted
    pub fn parse_lossy(value: &str) -> Restriction {
        match value.trim().to_lowercase().as_str() {
            "solo_fines_semana" => Restriction::WeekendsOnly,
            "solo_entre_semana" => Restriction::WeekdaysOnly,
            "solo_sabados" => Restriction::SaturdaysOnly,
            "solo_domingos" => Restriction::SundaysOnly,
            _ => Restriction::Unrestricted,
        }
    }
}

/// Roster member who may lead an outing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EligibleCaptain {
    pub id: CaptainId,
    pub name: String,
    #[serde(default)]
    pub restriction: Restriction,
}

impl EligibleCaptain {
    pub fn new(id: &str, restriction: Restriction) -> EligibleCaptain {
        EligibleCaptain {
            id: id.to_string(),
            name: id.to_string(),
            restriction,
        }
    }
}

/// Standing override binding a captain to a weekday + time slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixedAssignment {
    pub id: u32,
    pub weekday: u8,
    pub time_slot_id: String,
    pub captain_id: CaptainId,
    pub active: bool,
}

/// A recurring outing time, e.g. Tuesday and Thursday at 09:30
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub id: String,
    pub start: String,
    #[serde(default)]
    pub label: String,
    /// Weekdays the slot runs on; empty means every day
    #[serde(default)]
    pub weekdays: Vec<u8>,
}

impl TimeSlot {
    pub fn runs_on(&self, weekday: u8) -> bool {
        self.weekdays.is_empty() || WeekdaySet::from_days(&self.weekdays).contains(weekday)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Rotation,
    Random,
}
