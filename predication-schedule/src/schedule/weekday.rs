use chrono::{Datelike, NaiveDate};

use crate::error::{Result, ScheduleError};

const SHORT_NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// Parses a plain calendar date ("YYYY-MM-DD").
///
/// A trailing time component ("2024-03-10T18:00:00Z", "2024-03-10 08:00") is ignored:
/// the value is never turned into an instant, so no timezone offset can move it to a
/// neighbouring day.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let trimmed = value.trim();
    let date_part = trimmed
        .split(|c: char| c == 'T' || c == ' ')
        .next()
        .unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ScheduleError::InvalidDate(value.to_string()))
}

/// Weekday index, 0 = Sunday .. 6 = Saturday
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn weekday_name(weekday: u8) -> &'static str {
    SHORT_NAMES.get(weekday as usize).copied().unwrap_or("???")
}

/// All dates from `from` to `to`, both inclusive
pub fn dates_between(from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>> {
    if from > to {
        return Err(ScheduleError::InvalidRange {
            from: from.to_string(),
            to: to.to_string(),
        });
    }
    Ok(from.iter_days().take_while(|d| *d <= to).collect())
}
