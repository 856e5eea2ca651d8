use std::collections::HashSet;

use crate::error::{Result, ScheduleError};
use super::types::TimeSlot;

/// Parses a time string (HH:MM) to minutes since midnight
pub fn parse_time_to_minutes(time_str: &str) -> Option<u32> {
    let parts: Vec<&str> = time_str.trim().split(':').collect();
    if parts.len() != 2 {
        return None;
    }
    let hours: u32 = parts[0].parse().ok()?;
    let minutes: u32 = parts[1].parse().ok()?;
    if hours >= 24 || minutes >= 60 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Formats minutes since midnight to time string (HH:MM)
pub fn minutes_to_time_string(minutes: u32) -> String {
    let hours = minutes / 60;
    let mins = minutes % 60;
    format!("{:02}:{:02}", hours % 24, mins)
}

/// Checks configured time slots: unique ids, valid start times, weekdays in 0..=6
pub fn validate_time_slots(slots: &[TimeSlot]) -> Result<()> {
    let mut seen = HashSet::new();
    for slot in slots {
        if slot.id.trim().is_empty() {
            return Err(ScheduleError::Validation("time slot id must not be empty".to_string()));
        }
        if !seen.insert(slot.id.as_str()) {
            return Err(ScheduleError::Validation(format!("duplicate time slot id '{}'", slot.id)));
        }
        if parse_time_to_minutes(&slot.start).is_none() {
            return Err(ScheduleError::InvalidTime(slot.start.clone()));
        }
        if let Some(day) = slot.weekdays.iter().find(|&&d| d > 6) {
            return Err(ScheduleError::Validation(format!(
                "time slot '{}' has invalid weekday {}",
                slot.id, day
            )));
        }
    }
    Ok(())
}

pub fn find_slot<'a>(slots: &'a [TimeSlot], id: &str) -> Result<&'a TimeSlot> {
    slots
        .iter()
        .find(|s| s.id == id)
        .ok_or_else(|| ScheduleError::UnknownTimeSlot(id.to_string()))
}

/// Display label for a slot: "HH:MM Label", or just the time when there is no label
pub fn slot_display(slot: &TimeSlot) -> String {
    let time = parse_time_to_minutes(&slot.start)
        .map(minutes_to_time_string)
        .unwrap_or_else(|| slot.start.clone());
    if slot.label.is_empty() {
        time
    } else {
        format!("{} {}", time, slot.label)
    }
}
