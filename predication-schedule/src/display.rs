use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;

use crate::error::Result;
use crate::parser::RosterMember;
use crate::schedule::{slot_display, weekday_name, weekday_of, PeriodSchedule, ScheduleEntry, TimeSlot};

/// Roster names by id, for turning captain ids into display names
pub fn name_lookup(roster: &[RosterMember]) -> HashMap<&str, &str> {
    roster.iter().map(|m| (m.id.as_str(), m.name.as_str())).collect()
}

/// Formats a captain name, falling back to the id for people not on the roster
pub fn format_captain_name(captain_id: &str, names: &HashMap<&str, &str>) -> String {
    names
        .get(captain_id)
        .map(|name| name.to_string())
        .unwrap_or_else(|| captain_id.to_string())
}

fn slot_label(slot_id: &str, slots: &[TimeSlot]) -> String {
    slots
        .iter()
        .find(|s| s.id == slot_id)
        .map(slot_display)
        .unwrap_or_else(|| slot_id.to_string())
}

/// One schedule line: `YYYY-MM-DD Tue 09:30 Label -> Name` or `... [EMPTY]`
pub fn format_entry(entry: &ScheduleEntry, slots: &[TimeSlot], names: &HashMap<&str, &str>) -> String {
    let head = format!(
        "{} {} {}",
        entry.date,
        weekday_name(weekday_of(entry.date)),
        slot_label(&entry.time_slot_id, slots)
    );
    match &entry.captain_id {
        Some(id) => {
            let marker = if entry.fixed { " (fixed)" } else { "" };
            format!("{} -> {}{}", head, format_captain_name(id, names), marker)
        }
        None => format!("{} [EMPTY]", head),
    }
}

/// Writes a schedule to a text file, one outing per line
pub fn write_schedule_to_file(
    title: &str,
    schedule: &PeriodSchedule,
    slots: &[TimeSlot],
    roster: &[RosterMember],
    path: &Path,
) -> Result<()> {
    let names = name_lookup(roster);
    let mut file = File::create(path)?;

    writeln!(file, "** {} **", title)?;
    for entry in &schedule.entries {
        writeln!(file, "{}", format_entry(entry, slots, &names))?;
    }

    Ok(())
}

/// Writes a schedule as CSV: `date,weekday,time_slot,captain_id,captain,fixed`
pub fn write_schedule_csv(
    schedule: &PeriodSchedule,
    slots: &[TimeSlot],
    roster: &[RosterMember],
    path: &Path,
) -> Result<()> {
    let names = name_lookup(roster);
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(["date", "weekday", "time_slot", "captain_id", "captain", "fixed"])?;
    for entry in &schedule.entries {
        let captain_id = entry.captain_id.clone().unwrap_or_default();
        let captain = entry
            .captain_id
            .as_deref()
            .map(|id| format_captain_name(id, &names))
            .unwrap_or_default();
        wtr.write_record(&[
            entry.date.to_string(),
            weekday_name(weekday_of(entry.date)).to_string(),
            slot_label(&entry.time_slot_id, slots),
            captain_id,
            captain,
            entry.fixed.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Prints a schedule in a readable format
pub fn print_period_schedule(title: &str, schedule: &PeriodSchedule, slots: &[TimeSlot], roster: &[RosterMember]) {
    let names = name_lookup(roster);

    println!("\n=== {} ===", title);
    println!(
        "Outings: {}, assigned: {}",
        schedule.entries.len(),
        schedule.filled_count()
    );

    if !schedule.gaps.is_empty() {
        println!("⚠️  Outings without captain ({}):", schedule.gaps.len());
        for gap in &schedule.gaps {
            println!(
                "  - {} {} {}",
                gap.date,
                weekday_name(weekday_of(gap.date)),
                slot_label(&gap.time_slot_id, slots)
            );
        }
    }

    println!();
    for entry in &schedule.entries {
        println!("  {}", format_entry(entry, slots, &names));
    }

    println!("\nOutings per captain:");
    for (id, count) in schedule.captain_counts() {
        println!("  {} -> {}", format_captain_name(&id, &names), count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{parse_date, Restriction};

    fn roster() -> Vec<RosterMember> {
        vec![RosterMember {
            id: "p1".to_string(),
            name: "Ana".to_string(),
            is_captain: true,
            restriction: Restriction::Unrestricted,
        }]
    }

    fn slots() -> Vec<TimeSlot> {
        vec![TimeSlot {
            id: "am".to_string(),
            start: "9:30".to_string(),
            label: "Plaza".to_string(),
            weekdays: vec![],
        }]
    }

    fn entry(captain: Option<&str>, fixed: bool) -> ScheduleEntry {
        ScheduleEntry {
            date: parse_date("2024-03-12").unwrap(),
            time_slot_id: "am".to_string(),
            captain_id: captain.map(str::to_string),
            fixed,
        }
    }

    #[test]
    fn entry_lines() {
        let roster = roster();
        let names = name_lookup(&roster);
        assert_eq!(
            format_entry(&entry(Some("p1"), false), &slots(), &names),
            "2024-03-12 Tue 09:30 Plaza -> Ana"
        );
        assert_eq!(
            format_entry(&entry(Some("p7"), true), &slots(), &names),
            "2024-03-12 Tue 09:30 Plaza -> p7 (fixed)"
        );
        assert_eq!(
            format_entry(&entry(None, false), &[], &names),
            "2024-03-12 Tue am [EMPTY]"
        );
    }

    #[test]
    fn writes_text_and_csv() {
        let dir = std::env::temp_dir().join(format!("predication-display-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let schedule = PeriodSchedule {
            entries: vec![entry(Some("p1"), false), entry(None, false)],
            gaps: vec![],
        };

        let txt = dir.join("schedule.txt");
        write_schedule_to_file("March", &schedule, &slots(), &roster(), &txt).unwrap();
        let text = std::fs::read_to_string(&txt).unwrap();
        assert!(text.starts_with("** March **\n"));
        assert!(text.contains("-> Ana"));
        assert!(text.contains("[EMPTY]"));

        let csv_path = dir.join("schedule.csv");
        write_schedule_csv(&schedule, &slots(), &roster(), &csv_path).unwrap();
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = csv_text.lines().collect();
        assert_eq!(lines[0], "date,weekday,time_slot,captain_id,captain,fixed");
        assert_eq!(lines[1], "2024-03-12,Tue,09:30 Plaza,p1,Ana,false");
        assert_eq!(lines[2], "2024-03-12,Tue,09:30 Plaza,,,false");

        let _ = std::fs::remove_dir_all(&dir);
    }
}
