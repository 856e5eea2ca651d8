use csv::{Reader, StringRecord};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::schedule::{EligibleCaptain, FixedAssignment, Restriction};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterMember {
    pub id: String,
    pub name: String,
    pub is_captain: bool,
    pub restriction: Restriction,
}

/// Parses a boolean value from various string representations
fn parse_bool(value: &str) -> bool {
    let lower = value.trim().to_lowercase();
    lower == "yes" || lower == "true" || lower == "1" || lower == "si" || lower == "sí" || lower == "x"
}

/// Finds a column by header name (case-insensitive), falling back to a fixed position
fn column(headers: &StringRecord, name: &str, fallback: usize) -> usize {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
        .unwrap_or(fallback)
}

fn field<'a>(record: &'a StringRecord, col: usize) -> &'a str {
    record.get(col).unwrap_or("").trim()
}

/// Loads the roster from a CSV file with columns `id, name, captain, restriction`
pub fn load_roster<P: AsRef<Path>>(csv_path: P) -> Result<Vec<RosterMember>> {
    let file = File::open(csv_path)?;
    load_roster_from_reader(file)
}

/// Loads the roster from any reader.
///
/// File order is kept, since rotation follows it. A repeated id replaces the
/// earlier row in place.
pub fn load_roster_from_reader<R: Read>(reader: R) -> Result<Vec<RosterMember>> {
    let mut reader = Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let id_col = column(&headers, "id", 0);
    let name_col = column(&headers, "name", 1);
    let captain_col = column(&headers, "captain", 2);
    let restriction_col = column(&headers, "restriction", 3);

    let mut members: Vec<RosterMember> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for result in reader.records() {
        let record = result?;

        let id = field(&record, id_col).to_string();
        let name = field(&record, name_col).to_string();

        // Skip if essential fields are missing
        if id.is_empty() || name.is_empty() {
            debug!("skipping roster row without id or name: {:?}", record);
            continue;
        }

        let member = RosterMember {
            id: id.clone(),
            name,
            is_captain: parse_bool(field(&record, captain_col)),
            restriction: Restriction::parse_lossy(field(&record, restriction_col)),
        };

        if let Some(&pos) = positions.get(&id) {
            members[pos] = member;
        } else {
            positions.insert(id, members.len());
            members.push(member);
        }
    }

    info!(
        "loaded roster: {} members, {} captains",
        members.len(),
        members.iter().filter(|m| m.is_captain).count()
    );
    Ok(members)
}

/// Captains in roster order
pub fn eligible_captains(roster: &[RosterMember]) -> Vec<EligibleCaptain> {
    roster
        .iter()
        .filter(|m| m.is_captain)
        .map(|m| EligibleCaptain {
            id: m.id.clone(),
            name: m.name.clone(),
            restriction: m.restriction,
        })
        .collect()
}

/// Loads fixed assignments (`id, weekday, time_slot_id, captain_id, active`); a missing file means none
pub fn load_fixed_assignments<P: AsRef<Path>>(csv_path: P) -> Result<Vec<FixedAssignment>> {
    let path = csv_path.as_ref();
    if !path.exists() {
        debug!("no fixed assignments file at {}", path.display());
        return Ok(Vec::new());
    }
    load_fixed_assignments_from_reader(File::open(path)?)
}

pub fn load_fixed_assignments_from_reader<R: Read>(reader: R) -> Result<Vec<FixedAssignment>> {
    let mut reader = Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let id_col = column(&headers, "id", 0);
    let weekday_col = column(&headers, "weekday", 1);
    let slot_col = column(&headers, "time_slot_id", 2);
    let captain_col = column(&headers, "captain_id", 3);
    let active_col = column(&headers, "active", 4);

    let mut assignments = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let record = result?;

        let weekday = match field(&record, weekday_col).parse::<u8>() {
            Ok(d) if d < 7 => d,
            _ => {
                debug!("skipping fixed assignment row {} with bad weekday", row + 1);
                continue;
            }
        };
        let time_slot_id = field(&record, slot_col).to_string();
        let captain_id = field(&record, captain_col).to_string();
        if time_slot_id.is_empty() || captain_id.is_empty() {
            continue;
        }

        let active_raw = field(&record, active_col);
        assignments.push(FixedAssignment {
            id: field(&record, id_col).parse().unwrap_or(row as u32 + 1),
            weekday,
            time_slot_id,
            captain_id,
            active: active_raw.is_empty() || parse_bool(active_raw),
        });
    }

    Ok(assignments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roster_keeps_file_order_and_merges_duplicates() {
        let csv = "\
id,name,captain,restriction
p1,Ana,yes,sin_restriccion
p2,Luis,no,
p3,Marta,Sí,solo_sabados
p1,Ana María,yes,solo_domingos
,Nobody,yes,
p4,,yes,
";
        let roster = load_roster_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(roster.len(), 3);
        assert_eq!(roster[0].id, "p1");
        assert_eq!(roster[0].name, "Ana María");
        assert_eq!(roster[0].restriction, Restriction::SundaysOnly);
        assert!(!roster[1].is_captain);
        assert_eq!(roster[1].restriction, Restriction::Unrestricted);

        let captains = eligible_captains(&roster);
        let ids: Vec<&str> = captains.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["p1", "p3"]);
        assert_eq!(captains[1].restriction, Restriction::SaturdaysOnly);
    }

    #[test]
    fn columns_are_found_by_name() {
        let csv = "restriction,Captain,Name,ID\nsolo_entre_semana,true,Pedro,p9\nfoo,1,Eva,p10\n";
        let roster = load_roster_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(roster[0].id, "p9");
        assert_eq!(roster[0].name, "Pedro");
        assert!(roster[0].is_captain);
        assert_eq!(roster[0].restriction, Restriction::WeekdaysOnly);
        assert_eq!(roster[1].restriction, Restriction::Unrestricted);
    }

    #[test]
    fn fixed_assignments_parse() {
        let csv = "\
id,weekday,time_slot_id,captain_id,active
1,2,am,p1,true
2,6,pm,p3,
3,9,am,p1,true
4,0,am,p2,false
5,1,,p2,true
";
        let fixed = load_fixed_assignments_from_reader(csv.as_bytes()).unwrap();
        assert_eq!(fixed.len(), 3);
        assert_eq!(fixed[0].weekday, 2);
        assert!(fixed[1].active);
        assert_eq!(fixed[2].id, 4);
        assert!(!fixed[2].active);
    }

    #[test]
    fn missing_fixed_file_is_empty() {
        let path = std::env::temp_dir().join("predication-schedule-no-such-file.csv");
        assert!(load_fixed_assignments(&path).unwrap().is_empty());
    }

    #[test]
    fn lenient_booleans() {
        assert!(parse_bool("Yes"));
        assert!(parse_bool(" si "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("no"));
        assert!(!parse_bool(""));
    }
}
