use std::fs::File;
use std::path::Path;

use csv::WriterBuilder;

use crate::error::Result;
use crate::schedule::FixedAssignment;

/// Writes the whole fixed assignment table, soft-deleted rows included, in the format
/// read back by [`crate::parser::load_fixed_assignments`]
pub fn export_fixed_assignments(csv_path: &Path, assignments: &[FixedAssignment]) -> Result<()> {
    if let Some(parent) = csv_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(csv_path)?;
    let mut wtr = WriterBuilder::new().has_headers(false).from_writer(file);

    wtr.write_record(["id", "weekday", "time_slot_id", "captain_id", "active"])?;
    for assignment in assignments {
        wtr.write_record(&[
            assignment.id.to_string(),
            assignment.weekday.to_string(),
            assignment.time_slot_id.clone(),
            assignment.captain_id.clone(),
            assignment.active.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
