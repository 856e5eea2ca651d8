use serde::Deserialize;

use crate::schedule::{weekday_name, EligibleCaptain, FixedAssignment, TimeSlot};

/// Fixed assignment request from the admin page
#[derive(Debug, Clone, Deserialize)]
pub struct FixedAssignmentRequest {
    pub weekday: u8,
    pub time_slot_id: String,
    pub captain_id: String,
}

impl FixedAssignmentRequest {
    pub fn into_assignment(self, id: u32) -> FixedAssignment {
        FixedAssignment {
            id,
            weekday: self.weekday,
            time_slot_id: self.time_slot_id.trim().to_string(),
            captain_id: self.captain_id.trim().to_string(),
            active: true,
        }
    }
}

/// Validates a fixed assignment request against the configured slots, the captains and existing overrides
pub fn validate_fixed_assignment(
    req: &FixedAssignmentRequest,
    slots: &[TimeSlot],
    captains: &[EligibleCaptain],
    existing: &[FixedAssignment],
) -> Result<(), String> {
    if req.weekday > 6 {
        return Err(format!("Invalid weekday: {} (expected 0 = Sunday .. 6 = Saturday)", req.weekday));
    }

    let slot_id = req.time_slot_id.trim();
    let slot = match slots.iter().find(|s| s.id == slot_id) {
        Some(slot) => slot,
        None => return Err(format!("Unknown time slot: {}", slot_id)),
    };
    if !slot.runs_on(req.weekday) {
        return Err(format!(
            "Time slot {} does not run on {}",
            slot_id,
            weekday_name(req.weekday)
        ));
    }

    let captain_id = req.captain_id.trim();
    if captain_id.is_empty() {
        return Err("Captain is required".to_string());
    }
    if !captains.iter().any(|c| c.id == captain_id) {
        return Err(format!("{} is not an eligible captain", captain_id));
    }

    // Only one active override per weekday + slot
    if existing
        .iter()
        .any(|f| f.active && f.weekday == req.weekday && f.time_slot_id == slot_id)
    {
        return Err(format!(
            "{} {} already has a fixed captain",
            weekday_name(req.weekday),
            slot_id
        ));
    }

    Ok(())
}

/// Marks an assignment inactive; returns false if there is no active assignment with that id
pub fn soft_delete(assignments: &mut [FixedAssignment], id: u32) -> bool {
    match assignments.iter_mut().find(|f| f.id == id && f.active) {
        Some(assignment) => {
            assignment.active = false;
            true
        }
        None => false,
    }
}

/// Id for a new assignment, one past the highest id in use (soft-deleted rows included)
pub fn next_assignment_id(assignments: &[FixedAssignment]) -> Result<u32, String> {
    assignments
        .iter()
        .map(|f| f.id)
        .max()
        .unwrap_or(0)
        .checked_add(1)
        .ok_or_else(|| "No fixed assignment ids left".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::Restriction;

    fn slots() -> Vec<TimeSlot> {
        vec![TimeSlot {
            id: "am".to_string(),
            start: "09:30".to_string(),
            label: String::new(),
            weekdays: vec![2, 4],
        }]
    }

    fn captains() -> Vec<EligibleCaptain> {
        vec![EligibleCaptain::new("p1", Restriction::Unrestricted)]
    }

    fn request(weekday: u8, slot: &str, captain: &str) -> FixedAssignmentRequest {
        FixedAssignmentRequest {
            weekday,
            time_slot_id: slot.to_string(),
            captain_id: captain.to_string(),
        }
    }

    #[test]
    fn accepts_valid_request() {
        assert!(validate_fixed_assignment(&request(2, "am", "p1"), &slots(), &captains(), &[]).is_ok());
    }

    #[test]
    fn rejects_invalid_requests() {
        let s = slots();
        let c = captains();
        assert!(validate_fixed_assignment(&request(7, "am", "p1"), &s, &c, &[]).is_err());
        assert!(validate_fixed_assignment(&request(2, "pm", "p1"), &s, &c, &[]).is_err());
        assert!(validate_fixed_assignment(&request(3, "am", "p1"), &s, &c, &[]).is_err());
        assert!(validate_fixed_assignment(&request(2, "am", "nobody"), &s, &c, &[]).is_err());
        assert!(validate_fixed_assignment(&request(2, "am", " "), &s, &c, &[]).is_err());
    }

    #[test]
    fn one_active_override_per_slot() {
        let mut existing = vec![request(2, "am", "p1").into_assignment(1)];
        let err = validate_fixed_assignment(&request(2, "am", "p1"), &slots(), &captains(), &existing);
        assert!(err.unwrap_err().contains("already has a fixed captain"));

        assert!(soft_delete(&mut existing, 1));
        assert!(!soft_delete(&mut existing, 1));
        assert!(validate_fixed_assignment(&request(2, "am", "p1"), &slots(), &captains(), &existing).is_ok());
        assert_eq!(next_assignment_id(&existing), Ok(2));
        assert_eq!(next_assignment_id(&[]), Ok(1));
    }

    #[test]
    fn id_allocation_stops_at_the_top() {
        let mut last = request(2, "am", "p1").into_assignment(u32::MAX);
        last.active = false;
        assert!(next_assignment_id(&[last.clone()]).is_err());

        last.id = u32::MAX - 1;
        assert_eq!(next_assignment_id(&[last]), Ok(u32::MAX));
    }
}
