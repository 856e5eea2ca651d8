pub mod submission;
pub mod export;

pub use submission::{next_assignment_id, soft_delete, validate_fixed_assignment, FixedAssignmentRequest};
pub use export::export_fixed_assignments;
