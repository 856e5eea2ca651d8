use std::collections::HashMap;

/// Key shared by every slot when one continuous rotation should span them all
pub const GLOBAL_KEY: &str = "global";

/// Round-robin pointers, one per rotation key.
///
/// Owned by a single scheduling run. The stored value is an index into the
/// eligible captain list, so the list order must not change while the cursor is in use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationCursor {
    next: HashMap<String, usize>,
}

impl RotationCursor {
    pub fn new() -> RotationCursor {
        RotationCursor::default()
    }

    /// Key used when the caller does not pass one: one rotation per weekday + slot
    pub fn default_key(weekday: u8, time_slot_id: &str) -> String {
        format!("{}-{}", weekday, time_slot_id)
    }

    pub fn get(&self, key: &str) -> usize {
        self.next.get(key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: &str, index: usize) {
        self.next.insert(key.to_string(), index);
    }

    pub fn is_empty(&self) -> bool {
        self.next.is_empty()
    }

    pub fn clear(&mut self) {
        self.next.clear();
    }
}
