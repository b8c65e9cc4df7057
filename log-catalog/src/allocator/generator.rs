//! Filtered counting ID generator

use crate::config::ReservedIds;
use std::collections::BTreeSet;

/// Yields the smallest IDs that are neither claimed nor reserved, in order
///
/// Explicit and seed IDs are claimed up front; every ID the generator yields
/// is claimed as it is produced, so no ID is ever handed out twice.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    used: BTreeSet<u32>,
    reserved: ReservedIds,
    cursor: Option<u32>,
}

impl IdGenerator {
    pub fn new(reserved: ReservedIds) -> Self {
        Self {
            used: BTreeSet::new(),
            reserved,
            cursor: Some(0),
        }
    }

    /// Mark `id` as taken, returning false if it already was
    pub fn claim(&mut self, id: u32) -> bool {
        self.used.insert(id)
    }

    pub fn is_used(&self, id: u32) -> bool {
        self.used.contains(&id)
    }
}

impl Iterator for IdGenerator {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        let mut candidate = self.cursor?;
        loop {
            if let Some((_, last)) = self.reserved.interval_of(candidate) {
                candidate = last.checked_add(1)?;
            } else if self.used.contains(&candidate) {
                candidate = candidate.checked_add(1)?;
            } else {
                break;
            }
        }

        self.used.insert(candidate);
        self.cursor = candidate.checked_add(1);
        Some(candidate)
    }
}
