//! Bounded activity log.
//!
//! Holds the most recent [`ActivityRecord`]s in insertion order. Once the
//! configured capacity is reached, every append evicts the oldest record.

use std::collections::VecDeque;

use roster_types::ActivityRecord;

/// Upper bound on the slots reserved up front; the rest grow on demand.
const PREALLOCATED: usize = 256;

/// Ring buffer of activity records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLog {
    records: VecDeque<ActivityRecord>,
    capacity: usize,
}

impl ActivityLog {
    /// Create an empty log retaining at most `capacity` records.
    ///
    /// A capacity of 0 is raised to 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: VecDeque::with_capacity(capacity.min(PREALLOCATED)),
            capacity,
        }
    }

    /// Rebuild a log from records in oldest-first order, keeping the newest
    /// `capacity` of them.
    pub fn from_records(records: Vec<ActivityRecord>, capacity: usize) -> Self {
        let mut log = Self::new(capacity);
        for record in records {
            log.append(record);
        }
        log
    }

    /// Append a record, evicting the oldest if full.
    pub fn append(&mut self, record: ActivityRecord) {
        if self.records.len() >= self.capacity {
            self.records.pop_front();
        }
        self.records.push_back(record);
    }

    /// Up to `n` records, most recent first.
    pub fn recent(&self, n: usize) -> Vec<ActivityRecord> {
        self.records.iter().rev().take(n).cloned().collect()
    }

    /// Every retained record, oldest first.
    pub fn to_vec(&self) -> Vec<ActivityRecord> {
        self.records.iter().cloned().collect()
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Maximum number of retained records.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
