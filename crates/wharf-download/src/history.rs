//! History store for terminal-outcome records.
//!
//! Sync type with no internal locking (`QueueState` synchronizes).
//! Records arrive from the reconciler when a task leaves the active set,
//! or wholesale from the engine's durable history. They are immutable
//! here except for deletion.

// Record counts are always well under u32::MAX in practice
#![allow(clippy::cast_possible_truncation)]

use chrono::{Duration, Utc};

use wharf_core::download::{HistoryRecord, HistoryStats, TaskId};

/// In-memory history of finished transfers.
#[derive(Debug, Default)]
pub struct HistoryManager {
    records: Vec<HistoryRecord>,
}

impl HistoryManager {
    /// Create an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record for a task that reached a terminal outcome.
    pub fn append(&mut self, record: HistoryRecord) {
        self.records.push(record);
    }

    /// Records sorted most-recent-first, optionally truncated.
    #[must_use]
    pub fn list(&self, limit: Option<u32>) -> Vec<HistoryRecord> {
        let mut records = self.records.clone();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        if let Some(limit) = limit {
            records.truncate(limit as usize);
        }
        records
    }

    /// Case-insensitive substring search against filename and URL,
    /// most recent first.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<HistoryRecord> {
        let mut records: Vec<HistoryRecord> = self
            .records
            .iter()
            .filter(|record| record.matches(query))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        records
    }

    /// Remove one record by task id; returns whether it existed.
    pub fn remove(&mut self, id: &TaskId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| &record.id != id);
        self.records.len() < before
    }

    /// Delete records; with an age, only those whose completion is older
    /// than the cutoff. Returns how many were deleted.
    pub fn clear(&mut self, older_than_days: Option<u32>) -> u32 {
        let before = self.records.len();
        match older_than_days {
            None => self.records.clear(),
            Some(days) => {
                let cutoff = Utc::now() - Duration::days(i64::from(days));
                self.records.retain(|record| record.completed_at >= cutoff);
            }
        }
        (before - self.records.len()) as u32
    }

    /// Aggregate statistics over the stored records.
    #[must_use]
    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_records(&self.records)
    }

    /// Replace the whole history with an engine snapshot.
    pub fn replace_all(&mut self, records: Vec<HistoryRecord>) {
        self.records = records;
    }

    /// Number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the history is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
