//! Terminal-outcome history records and their aggregate statistics.
//!
//! A `HistoryRecord` is a copy of a task's final shape, taken when the
//! task leaves the active set. Records are immutable after creation
//! except for deletion; the active queue and the history never share an
//! entity by reference.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::types::{DownloadTask, TaskId, TaskState};

/// Terminal outcome of a finished transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    /// Finished successfully.
    Completed,
    /// Stopped with an error.
    Failed,
    /// Stopped by the user.
    Cancelled,
}

impl HistoryStatus {
    /// Convert to string representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Map a terminal task state to its history outcome.
    ///
    /// Returns `None` for non-terminal states.
    #[must_use]
    pub const fn from_task_state(state: TaskState) -> Option<Self> {
        match state {
            TaskState::Completed => Some(Self::Completed),
            TaskState::Failed => Some(Self::Failed),
            TaskState::Cancelled => Some(Self::Cancelled),
            TaskState::Queued
            | TaskState::Downloading
            | TaskState::Paused
            | TaskState::Extracting => None,
        }
    }
}

/// Immutable summary of one task's terminal outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Id the task had while active.
    pub id: TaskId,
    /// Source URL.
    pub url: String,
    /// Display name of the transferred file.
    pub filename: String,
    /// Destination path on disk.
    pub destination: String,
    /// Final size in bytes (known total, else bytes actually written).
    pub size: u64,
    /// Verified checksum, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    /// Free-text origin tag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// When the first byte moved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When the terminal state was reached.
    pub completed_at: DateTime<Utc>,
    /// Wall-clock seconds between start and terminal state.
    pub duration_seconds: u64,
    /// Mean transfer speed over the task's lifetime.
    pub average_speed_bps: u64,
    /// Terminal outcome.
    pub status: HistoryStatus,
    /// Failure reason, present only when `status == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryRecord {
    /// Copy a terminal task into a history record.
    ///
    /// Returns `None` for tasks still moving through their lifecycle.
    #[must_use]
    pub fn from_task(task: &DownloadTask, completed_at: DateTime<Utc>) -> Option<Self> {
        let status = HistoryStatus::from_task_state(task.state)?;

        let size = match status {
            HistoryStatus::Completed => task
                .progress
                .total_bytes
                .unwrap_or(task.progress.downloaded_bytes),
            HistoryStatus::Failed | HistoryStatus::Cancelled => task.progress.downloaded_bytes,
        };

        let duration_seconds = task
            .started_at
            .map(|started| {
                let secs = completed_at.signed_duration_since(started).num_seconds();
                u64::try_from(secs).unwrap_or(0)
            })
            .unwrap_or(0);

        let average_speed_bps = if duration_seconds > 0 {
            size / duration_seconds
        } else {
            0
        };

        Some(Self {
            id: task.id.clone(),
            url: task.url.clone(),
            filename: task.name.clone(),
            destination: task.destination.clone(),
            size,
            checksum: task.expected_checksum.clone(),
            provider: task.provider.clone(),
            started_at: task.started_at,
            completed_at,
            duration_seconds,
            average_speed_bps,
            status,
            error: if status == HistoryStatus::Failed {
                task.error.clone()
            } else {
                None
            },
        })
    }

    /// Case-insensitive substring match against filename and URL.
    #[must_use]
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.filename.to_lowercase().contains(&query) || self.url.to_lowercase().contains(&query)
    }
}

/// Aggregate statistics over the history store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    /// Number of records.
    pub total_count: u32,
    /// Sum of record sizes in bytes.
    pub total_bytes: u64,
    /// Mean of per-record average speeds.
    pub average_speed_bps: u64,
    /// `completed / total * 100`; 0 when the history is empty.
    pub success_rate_percent: f64,
}

impl HistoryStats {
    /// Derive stats from a set of records.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a HistoryRecord>,
    {
        let mut total_count: u32 = 0;
        let mut completed_count: u32 = 0;
        let mut total_bytes: u64 = 0;
        let mut speed_sum: u64 = 0;

        for record in records {
            total_count += 1;
            total_bytes += record.size;
            speed_sum += record.average_speed_bps;
            if record.status == HistoryStatus::Completed {
                completed_count += 1;
            }
        }

        let average_speed_bps = if total_count > 0 {
            speed_sum / u64::from(total_count)
        } else {
            0
        };

        let success_rate_percent = if total_count > 0 {
            f64::from(completed_count) / f64::from(total_count) * 100.0
        } else {
            0.0
        };

        Self {
            total_count,
            total_bytes,
            average_speed_bps,
            success_rate_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn terminal_task(state: TaskState) -> DownloadTask {
        let mut task = DownloadTask::new(TaskId::new("t1"), "https://h/a.zip", "/d/a.zip");
        task.state = state;
        task.progress.downloaded_bytes = 1_000;
        task.progress.total_bytes = Some(1_000);
        task.started_at = Some(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        task
    }

    #[test]
    fn test_record_from_completed_task() {
        let task = terminal_task(TaskState::Completed);
        let finished = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 10).unwrap();
        let record = HistoryRecord::from_task(&task, finished).unwrap();

        assert_eq!(record.status, HistoryStatus::Completed);
        assert_eq!(record.size, 1_000);
        assert_eq!(record.duration_seconds, 10);
        assert_eq!(record.average_speed_bps, 100);
        assert!(record.error.is_none());
    }

    #[test]
    fn test_record_carries_error_only_when_failed() {
        let mut task = terminal_task(TaskState::Failed);
        task.error = Some("connection reset".to_string());
        let record = HistoryRecord::from_task(&task, Utc::now()).unwrap();

        assert_eq!(record.status, HistoryStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("connection reset"));
    }

    #[test]
    fn test_record_rejects_active_task() {
        let task = terminal_task(TaskState::Downloading);
        assert!(HistoryRecord::from_task(&task, Utc::now()).is_none());
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let task = terminal_task(TaskState::Completed);
        let record = HistoryRecord::from_task(&task, Utc::now()).unwrap();

        assert!(record.matches("A.ZIP"));
        assert!(record.matches("h/a"));
        assert!(!record.matches("tar"));
    }

    #[test]
    fn test_history_stats() {
        let completed = HistoryRecord::from_task(
            &terminal_task(TaskState::Completed),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 10).unwrap(),
        )
        .unwrap();
        let cancelled = HistoryRecord::from_task(
            &terminal_task(TaskState::Cancelled),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 20).unwrap(),
        )
        .unwrap();

        let stats = HistoryStats::from_records([&completed, &cancelled]);

        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.total_bytes, 2_000);
        assert!((stats.success_rate_percent - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_history_stats_empty() {
        let stats = HistoryStats::from_records(std::iter::empty::<&HistoryRecord>());
        assert_eq!(stats.total_count, 0);
        assert!((stats.success_rate_percent - 0.0).abs() < f64::EPSILON);
    }
}
