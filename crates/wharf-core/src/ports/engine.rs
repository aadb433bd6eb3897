//! Transfer engine port definition.
//!
//! This port is the full command surface of the external transfer engine:
//! the process that actually opens connections, writes bytes, computes
//! checksums, and enforces the speed cap. The queue manager only issues
//! these commands and consumes the engine's event feed; it never performs
//! byte-level work itself.
//!
//! # Design
//!
//! - Only core domain types in signatures
//! - Every command is an independent request/acknowledgement round trip
//! - Events travel over a host-owned channel, not through this trait

use std::path::Path;

use async_trait::async_trait;

use crate::download::{
    DownloadTask, EngineError, EngineResult, HistoryRecord, HistoryStats, QueueStats, TaskId,
};

/// Mid-range default priority assigned when a request does not set one.
pub const DEFAULT_PRIORITY: i32 = 5;

/// Request to create a new transfer task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Source URL; must be syntactically valid.
    pub url: String,
    /// Destination path on disk.
    pub destination: String,
    /// Display name; the engine derives one from the URL when unset.
    pub name: Option<String>,
    /// Free-text origin tag (e.g. a package-registry name).
    pub provider: Option<String>,
    /// Scheduling priority; defaults to [`DEFAULT_PRIORITY`] when unset.
    pub priority: Option<i32>,
    /// Checksum for post-transfer verification.
    pub expected_checksum: Option<String>,
}

impl DownloadRequest {
    /// Create a request with the required fields.
    pub fn new(url: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            destination: destination.into(),
            name: None,
            provider: None,
            priority: None,
            expected_checksum: None,
        }
    }

    /// Set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Set the origin tag.
    #[must_use]
    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Set the scheduling priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the expected checksum.
    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.expected_checksum = Some(checksum.into());
        self
    }

    /// Effective priority, applying the mid-range default.
    #[must_use]
    pub const fn effective_priority(&self) -> i32 {
        match self.priority {
            Some(priority) => priority,
            None => DEFAULT_PRIORITY,
        }
    }

    /// Check the request shape before it goes anywhere near the engine.
    ///
    /// Validation failures surface immediately to the caller and are
    /// never retried automatically.
    pub fn validate(&self) -> EngineResult<()> {
        if let Err(err) = url::Url::parse(&self.url) {
            return Err(EngineError::validation(format!(
                "malformed URL '{}': {err}",
                self.url
            )));
        }
        if self.destination.trim().is_empty() {
            return Err(EngineError::validation("destination path is required"));
        }
        Ok(())
    }
}

/// Port for the external transfer engine.
///
/// The engine is an opaque concurrent executor: command acknowledgements
/// and event delivery may interleave arbitrarily across tasks, and a
/// command either completes or the caller abandons interest in its
/// result — in-flight cancellation is not supported.
#[async_trait]
pub trait TransferEnginePort: Send + Sync {
    /// Create a new transfer task; returns the engine-assigned id.
    async fn add(&self, request: DownloadRequest) -> EngineResult<TaskId>;

    /// Suspend a task.
    async fn pause(&self, id: &TaskId) -> EngineResult<()>;

    /// Re-enter a paused task into the admission queue.
    async fn resume(&self, id: &TaskId) -> EngineResult<()>;

    /// Stop a task.
    async fn cancel(&self, id: &TaskId) -> EngineResult<()>;

    /// Drop a task from the engine entirely, in any state.
    async fn remove(&self, id: &TaskId) -> EngineResult<()>;

    /// Re-queue a task regardless of its terminal state (force retry).
    async fn retry(&self, id: &TaskId) -> EngineResult<()>;

    /// Suspend every pausable task; returns how many were acted on.
    async fn pause_all(&self) -> EngineResult<u32>;

    /// Re-admit every paused task; returns how many were acted on.
    async fn resume_all(&self) -> EngineResult<u32>;

    /// Stop every active task; returns how many were acted on.
    async fn cancel_all(&self) -> EngineResult<u32>;

    /// Drop every finished task; returns how many were dropped.
    async fn clear_finished(&self) -> EngineResult<u32>;

    /// Re-queue every failed task; returns how many were re-queued.
    async fn retry_failed(&self) -> EngineResult<u32>;

    /// Change a task's scheduling priority.
    async fn set_priority(&self, id: &TaskId, priority: i32) -> EngineResult<()>;

    /// Set the global speed cap in bytes per second; 0 lifts the cap.
    async fn set_speed_limit(&self, bytes_per_sec: u64) -> EngineResult<()>;

    /// Read the global speed cap.
    async fn get_speed_limit(&self) -> EngineResult<u64>;

    /// Set the maximum number of simultaneously running transfers.
    async fn set_max_concurrent(&self, max: u32) -> EngineResult<()>;

    /// Read the maximum number of simultaneously running transfers.
    async fn get_max_concurrent(&self) -> EngineResult<u32>;

    /// Verify a file on disk against a checksum.
    async fn verify_file(&self, path: &Path, checksum: &str) -> EngineResult<bool>;

    /// Compute the checksum of a file on disk.
    async fn calculate_checksum(&self, path: &Path) -> EngineResult<String>;

    /// Fetch the engine's full task list.
    async fn list_tasks(&self) -> EngineResult<Vec<DownloadTask>>;

    /// Fetch the engine's queue-wide aggregates.
    async fn get_stats(&self) -> EngineResult<QueueStats>;

    /// Fetch history records, most recent first.
    async fn history_list(&self, limit: Option<u32>) -> EngineResult<Vec<HistoryRecord>>;

    /// Search history by case-insensitive substring.
    async fn history_search(&self, query: &str) -> EngineResult<Vec<HistoryRecord>>;

    /// Fetch aggregate history statistics.
    async fn history_stats(&self) -> EngineResult<HistoryStats>;

    /// Delete history records; with an age, only those older than the
    /// cutoff. Returns how many were deleted.
    async fn history_clear(&self, older_than_days: Option<u32>) -> EngineResult<u32>;

    /// Delete one history record; returns whether it existed.
    async fn history_remove(&self, id: &TaskId) -> EngineResult<bool>;
}
