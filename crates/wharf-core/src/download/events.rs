//! Engine events - discriminated union for all task state changes.

use serde::{Deserialize, Serialize};

use super::stats::QueueStats;
use super::types::TaskId;

/// Single discriminated union for everything the transfer engine reports.
///
/// Delivery contract: events for one task arrive in order; interleaving
/// across tasks is unconstrained. Consumers must treat unknown ids and
/// reports against terminal tasks as droppable noise, never as errors.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Something changed in the engine's task list; carries no payload.
    /// Consumers resynchronize with a full task-list fetch.
    Added,

    /// A transfer has started moving bytes.
    Started {
        /// Id of the task.
        id: TaskId,
    },

    /// Progress report for an active transfer.
    Progress {
        /// Id of the task.
        id: TaskId,
        /// Bytes written so far.
        downloaded_bytes: u64,
        /// Total bytes, when known.
        #[serde(skip_serializing_if = "Option::is_none")]
        total_bytes: Option<u64>,
        /// Current speed in bytes per second.
        speed_bps: u64,
    },

    /// Transfer finished successfully.
    Completed {
        /// Id of the task.
        id: TaskId,
    },

    /// Transfer stopped with an error.
    Failed {
        /// Id of the task.
        id: TaskId,
        /// Human-readable failure reason.
        reason: String,
    },

    /// Transfer suspended by the user.
    Paused {
        /// Id of the task.
        id: TaskId,
    },

    /// Transfer re-entered the admission queue after a pause.
    Resumed {
        /// Id of the task.
        id: TaskId,
    },

    /// Transfer stopped by the user.
    Cancelled {
        /// Id of the task.
        id: TaskId,
    },

    /// Post-download archive expansion started.
    Extracting {
        /// Id of the task.
        id: TaskId,
    },

    /// Archive expansion finished; terminal bookkeeping is engine-owned,
    /// so consumers resynchronize with a full task-list fetch.
    Extracted {
        /// Id of the task.
        id: TaskId,
    },

    /// Authoritative snapshot of queue-wide aggregates.
    QueueSnapshot {
        /// Replaces any locally cached stats wholesale.
        stats: QueueStats,
    },
}

impl EngineEvent {
    /// Create a started event.
    pub fn started(id: impl Into<TaskId>) -> Self {
        Self::Started { id: id.into() }
    }

    /// Create a progress event.
    pub fn progress(
        id: impl Into<TaskId>,
        downloaded_bytes: u64,
        total_bytes: Option<u64>,
        speed_bps: u64,
    ) -> Self {
        Self::Progress {
            id: id.into(),
            downloaded_bytes,
            total_bytes,
            speed_bps,
        }
    }

    /// Create a completed event.
    pub fn completed(id: impl Into<TaskId>) -> Self {
        Self::Completed { id: id.into() }
    }

    /// Create a failed event.
    pub fn failed(id: impl Into<TaskId>, reason: impl Into<String>) -> Self {
        Self::Failed {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a paused event.
    pub fn paused(id: impl Into<TaskId>) -> Self {
        Self::Paused { id: id.into() }
    }

    /// Create a resumed event.
    pub fn resumed(id: impl Into<TaskId>) -> Self {
        Self::Resumed { id: id.into() }
    }

    /// Create a cancelled event.
    pub fn cancelled(id: impl Into<TaskId>) -> Self {
        Self::Cancelled { id: id.into() }
    }

    /// Create an extracting event.
    pub fn extracting(id: impl Into<TaskId>) -> Self {
        Self::Extracting { id: id.into() }
    }

    /// Create an extracted event.
    pub fn extracted(id: impl Into<TaskId>) -> Self {
        Self::Extracted { id: id.into() }
    }

    /// Create a queue snapshot event.
    #[must_use]
    pub const fn queue_snapshot(stats: QueueStats) -> Self {
        Self::QueueSnapshot { stats }
    }

    /// Get the task ID from any per-task event.
    #[must_use]
    pub const fn task_id(&self) -> Option<&TaskId> {
        match self {
            Self::Added | Self::QueueSnapshot { .. } => None,
            Self::Started { id }
            | Self::Progress { id, .. }
            | Self::Completed { id }
            | Self::Failed { id, .. }
            | Self::Paused { id }
            | Self::Resumed { id }
            | Self::Cancelled { id }
            | Self::Extracting { id }
            | Self::Extracted { id } => Some(id),
        }
    }

    /// Get the event name for wire protocols.
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Added => "transfer:added",
            Self::Started { .. } => "transfer:started",
            Self::Progress { .. } => "transfer:progress",
            Self::Completed { .. } => "transfer:completed",
            Self::Failed { .. } => "transfer:failed",
            Self::Paused { .. } => "transfer:paused",
            Self::Resumed { .. } => "transfer:resumed",
            Self::Cancelled { .. } => "transfer:cancelled",
            Self::Extracting { .. } => "transfer:extracting",
            Self::Extracted { .. } => "transfer:extracted",
            Self::QueueSnapshot { .. } => "transfer:queue_snapshot",
        }
    }
}
