//! Queue-wide aggregate statistics.
//!
//! `QueueStats` is a derived DTO, never stored per-task. The engine may
//! push an authoritative snapshot (it can track tasks the UI has not yet
//! fetched); `from_tasks` is the pure local fallback.

use serde::{Deserialize, Serialize};

use super::types::{DownloadTask, TaskState};

/// Per-state counts and byte totals over the active task set.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueStats {
    /// Tasks waiting for an admission slot.
    pub queued: u32,
    /// Tasks currently transferring.
    pub downloading: u32,
    /// Tasks suspended by the user.
    pub paused: u32,
    /// Tasks finished successfully.
    pub completed: u32,
    /// Tasks stopped with an error.
    pub failed: u32,
    /// Tasks stopped by the user.
    pub cancelled: u32,
    /// Tasks expanding an archive.
    pub extracting: u32,
    /// Sum of known totals; tasks with an unknown total are excluded.
    pub total_bytes: u64,
    /// Sum of downloaded bytes over tasks with a known total.
    pub downloaded_bytes: u64,
    /// `downloaded_bytes / total_bytes * 100`, clamped to [0, 100];
    /// 0 when no task has a known total.
    pub overall_progress_percent: f64,
}

impl QueueStats {
    /// Derive stats from a task snapshot.
    ///
    /// Tasks whose total size is unknown are excluded from both byte sums,
    /// so a queue of unsized transfers reports 0% rather than a misleading
    /// partial figure.
    pub fn from_tasks<'a, I>(tasks: I) -> Self
    where
        I: IntoIterator<Item = &'a DownloadTask>,
    {
        let mut stats = Self::default();

        for task in tasks {
            match task.state {
                TaskState::Queued => stats.queued += 1,
                TaskState::Downloading => stats.downloading += 1,
                TaskState::Paused => stats.paused += 1,
                TaskState::Completed => stats.completed += 1,
                TaskState::Failed => stats.failed += 1,
                TaskState::Cancelled => stats.cancelled += 1,
                TaskState::Extracting => stats.extracting += 1,
            }

            if let Some(total) = task.progress.total_bytes {
                stats.total_bytes += total;
                stats.downloaded_bytes += task.progress.downloaded_bytes.min(total);
            }
        }

        stats.overall_progress_percent = if stats.total_bytes > 0 {
            #[expect(
                clippy::cast_precision_loss,
                reason = "precision loss acceptable for progress percentage"
            )]
            let percent = (stats.downloaded_bytes as f64 / stats.total_bytes as f64) * 100.0;
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };

        stats
    }

    /// Total number of tracked tasks.
    #[must_use]
    pub const fn total_count(&self) -> u32 {
        self.queued
            + self.downloading
            + self.paused
            + self.completed
            + self.failed
            + self.cancelled
            + self.extracting
    }

    /// Number of tasks still moving through their lifecycle.
    #[must_use]
    pub const fn active_count(&self) -> u32 {
        self.queued + self.downloading + self.paused + self.extracting
    }
}
