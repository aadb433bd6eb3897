//! Core domain types for transfer tasks.
//!
//! Pure data types with no I/O dependencies.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Canonical identifier for a transfer task.
///
/// Opaque, assigned by the engine at creation, immutable for the lifetime
/// of the task.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    /// Create a task ID from its string form.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TaskId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Lifecycle state of a transfer task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Waiting for an admission slot.
    Queued,
    /// Bytes are moving.
    Downloading,
    /// Suspended by the user; resume re-enters the queue.
    Paused,
    /// Finished successfully.
    Completed,
    /// Stopped with an error; recoverable through an explicit retry.
    Failed,
    /// Stopped by the user.
    Cancelled,
    /// Post-download archive expansion in progress.
    Extracting,
}

impl TaskState {
    /// Convert to string representation for storage and display.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Downloading => "downloading",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
            Self::Extracting => "extracting",
        }
    }

    /// Parse from string representation.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "downloading" => Self::Downloading,
            "paused" => Self::Paused,
            "completed" => Self::Completed,
            "failed" => Self::Failed,
            "cancelled" => Self::Cancelled,
            "extracting" => Self::Extracting,
            // "queued" or unknown values default to Queued
            _ => Self::Queued,
        }
    }

    /// Whether this state ends the task's lifecycle.
    ///
    /// `Failed` counts as terminal until an explicit retry re-queues the task.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Whether a pause command applies to a task in this state.
    #[must_use]
    pub const fn is_pausable(&self) -> bool {
        matches!(self, Self::Queued | Self::Downloading)
    }

    /// Whether a resume command applies to a task in this state.
    #[must_use]
    pub const fn is_resumable(&self) -> bool {
        matches!(self, Self::Paused)
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Byte-level progress of a single task.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskProgress {
    /// Bytes written so far.
    pub downloaded_bytes: u64,
    /// Total bytes, when the engine knows the final size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_bytes: Option<u64>,
    /// Progress percentage (0.0 - 100.0); 0.0 while the total is unknown.
    pub percent: f64,
    /// Current transfer speed in bytes per second.
    pub speed_bps: u64,
    /// Estimated seconds remaining, when total and speed allow an estimate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_seconds: Option<u64>,
}

impl TaskProgress {
    /// Recompute derived fields from a progress report.
    ///
    /// A report without a total keeps the last known total. When the total
    /// is known, `downloaded_bytes` is clamped so it never exceeds it.
    pub fn update(&mut self, downloaded_bytes: u64, total_bytes: Option<u64>, speed_bps: u64) {
        self.total_bytes = total_bytes.filter(|t| *t > 0).or(self.total_bytes);
        self.speed_bps = speed_bps;

        match self.total_bytes {
            Some(total) => {
                self.downloaded_bytes = downloaded_bytes.min(total);
                #[expect(
                    clippy::cast_precision_loss,
                    reason = "precision loss acceptable for progress percentage"
                )]
                let percent = (self.downloaded_bytes as f64 / total as f64) * 100.0;
                self.percent = percent.clamp(0.0, 100.0);
                self.eta_seconds = if speed_bps > 0 && total > self.downloaded_bytes {
                    Some((total - self.downloaded_bytes) / speed_bps)
                } else {
                    None
                };
            }
            None => {
                self.downloaded_bytes = downloaded_bytes;
                self.percent = 0.0;
                self.eta_seconds = None;
            }
        }
    }
}

/// One requested transfer with its own lifecycle state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DownloadTask {
    /// Engine-assigned identifier.
    pub id: TaskId,

    /// Source URL.
    pub url: String,

    /// Destination path on disk.
    pub destination: String,

    /// Display name; defaults from the URL's last path segment.
    pub name: String,

    /// Current lifecycle state.
    pub state: TaskState,

    /// Byte-level progress.
    pub progress: TaskProgress,

    /// Failure reason, present only when `state == Failed`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Free-text origin tag (e.g. a package-registry name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// When the task was created.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,

    /// When the first byte moved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// When the task reached a terminal state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Retry attempts so far.
    pub retries: u32,

    /// Scheduling priority; higher is served first by the engine.
    pub priority: i32,

    /// Checksum the engine verifies after the transfer, when provided.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_checksum: Option<String>,

    /// Whether the engine reports this transfer as resumable.
    pub supports_resume: bool,
}

impl DownloadTask {
    /// Create a new queued task with a name derived from the URL.
    pub fn new(id: TaskId, url: impl Into<String>, destination: impl Into<String>) -> Self {
        let url = url.into();
        let name = default_task_name(&url);
        Self {
            id,
            url,
            destination: destination.into(),
            name,
            state: TaskState::Queued,
            progress: TaskProgress::default(),
            error: None,
            provider: None,
            created_at: None,
            started_at: None,
            completed_at: None,
            retries: 0,
            priority: 0,
            expected_checksum: None,
            supports_resume: false,
        }
    }

    /// Override the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
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
        self.priority = priority;
        self
    }

    /// Set the expected checksum.
    #[must_use]
    pub fn with_checksum(mut self, checksum: impl Into<String>) -> Self {
        self.expected_checksum = Some(checksum.into());
        self
    }

    /// Set the creation timestamp.
    #[must_use]
    pub const fn with_created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = Some(at);
        self
    }

    /// Whether the task is in a terminal state.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.state.is_terminal()
    }

    /// Recompute progress from an engine report.
    pub fn update_progress(&mut self, downloaded_bytes: u64, total_bytes: Option<u64>, speed_bps: u64) {
        self.progress.update(downloaded_bytes, total_bytes, speed_bps);
    }

    /// Get formatted speed string (e.g., "5.2 MB/s").
    #[must_use]
    pub fn speed_display(&self) -> String {
        format_bytes_per_second(self.progress.speed_bps)
    }

    /// Get formatted ETA string (e.g., "2m 30s").
    #[must_use]
    pub fn eta_display(&self) -> Option<String> {
        self.progress.eta_seconds.map(format_duration)
    }
}

/// Derive a display name from the last non-empty path segment of a URL.
///
/// Falls back to the text after the last `/`, then to the URL itself.
#[must_use]
pub fn default_task_name(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|segments| segments.rev().find(|s| !s.is_empty()).map(str::to_string))
        })
        .or_else(|| {
            url.trim_end_matches('/')
                .rsplit('/')
                .next()
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| url.to_string())
}

/// Format bytes per second as human-readable string.
#[must_use]
pub fn format_bytes_per_second(bps: u64) -> String {
    #[expect(
        clippy::cast_precision_loss,
        reason = "precision loss acceptable for display formatting"
    )]
    let bps = bps as f64;
    let (value, unit) = if bps >= 1_000_000_000.0 {
        (bps / 1_000_000_000.0, "GB/s")
    } else if bps >= 1_000_000.0 {
        (bps / 1_000_000.0, "MB/s")
    } else if bps >= 1_000.0 {
        (bps / 1_000.0, "KB/s")
    } else {
        return format!("{bps:.0} B/s");
    };
    format!("{value:.1} {unit}")
}

/// Format seconds as human-readable duration.
#[must_use]
pub fn format_duration(secs: u64) -> String {
    let duration = Duration::from_secs(secs);
    let hours = duration.as_secs() / 3600;
    let minutes = (duration.as_secs() % 3600) / 60;
    let seconds = duration.as_secs() % 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}
