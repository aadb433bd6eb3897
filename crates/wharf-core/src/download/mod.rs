//! Transfer domain types, events, and errors.
//!
//! This module contains pure data types for the download queue system.
//! No I/O, networking, or runtime dependencies allowed.
//!
//! # Structure
//!
//! - `types` - Task identity, lifecycle state, and progress (`TaskId`, `TaskState`, `DownloadTask`)
//! - `events` - Engine event union (`EngineEvent`)
//! - `errors` - Error types for engine commands
//! - `stats` - Queue-wide aggregates (`QueueStats`)
//! - `history` - Terminal-outcome records (`HistoryRecord`, `HistoryStats`)

pub mod errors;
pub mod events;
pub mod history;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, EngineResult};
pub use events::EngineEvent;
pub use history::{HistoryRecord, HistoryStats, HistoryStatus};
pub use stats::QueueStats;
pub use types::{DownloadTask, TaskId, TaskProgress, TaskState, default_task_name};
