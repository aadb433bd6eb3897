//! Core domain types and port definitions for the wharf transfer queue.
//!
//! This crate holds the pure model of task, queue, history, and settings
//! state: data types, events, errors, and the port through which the
//! external transfer engine is reached. No I/O or runtime dependencies —
//! the orchestration lives in `wharf-download`.

pub mod download;
pub mod ports;
pub mod settings;

// Re-export commonly used types for convenience
pub use download::{
    DownloadTask, EngineError, EngineEvent, EngineResult, HistoryRecord, HistoryStats,
    HistoryStatus, QueueStats, TaskId, TaskProgress, TaskState, default_task_name,
};
pub use ports::{DEFAULT_PRIORITY, DownloadRequest, TransferEnginePort};
pub use settings::{DEFAULT_MAX_CONCURRENT, TransferSettings};
