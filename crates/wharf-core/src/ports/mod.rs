//! Port definitions for external collaborators.
//!
//! Ports are trait seams between the queue manager and the processes it
//! coordinates with. Implementations live in adapter crates or test
//! fakes, never here.

pub mod engine;

pub use engine::{DEFAULT_PRIORITY, DownloadRequest, TransferEnginePort};
