//! Minimal engine stub for unit tests.
//!
//! Acknowledges every command, serves a configurable task list, and logs
//! command names so tests can assert forwarding. The richer behavioral
//! fake used by the integration suite lives in `tests/common`.

use std::path::Path;

use async_trait::async_trait;
use tokio::sync::Mutex;

use wharf_core::download::{
    DownloadTask, EngineResult, HistoryRecord, HistoryStats, QueueStats, TaskId,
};
use wharf_core::ports::{DownloadRequest, TransferEnginePort};

/// Engine stub that acknowledges everything.
#[derive(Default)]
pub struct StubEngine {
    tasks: Mutex<Vec<DownloadTask>>,
    calls: Mutex<Vec<String>>,
}

impl StubEngine {
    /// Set the task list served by `list_tasks`.
    pub async fn set_tasks(&self, tasks: Vec<DownloadTask>) {
        *self.tasks.lock().await = tasks;
    }

    /// Names of the commands received so far.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    async fn record(&self, call: &str) {
        self.calls.lock().await.push(call.to_string());
    }
}

#[async_trait]
impl TransferEnginePort for StubEngine {
    async fn add(&self, request: DownloadRequest) -> EngineResult<TaskId> {
        self.record("add").await;
        let id = TaskId::new("stub-task");
        let task = DownloadTask::new(id.clone(), request.url, request.destination);
        self.tasks.lock().await.push(task);
        Ok(id)
    }

    async fn pause(&self, _id: &TaskId) -> EngineResult<()> {
        self.record("pause").await;
        Ok(())
    }

    async fn resume(&self, _id: &TaskId) -> EngineResult<()> {
        self.record("resume").await;
        Ok(())
    }

    async fn cancel(&self, _id: &TaskId) -> EngineResult<()> {
        self.record("cancel").await;
        Ok(())
    }

    async fn remove(&self, _id: &TaskId) -> EngineResult<()> {
        self.record("remove").await;
        Ok(())
    }

    async fn retry(&self, _id: &TaskId) -> EngineResult<()> {
        self.record("retry").await;
        Ok(())
    }

    async fn pause_all(&self) -> EngineResult<u32> {
        self.record("pause_all").await;
        Ok(0)
    }

    async fn resume_all(&self) -> EngineResult<u32> {
        self.record("resume_all").await;
        Ok(0)
    }

    async fn cancel_all(&self) -> EngineResult<u32> {
        self.record("cancel_all").await;
        Ok(0)
    }

    async fn clear_finished(&self) -> EngineResult<u32> {
        self.record("clear_finished").await;
        Ok(0)
    }

    async fn retry_failed(&self) -> EngineResult<u32> {
        self.record("retry_failed").await;
        Ok(0)
    }

    async fn set_priority(&self, _id: &TaskId, _priority: i32) -> EngineResult<()> {
        self.record("set_priority").await;
        Ok(())
    }

    async fn set_speed_limit(&self, _bytes_per_sec: u64) -> EngineResult<()> {
        self.record("set_speed_limit").await;
        Ok(())
    }

    async fn get_speed_limit(&self) -> EngineResult<u64> {
        Ok(0)
    }

    async fn set_max_concurrent(&self, _max: u32) -> EngineResult<()> {
        self.record("set_max_concurrent").await;
        Ok(())
    }

    async fn get_max_concurrent(&self) -> EngineResult<u32> {
        Ok(1)
    }

    async fn verify_file(&self, _path: &Path, _checksum: &str) -> EngineResult<bool> {
        self.record("verify_file").await;
        Ok(true)
    }

    async fn calculate_checksum(&self, _path: &Path) -> EngineResult<String> {
        Ok(String::new())
    }

    async fn list_tasks(&self) -> EngineResult<Vec<DownloadTask>> {
        Ok(self.tasks.lock().await.clone())
    }

    async fn get_stats(&self) -> EngineResult<QueueStats> {
        Ok(QueueStats::default())
    }

    async fn history_list(&self, _limit: Option<u32>) -> EngineResult<Vec<HistoryRecord>> {
        Ok(Vec::new())
    }

    async fn history_search(&self, _query: &str) -> EngineResult<Vec<HistoryRecord>> {
        Ok(Vec::new())
    }

    async fn history_stats(&self) -> EngineResult<HistoryStats> {
        Ok(HistoryStats::default())
    }

    async fn history_clear(&self, _older_than_days: Option<u32>) -> EngineResult<u32> {
        self.record("history_clear").await;
        Ok(0)
    }

    async fn history_remove(&self, _id: &TaskId) -> EngineResult<bool> {
        self.record("history_remove").await;
        Ok(true)
    }
}
