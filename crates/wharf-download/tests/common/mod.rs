//! Behavioral in-memory engine for integration tests.
//!
//! Owns its own task list and history, acknowledges commands the way the
//! real engine contract describes (counts reflect what was actually acted
//! on), and exposes the sending half of the event feed so tests can
//! script deliveries.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{Mutex, mpsc};

use wharf_download::{
    DownloadRequest, DownloadTask, EngineError, EngineEvent, EngineResult, HistoryRecord,
    HistoryStats, QueueStats, TaskId, TaskState, TransferEnginePort,
};

/// Test checksum every file "hashes" to.
pub const FAKE_CHECKSUM: &str = "deadbeef";

#[derive(Default)]
struct Inner {
    tasks: Vec<DownloadTask>,
    history: Vec<HistoryRecord>,
    speed_limit: u64,
    max_concurrent: u32,
    online: bool,
    next_id: u32,
}

/// In-memory transfer engine.
pub struct FakeEngine {
    inner: Mutex<Inner>,
    events: mpsc::Sender<EngineEvent>,
}

impl FakeEngine {
    /// Create an online engine wired to the given event feed.
    pub fn new(events: mpsc::Sender<EngineEvent>) -> Arc<Self> {
        Arc::new(Self {
            inner: Mutex::new(Inner {
                online: true,
                max_concurrent: 3,
                ..Inner::default()
            }),
            events,
        })
    }

    /// Simulate the engine becoming (un)reachable.
    pub async fn set_online(&self, online: bool) {
        self.inner.lock().await.online = online;
    }

    /// Preload a task, bypassing `add`.
    pub async fn seed_task(&self, task: DownloadTask) {
        self.inner.lock().await.tasks.push(task);
    }

    /// Preload a history record.
    pub async fn seed_history(&self, record: HistoryRecord) {
        self.inner.lock().await.history.push(record);
    }

    /// Push an event into the feed.
    pub async fn emit(&self, event: EngineEvent) {
        self.events.send(event).await.expect("event channel open");
    }

    async fn check_online(&self) -> EngineResult<()> {
        if self.inner.lock().await.online {
            Ok(())
        } else {
            Err(EngineError::unavailable("engine offline"))
        }
    }
}

#[async_trait]
impl TransferEnginePort for FakeEngine {
    async fn add(&self, request: DownloadRequest) -> EngineResult<TaskId> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        inner.next_id += 1;
        let id = TaskId::new(format!("task-{}", inner.next_id));

        let priority = request.effective_priority();
        let mut task = DownloadTask::new(id.clone(), request.url, request.destination)
            .with_priority(priority)
            .with_created_at(Utc::now());
        if let Some(name) = request.name {
            task = task.with_name(name);
        }
        if let Some(provider) = request.provider {
            task = task.with_provider(provider);
        }
        if let Some(checksum) = request.expected_checksum {
            task = task.with_checksum(checksum);
        }
        inner.tasks.push(task);
        Ok(id)
    }

    async fn pause(&self, id: &TaskId) -> EngineResult<()> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| EngineError::task_not_found(id))?;
        if task.state.is_pausable() {
            task.state = TaskState::Paused;
        }
        Ok(())
    }

    async fn resume(&self, id: &TaskId) -> EngineResult<()> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| EngineError::task_not_found(id))?;
        if task.state.is_resumable() {
            task.state = TaskState::Queued;
        }
        Ok(())
    }

    async fn cancel(&self, id: &TaskId) -> EngineResult<()> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| EngineError::task_not_found(id))?;
        if !task.state.is_terminal() {
            task.state = TaskState::Cancelled;
        }
        Ok(())
    }

    async fn remove(&self, id: &TaskId) -> EngineResult<()> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| &t.id != id);
        if inner.tasks.len() < before {
            Ok(())
        } else {
            Err(EngineError::task_not_found(id))
        }
    }

    async fn retry(&self, id: &TaskId) -> EngineResult<()> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| EngineError::task_not_found(id))?;
        task.state = TaskState::Queued;
        task.error = None;
        task.retries += 1;
        Ok(())
    }

    async fn pause_all(&self) -> EngineResult<u32> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let mut count = 0;
        for task in &mut inner.tasks {
            if task.state.is_pausable() {
                task.state = TaskState::Paused;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn resume_all(&self) -> EngineResult<u32> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let mut count = 0;
        for task in &mut inner.tasks {
            if task.state.is_resumable() {
                task.state = TaskState::Queued;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn cancel_all(&self) -> EngineResult<u32> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let mut count = 0;
        for task in &mut inner.tasks {
            if !task.state.is_terminal() {
                task.state = TaskState::Cancelled;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn clear_finished(&self) -> EngineResult<u32> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| !t.state.is_terminal());
        Ok(u32::try_from(before - inner.tasks.len()).unwrap_or(u32::MAX))
    }

    async fn retry_failed(&self) -> EngineResult<u32> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let mut count = 0;
        for task in &mut inner.tasks {
            if task.state == TaskState::Failed {
                task.state = TaskState::Queued;
                task.error = None;
                task.retries += 1;
                count += 1;
            }
        }
        Ok(count)
    }

    async fn set_priority(&self, id: &TaskId, priority: i32) -> EngineResult<()> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| &t.id == id)
            .ok_or_else(|| EngineError::task_not_found(id))?;
        task.priority = priority;
        Ok(())
    }

    async fn set_speed_limit(&self, bytes_per_sec: u64) -> EngineResult<()> {
        self.check_online().await?;
        self.inner.lock().await.speed_limit = bytes_per_sec;
        Ok(())
    }

    async fn get_speed_limit(&self) -> EngineResult<u64> {
        self.check_online().await?;
        Ok(self.inner.lock().await.speed_limit)
    }

    async fn set_max_concurrent(&self, max: u32) -> EngineResult<()> {
        self.check_online().await?;
        self.inner.lock().await.max_concurrent = max;
        Ok(())
    }

    async fn get_max_concurrent(&self) -> EngineResult<u32> {
        self.check_online().await?;
        Ok(self.inner.lock().await.max_concurrent)
    }

    async fn verify_file(&self, _path: &Path, checksum: &str) -> EngineResult<bool> {
        self.check_online().await?;
        Ok(checksum == FAKE_CHECKSUM)
    }

    async fn calculate_checksum(&self, _path: &Path) -> EngineResult<String> {
        self.check_online().await?;
        Ok(FAKE_CHECKSUM.to_string())
    }

    async fn list_tasks(&self) -> EngineResult<Vec<DownloadTask>> {
        self.check_online().await?;
        Ok(self.inner.lock().await.tasks.clone())
    }

    async fn get_stats(&self) -> EngineResult<QueueStats> {
        self.check_online().await?;
        Ok(QueueStats::from_tasks(&self.inner.lock().await.tasks))
    }

    async fn history_list(&self, limit: Option<u32>) -> EngineResult<Vec<HistoryRecord>> {
        self.check_online().await?;
        let mut records = self.inner.lock().await.history.clone();
        records.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        if let Some(limit) = limit {
            records.truncate(limit as usize);
        }
        Ok(records)
    }

    async fn history_search(&self, query: &str) -> EngineResult<Vec<HistoryRecord>> {
        self.check_online().await?;
        Ok(self
            .inner
            .lock()
            .await
            .history
            .iter()
            .filter(|r| r.matches(query))
            .cloned()
            .collect())
    }

    async fn history_stats(&self) -> EngineResult<HistoryStats> {
        self.check_online().await?;
        Ok(HistoryStats::from_records(&self.inner.lock().await.history))
    }

    async fn history_clear(&self, older_than_days: Option<u32>) -> EngineResult<u32> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let before = inner.history.len();
        match older_than_days {
            None => inner.history.clear(),
            Some(days) => {
                let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
                inner.history.retain(|r| r.completed_at >= cutoff);
            }
        }
        Ok(u32::try_from(before - inner.history.len()).unwrap_or(u32::MAX))
    }

    async fn history_remove(&self, id: &TaskId) -> EngineResult<bool> {
        self.check_online().await?;
        let mut inner = self.inner.lock().await;
        let before = inner.history.len();
        inner.history.retain(|r| &r.id != id);
        Ok(inner.history.len() < before)
    }
}

/// Build a task in the given state with known byte counts.
pub fn task_fixture(id: &str, state: TaskState, downloaded: u64, total: Option<u64>) -> DownloadTask {
    let mut task = DownloadTask::new(
        TaskId::new(id),
        format!("https://host/{id}.zip"),
        format!("/downloads/{id}.zip"),
    );
    task.state = state;
    task.progress.downloaded_bytes = downloaded;
    task.progress.total_bytes = total;
    task
}

/// Build a terminal history record fixture.
pub fn history_fixture(id: &str, filename: &str, state: TaskState) -> HistoryRecord {
    let mut task = DownloadTask::new(
        TaskId::new(id),
        format!("https://host/{filename}"),
        format!("/downloads/{filename}"),
    );
    task.state = state;
    if state == TaskState::Failed {
        task.error = Some("transfer failed".to_string());
    }
    task.progress.total_bytes = Some(1_000);
    task.progress.downloaded_bytes = 1_000;
    HistoryRecord::from_task(&task, Utc::now()).expect("terminal task")
}
