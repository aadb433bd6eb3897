//! Shared queue state.
//!
//! `QueueState` is the single exclusive-access path to everything the
//! queue manager tracks: the task record store, the history store, the
//! cached engine stats, and the UI's selection set. Only the command
//! dispatcher and the event reconciler write here; read surfaces observe
//! changes through the revision watch channel instead of polling.

use tokio::sync::{RwLock, watch};

use wharf_core::download::{
    DownloadTask, HistoryRecord, HistoryStats, QueueStats, TaskId, TaskState,
};

use crate::history::HistoryManager;
use crate::store::{TaskPatch, TaskStore};

/// Owned, explicitly-injected queue state.
///
/// Wrap in an `Arc` and hand to the dispatcher and reconciler; read
/// surfaces share the same instance.
#[derive(Debug)]
pub struct QueueState {
    tasks: RwLock<TaskStore>,
    history: RwLock<HistoryManager>,
    /// Engine-pushed aggregates; authoritative over local derivation
    /// because the engine may track tasks not yet fetched.
    cached_stats: RwLock<Option<QueueStats>>,
    selection: RwLock<Vec<TaskId>>,
    revision: watch::Sender<u64>,
}

impl Default for QueueState {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueState {
    /// Create empty queue state.
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            tasks: RwLock::new(TaskStore::new()),
            history: RwLock::new(HistoryManager::new()),
            cached_stats: RwLock::new(None),
            selection: RwLock::new(Vec::new()),
            revision,
        }
    }

    /// Subscribe to the revision counter; it bumps on every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump(&self) {
        self.revision.send_modify(|revision| *revision += 1);
    }

    // ─────────────────────────────────────────────────────────────────────
    // Task record store
    // ─────────────────────────────────────────────────────────────────────

    /// Snapshot of every tracked task.
    pub async fn tasks(&self) -> Vec<DownloadTask> {
        self.tasks.read().await.all()
    }

    /// Look up one task by id.
    pub async fn task(&self, id: &TaskId) -> Option<DownloadTask> {
        self.tasks.read().await.get(id).cloned()
    }

    /// Number of tracked tasks.
    pub async fn task_count(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Insert or replace a task.
    pub async fn upsert_task(&self, task: DownloadTask) {
        self.tasks.write().await.upsert(task);
        self.bump();
    }

    /// Apply a partial update; no-op on unknown ids.
    pub async fn patch_task(&self, id: &TaskId, patch: TaskPatch) -> bool {
        let applied = self.tasks.write().await.patch(id, patch);
        if applied {
            self.bump();
        }
        applied
    }

    /// Read-modify-write one task under a single write lock.
    ///
    /// Returns `None` when the id is unknown.
    pub async fn mutate_task<R>(
        &self,
        id: &TaskId,
        f: impl FnOnce(&mut DownloadTask) -> R,
    ) -> Option<R> {
        let result = self.tasks.write().await.mutate(id, f);
        if result.is_some() {
            self.bump();
        }
        result
    }

    /// Remove a task unconditionally.
    pub async fn remove_task(&self, id: &TaskId) -> Option<DownloadTask> {
        let removed = self.tasks.write().await.remove(id);
        if removed.is_some() {
            self.bump();
        }
        removed
    }

    /// Remove every task matching the predicate; returns how many went.
    pub async fn remove_tasks_where(
        &self,
        predicate: impl FnMut(&DownloadTask) -> bool,
    ) -> u32 {
        let removed = self.tasks.write().await.remove_where(predicate);
        if removed > 0 {
            self.bump();
        }
        removed
    }

    /// Ids of every task currently in the given state.
    pub async fn task_ids_in_state(&self, state: TaskState) -> Vec<TaskId> {
        self.tasks.read().await.ids_in_state(state)
    }

    /// Replace the whole task set with a fresh engine snapshot.
    pub async fn replace_tasks(&self, tasks: Vec<DownloadTask>) {
        self.tasks.write().await.replace_all(tasks);
        self.bump();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Stats
    // ─────────────────────────────────────────────────────────────────────

    /// Queue-wide aggregates.
    ///
    /// Prefers the engine's last pushed snapshot; derives from the local
    /// task set until one has arrived.
    pub async fn stats(&self) -> QueueStats {
        if let Some(stats) = self.cached_stats.read().await.clone() {
            return stats;
        }
        QueueStats::from_tasks(self.tasks.read().await.iter())
    }

    /// Replace the cached engine snapshot wholesale.
    pub async fn set_cached_stats(&self, stats: QueueStats) {
        *self.cached_stats.write().await = Some(stats);
        self.bump();
    }

    // ─────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────

    /// Append a terminal-outcome record.
    pub async fn history_append(&self, record: HistoryRecord) {
        self.history.write().await.append(record);
        self.bump();
    }

    /// History records, most recent first.
    pub async fn history_list(&self, limit: Option<u32>) -> Vec<HistoryRecord> {
        self.history.read().await.list(limit)
    }

    /// Search history by case-insensitive substring.
    pub async fn history_search(&self, query: &str) -> Vec<HistoryRecord> {
        self.history.read().await.search(query)
    }

    /// Remove one history record; returns whether it existed.
    pub async fn history_remove(&self, id: &TaskId) -> bool {
        let removed = self.history.write().await.remove(id);
        if removed {
            self.bump();
        }
        removed
    }

    /// Delete history records, optionally only those older than the
    /// cutoff. Returns how many were deleted.
    pub async fn history_clear(&self, older_than_days: Option<u32>) -> u32 {
        let removed = self.history.write().await.clear(older_than_days);
        if removed > 0 {
            self.bump();
        }
        removed
    }

    /// Aggregate history statistics.
    pub async fn history_stats(&self) -> HistoryStats {
        self.history.read().await.stats()
    }

    /// Replace the local history view with an engine snapshot.
    pub async fn history_replace(&self, records: Vec<HistoryRecord>) {
        self.history.write().await.replace_all(records);
        self.bump();
    }

    // ─────────────────────────────────────────────────────────────────────
    // Selection
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the currently selected-id set.
    pub async fn set_selection(&self, ids: Vec<TaskId>) {
        *self.selection.write().await = ids;
    }

    /// The currently selected-id set.
    pub async fn selection(&self) -> Vec<TaskId> {
        self.selection.read().await.clone()
    }

    /// Clear the selection.
    pub async fn clear_selection(&self) {
        self.selection.write().await.clear();
    }
}
