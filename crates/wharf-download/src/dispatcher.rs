//! Command dispatcher.
//!
//! Issues imperative operations to the transfer engine and reflects
//! acknowledged results into the shared state. Commands are independent
//! request/acknowledgement round trips: the store is never mutated
//! speculatively, so a failed command leaves it untouched and the event
//! feed remains the only other writer.

use std::path::Path;
use std::sync::Arc;

use wharf_core::download::{
    DownloadTask, EngineError, EngineResult, HistoryRecord, HistoryStats, QueueStats, TaskId,
    TaskState,
};
use wharf_core::ports::{DownloadRequest, TransferEnginePort};

use crate::state::QueueState;
use crate::store::TaskPatch;

/// Issues commands to the engine on behalf of UI surfaces.
#[derive(Clone)]
pub struct CommandDispatcher {
    engine: Arc<dyn TransferEnginePort>,
    state: Arc<QueueState>,
}

impl CommandDispatcher {
    /// Create a dispatcher over the given engine and shared state.
    pub fn new(engine: Arc<dyn TransferEnginePort>, state: Arc<QueueState>) -> Self {
        Self { engine, state }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Single-task commands
    // ─────────────────────────────────────────────────────────────────────

    /// Create a new transfer task.
    ///
    /// The request shape is validated locally before the engine sees it;
    /// on success the store is refreshed wholesale to pick up
    /// engine-assigned defaults rather than patched from partial data.
    pub async fn add(&self, request: DownloadRequest) -> EngineResult<TaskId> {
        request.validate()?;
        let id = self.engine.add(request).await?;
        tracing::info!(id = %id, "Queued new transfer");
        if let Err(err) = self.refresh().await {
            // The add is acknowledged; events will converge a stale store.
            tracing::warn!(error = %err, "Post-add refresh failed");
        }
        Ok(id)
    }

    /// Suspend one task.
    pub async fn pause(&self, id: &TaskId) -> EngineResult<()> {
        self.engine.pause(id).await?;
        tracing::info!(id = %id, "Paused transfer");
        Ok(())
    }

    /// Re-admit one paused task.
    pub async fn resume(&self, id: &TaskId) -> EngineResult<()> {
        self.engine.resume(id).await?;
        tracing::info!(id = %id, "Resumed transfer");
        Ok(())
    }

    /// Stop one task.
    ///
    /// A cancel can race a completion already in flight from the engine;
    /// callers must not assume the cancel always lands.
    pub async fn cancel(&self, id: &TaskId) -> EngineResult<()> {
        self.engine.cancel(id).await?;
        tracing::info!(id = %id, "Cancelled transfer");
        Ok(())
    }

    /// Drop one task, in any state.
    pub async fn remove(&self, id: &TaskId) -> EngineResult<()> {
        self.engine.remove(id).await?;
        self.state.remove_task(id).await;
        tracing::info!(id = %id, "Removed transfer");
        Ok(())
    }

    /// Force-retry one task, permitted even on completed or cancelled
    /// tasks.
    pub async fn retry(&self, id: &TaskId) -> EngineResult<()> {
        self.engine.retry(id).await?;
        self.state
            .mutate_task(id, |task| {
                task.state = TaskState::Queued;
                task.retries += 1;
                task.error = None;
                task.completed_at = None;
            })
            .await;
        tracing::info!(id = %id, "Retrying transfer");
        Ok(())
    }

    /// Change one task's scheduling priority.
    ///
    /// The value is transported to the engine's scheduler; the local
    /// store keeps its ordering (ordering is a presentation concern).
    pub async fn set_priority(&self, id: &TaskId, priority: i32) -> EngineResult<()> {
        self.engine.set_priority(id, priority).await?;
        self.state
            .patch_task(
                id,
                TaskPatch {
                    priority: Some(priority),
                    ..TaskPatch::default()
                },
            )
            .await;
        Ok(())
    }

    /// Verify a finished transfer against its recorded checksum.
    pub async fn verify(&self, id: &TaskId) -> EngineResult<bool> {
        let task = self
            .state
            .task(id)
            .await
            .ok_or_else(|| EngineError::task_not_found(id))?;
        let checksum = task
            .expected_checksum
            .ok_or_else(|| EngineError::validation("no checksum recorded for this transfer"))?;
        self.engine
            .verify_file(Path::new(&task.destination), &checksum)
            .await
    }

    /// Compute the checksum of a transfer's destination file.
    pub async fn checksum(&self, id: &TaskId) -> EngineResult<String> {
        let task = self
            .state
            .task(id)
            .await
            .ok_or_else(|| EngineError::task_not_found(id))?;
        self.engine
            .calculate_checksum(Path::new(&task.destination))
            .await
    }

    // ─────────────────────────────────────────────────────────────────────
    // Bulk commands
    // ─────────────────────────────────────────────────────────────────────

    /// Suspend every pausable task; returns the engine-acknowledged count.
    pub async fn pause_all(&self) -> EngineResult<u32> {
        let count = self.engine.pause_all().await?;
        tracing::info!(count, "Paused all transfers");
        Ok(count)
    }

    /// Re-admit every paused task; returns the engine-acknowledged count.
    pub async fn resume_all(&self) -> EngineResult<u32> {
        let count = self.engine.resume_all().await?;
        tracing::info!(count, "Resumed all transfers");
        Ok(count)
    }

    /// Stop every active task; returns the engine-acknowledged count.
    pub async fn cancel_all(&self) -> EngineResult<u32> {
        let count = self.engine.cancel_all().await?;
        tracing::info!(count, "Cancelled all transfers");
        Ok(count)
    }

    /// Drop every finished task from the active store.
    ///
    /// History is unaffected — those records already exist independently.
    /// Returns how many local tasks were removed.
    pub async fn clear_finished(&self) -> EngineResult<u32> {
        let engine_count = self.engine.clear_finished().await?;
        let removed = self
            .state
            .remove_tasks_where(|task| task.state.is_terminal())
            .await;
        if engine_count != removed {
            tracing::debug!(
                engine = engine_count,
                local = removed,
                "Finished-task counts differ; next refresh converges"
            );
        }
        tracing::info!(count = removed, "Cleared finished transfers");
        Ok(removed)
    }

    /// Re-queue every failed task; returns how many were retried.
    pub async fn retry_failed(&self) -> EngineResult<u32> {
        self.engine.retry_failed().await?;
        let failed = self.state.task_ids_in_state(TaskState::Failed).await;
        let mut count = 0;
        for id in failed {
            let retried = self
                .state
                .mutate_task(&id, |task| {
                    if task.state == TaskState::Failed {
                        task.state = TaskState::Queued;
                        task.retries += 1;
                        task.error = None;
                        task.completed_at = None;
                        true
                    } else {
                        false
                    }
                })
                .await;
            if retried == Some(true) {
                count += 1;
            }
        }
        tracing::info!(count, "Retried failed transfers");
        Ok(count)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Batch commands over explicit ids or the current selection
    // ─────────────────────────────────────────────────────────────────────

    /// Suspend the given tasks (or the selection); returns the affected
    /// count. Zero matching ids is a no-op returning 0, never an error.
    pub async fn batch_pause(&self, ids: Option<&[TaskId]>) -> EngineResult<u32> {
        let targets = self.batch_targets(ids, TaskState::is_pausable).await;
        let mut count = 0;
        for id in targets {
            if Self::forward_benign(self.engine.pause(&id).await, &id)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Re-admit the given paused tasks (or the selection).
    pub async fn batch_resume(&self, ids: Option<&[TaskId]>) -> EngineResult<u32> {
        let targets = self.batch_targets(ids, TaskState::is_resumable).await;
        let mut count = 0;
        for id in targets {
            if Self::forward_benign(self.engine.resume(&id).await, &id)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Stop the given active tasks (or the selection).
    pub async fn batch_cancel(&self, ids: Option<&[TaskId]>) -> EngineResult<u32> {
        let targets = self
            .batch_targets(ids, |state| !state.is_terminal())
            .await;
        let mut count = 0;
        for id in targets {
            if Self::forward_benign(self.engine.cancel(&id).await, &id)? {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Drop the given tasks (or the selection), in any state.
    pub async fn batch_remove(&self, ids: Option<&[TaskId]>) -> EngineResult<u32> {
        let targets = self.batch_targets(ids, |_| true).await;
        let mut count = 0;
        for id in targets {
            if Self::forward_benign(self.engine.remove(&id).await, &id)? {
                self.state.remove_task(&id).await;
                count += 1;
            }
        }
        Ok(count)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Synchronization
    // ─────────────────────────────────────────────────────────────────────

    /// Replace the local task set with the engine's full list.
    pub async fn refresh(&self) -> EngineResult<()> {
        let tasks = self.engine.list_tasks().await?;
        self.state.replace_tasks(tasks).await;
        Ok(())
    }

    /// Snapshot of every locally tracked task.
    pub async fn tasks(&self) -> Vec<DownloadTask> {
        self.state.tasks().await
    }

    /// Queue-wide aggregates: the engine's last pushed snapshot, or a
    /// local derivation until one has arrived.
    pub async fn stats(&self) -> QueueStats {
        self.state.stats().await
    }

    /// Pull the engine's aggregates and cache them as the authoritative
    /// snapshot, same as a `QueueSnapshot` event would.
    pub async fn sync_stats(&self) -> EngineResult<QueueStats> {
        let stats = self.engine.get_stats().await?;
        self.state.set_cached_stats(stats.clone()).await;
        Ok(stats)
    }

    // ─────────────────────────────────────────────────────────────────────
    // History
    // ─────────────────────────────────────────────────────────────────────

    /// Hydrate the local history view from the engine's durable store.
    pub async fn sync_history(&self, limit: Option<u32>) -> EngineResult<()> {
        let records = self.engine.history_list(limit).await?;
        tracing::debug!(count = records.len(), "Hydrated history from engine");
        self.state.history_replace(records).await;
        Ok(())
    }

    /// Local history records, most recent first.
    pub async fn history_list(&self, limit: Option<u32>) -> Vec<HistoryRecord> {
        self.state.history_list(limit).await
    }

    /// Search local history by case-insensitive substring.
    pub async fn history_search(&self, query: &str) -> Vec<HistoryRecord> {
        self.state.history_search(query).await
    }

    /// Aggregate statistics over local history.
    pub async fn history_stats(&self) -> HistoryStats {
        self.state.history_stats().await
    }

    /// Delete one history record everywhere; returns whether any side
    /// still had it.
    pub async fn history_remove(&self, id: &TaskId) -> EngineResult<bool> {
        let engine_had = self.engine.history_remove(id).await?;
        let local_had = self.state.history_remove(id).await;
        Ok(engine_had || local_had)
    }

    /// Delete history records, optionally only those older than the
    /// cutoff. Returns the engine's deletion count.
    pub async fn history_clear(&self, older_than_days: Option<u32>) -> EngineResult<u32> {
        let count = self.engine.history_clear(older_than_days).await?;
        self.state.history_clear(older_than_days).await;
        tracing::info!(count, "Cleared history");
        Ok(count)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Helpers
    // ─────────────────────────────────────────────────────────────────────

    /// Resolve batch targets: explicit ids or the current selection,
    /// filtered to tasks the operation applies to.
    async fn batch_targets(
        &self,
        ids: Option<&[TaskId]>,
        eligible: impl Fn(&TaskState) -> bool,
    ) -> Vec<TaskId> {
        let candidates = match ids {
            Some(ids) => ids.to_vec(),
            None => self.state.selection().await,
        };

        let mut targets = Vec::with_capacity(candidates.len());
        for id in candidates {
            if let Some(task) = self.state.task(&id).await {
                if eligible(&task.state) {
                    targets.push(id);
                }
            }
        }
        targets
    }

    /// Fold a single-task acknowledgement into a batch: missing tasks are
    /// a benign skip, everything else aborts the batch.
    fn forward_benign(result: EngineResult<()>, id: &TaskId) -> EngineResult<bool> {
        match result {
            Ok(()) => Ok(true),
            Err(err) if err.is_not_found() => {
                tracing::debug!(id = %id, "Skipping vanished task in batch command");
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
