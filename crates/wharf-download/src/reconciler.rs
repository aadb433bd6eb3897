//! Event reconciler.
//!
//! Applies engine-originated lifecycle and progress events to the shared
//! queue state. Events arrive over a bounded channel, in order per task
//! but interleaved arbitrarily across tasks; the reconciler applies them
//! in arrival order with no command/event correlation.
//!
//! # Convergence rules
//!
//! - A non-terminal event never overturns a terminal state.
//! - Terminal events apply last-writer-wins (a cancel racing an in-flight
//!   completion lands on whichever the store saw last).
//! - Progress against a terminal task is dropped.
//! - Events never raise errors: unknown ids and malformed reports are
//!   dropped, with tracing as the only trace they leave.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::mpsc;

use wharf_core::download::{DownloadTask, EngineEvent, HistoryRecord, TaskId, TaskState};
use wharf_core::ports::TransferEnginePort;

use crate::state::QueueState;

/// Outcome of applying a terminal event to one task.
enum TerminalOutcome {
    /// State changed; the task snapshot is ready for a history record.
    Transitioned(DownloadTask),
    /// Task was already in this terminal state; duplicate dropped.
    AlreadyThere,
}

/// Applies engine events to the queue state.
pub struct EventReconciler {
    state: Arc<QueueState>,
    engine: Arc<dyn TransferEnginePort>,
    events: mpsc::Receiver<EngineEvent>,
}

impl EventReconciler {
    /// Create a reconciler draining the given event channel.
    pub fn new(
        state: Arc<QueueState>,
        engine: Arc<dyn TransferEnginePort>,
        events: mpsc::Receiver<EngineEvent>,
    ) -> Self {
        Self {
            state,
            engine,
            events,
        }
    }

    /// Drain the event channel until the engine side closes it.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            self.handle(event).await;
        }
        tracing::debug!("Event channel closed; reconciler stopping");
    }

    /// Apply a single event.
    pub async fn handle(&self, event: EngineEvent) {
        match event {
            EngineEvent::Added => {
                tracing::debug!("Engine task list changed; resynchronizing");
                self.refresh().await;
            }
            EngineEvent::Extracted { id } => {
                tracing::debug!(id = %id, "Extraction finished; resynchronizing");
                self.refresh().await;
            }
            EngineEvent::Started { id } => {
                self.apply_non_terminal(&id, |task| {
                    task.state = TaskState::Downloading;
                    if task.started_at.is_none() {
                        task.started_at = Some(Utc::now());
                    }
                })
                .await;
            }
            EngineEvent::Progress {
                id,
                downloaded_bytes,
                total_bytes,
                speed_bps,
            } => {
                let applied = self
                    .state
                    .mutate_task(&id, |task| {
                        if task.state.is_terminal() {
                            false
                        } else {
                            task.update_progress(downloaded_bytes, total_bytes, speed_bps);
                            true
                        }
                    })
                    .await;
                match applied {
                    None => tracing::debug!(id = %id, "Dropping progress for unknown task"),
                    Some(false) => {
                        tracing::debug!(id = %id, "Dropping progress for finished task");
                    }
                    Some(true) => {}
                }
            }
            EngineEvent::Completed { id } => {
                self.apply_terminal(&id, TaskState::Completed, None).await;
            }
            EngineEvent::Failed { id, reason } => {
                self.apply_terminal(&id, TaskState::Failed, Some(reason)).await;
            }
            EngineEvent::Cancelled { id } => {
                self.apply_terminal(&id, TaskState::Cancelled, None).await;
            }
            EngineEvent::Paused { id } => {
                self.apply_non_terminal(&id, |task| task.state = TaskState::Paused)
                    .await;
            }
            EngineEvent::Resumed { id } => {
                // Resume re-enters the admission queue; the engine decides
                // when a slot frees up.
                self.apply_non_terminal(&id, |task| task.state = TaskState::Queued)
                    .await;
            }
            EngineEvent::Extracting { id } => {
                self.apply_non_terminal(&id, |task| task.state = TaskState::Extracting)
                    .await;
            }
            EngineEvent::QueueSnapshot { stats } => {
                self.state.set_cached_stats(stats).await;
            }
        }
    }

    /// Apply a non-terminal transition; dropped for terminal tasks and
    /// unknown ids.
    async fn apply_non_terminal(
        &self,
        id: &TaskId,
        f: impl FnOnce(&mut DownloadTask),
    ) {
        let applied = self
            .state
            .mutate_task(id, |task| {
                if task.state.is_terminal() {
                    false
                } else {
                    f(task);
                    true
                }
            })
            .await;
        match applied {
            None => tracing::debug!(id = %id, "Dropping event for unknown task"),
            Some(false) => tracing::debug!(id = %id, "Dropping event for finished task"),
            Some(true) => {}
        }
    }

    /// Apply a terminal transition and record the outcome in history.
    ///
    /// Last-writer-wins across terminal states; a duplicate of the
    /// current state is dropped so history never double-records.
    async fn apply_terminal(&self, id: &TaskId, target: TaskState, error: Option<String>) {
        let now = Utc::now();
        let outcome = self
            .state
            .mutate_task(id, |task| {
                if task.state == target {
                    return TerminalOutcome::AlreadyThere;
                }
                task.state = target;
                task.error = if target == TaskState::Failed {
                    error
                } else {
                    None
                };
                if task.completed_at.is_none() {
                    task.completed_at = Some(now);
                }
                TerminalOutcome::Transitioned(task.clone())
            })
            .await;

        match outcome {
            None => tracing::debug!(id = %id, state = %target, "Dropping terminal event for unknown task"),
            Some(TerminalOutcome::AlreadyThere) => {
                tracing::debug!(id = %id, state = %target, "Dropping duplicate terminal event");
            }
            Some(TerminalOutcome::Transitioned(task)) => {
                tracing::info!(id = %id, state = %target, "Task finished");
                let completed_at = task.completed_at.unwrap_or(now);
                if let Some(record) = HistoryRecord::from_task(&task, completed_at) {
                    self.state.history_append(record).await;
                }
            }
        }
    }

    /// Full task-list resynchronization from the engine.
    ///
    /// A fetch failure keeps the local snapshot; later events converge it.
    async fn refresh(&self) {
        match self.engine.list_tasks().await {
            Ok(tasks) => self.state.replace_tasks(tasks).await,
            Err(err) => {
                tracing::warn!(error = %err, "Task refresh failed; keeping local snapshot");
            }
        }
    }
}
