//! Task record store.
//!
//! In-memory map of task id to task entity: pure data plus mutation
//! primitives. This is a sync type with no internal locking — the caller
//! (`QueueState`) is responsible for synchronization.
//!
//! All mutations are total functions over the current snapshot; a patch
//! against an unknown id is a no-op, which keeps late or duplicate engine
//! events harmless.

// Task counts are always well under u32::MAX in practice
#![allow(clippy::cast_possible_truncation)]

use chrono::{DateTime, Utc};
use indexmap::IndexMap;

use wharf_core::download::{DownloadTask, TaskId, TaskProgress, TaskState};

/// Partial update for a stored task.
///
/// Outer `None` leaves a field untouched. For `error`, `Some(None)`
/// clears the stored value.
#[derive(Clone, Debug, Default)]
pub struct TaskPatch {
    /// New lifecycle state.
    pub state: Option<TaskState>,
    /// New progress snapshot.
    pub progress: Option<TaskProgress>,
    /// Set or clear the failure reason.
    pub error: Option<Option<String>>,
    /// Set the start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Set or clear the completion timestamp.
    pub completed_at: Option<Option<DateTime<Utc>>>,
    /// New retry count.
    pub retries: Option<u32>,
    /// New scheduling priority.
    pub priority: Option<i32>,
}

/// In-memory store of active tasks, keyed by id.
///
/// Insertion order is preserved so full-list reads are stable; any
/// user-facing ordering beyond that is a presentation concern.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: IndexMap<TaskId, DownloadTask>,
}

impl TaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a task, replacing any existing record with the same id.
    pub fn upsert(&mut self, task: DownloadTask) {
        self.tasks.insert(task.id.clone(), task);
    }

    /// Apply a partial update; no-op when the id is unknown.
    ///
    /// Returns whether a task was updated.
    pub fn patch(&mut self, id: &TaskId, patch: TaskPatch) -> bool {
        let Some(task) = self.tasks.get_mut(id) else {
            return false;
        };

        if let Some(state) = patch.state {
            task.state = state;
        }
        if let Some(progress) = patch.progress {
            task.progress = progress;
        }
        if let Some(error) = patch.error {
            task.error = error;
        }
        if let Some(started_at) = patch.started_at {
            task.started_at = Some(started_at);
        }
        if let Some(completed_at) = patch.completed_at {
            task.completed_at = completed_at;
        }
        if let Some(retries) = patch.retries {
            task.retries = retries;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        true
    }

    /// Apply a closure to a stored task; no-op when the id is unknown.
    ///
    /// Returns the closure's result when the task exists.
    pub fn mutate<R>(&mut self, id: &TaskId, f: impl FnOnce(&mut DownloadTask) -> R) -> Option<R> {
        self.tasks.get_mut(id).map(f)
    }

    /// Remove a task; returns the removed record when it existed.
    pub fn remove(&mut self, id: &TaskId) -> Option<DownloadTask> {
        self.tasks.shift_remove(id)
    }

    /// Remove every task matching the predicate; returns how many went.
    pub fn remove_where(&mut self, mut predicate: impl FnMut(&DownloadTask) -> bool) -> u32 {
        let before = self.tasks.len();
        self.tasks.retain(|_, task| !predicate(task));
        (before - self.tasks.len()) as u32
    }

    /// Look up a task by id.
    pub fn get(&self, id: &TaskId) -> Option<&DownloadTask> {
        self.tasks.get(id)
    }

    /// Snapshot of every tracked task.
    #[must_use]
    pub fn all(&self) -> Vec<DownloadTask> {
        self.tasks.values().cloned().collect()
    }

    /// Iterate over tracked tasks without cloning.
    pub fn iter(&self) -> impl Iterator<Item = &DownloadTask> {
        self.tasks.values()
    }

    /// Ids of every task currently in the given state.
    #[must_use]
    pub fn ids_in_state(&self, state: TaskState) -> Vec<TaskId> {
        self.tasks
            .values()
            .filter(|task| task.state == state)
            .map(|task| task.id.clone())
            .collect()
    }

    /// Replace the entire task set with a fresh engine snapshot.
    pub fn replace_all(&mut self, tasks: Vec<DownloadTask>) {
        self.tasks = tasks
            .into_iter()
            .map(|task| (task.id.clone(), task))
            .collect();
    }

    /// Number of tracked tasks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
