//! Last-known task snapshot.

use std::sync::{Arc, PoisonError, RwLock};

use tasklink_core::{Task, TaskId};
use time::OffsetDateTime;

/// Complete ordered task sequence. Never mutated once handed out.
pub type Snapshot = Arc<Vec<Task>>;

/// Holds the current snapshot and replaces it wholesale.
#[derive(Debug, Default)]
pub struct TaskCache {
    state: RwLock<CacheState>,
}

#[derive(Debug, Default)]
struct CacheState {
    snapshot: Snapshot,
    loaded_at: Option<OffsetDateTime>,
}

impl TaskCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.read().snapshot)
    }

    /// Swap in a freshly loaded snapshot and return it.
    pub fn replace(&self, tasks: Vec<Task>) -> Snapshot {
        let snapshot = Arc::new(tasks);
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.snapshot = Arc::clone(&snapshot);
        state.loaded_at = Some(OffsetDateTime::now_utc());
        drop(state);
        snapshot
    }

    /// Publish a copy of the snapshot with task `id` archived.
    ///
    /// Returns `false` when the snapshot does not contain `id`.
    pub fn archive(&self, id: TaskId) -> bool {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let Some(position) = state.snapshot.iter().position(|task| task.id == id) else {
            return false;
        };
        let mut tasks = state.snapshot.as_ref().clone();
        tasks[position].archived = true;
        state.snapshot = Arc::new(tasks);
        drop(state);
        true
    }

    /// Clone a single task by id.
    pub fn get(&self, id: TaskId) -> Option<Task> {
        self.read().snapshot.iter().find(|task| task.id == id).cloned()
    }

    /// Time of the last successful load.
    pub fn loaded_at(&self) -> Option<OffsetDateTime> {
        self.read().loaded_at
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}
