//! The set of active scans.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::error::ScanError;
use crate::progress::ProgressObserver;
use crate::task::{ScanTask, TaskId};

type TaskSet = Mutex<HashMap<TaskId, ScanTask>>;

fn lock(tasks: &TaskSet) -> MutexGuard<'_, HashMap<TaskId, ScanTask>> {
    tasks.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Tracks running scans. The only answer to "is a scan in progress".
///
/// Registered tasks remove themselves when they finish, on every exit path.
/// Clones share the same set.
#[derive(Clone, Debug, Default)]
pub struct ScanCoordinator {
    tasks: Arc<TaskSet>,
}

impl ScanCoordinator {
    /// Creates an empty coordinator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a task to the active set.
    ///
    /// A task that has already finished is not added.
    pub fn register(&self, task: &ScanTask) {
        let id = task.id();
        lock(&self.tasks).insert(id, task.clone());
        let tasks: Weak<TaskSet> = Arc::downgrade(&self.tasks);
        let hooked = task.on_finish(move |id| {
            if let Some(tasks) = tasks.upgrade() {
                lock(&tasks).remove(&id);
            }
        });
        if !hooked {
            lock(&self.tasks).remove(&id);
        }
    }

    /// Removes a task from the active set.
    pub fn deregister(&self, task: &ScanTask) {
        lock(&self.tasks).remove(&task.id());
    }

    /// Registers and starts a task, deregistering it again if it cannot start.
    pub fn launch(
        &self,
        task: &ScanTask,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<(), ScanError> {
        self.register(task);
        if let Err(err) = task.start(observer) {
            self.deregister(task);
            return Err(err);
        }
        Ok(())
    }

    /// Requests cancellation of every active task and empties the set.
    ///
    /// Does not wait for the tasks to stop.
    pub fn stop_all(&self) {
        let tasks = std::mem::take(&mut *lock(&self.tasks));
        if !tasks.is_empty() {
            tracing::info!(count = tasks.len(), "stopping all scans");
        }
        for task in tasks.into_values() {
            task.cancel();
        }
    }

    /// Returns `true` while at least one task is registered.
    pub fn is_any_running(&self) -> bool {
        !lock(&self.tasks).is_empty()
    }

    /// Returns the registered tasks.
    pub fn active_tasks(&self) -> Vec<ScanTask> {
        lock(&self.tasks).values().cloned().collect()
    }

    /// Returns the number of registered tasks.
    pub fn active_count(&self) -> usize {
        lock(&self.tasks).len()
    }
}
