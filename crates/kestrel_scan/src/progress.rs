//! Progress reporting from scan workers.

use kestrel_source::SourceRef;

use crate::task::TaskState;

/// Receives progress from a running scan.
///
/// Called on the scan's worker thread.
pub trait ProgressObserver: Send + Sync {
    /// One file finished, successfully or not. `done` counts from 1.
    fn file_processed(&self, source: &SourceRef, done: usize, total: usize);

    /// The scan reached `state`. Called once, before `join` returns.
    fn scan_finished(&self, state: TaskState) {
        let _ = state;
    }
}

/// Ignores all progress.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn file_processed(&self, _source: &SourceRef, _done: usize, _total: usize) {}
}
