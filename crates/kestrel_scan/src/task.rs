//! One background scan over an ordered list of files.
//!
//! A [`ScanTask`] moves `Created -> Running -> {Completed, Failed, Cancelled}`.
//! Each file is staged, run through the engine, and recorded before the next
//! one starts. Failures of a single file are recorded against that file and
//! the scan moves on; only a panic in the worker fails the task as a whole.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use kestrel_cache::CompiledEngine;
use kestrel_common::panic_message;
use kestrel_diagnostics::Diagnostic;
use kestrel_source::{LineSeparator, SourceBuffer};

use crate::cancel::CancellationToken;
use crate::error::{FileError, ScanError};
use crate::progress::{NoProgress, ProgressObserver};
use crate::report::{FileReport, ScanReport};
use crate::staging::FileStager;

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-unique task identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        TaskId(NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle state of a scan task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Not started yet.
    Created,
    /// Processing files.
    Running,
    /// Every file was processed.
    Completed,
    /// The worker panicked.
    Failed,
    /// Cancellation was observed before all files were processed.
    Cancelled,
}

impl TaskState {
    /// Returns `true` for `Completed`, `Failed`, and `Cancelled`.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Failed | TaskState::Cancelled
        )
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Created => "created",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// How files are staged for a scan.
#[derive(Clone, Debug, Default)]
pub struct ScanOptions {
    /// Where and how staged files are created.
    pub stager: FileStager,
    /// Separator written for each `\n` of a buffer.
    pub line_separator: LineSeparator,
}

type FinishHook = Box<dyn FnOnce(TaskId) + Send>;

struct Progress {
    state: TaskState,
    started: bool,
    finishing: bool,
    files: Vec<FileReport>,
    failure: Option<ScanError>,
    hooks: Vec<FinishHook>,
}

struct Inner {
    id: TaskId,
    engine: Arc<CompiledEngine>,
    files: Vec<Arc<SourceBuffer>>,
    options: ScanOptions,
    cancel: CancellationToken,
    progress: Mutex<Progress>,
    done: Condvar,
}

/// Handle to a background scan. Clones refer to the same task.
#[derive(Clone)]
pub struct ScanTask {
    inner: Arc<Inner>,
}

impl fmt::Debug for ScanTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScanTask")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("files", &self.inner.files.len())
            .finish_non_exhaustive()
    }
}

impl ScanTask {
    /// Creates a task scanning `files` in order with `engine`.
    pub fn new(
        engine: Arc<CompiledEngine>,
        files: Vec<Arc<SourceBuffer>>,
        options: ScanOptions,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: TaskId::next(),
                engine,
                files,
                options,
                cancel: CancellationToken::new(),
                progress: Mutex::new(Progress {
                    state: TaskState::Created,
                    started: false,
                    finishing: false,
                    files: Vec::new(),
                    failure: None,
                    hooks: Vec::new(),
                }),
                done: Condvar::new(),
            }),
        }
    }

    /// Returns the task's id.
    pub fn id(&self) -> TaskId {
        self.inner.id
    }

    /// Returns the current state.
    pub fn state(&self) -> TaskState {
        lock(&self.inner.progress).state
    }

    /// Returns the number of files processed so far.
    pub fn processed(&self) -> usize {
        lock(&self.inner.progress).files.len()
    }

    /// Returns the number of files the task was given.
    pub fn total(&self) -> usize {
        self.inner.files.len()
    }

    /// Returns a snapshot of the per-file results so far.
    pub fn results(&self) -> Vec<FileReport> {
        lock(&self.inner.progress).files.clone()
    }

    /// Starts the scan on a new worker thread.
    pub fn start(&self, observer: Arc<dyn ProgressObserver>) -> Result<(), ScanError> {
        {
            let mut progress = lock(&self.inner.progress);
            if progress.started {
                return Err(ScanError::AlreadyStarted(self.inner.id.as_u64()));
            }
            progress.started = true;
            progress.state = TaskState::Running;
        }

        let inner = Arc::clone(&self.inner);
        let spawned = std::thread::Builder::new()
            .name(format!("kestrel-scan-{}", self.inner.id))
            .spawn(move || inner.execute(observer.as_ref()));
        if let Err(e) = spawned {
            let reason = e.to_string();
            self.inner.finish(
                TaskState::Failed,
                Some(ScanError::Spawn(reason.clone())),
                &NoProgress,
            );
            return Err(ScanError::Spawn(reason));
        }
        Ok(())
    }

    /// Requests cancellation.
    ///
    /// A running task stops before its next file. A task that was never
    /// started is cancelled immediately and can no longer be started.
    pub fn cancel(&self) {
        self.inner.cancel.cancel();
        let never_started = {
            let mut progress = lock(&self.inner.progress);
            !std::mem::replace(&mut progress.started, true)
        };
        if never_started {
            self.inner.finish(TaskState::Cancelled, None, &NoProgress);
        } else {
            tracing::debug!(task = %self.inner.id, "scan cancellation requested");
        }
    }

    /// Blocks until the task is terminal and returns its report.
    ///
    /// Blocks indefinitely on a task that is never started or cancelled.
    pub fn join(&self) -> Result<ScanReport, ScanError> {
        let mut progress = lock(&self.inner.progress);
        while !progress.state.is_terminal() {
            progress = self
                .inner
                .done
                .wait(progress)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if let Some(err) = &progress.failure {
            return Err(err.clone());
        }
        Ok(ScanReport {
            state: progress.state,
            files: progress.files.clone(),
        })
    }

    /// Runs `hook` once the task finishes, before `join` returns.
    ///
    /// Returns `false` without registering if the task is already finishing.
    pub(crate) fn on_finish(&self, hook: impl FnOnce(TaskId) + Send + 'static) -> bool {
        let mut progress = lock(&self.inner.progress);
        if progress.finishing {
            return false;
        }
        progress.hooks.push(Box::new(hook));
        true
    }
}

impl Inner {
    fn execute(&self, observer: &dyn ProgressObserver) {
        tracing::info!(task = %self.id, files = self.files.len(), "scan started");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run(observer)));
        let (state, failure) = match outcome {
            Ok(state) => (state, None),
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                tracing::error!(task = %self.id, reason = %reason, "scan worker panicked");
                (TaskState::Failed, Some(ScanError::WorkerPanicked(reason)))
            }
        };
        self.finish(state, failure, observer);
    }

    fn run(&self, observer: &dyn ProgressObserver) -> TaskState {
        let total = self.files.len();
        for (index, buffer) in self.files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                return TaskState::Cancelled;
            }
            let report = FileReport::new(buffer.source().clone(), self.scan_file(buffer));
            if let Some(err) = &report.error {
                tracing::warn!(task = %self.id, file = %report.source, error = %err, "file not scanned");
            }
            lock(&self.progress).files.push(report);
            observer.file_processed(buffer.source(), index + 1, total);
        }
        TaskState::Completed
    }

    fn scan_file(&self, buffer: &SourceBuffer) -> Result<Vec<Diagnostic>, FileError> {
        let source = buffer.source();
        let suffix = source.extension().map(|ext| format!(".{ext}")).unwrap_or_default();
        let staged = self.options.stager.stage_with_suffix(
            &buffer.content,
            self.options.line_separator,
            &suffix,
        )?;
        let outcome = self.engine.process(staged.path(), source);
        if let Err(err) = staged.release() {
            tracing::warn!(error = %err, "staged file not removed");
        }
        outcome.map_err(FileError::from)
    }

    fn finish(
        &self,
        state: TaskState,
        failure: Option<ScanError>,
        observer: &dyn ProgressObserver,
    ) {
        let (hooks, processed) = {
            let mut progress = lock(&self.progress);
            progress.finishing = true;
            (std::mem::take(&mut progress.hooks), progress.files.len())
        };
        for hook in hooks {
            hook(self.id);
        }
        if panic::catch_unwind(AssertUnwindSafe(|| observer.scan_finished(state))).is_err() {
            tracing::warn!(task = %self.id, "progress observer panicked");
        }
        tracing::info!(
            task = %self.id,
            state = %state,
            processed,
            total = self.files.len(),
            "scan finished"
        );

        let mut progress = lock(&self.progress);
        progress.state = state;
        progress.failure = failure;
        drop(progress);
        self.done.notify_all();
    }
}
