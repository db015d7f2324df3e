//! Error types for staging and scanning.

use std::path::PathBuf;

use kestrel_cache::CacheError;
use kestrel_engine::EngineError;

/// A source buffer could not be materialized on disk.
#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    /// The temporary file could not be created.
    #[error("failed to create staging file in {dir}: {source}")]
    Create {
        /// The directory the file was created in.
        dir: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The content could not be written.
    #[error("failed to write staging file {path}: {source}")]
    Write {
        /// The staging file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The file could not be deleted on release.
    #[error("failed to delete staging file {path}: {source}")]
    Release {
        /// The staging file.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Why one file of a scan produced no diagnostics.
///
/// Recorded against the file; never aborts the rest of the scan.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The file could not be staged.
    #[error(transparent)]
    Staging(#[from] StagingError),

    /// The engine failed on the staged file.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// A scan task failed as a whole.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    /// `start` was called on a task that already left the created state.
    #[error("scan task {0} has already been started")]
    AlreadyStarted(u64),

    /// The worker panicked while processing files.
    #[error("scan worker panicked: {0}")]
    WorkerPanicked(String),

    /// The worker thread could not be started.
    #[error("could not start scan worker: {0}")]
    Spawn(String),
}

/// A session could not run a scan.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No engine could be obtained for the configuration.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The scan task failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
}
