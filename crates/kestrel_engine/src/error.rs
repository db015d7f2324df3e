//! Per-file engine failures.

use std::path::PathBuf;

/// An engine could not process one file.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The staged file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The staged file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The engine has been destroyed and cannot process files.
    #[error("engine has been destroyed")]
    Destroyed,

    /// A suppression document could not be loaded.
    #[error("suppression filter failed: {0}")]
    Suppression(String),
}
