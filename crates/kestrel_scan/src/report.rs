//! Scan results.

use std::sync::Arc;

use kestrel_diagnostics::Diagnostic;
use kestrel_source::SourceRef;

use crate::error::FileError;
use crate::task::TaskState;

/// The outcome for one file of a scan.
#[derive(Clone, Debug)]
pub struct FileReport {
    /// The file scanned.
    pub source: SourceRef,
    /// Diagnostics, sorted by position. Empty when `error` is set.
    pub diagnostics: Vec<Diagnostic>,
    /// Why the file could not be scanned, if it could not.
    pub error: Option<Arc<FileError>>,
}

impl FileReport {
    /// Records a file's outcome.
    pub fn new(source: SourceRef, outcome: Result<Vec<Diagnostic>, FileError>) -> Self {
        match outcome {
            Ok(diagnostics) => Self {
                source,
                diagnostics,
                error: None,
            },
            Err(err) => Self {
                source,
                diagnostics: Vec::new(),
                error: Some(Arc::new(err)),
            },
        }
    }

    /// Returns `true` if the file was scanned.
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// The results of a finished scan, in the order files were supplied.
///
/// A cancelled scan reports only the files processed before cancellation.
#[derive(Clone, Debug)]
pub struct ScanReport {
    /// The task's terminal state.
    pub state: TaskState,
    /// Per-file outcomes.
    pub files: Vec<FileReport>,
}

impl ScanReport {
    /// Returns the diagnostics recorded for `source`, if it was processed.
    pub fn diagnostics_for(&self, source: &SourceRef) -> Option<&[Diagnostic]> {
        self.files
            .iter()
            .find(|f| &f.source == source)
            .map(|f| f.diagnostics.as_slice())
    }

    /// Returns the files that could not be scanned.
    pub fn failed_files(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|f| !f.is_ok())
    }

    /// Returns the total number of diagnostics.
    pub fn diagnostic_count(&self) -> usize {
        self.files.iter().map(|f| f.diagnostics.len()).sum()
    }

    /// Iterates over every diagnostic, file by file.
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.files.iter().flat_map(|f| f.diagnostics.iter())
    }
}
