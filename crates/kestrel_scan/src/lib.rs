//! Background scans over cached engines.
//!
//! A [`ScanTask`] stages each source buffer to a temporary file with the
//! configured line separator, runs it through a shared
//! [`CompiledEngine`](kestrel_cache::CompiledEngine), and records the
//! diagnostics or the failure for that file. The [`ScanCoordinator`] tracks
//! which tasks are active, and a [`ScanSession`] ties an engine cache, a
//! coordinator, and staging options together for one host session.

#![warn(missing_docs)]

pub mod cancel;
pub mod coordinator;
pub mod error;
pub mod progress;
pub mod report;
pub mod session;
pub mod staging;
pub mod task;

pub use cancel::CancellationToken;
pub use coordinator::ScanCoordinator;
pub use error::{FileError, ScanError, SessionError, StagingError};
pub use progress::{NoProgress, ProgressObserver};
pub use report::{FileReport, ScanReport};
pub use session::ScanSession;
pub use staging::{replace_newlines, FileStager, StagedFile};
pub use task::{ScanOptions, ScanTask, TaskId, TaskState};
