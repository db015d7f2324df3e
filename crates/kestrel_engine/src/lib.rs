//! Analysis engine: checks configured from a rule document and run per file.
//!
//! A configuration tree from `kestrel_config` is turned into a [`RuleEngine`]
//! by instantiating each `<module>` through a [`CheckRegistry`]. The engine
//! then reads staged files and reports [`Diagnostic`]s against the original
//! source they were staged from.
//!
//! # Built-in checks
//!
//! - **LineLength:** lines longer than `max` characters
//! - **FileTabCharacter:** tab characters, first instance or every line
//! - **FileLength:** files longer than `max` lines
//! - **TrailingWhitespace:** spaces or tabs before a line end
//! - **NewlineAtEndOfFile:** missing final line separator
//! - **RegexpSingleline:** lines matching a forbidden pattern

#![warn(missing_docs)]

mod check;
pub mod checks;
mod engine;
mod error;
mod suppression;
mod text;

pub use check::{Check, CheckRegistry, Finding};
pub use engine::RuleEngine;
pub use error::EngineError;
pub use suppression::SuppressionFilter;
pub use text::FileText;

use kestrel_diagnostics::Diagnostic;
use kestrel_source::SourceRef;
use std::path::Path;

/// A configured engine that analyses one staged file at a time.
///
/// After configuration an engine is only read, so one instance may process
/// files from several scans concurrently. Once [`destroy`](Self::destroy)
/// has been called every further [`process`](Self::process) call fails with
/// [`EngineError::Destroyed`].
pub trait AnalysisEngine: Send + Sync {
    /// Analyses the staged copy of `source` at `staged`.
    ///
    /// Diagnostics refer to `source` and are ordered by line, then column.
    fn process(&self, staged: &Path, source: &SourceRef) -> Result<Vec<Diagnostic>, EngineError>;

    /// Releases the engine's resources. Calling it again has no effect.
    fn destroy(&self);

    /// Returns `true` once [`destroy`](Self::destroy) has been called.
    fn is_destroyed(&self) -> bool;
}
