//! A single finding reported for one source buffer.

use crate::severity::Severity;
use kestrel_source::SourceRef;
use serde::{Deserialize, Serialize};

/// One finding reported by the engine for a single file.
///
/// Diagnostics are values: once produced they are never mutated. `line` and
/// `column` are 1-indexed and refer to the host buffer's visual lines; a
/// `column` of 0 means the finding applies to the whole line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// The buffer this finding belongs to.
    pub source: SourceRef,
    /// 1-indexed line.
    pub line: u32,
    /// 1-indexed column, or 0 for the whole line.
    pub column: u32,
    /// The severity level of this finding.
    pub severity: Severity,
    /// Human-readable message.
    pub message: String,
    /// Name of the check that produced the finding.
    pub check: String,
}

impl Diagnostic {
    /// Creates a diagnostic with no check name attached.
    pub fn new(
        source: SourceRef,
        line: u32,
        column: u32,
        severity: Severity,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source,
            line,
            column,
            severity,
            message: message.into(),
            check: String::new(),
        }
    }

    /// Attaches the name of the check that produced this finding.
    pub fn with_check(mut self, check: impl Into<String>) -> Self {
        self.check = check.into();
        self
    }

    /// Returns `path:line` or `path:line:column` for display.
    pub fn location(&self) -> String {
        if self.column == 0 {
            format!("{}:{}", self.source, self.line)
        } else {
            format!("{}:{}:{}", self.source, self.line, self.column)
        }
    }
}
